use rand::Rng;

use crate::space::{Position, SearchSpace};

/// Starting positions waiting to be proposed one at a time, plus the best
/// of those already scored.
#[derive(Debug, Clone, Default)]
pub(crate) struct InitQueue {
    pending: Vec<Position>,
    next: usize,
    best: Option<(Position, f64)>,
}

impl InitQueue {
    /// Uses `initial` if non-empty, else `default_count` random feasible
    /// positions.
    pub(crate) fn new<R: Rng + ?Sized>(
        space: &SearchSpace,
        rng: &mut R,
        initial: &[Position],
        default_count: usize,
    ) -> Self {
        let pending = if initial.is_empty() {
            (0..default_count.max(1))
                .map(|_| space.random_feasible_position(rng))
                .collect()
        } else {
            initial.to_vec()
        };
        Self {
            pending,
            next: 0,
            best: None,
        }
    }

    /// The next starting position, while any remain.
    pub(crate) fn current(&self) -> Option<&Position> {
        self.pending.get(self.next)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.next >= self.pending.len()
    }

    /// Records the score of the current starting position and advances.
    pub(crate) fn advance(&mut self, position: &Position, score: f64) {
        let better = match &self.best {
            Some((_, s)) => score > *s,
            None => true,
        };
        if better {
            self.best = Some((position.clone(), score));
        }
        self.next += 1;
    }

    /// Best scored starting position.
    pub(crate) fn best(&self) -> Option<&(Position, f64)> {
        self.best.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;

    #[test]
    fn test_queue_tracks_best() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 0, 9)]).unwrap();
        let mut rng = create_rng(0);
        let starts = vec![Position::new(vec![1]), Position::new(vec![5])];
        let mut q = InitQueue::new(&space, &mut rng, &starts, 3);

        assert_eq!(q.current(), Some(&starts[0]));
        q.advance(&starts[0], -2.0);
        assert_eq!(q.current(), Some(&starts[1]));
        q.advance(&starts[1], 4.0);
        assert!(q.is_done());
        assert_eq!(q.best().map(|(p, _)| p), Some(&starts[1]));
    }

    #[test]
    fn test_queue_defaults_to_random() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 0, 9)]).unwrap();
        let mut rng = create_rng(0);
        let q = InitQueue::new(&space, &mut rng, &[], 3);
        assert!(!q.is_done());
        assert_eq!(q.pending.len(), 3);
    }
}
