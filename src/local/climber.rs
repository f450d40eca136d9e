use rand::{Rng, RngCore};

use crate::memory::EvaluationMemory;
use crate::random::Perturbation;
use crate::space::{Position, SearchSpace};
use crate::strategy::{argmax, InitQueue};

/// Climb draws tried before falling back to an exhaustive neighbour scan.
const CLIMB_ATTEMPTS: usize = 8;

/// A local step from `from` that avoids positions already in memory.
///
/// Draws random climbs first; if all of them hit memory or violate a
/// constraint, picks an unvisited axis neighbour. When the neighbourhood is
/// exhausted the last draw is returned (a cache hit).
pub(crate) fn explore<R: Rng + ?Sized>(
    space: &SearchSpace,
    memory: &EvaluationMemory,
    from: &Position,
    epsilon: f64,
    perturbation: Perturbation,
    rng: &mut R,
) -> Position {
    let mut last = from.clone();
    for _ in 0..CLIMB_ATTEMPTS {
        let candidate = space.climb(from, epsilon, perturbation, rng);
        if !memory.contains(&candidate) && space.is_feasible(&candidate) {
            return candidate;
        }
        last = candidate;
    }
    let fresh: Vec<Position> = space
        .neighbors(from, &[])
        .into_iter()
        .filter(|p| !memory.contains(p) && space.is_feasible(p))
        .collect();
    if fresh.is_empty() {
        last
    } else {
        fresh[rng.random_range(0..fresh.len())].clone()
    }
}

/// Shared state of the hill-climbing family: a current position and the
/// neighbours sampled around it in the ongoing round.
#[derive(Debug, Clone, Default)]
pub(crate) struct Climber {
    init: InitQueue,
    current: Option<(Position, f64)>,
    round: Vec<(Position, f64)>,
}

impl Climber {
    pub(crate) fn start(space: &SearchSpace, rng: &mut dyn RngCore, initial: &[Position]) -> Self {
        Self {
            init: InitQueue::new(space, rng, initial, 1),
            current: None,
            round: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> Option<&(Position, f64)> {
        self.current.as_ref()
    }

    /// Replaces the current position.
    pub(crate) fn move_to(&mut self, position: Position, score: f64) {
        self.current = Some((position, score));
    }

    /// Starting position still to be evaluated, or a step from the current
    /// position.
    pub(crate) fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
        epsilon: f64,
        perturbation: Perturbation,
        rand_rest_p: f64,
    ) -> Position {
        if let Some(start) = self.init.current() {
            return start.clone();
        }
        match &self.current {
            Some((current, _)) if !(rand_rest_p > 0.0 && rng.random_bool(rand_rest_p)) => {
                explore(space, memory, current, epsilon, perturbation, rng)
            }
            _ => space.random_feasible_position(rng),
        }
    }

    /// Adds a scored sample. Returns the best sample of the round once
    /// `n_neighbours` samples are collected.
    ///
    /// While starting positions are pending, samples feed the init queue
    /// instead and the best start becomes the current position.
    pub(crate) fn observe(
        &mut self,
        position: &Position,
        score: f64,
        n_neighbours: usize,
    ) -> Option<(Position, f64)> {
        if !self.init.is_done() {
            self.init.advance(position, score);
            if self.init.is_done() {
                self.current = self.init.best().cloned();
            }
            return None;
        }
        self.round.push((position.clone(), score));
        if self.round.len() < n_neighbours {
            return None;
        }
        let scores: Vec<f64> = self.round.iter().map(|(_, s)| *s).collect();
        let best = argmax(&scores).map(|i| self.round.swap_remove(i));
        self.round.clear();
        best
    }

    /// Moves to `candidate` if it strictly improves on the current position.
    pub(crate) fn greedy(&mut self, candidate: (Position, f64)) -> bool {
        let improves = match &self.current {
            Some((_, score)) => candidate.1 > *score,
            None => true,
        };
        if improves {
            self.current = Some(candidate);
        }
        improves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;

    fn line(n: i64) -> SearchSpace {
        SearchSpace::new(vec![Dimension::integer("x", 0, n - 1)]).unwrap()
    }

    #[test]
    fn test_explore_prefers_unvisited() {
        let space = line(10);
        let mut memory = EvaluationMemory::new();
        memory.record(Position::new(vec![4]), 0.0, None);
        memory.record(Position::new(vec![3]), 0.0, None);
        let mut rng = create_rng(1);
        for _ in 0..20 {
            let next = explore(
                &space,
                &memory,
                &Position::new(vec![4]),
                0.03,
                Perturbation::Normal,
                &mut rng,
            );
            assert!(!memory.contains(&next));
        }
    }

    #[test]
    fn test_explore_degenerate_space() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 2, 2)]).unwrap();
        let mut memory = EvaluationMemory::new();
        let only = Position::new(vec![0]);
        memory.record(only.clone(), 1.0, None);
        let mut rng = create_rng(0);
        let next = explore(&space, &memory, &only, 0.5, Perturbation::Normal, &mut rng);
        assert_eq!(next, only);
    }

    #[test]
    fn test_round_returns_best() {
        let space = line(10);
        let mut rng = create_rng(0);
        let start = Position::new(vec![0]);
        let mut climber = Climber::start(&space, &mut rng, std::slice::from_ref(&start));

        assert!(climber.observe(&start, -5.0, 2).is_none());
        assert_eq!(climber.current().map(|(p, _)| p), Some(&start));

        assert!(climber.observe(&Position::new(vec![1]), -3.0, 2).is_none());
        let best = climber.observe(&Position::new(vec![2]), -1.0, 2).unwrap();
        assert_eq!(best.0, Position::new(vec![2]));
        assert!(climber.greedy(best));
        assert!(!climber.greedy((Position::new(vec![3]), -1.0)));
    }
}
