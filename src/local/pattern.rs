use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::debug;

use super::config::PatternSearchConfig;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{argmax, InitQueue, OptimizerStrategy};

/// Pattern (compass) search.
///
/// Evaluates up to `n_positions` points of a cross-shaped pattern around
/// the current position. Moves to the best point if it improves, otherwise
/// shrinks the pattern by `reduction`. The pattern arm never drops below
/// one grid step.
#[derive(Debug, Clone)]
pub struct PatternSearch {
    config: PatternSearchConfig,
    init: InitQueue,
    current: Option<(Position, f64)>,
    pattern_size: f64,
    pattern: Vec<Position>,
    cursor: usize,
    round: Vec<(Position, f64)>,
}

impl Default for PatternSearch {
    fn default() -> Self {
        Self::new(PatternSearchConfig::default())
    }
}

impl PatternSearch {
    pub fn new(config: PatternSearchConfig) -> Self {
        let pattern_size = config.pattern_size;
        Self {
            config,
            init: InitQueue::default(),
            current: None,
            pattern_size,
            pattern: Vec::new(),
            cursor: 0,
            round: Vec::new(),
        }
    }

    /// Current arm length as a fraction of each dimension.
    pub fn pattern_size(&self) -> f64 {
        self.pattern_size
    }

    pub fn current(&self) -> Option<&(Position, f64)> {
        self.current.as_ref()
    }

    fn build_pattern(&mut self, space: &SearchSpace, rng: &mut dyn RngCore) {
        self.pattern.clear();
        self.cursor = 0;
        self.round.clear();
        let Some((center, _)) = &self.current else {
            return;
        };
        let steps: Vec<usize> = space
            .sizes()
            .iter()
            .map(|&k| ((self.pattern_size * (k - 1) as f64).round() as usize).max(1))
            .collect();
        let mut pattern = space.neighbors(center, &steps);
        pattern.shuffle(rng);
        pattern.truncate(self.config.n_positions);
        self.pattern = pattern;
    }
}

impl OptimizerStrategy for PatternSearch {
    fn name(&self) -> &'static str {
        "pattern_search"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.init = InitQueue::new(space, rng, initial, 1);
        self.current = None;
        self.pattern_size = self.config.pattern_size;
        self.pattern.clear();
        self.cursor = 0;
        self.round.clear();
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        _memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        if let Some(start) = self.init.current() {
            return vec![start.clone()];
        }
        let p = self.config.rand_rest_p;
        if p > 0.0 && rng.random_bool(p) {
            return vec![space.random_feasible_position(rng)];
        }
        match (self.pattern.get(self.cursor), &self.current) {
            (Some(next), _) => vec![next.clone()],
            (None, Some((center, _))) => vec![center.clone()],
            (None, None) => vec![space.random_feasible_position(rng)],
        }
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            if !self.init.is_done() {
                self.init.advance(position, score);
                if self.init.is_done() {
                    self.current = self.init.best().cloned();
                    self.build_pattern(space, rng);
                }
                continue;
            }
            self.round.push((position.clone(), score));
            self.cursor += 1;
            if self.cursor < self.pattern.len() {
                continue;
            }
            let round_scores: Vec<f64> = self.round.iter().map(|(_, s)| *s).collect();
            let current = self.current.as_ref().map_or(f64::NEG_INFINITY, |c| c.1);
            match argmax(&round_scores) {
                Some(i) if round_scores[i] > current => {
                    self.current = Some(self.round.swap_remove(i));
                }
                _ => {
                    self.pattern_size *= self.config.reduction;
                    debug!(pattern_size = self.pattern_size, "pattern shrunk");
                }
            }
            self.build_pattern(space, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;

    fn plane() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("x", 0, 40),
            Dimension::integer("y", 0, 40),
        ])
        .unwrap()
    }

    #[test]
    fn test_pattern_points_are_axis_moves() {
        let space = plane();
        let mut ps = PatternSearch::default();
        let mut rng = create_rng(0);
        let start = Position::new(vec![20, 20]);
        ps.initialize(&space, &mut rng, std::slice::from_ref(&start)).unwrap();
        ps.update(&space, &[start.clone()], &[0.0], &mut rng);

        assert_eq!(ps.pattern.len(), 4);
        for p in &ps.pattern {
            let moved = (0..2).filter(|&d| p[d] != start[d]).count();
            assert_eq!(moved, 1);
            let d = (0..2).find(|&d| p[d] != start[d]).unwrap();
            assert_eq!(p[d].abs_diff(start[d]), 10);
        }
    }

    #[test]
    fn test_pattern_shrinks_without_improvement() {
        let space = plane();
        let mut ps = PatternSearch::default();
        let mut rng = create_rng(0);
        let start = Position::new(vec![20, 20]);
        ps.initialize(&space, &mut rng, std::slice::from_ref(&start)).unwrap();
        ps.update(&space, &[start], &[0.0], &mut rng);
        let pattern = ps.pattern.clone();
        for p in &pattern {
            ps.update(&space, std::slice::from_ref(p), &[-1.0], &mut rng);
        }
        assert!((ps.pattern_size() - 0.25 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_pattern_search_climbs() {
        let space = plane();
        let mut ps = PatternSearch::default();
        let mut rng = create_rng(2);
        ps.initialize(&space, &mut rng, &[Position::new(vec![0, 0])]).unwrap();
        let memory = drive(&mut ps, &space, 80, 2, |p| {
            -((p[0] as f64 - 30.0).abs() + (p[1] as f64 - 30.0).abs())
        });
        let best = memory.best().map(|(_, s)| s).unwrap();
        assert!(best > -10.0, "best {best}");
    }
}
