use rand::RngCore;
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{InitQueue, OptimizerStrategy};

/// Configuration for [`GridSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSearchConfig {
    /// Stride over the flattened grid. With a stride `s` the traversal
    /// visits `0, s, 2s, ..`, then `1, s + 1, ..`, so coarse coverage comes
    /// first; every position is still visited exactly once per pass.
    pub step_size: usize,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self { step_size: 1 }
    }
}

impl GridSearchConfig {
    pub fn with_step_size(mut self, step: usize) -> Self {
        self.step_size = step;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.step_size == 0 {
            return Err("step_size must be at least 1".into());
        }
        Ok(())
    }
}

/// Exhaustive, deterministic traversal of the search space.
///
/// Positions are enumerated by flat index (last dimension fastest). The
/// strategy is converged after one full pass; if driven further it starts
/// over, and the cache answers the repeats.
#[derive(Debug, Clone, Default)]
pub struct GridSearch {
    config: GridSearchConfig,
    init: InitQueue,
    total: usize,
    phase: usize,
    next: usize,
    visited: usize,
}

impl GridSearch {
    pub fn new(config: GridSearchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Grid positions proposed so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    fn advance(&mut self) {
        self.visited += 1;
        self.next += self.config.step_size;
        if self.next >= self.total {
            self.phase += 1;
            if self.phase >= self.config.step_size.min(self.total) {
                self.phase = 0;
                debug!(positions = self.total, "grid pass complete");
            }
            self.next = self.phase;
        }
    }
}

impl OptimizerStrategy for GridSearch {
    fn name(&self) -> &'static str {
        "grid_search"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.total = space.size().ok_or_else(|| {
            SearchError::Configuration("search space too large to enumerate".into())
        })?;
        self.init = if initial.is_empty() {
            InitQueue::default()
        } else {
            InitQueue::new(space, rng, initial, 0)
        };
        self.phase = 0;
        self.next = 0;
        self.visited = 0;
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        _memory: &EvaluationMemory,
        _rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        match self.init.current() {
            Some(start) => vec![start.clone()],
            None => vec![space.position_at(self.next)],
        }
    }

    fn update(
        &mut self,
        _space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        _rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            if self.init.is_done() {
                self.advance();
            } else {
                self.init.advance(position, score);
            }
        }
    }

    fn is_converged(&self) -> bool {
        self.visited >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;
    use std::collections::HashSet;

    fn square() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("x", 0, 4),
            Dimension::integer("y", 0, 4),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_pass_visits_every_position_once() {
        let space = square();
        for step in [1, 2, 3, 7, 30] {
            let mut gs = GridSearch::new(GridSearchConfig::default().with_step_size(step));
            let mut rng = create_rng(0);
            gs.initialize(&space, &mut rng, &[]).unwrap();

            let mut seen = HashSet::new();
            let memory = EvaluationMemory::new();
            while !gs.is_converged() {
                let p = gs.propose(&space, &memory, &mut rng);
                assert!(seen.insert(p[0].clone()), "step {step}: repeated {}", p[0]);
                gs.update(&space, &p, &[0.0], &mut rng);
            }
            assert_eq!(seen.len(), 25, "step {step}");
        }
    }

    #[test]
    fn test_grid_best_is_corner() {
        let space = square();
        let mut gs = GridSearch::default();
        let mut rng = create_rng(0);
        gs.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut gs, &space, 25, 0, |p| (p[0] + p[1]) as f64);
        assert_eq!(memory.len(), 25);
        let (best, score) = memory.best().unwrap();
        assert_eq!(best, &Position::new(vec![4, 4]));
        assert_eq!(score, 8.0);
        assert!(gs.is_converged());
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(GridSearchConfig::default().with_step_size(0).validate().is_err());
        let mut gs = GridSearch::new(GridSearchConfig::default().with_step_size(0));
        let mut rng = create_rng(0);
        let err = gs.initialize(&square(), &mut rng, &[]).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }

    #[test]
    fn test_oversized_space_is_configuration_error() {
        let dims = (0..8)
            .map(|i| Dimension::integer(format!("d{i}"), 0, 1_000_000))
            .collect();
        let space = SearchSpace::new(dims).unwrap();
        let mut gs = GridSearch::default();
        let mut rng = create_rng(0);
        let err = gs.initialize(&space, &mut rng, &[]).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }
}
