use rand::RngCore;

use crate::error::Result;
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{InitQueue, OptimizerStrategy};

/// Uniform random sampling.
///
/// Draws are independent; repeats are absorbed by the evaluation cache.
#[derive(Debug, Clone, Default)]
pub struct RandomSearch {
    init: InitQueue,
}

impl RandomSearch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptimizerStrategy for RandomSearch {
    fn name(&self) -> &'static str {
        "random_search"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        // without seeds the first proposal is simply the first draw
        self.init = if initial.is_empty() {
            InitQueue::default()
        } else {
            InitQueue::new(space, rng, initial, 0)
        };
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        _memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        match self.init.current() {
            Some(start) => vec![start.clone()],
            None => vec![space.random_feasible_position(rng)],
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
            if !self.init.is_done() {
                self.init.advance(position, score);
            }
        }
    }
}
