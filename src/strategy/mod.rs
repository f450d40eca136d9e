//! The optimizer-strategy protocol.
//!
//! Every search algorithm implements [`OptimizerStrategy`]. The controller
//! drives strategies only through this trait:
//!
//! 1. [`initialize`](OptimizerStrategy::initialize) once, with optional
//!    seed positions
//! 2. repeatedly [`propose`](OptimizerStrategy::propose) candidates, have
//!    them scored, and hand the scores back via
//!    [`update`](OptimizerStrategy::update)
//! 3. stop when [`is_converged`](OptimizerStrategy::is_converged) or the
//!    run budget says so
//!
//! Initial positions are evaluated through the same cycle: a strategy's
//! first proposals are its starting positions.
//!
//! All scores seen by strategies are maximized. Infeasible proposals come
//! back as `f64::NEG_INFINITY`.

mod init;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use init::InitQueue;

use rand::RngCore;

use crate::error::Result;
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};

/// A pluggable search algorithm.
///
/// Strategy state is owned by the implementing type and mutated only in
/// `initialize` and `update`. `propose` reads state and memory and may
/// consume randomness, nothing else.
pub trait OptimizerStrategy: Send {
    /// Short identifier used to tag evaluation records.
    fn name(&self) -> &'static str;

    /// Resets state for `space`. `initial` may be empty, in which case the
    /// strategy draws its own starting positions.
    ///
    /// Returns `Configuration` errors for invalid strategy parameters.
    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()>;

    /// Next candidate(s). Sequential strategies return exactly one
    /// position; population strategies return a whole generation.
    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position>;

    /// Incorporates the scores of the last proposal (same order).
    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    );

    /// Strategy-specific stopping signal.
    fn is_converged(&self) -> bool {
        false
    }
}

impl OptimizerStrategy for Box<dyn OptimizerStrategy> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        (**self).initialize(space, rng, initial)
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        (**self).propose(space, memory, rng)
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        (**self).update(space, proposed, scores, rng)
    }

    fn is_converged(&self) -> bool {
        (**self).is_converged()
    }
}

/// Index of the maximum score; ties go to the first occurrence.
pub(crate) fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some(b) if s <= scores[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_tie() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f64::NEG_INFINITY]), Some(0));
    }
}
