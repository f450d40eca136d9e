//! Test harness driving a strategy without the controller.

use crate::memory::EvaluationMemory;
use crate::random::create_rng;
use crate::space::{Position, SearchSpace};

use super::OptimizerStrategy;

/// Runs `iters` propose/update rounds against `objective`, caching through
/// a fresh memory. Infeasible proposals score `-inf` and are not recorded.
pub(crate) fn drive<F>(
    strategy: &mut dyn OptimizerStrategy,
    space: &SearchSpace,
    iters: usize,
    seed: u64,
    objective: F,
) -> EvaluationMemory
where
    F: Fn(&Position) -> f64,
{
    let mut rng = create_rng(seed);
    let mut memory = EvaluationMemory::new();
    for _ in 0..iters {
        let proposed = strategy.propose(space, &memory, &mut rng);
        assert!(!proposed.is_empty(), "{} proposed nothing", strategy.name());
        let scores: Vec<f64> = proposed
            .iter()
            .map(|p| {
                assert!(space.contains(p), "{} proposed {p} outside the space", strategy.name());
                if !space.is_feasible(p) {
                    return f64::NEG_INFINITY;
                }
                let score = memory.get(p).unwrap_or_else(|| objective(p));
                memory.record(p.clone(), score, Some(strategy.name()))
            })
            .collect();
        strategy.update(space, &proposed, &scores, &mut rng);
    }
    memory
}
