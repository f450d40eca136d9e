use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};

/// Unvisited feasible positions to rank with an acquisition criterion.
///
/// Enumerates the whole space when it has at most `max_sample_size`
/// positions, otherwise draws that many uniform samples (deduplicated).
/// Positions in `memory` or in the strategy's own `sampled` set are left
/// out; the latter still applies when the shared cache is disabled.
pub(crate) fn candidate_pool<R: Rng + ?Sized>(
    space: &SearchSpace,
    memory: &EvaluationMemory,
    sampled: &HashSet<Position>,
    max_sample_size: usize,
    rng: &mut R,
) -> Vec<Position> {
    let keep =
        |p: &Position| space.is_feasible(p) && !memory.contains(p) && !sampled.contains(p);
    match space.size() {
        Some(total) if total <= max_sample_size => {
            (0..total).map(|i| space.position_at(i)).filter(keep).collect()
        }
        _ => {
            let mut seen = HashSet::with_capacity(max_sample_size);
            let pool: Vec<Position> = (0..max_sample_size)
                .map(|_| space.random_position(rng))
                .filter(|p| seen.insert(p.clone()) && keep(p))
                .collect();
            debug!(sampled = pool.len(), "candidate pool sampled");
            pool
        }
    }
}

/// Default starting design: a small lattice, the corners and two random
/// points, without repeats.
pub(crate) fn initial_design<R: Rng + ?Sized>(space: &SearchSpace, rng: &mut R) -> Vec<Position> {
    let mut design = space.grid_positions(4);
    design.extend(space.vertex_positions(4));
    design.push(space.random_feasible_position(rng));
    design.push(space.random_feasible_position(rng));
    let mut seen = HashSet::new();
    design.retain(|p| seen.insert(p.clone()));
    design
}
