use rand::{Rng, RngCore};
use tracing::debug;

use super::config::DifferentialEvolutionConfig;
use super::members::{collapsed, distinct_indices, fittest, seed_generation, Member};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Differential evolution (DE/rand/1/bin).
///
/// For each target member a mutant `a + F * (b - c)` is built from three
/// other random members, mixed with the target by binomial crossover and
/// rounded onto the grid. The trial replaces its target when it scores at
/// least as well.
///
/// # References
///
/// - Storn & Price (1997), "Differential Evolution: A Simple and Efficient
///   Heuristic for Global Optimization over Continuous Spaces"
#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    config: DifferentialEvolutionConfig,
    members: Vec<Member>,
    pending: Vec<Position>,
    generation: usize,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::new(DifferentialEvolutionConfig::default())
    }
}

impl DifferentialEvolution {
    pub fn new(config: DifferentialEvolutionConfig) -> Self {
        Self {
            config,
            members: Vec::new(),
            pending: Vec::new(),
            generation: 0,
        }
    }

    /// Current members and their scores.
    pub fn population(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.members.iter().map(|m| (&m.position, m.score))
    }

    fn trials(&self, space: &SearchSpace, rng: &mut dyn RngCore) -> Vec<Position> {
        let n = self.members.len();
        let dims = space.dimension_count();
        let f = self.config.mutation_rate;
        let coords: Vec<Vec<f64>> = self
            .members
            .iter()
            .map(|m| space.to_continuous(&m.position))
            .collect();

        (0..n)
            .map(|i| {
                let donors = distinct_indices(n, 3, i, rng);
                let (a, b, c) = (&coords[donors[0]], &coords[donors[1]], &coords[donors[2]]);
                let forced = rng.random_range(0..dims);
                let mut trial: Vec<f64> = (0..dims)
                    .map(|d| {
                        if d == forced || rng.random::<f64>() < self.config.crossover_rate {
                            a[d] + f * (b[d] - c[d])
                        } else {
                            coords[i][d]
                        }
                    })
                    .collect();
                space.clamp_continuous(&mut trial);
                space.from_continuous(&trial)
            })
            .collect()
    }
}

impl OptimizerStrategy for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential_evolution"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.members.clear();
        self.generation = 0;
        self.pending = seed_generation(space, rng, initial, self.config.population);
        Ok(())
    }

    fn propose(
        &self,
        _space: &SearchSpace,
        _memory: &EvaluationMemory,
        _rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        self.pending.clone()
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        if self.members.is_empty() {
            self.members = fittest(proposed, scores, self.config.population);
        } else {
            let mut replaced = 0;
            for ((member, trial), &score) in self.members.iter_mut().zip(proposed).zip(scores) {
                if score >= member.score {
                    member.position = trial.clone();
                    member.score = score;
                    replaced += 1;
                }
            }
            debug!(generation = self.generation, replaced, "differential selection");
        }
        self.generation += 1;
        self.pending = self.trials(space, rng);
    }

    fn is_converged(&self) -> bool {
        collapsed(self.members.iter().map(|m| &m.position))
    }
}
