use rand::{Rng, RngCore};
use tracing::debug;

use super::config::ParallelTemperingConfig;
use super::members::{fittest, seed_generation, Member};
use crate::error::{Result, SearchError};
use crate::local::acceptance_probability;
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Probability of exchanging the states of a colder and a hotter replica.
fn swap_probability(cold: f64, hot: f64, t_cold: f64, t_hot: f64) -> f64 {
    let exponent = (hot - cold) * (1.0 / t_cold - 1.0 / t_hot);
    if exponent.is_nan() {
        0.0
    } else {
        exponent.exp().min(1.0)
    }
}

/// Parallel tempering (replica exchange Monte Carlo).
///
/// One Metropolis chain per rung of a geometric temperature ladder; every
/// generation each chain proposes one neighbour. Every `n_iter_swap`
/// generations adjacent chains try to exchange states, so good states
/// found by hot, exploratory chains migrate to the cold ones.
///
/// # References
///
/// - Swendsen & Wang (1986), "Replica Monte Carlo Simulation of Spin-Glasses"
#[derive(Debug, Clone)]
pub struct ParallelTempering {
    config: ParallelTemperingConfig,
    replicas: Vec<Member>,
    pending: Vec<Position>,
    generation: usize,
    swaps: usize,
}

impl Default for ParallelTempering {
    fn default() -> Self {
        Self::new(ParallelTemperingConfig::default())
    }
}

impl ParallelTempering {
    pub fn new(config: ParallelTemperingConfig) -> Self {
        Self {
            config,
            replicas: Vec::new(),
            pending: Vec::new(),
            generation: 0,
            swaps: 0,
        }
    }

    /// Accepted exchanges so far.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Replica states, coldest first.
    pub fn replicas(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.replicas.iter().map(|m| (&m.position, m.score))
    }

    fn exchange(&mut self, rng: &mut dyn RngCore) {
        for i in 0..self.replicas.len().saturating_sub(1) {
            let p = swap_probability(
                self.replicas[i].score,
                self.replicas[i + 1].score,
                self.config.temperature(i),
                self.config.temperature(i + 1),
            );
            if rng.random::<f64>() < p {
                self.replicas.swap(i, i + 1);
                self.swaps += 1;
            }
        }
    }
}

impl OptimizerStrategy for ParallelTempering {
    fn name(&self) -> &'static str {
        "parallel_tempering"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.replicas.clear();
        self.generation = 0;
        self.swaps = 0;
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
        if self.replicas.is_empty() {
            self.replicas = fittest(proposed, scores, self.config.population);
        } else {
            for (i, (position, &score)) in proposed.iter().zip(scores).enumerate() {
                let Some(replica) = self.replicas.get_mut(i) else {
                    break;
                };
                let delta = score - replica.score;
                let t = self.config.temperature(i);
                if rng.random::<f64>() < acceptance_probability(delta, t) {
                    *replica = Member {
                        position: position.clone(),
                        score,
                    };
                }
            }
        }
        self.generation += 1;
        if self.generation % self.config.n_iter_swap == 0 {
            self.exchange(rng);
            debug!(generation = self.generation, swaps = self.swaps, "replica exchange");
        }

        let c = &self.config;
        self.pending = self
            .replicas
            .iter()
            .map(|m| space.climb(&m.position, c.epsilon, c.perturbation, rng))
            .collect();
    }
}
