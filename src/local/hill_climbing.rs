use rand::{Rng, RngCore};
use tracing::debug;

use super::climber::Climber;
use super::config::{
    HillClimbingConfig, RepulsingHillClimbingConfig, StochasticHillClimbingConfig,
};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Greedy hill climbing.
///
/// Samples `n_neighbours` steps around the current position, then moves to
/// the best of them if it strictly improves.
#[derive(Debug, Clone, Default)]
pub struct HillClimbing {
    config: HillClimbingConfig,
    climber: Climber,
}

impl HillClimbing {
    pub fn new(config: HillClimbingConfig) -> Self {
        Self {
            config,
            climber: Climber::default(),
        }
    }

    /// Current position and its score, once the start has been evaluated.
    pub fn current(&self) -> Option<&(Position, f64)> {
        self.climber.current()
    }
}

impl OptimizerStrategy for HillClimbing {
    fn name(&self) -> &'static str {
        "hill_climbing"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.climber = Climber::start(space, rng, initial);
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        let c = &self.config;
        vec![self
            .climber
            .propose(space, memory, rng, c.epsilon, c.perturbation, c.rand_rest_p)]
    }

    fn update(
        &mut self,
        _space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        _rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            if let Some(best) = self.climber.observe(position, score, self.config.n_neighbours) {
                self.climber.greedy(best);
            }
        }
    }
}

/// Hill climbing that sometimes accepts a worse neighbour.
///
/// A non-improving round winner is accepted with probability
/// `2 * p_accept / (1 + exp(d))`, where `d` is the loss relative to the
/// magnitude of both scores.
#[derive(Debug, Clone, Default)]
pub struct StochasticHillClimbing {
    config: StochasticHillClimbingConfig,
    climber: Climber,
}

impl StochasticHillClimbing {
    pub fn new(config: StochasticHillClimbingConfig) -> Self {
        Self {
            config,
            climber: Climber::default(),
        }
    }

    pub fn current(&self) -> Option<&(Position, f64)> {
        self.climber.current()
    }
}

/// Probability of moving from `current` to the worse-or-equal `candidate`.
pub(crate) fn stochastic_acceptance(p_accept: f64, current: f64, candidate: f64) -> f64 {
    if !current.is_finite() || !candidate.is_finite() {
        return 0.0;
    }
    let scale = current.abs() + candidate.abs();
    let loss = if scale > 0.0 {
        (current - candidate) / scale
    } else {
        0.0
    };
    (2.0 * p_accept / (1.0 + loss.exp())).clamp(0.0, 1.0)
}

impl OptimizerStrategy for StochasticHillClimbing {
    fn name(&self) -> &'static str {
        "stochastic_hill_climbing"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.climber = Climber::start(space, rng, initial);
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        let c = &self.config.climb;
        vec![self
            .climber
            .propose(space, memory, rng, c.epsilon, c.perturbation, c.rand_rest_p)]
    }

    fn update(
        &mut self,
        _space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            let Some(best) = self
                .climber
                .observe(position, score, self.config.climb.n_neighbours)
            else {
                continue;
            };
            let current = self.climber.current().map_or(f64::NEG_INFINITY, |c| c.1);
            if best.1 > current {
                self.climber.move_to(best.0, best.1);
            } else if rng.random::<f64>()
                < stochastic_acceptance(self.config.p_accept, current, best.1)
            {
                debug!(score = best.1, current, "accepted worse neighbour");
                self.climber.move_to(best.0, best.1);
            }
        }
    }
}

/// Hill climbing that widens its step after a round without improvement,
/// pushing the search away from the explored region.
#[derive(Debug, Clone, Default)]
pub struct RepulsingHillClimbing {
    config: RepulsingHillClimbingConfig,
    climber: Climber,
    repelled: bool,
}

impl RepulsingHillClimbing {
    pub fn new(config: RepulsingHillClimbingConfig) -> Self {
        Self {
            config,
            climber: Climber::default(),
            repelled: false,
        }
    }

    /// Step width in effect for the next proposal.
    pub fn epsilon(&self) -> f64 {
        if self.repelled {
            self.config.climb.epsilon * self.config.repulsion_factor
        } else {
            self.config.climb.epsilon
        }
    }

    pub fn current(&self) -> Option<&(Position, f64)> {
        self.climber.current()
    }
}

impl OptimizerStrategy for RepulsingHillClimbing {
    fn name(&self) -> &'static str {
        "repulsing_hill_climbing"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.climber = Climber::start(space, rng, initial);
        self.repelled = false;
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        let c = &self.config.climb;
        vec![self
            .climber
            .propose(space, memory, rng, self.epsilon(), c.perturbation, c.rand_rest_p)]
    }

    fn update(
        &mut self,
        _space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        _rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            if let Some(best) = self
                .climber
                .observe(position, score, self.config.climb.n_neighbours)
            {
                self.repelled = !self.climber.greedy(best);
            }
        }
    }
}
