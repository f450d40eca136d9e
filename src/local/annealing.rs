use rand::{Rng, RngCore};
use tracing::debug;

use super::climber::Climber;
use super::config::SimulatedAnnealingConfig;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Probability of accepting a move that changes the score by `delta` at
/// `temperature`.
///
/// Improvements are always accepted. For a worsening move the probability
/// is `exp(delta / temperature)`, which shrinks as the temperature drops.
///
/// # Examples
///
/// ```
/// use u_blackbox::local::acceptance_probability;
///
/// assert_eq!(acceptance_probability(1.0, 0.5), 1.0);
/// assert!(acceptance_probability(-1.0, 1.0) > acceptance_probability(-1.0, 0.5));
/// ```
pub fn acceptance_probability(delta: f64, temperature: f64) -> f64 {
    if delta >= 0.0 {
        1.0
    } else if temperature > 0.0 {
        (delta / temperature).exp()
    } else {
        0.0
    }
}

/// Simulated annealing over the discretized space.
///
/// Hill climbing whose round winner replaces the current position even when
/// worse, with [`acceptance_probability`]. The temperature cools once per
/// iteration following the configured [`CoolingSchedule`](super::CoolingSchedule);
/// the strategy is converged once it reaches `min_temperature`.
///
/// # References
///
/// - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    config: SimulatedAnnealingConfig,
    climber: Climber,
    temperature: f64,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new(SimulatedAnnealingConfig::default())
    }
}

impl SimulatedAnnealing {
    pub fn new(config: SimulatedAnnealingConfig) -> Self {
        let temperature = config.start_temperature;
        Self {
            config,
            climber: Climber::default(),
            temperature,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn current(&self) -> Option<&(Position, f64)> {
        self.climber.current()
    }
}

impl OptimizerStrategy for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "simulated_annealing"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.climber = Climber::start(space, rng, initial);
        self.temperature = self.config.start_temperature;
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
            if let Some(best) = self
                .climber
                .observe(position, score, self.config.climb.n_neighbours)
            {
                let current = self.climber.current().map_or(f64::NEG_INFINITY, |c| c.1);
                let delta = best.1 - current;
                if delta > 0.0 {
                    self.climber.move_to(best.0, best.1);
                } else if rng.random::<f64>() < acceptance_probability(delta, self.temperature) {
                    debug!(delta, temperature = self.temperature, "accepted worse move");
                    self.climber.move_to(best.0, best.1);
                }
            }
            let c = &self.config;
            self.temperature = c
                .cooling
                .cool(self.temperature, c.start_temperature, c.min_temperature);
        }
    }

    fn is_converged(&self) -> bool {
        self.temperature <= self.config.min_temperature
    }
}
