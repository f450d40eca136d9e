//! Population-strategy configurations.

use super::selection::Selection;
use crate::random::Perturbation;

fn check_population(population: usize, min: usize) -> Result<(), String> {
    if population < min {
        return Err(format!("population must be at least {min}, got {population}"));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{name} must be in [0, 1], got {value}"));
    }
    Ok(())
}

/// Configuration for [`ParticleSwarm`](super::ParticleSwarm).
///
/// # Examples
///
/// ```
/// use u_blackbox::population::ParticleSwarmConfig;
///
/// let config = ParticleSwarmConfig::default()
///     .with_population(20)
///     .with_inertia(0.7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticleSwarmConfig {
    /// Number of particles.
    pub population: usize,

    /// Weight of the previous velocity.
    pub inertia: f64,

    /// Attraction towards each particle's own best position.
    pub cognitive_weight: f64,

    /// Attraction towards the swarm's best position.
    pub social_weight: f64,

    /// Initial velocity range as a fraction of each dimension's size.
    pub initial_velocity: f64,
}

impl Default for ParticleSwarmConfig {
    fn default() -> Self {
        Self {
            population: 10,
            inertia: 0.5,
            cognitive_weight: 0.5,
            social_weight: 0.5,
            initial_velocity: 0.1,
        }
    }
}

impl ParticleSwarmConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_inertia(mut self, w: f64) -> Self {
        self.inertia = w;
        self
    }

    pub fn with_cognitive_weight(mut self, w: f64) -> Self {
        self.cognitive_weight = w;
        self
    }

    pub fn with_social_weight(mut self, w: f64) -> Self {
        self.social_weight = w;
        self
    }

    pub fn with_initial_velocity(mut self, v: f64) -> Self {
        self.initial_velocity = v;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_population(self.population, 1)?;
        for (name, w) in [
            ("inertia", self.inertia),
            ("cognitive_weight", self.cognitive_weight),
            ("social_weight", self.social_weight),
            ("initial_velocity", self.initial_velocity),
        ] {
            if !(w >= 0.0 && w.is_finite()) {
                return Err(format!("{name} must be non-negative, got {w}"));
            }
        }
        Ok(())
    }
}

/// Configuration for [`DifferentialEvolution`](super::DifferentialEvolution).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifferentialEvolutionConfig {
    /// Number of members. At least 4 (target plus three donors).
    pub population: usize,

    /// Differential weight `F`.
    pub mutation_rate: f64,

    /// Binomial crossover probability `CR`.
    pub crossover_rate: f64,
}

impl Default for DifferentialEvolutionConfig {
    fn default() -> Self {
        Self {
            population: 10,
            mutation_rate: 0.9,
            crossover_rate: 0.9,
        }
    }
}

impl DifferentialEvolutionConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_mutation_rate(mut self, f: f64) -> Self {
        self.mutation_rate = f;
        self
    }

    pub fn with_crossover_rate(mut self, cr: f64) -> Self {
        self.crossover_rate = cr;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_population(self.population, 4)?;
        if !(self.mutation_rate > 0.0 && self.mutation_rate <= 2.0) {
            return Err(format!(
                "mutation_rate must be in (0, 2], got {}",
                self.mutation_rate
            ));
        }
        check_unit("crossover_rate", self.crossover_rate)
    }
}

/// Configuration for [`EvolutionStrategy`](super::EvolutionStrategy).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionStrategyConfig {
    /// Parents kept per generation (`mu`).
    pub population: usize,

    /// Offspring per generation (`lambda`).
    pub offspring: usize,

    /// `true` = (mu, lambda): parents are discarded each generation.
    /// `false` = (mu + lambda): parents compete with their offspring.
    pub replace_parents: bool,

    /// Share of offspring produced by recombining two parents before
    /// mutation.
    pub crossover_rate: f64,

    /// Initial mutation scale as a fraction of each dimension's size.
    pub initial_sigma: f64,
}

impl Default for EvolutionStrategyConfig {
    fn default() -> Self {
        Self {
            population: 10,
            offspring: 20,
            replace_parents: false,
            crossover_rate: 0.3,
            initial_sigma: 0.1,
        }
    }
}

impl EvolutionStrategyConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_offspring(mut self, n: usize) -> Self {
        self.offspring = n;
        self
    }

    pub fn with_replace_parents(mut self, replace: bool) -> Self {
        self.replace_parents = replace;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_initial_sigma(mut self, sigma: f64) -> Self {
        self.initial_sigma = sigma;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_population(self.population, 1)?;
        if self.offspring == 0 {
            return Err("offspring must be at least 1".into());
        }
        if self.replace_parents && self.offspring < self.population {
            return Err(format!(
                "(mu, lambda) selection needs offspring >= population, got {} < {}",
                self.offspring, self.population
            ));
        }
        check_unit("crossover_rate", self.crossover_rate)?;
        if !(self.initial_sigma > 0.0 && self.initial_sigma.is_finite()) {
            return Err(format!(
                "initial_sigma must be positive, got {}",
                self.initial_sigma
            ));
        }
        Ok(())
    }
}

/// Configuration for [`GeneticAlgorithm`](super::GeneticAlgorithm).
///
/// # Examples
///
/// ```
/// use u_blackbox::population::{GeneticAlgorithmConfig, Selection};
///
/// let config = GeneticAlgorithmConfig::default()
///     .with_population(30)
///     .with_offspring(40)
///     .with_selection(Selection::Rank);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneticAlgorithmConfig {
    /// Members kept per generation.
    pub population: usize,

    /// Offspring per generation.
    pub offspring: usize,

    /// Parents mixed per crossover.
    pub n_parents: usize,

    /// `true` = survivors are drawn from the offspring only.
    pub replace_parents: bool,

    /// Relative weight of mutation when producing a child.
    pub mutation_rate: f64,

    /// Relative weight of crossover when producing a child.
    pub crossover_rate: f64,

    pub selection: Selection,

    /// Step width of a mutation as a fraction of each dimension's size.
    pub epsilon: f64,

    pub perturbation: Perturbation,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            population: 10,
            offspring: 20,
            n_parents: 2,
            replace_parents: false,
            mutation_rate: 0.7,
            crossover_rate: 0.3,
            selection: Selection::default(),
            epsilon: 0.03,
            perturbation: Perturbation::Normal,
        }
    }
}

impl GeneticAlgorithmConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_offspring(mut self, n: usize) -> Self {
        self.offspring = n;
        self
    }

    pub fn with_n_parents(mut self, n: usize) -> Self {
        self.n_parents = n;
        self
    }

    pub fn with_replace_parents(mut self, replace: bool) -> Self {
        self.replace_parents = replace;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_population(self.population, 2)?;
        if self.offspring == 0 {
            return Err("offspring must be at least 1".into());
        }
        if self.replace_parents && self.offspring < self.population {
            return Err(format!(
                "replace_parents needs offspring >= population, got {} < {}",
                self.offspring, self.population
            ));
        }
        if self.n_parents < 2 || self.n_parents > self.population {
            return Err(format!(
                "n_parents must be in [2, population], got {}",
                self.n_parents
            ));
        }
        if self.mutation_rate < 0.0 || self.crossover_rate < 0.0 {
            return Err("mutation_rate and crossover_rate must be non-negative".into());
        }
        if self.mutation_rate + self.crossover_rate <= 0.0 {
            return Err("mutation_rate + crossover_rate must be positive".into());
        }
        if let Selection::Tournament(0) = self.selection {
            return Err("tournament size must be at least 1".into());
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(format!("epsilon must be positive, got {}", self.epsilon));
        }
        Ok(())
    }
}

/// Configuration for [`ParallelTempering`](super::ParallelTempering).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParallelTemperingConfig {
    /// Number of replicas.
    pub population: usize,

    /// Generations between replica exchange attempts.
    pub n_iter_swap: usize,

    /// Temperature of the coldest replica.
    pub base_temperature: f64,

    /// Ratio between neighbouring temperatures on the ladder.
    pub ladder_ratio: f64,

    pub epsilon: f64,

    pub perturbation: Perturbation,
}

impl Default for ParallelTemperingConfig {
    fn default() -> Self {
        Self {
            population: 5,
            n_iter_swap: 5,
            base_temperature: 0.1,
            ladder_ratio: 3.0,
            epsilon: 0.03,
            perturbation: Perturbation::Normal,
        }
    }
}

impl ParallelTemperingConfig {
    pub fn with_population(mut self, n: usize) -> Self {
        self.population = n;
        self
    }

    pub fn with_n_iter_swap(mut self, n: usize) -> Self {
        self.n_iter_swap = n;
        self
    }

    pub fn with_base_temperature(mut self, t: f64) -> Self {
        self.base_temperature = t;
        self
    }

    pub fn with_ladder_ratio(mut self, ratio: f64) -> Self {
        self.ladder_ratio = ratio;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Temperature of replica `i` (0 = coldest).
    pub fn temperature(&self, i: usize) -> f64 {
        self.base_temperature * self.ladder_ratio.powi(i as i32)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_population(self.population, 2)?;
        if self.n_iter_swap == 0 {
            return Err("n_iter_swap must be at least 1".into());
        }
        if !(self.base_temperature > 0.0 && self.base_temperature.is_finite()) {
            return Err("base_temperature must be positive".into());
        }
        if !(self.ladder_ratio > 1.0 && self.ladder_ratio.is_finite()) {
            return Err(format!(
                "ladder_ratio must be greater than 1, got {}",
                self.ladder_ratio
            ));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(format!("epsilon must be positive, got {}", self.epsilon));
        }
        Ok(())
    }
}
