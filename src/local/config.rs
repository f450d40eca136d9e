//! Local-search configurations and cooling schedules.

use crate::random::Perturbation;

/// Cooling schedule for the annealing temperature.
///
/// Applied once per iteration.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling from the start to the minimum temperature over
    /// `steps` iterations.
    Linear {
        /// Number of iterations until the minimum is reached.
        steps: usize,
    },

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// Cools fast at high T, slow at low T.
    LundyMees {
        /// Cooling parameter.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.97 }
    }
}

impl CoolingSchedule {
    /// Temperature after one more step, never below `min`.
    pub fn cool(&self, temperature: f64, start: f64, min: f64) -> f64 {
        let next = match *self {
            CoolingSchedule::Geometric { alpha } => temperature * alpha,
            CoolingSchedule::Linear { steps } => {
                if steps == 0 {
                    min
                } else {
                    temperature - (start - min) / steps as f64
                }
            }
            CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
        };
        next.max(min)
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            CoolingSchedule::Geometric { alpha } => {
                if alpha <= 0.0 || alpha >= 1.0 {
                    return Err(format!("geometric alpha must be in (0, 1), got {alpha}"));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if beta <= 0.0 {
                    return Err(format!("lundy-mees beta must be positive, got {beta}"));
                }
            }
            CoolingSchedule::Linear { .. } => {}
        }
        Ok(())
    }
}

fn check_step(epsilon: f64, rand_rest_p: f64, n_neighbours: usize) -> Result<(), String> {
    if !(epsilon > 0.0 && epsilon.is_finite()) {
        return Err(format!("epsilon must be positive, got {epsilon}"));
    }
    if !(0.0..=1.0).contains(&rand_rest_p) {
        return Err(format!("rand_rest_p must be in [0, 1], got {rand_rest_p}"));
    }
    if n_neighbours == 0 {
        return Err("n_neighbours must be at least 1".into());
    }
    Ok(())
}

/// Configuration for [`HillClimbing`](super::HillClimbing).
///
/// # Examples
///
/// ```
/// use u_blackbox::local::HillClimbingConfig;
/// use u_blackbox::random::Perturbation;
///
/// let config = HillClimbingConfig::default()
///     .with_epsilon(0.1)
///     .with_perturbation(Perturbation::Laplace)
///     .with_n_neighbours(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HillClimbingConfig {
    /// Step width as a fraction of each dimension's size.
    pub epsilon: f64,

    /// Noise distribution of a step.
    pub perturbation: Perturbation,

    /// Neighbours sampled before moving to the best of them.
    pub n_neighbours: usize,

    /// Probability of a uniformly random step instead of a climb.
    pub rand_rest_p: f64,
}

impl Default for HillClimbingConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.03,
            perturbation: Perturbation::Normal,
            n_neighbours: 3,
            rand_rest_p: 0.0,
        }
    }
}

impl HillClimbingConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_perturbation(mut self, perturbation: Perturbation) -> Self {
        self.perturbation = perturbation;
        self
    }

    pub fn with_n_neighbours(mut self, n: usize) -> Self {
        self.n_neighbours = n;
        self
    }

    pub fn with_rand_rest_p(mut self, p: f64) -> Self {
        self.rand_rest_p = p;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        check_step(self.epsilon, self.rand_rest_p, self.n_neighbours)
    }
}

/// Configuration for [`StochasticHillClimbing`](super::StochasticHillClimbing).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StochasticHillClimbingConfig {
    pub climb: HillClimbingConfig,

    /// Base probability of accepting an equal-score move. Worse moves are
    /// accepted less often the larger their relative loss.
    pub p_accept: f64,
}

impl Default for StochasticHillClimbingConfig {
    fn default() -> Self {
        Self {
            climb: HillClimbingConfig::default(),
            p_accept: 0.5,
        }
    }
}

impl StochasticHillClimbingConfig {
    pub fn with_climb(mut self, climb: HillClimbingConfig) -> Self {
        self.climb = climb;
        self
    }

    pub fn with_p_accept(mut self, p: f64) -> Self {
        self.p_accept = p;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.climb.validate()?;
        if !(0.0..=1.0).contains(&self.p_accept) {
            return Err(format!("p_accept must be in [0, 1], got {}", self.p_accept));
        }
        Ok(())
    }
}

/// Configuration for [`RepulsingHillClimbing`](super::RepulsingHillClimbing).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepulsingHillClimbingConfig {
    pub climb: HillClimbingConfig,

    /// Step-width multiplier applied after a neighbourhood without
    /// improvement.
    pub repulsion_factor: f64,
}

impl Default for RepulsingHillClimbingConfig {
    fn default() -> Self {
        Self {
            climb: HillClimbingConfig::default(),
            repulsion_factor: 5.0,
        }
    }
}

impl RepulsingHillClimbingConfig {
    pub fn with_climb(mut self, climb: HillClimbingConfig) -> Self {
        self.climb = climb;
        self
    }

    pub fn with_repulsion_factor(mut self, factor: f64) -> Self {
        self.repulsion_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.climb.validate()?;
        if !(self.repulsion_factor >= 1.0 && self.repulsion_factor.is_finite()) {
            return Err(format!(
                "repulsion_factor must be >= 1, got {}",
                self.repulsion_factor
            ));
        }
        Ok(())
    }
}

/// Configuration for [`SimulatedAnnealing`](super::SimulatedAnnealing).
///
/// # Examples
///
/// ```
/// use u_blackbox::local::{CoolingSchedule, SimulatedAnnealingConfig};
///
/// let config = SimulatedAnnealingConfig::default()
///     .with_start_temperature(10.0)
///     .with_cooling(CoolingSchedule::LundyMees { beta: 0.01 });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulatedAnnealingConfig {
    pub climb: HillClimbingConfig,

    /// Initial temperature. Higher values allow more exploration.
    pub start_temperature: f64,

    /// The strategy reports convergence once the temperature reaches this.
    pub min_temperature: f64,

    pub cooling: CoolingSchedule,
}

impl Default for SimulatedAnnealingConfig {
    fn default() -> Self {
        Self {
            climb: HillClimbingConfig::default(),
            start_temperature: 1.0,
            min_temperature: 1e-6,
            cooling: CoolingSchedule::default(),
        }
    }
}

impl SimulatedAnnealingConfig {
    pub fn with_climb(mut self, climb: HillClimbingConfig) -> Self {
        self.climb = climb;
        self
    }

    pub fn with_start_temperature(mut self, t: f64) -> Self {
        self.start_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.climb.validate()?;
        if self.start_temperature <= 0.0 {
            return Err("start_temperature must be positive".into());
        }
        if self.min_temperature <= 0.0 {
            return Err("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.start_temperature {
            return Err("min_temperature must be less than start_temperature".into());
        }
        self.cooling.validate()
    }
}

/// Configuration for [`PatternSearch`](super::PatternSearch).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternSearchConfig {
    /// Pattern points evaluated per round.
    pub n_positions: usize,

    /// Pattern arm length as a fraction of each dimension's size.
    pub pattern_size: f64,

    /// Factor applied to the arm length after a round without improvement.
    pub reduction: f64,

    pub rand_rest_p: f64,
}

impl Default for PatternSearchConfig {
    fn default() -> Self {
        Self {
            n_positions: 4,
            pattern_size: 0.25,
            reduction: 0.9,
            rand_rest_p: 0.0,
        }
    }
}

impl PatternSearchConfig {
    pub fn with_n_positions(mut self, n: usize) -> Self {
        self.n_positions = n;
        self
    }

    pub fn with_pattern_size(mut self, size: f64) -> Self {
        self.pattern_size = size;
        self
    }

    pub fn with_reduction(mut self, reduction: f64) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_rand_rest_p(mut self, p: f64) -> Self {
        self.rand_rest_p = p;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_positions == 0 {
            return Err("n_positions must be at least 1".into());
        }
        if !(self.pattern_size > 0.0 && self.pattern_size <= 1.0) {
            return Err(format!(
                "pattern_size must be in (0, 1], got {}",
                self.pattern_size
            ));
        }
        if !(self.reduction > 0.0 && self.reduction <= 1.0) {
            return Err(format!("reduction must be in (0, 1], got {}", self.reduction));
        }
        if !(0.0..=1.0).contains(&self.rand_rest_p) {
            return Err(format!("rand_rest_p must be in [0, 1], got {}", self.rand_rest_p));
        }
        Ok(())
    }
}

/// Configuration for [`PowellsMethod`](super::PowellsMethod).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowellsMethodConfig {
    /// Line-search samples per dimension.
    pub iters_p_dim: usize,
}

impl Default for PowellsMethodConfig {
    fn default() -> Self {
        Self { iters_p_dim: 10 }
    }
}

impl PowellsMethodConfig {
    pub fn with_iters_p_dim(mut self, n: usize) -> Self {
        self.iters_p_dim = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.iters_p_dim == 0 {
            return Err("iters_p_dim must be at least 1".into());
        }
        Ok(())
    }
}

/// Configuration for [`RandomRestart`](super::RandomRestart).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomRestartConfig {
    /// Iterations without improvement of the current sub-run before a
    /// restart.
    pub n_iter_restart: usize,

    /// Upper bound on restarts. `None` = unlimited.
    pub max_restarts: Option<usize>,
}

impl Default for RandomRestartConfig {
    fn default() -> Self {
        Self {
            n_iter_restart: 10,
            max_restarts: None,
        }
    }
}

impl RandomRestartConfig {
    pub fn with_n_iter_restart(mut self, n: usize) -> Self {
        self.n_iter_restart = n;
        self
    }

    pub fn with_max_restarts(mut self, n: usize) -> Self {
        self.max_restarts = Some(n);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_iter_restart == 0 {
            return Err("n_iter_restart must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hill_climbing() {
        let config = HillClimbingConfig::default();
        assert!((config.epsilon - 0.03).abs() < 1e-12);
        assert_eq!(config.n_neighbours, 3);
        assert_eq!(config.perturbation, Perturbation::Normal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_epsilon() {
        assert!(HillClimbingConfig::default().with_epsilon(0.0).validate().is_err());
        assert!(HillClimbingConfig::default()
            .with_epsilon(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_bad_rand_rest_p() {
        let config = HillClimbingConfig::default().with_rand_rest_p(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_annealing() {
        assert!(SimulatedAnnealingConfig::default().validate().is_ok());
        let config = SimulatedAnnealingConfig::default()
            .with_start_temperature(1.0)
            .with_min_temperature(2.0);
        assert!(config.validate().is_err());
        let config = SimulatedAnnealingConfig::default()
            .with_cooling(CoolingSchedule::Geometric { alpha: 1.5 });
        assert!(config.validate().is_err());
        let config = SimulatedAnnealingConfig::default()
            .with_cooling(CoolingSchedule::LundyMees { beta: -1.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cooling_schedules_decrease() {
        let schedules = [
            CoolingSchedule::Geometric { alpha: 0.9 },
            CoolingSchedule::Linear { steps: 10 },
            CoolingSchedule::LundyMees { beta: 0.5 },
        ];
        for schedule in schedules {
            let next = schedule.cool(1.0, 1.0, 0.01);
            assert!(next < 1.0, "{schedule:?}");
            assert!(next >= 0.01);
        }
    }

    #[test]
    fn test_linear_reaches_min() {
        let schedule = CoolingSchedule::Linear { steps: 4 };
        let mut t = 1.0;
        for _ in 0..4 {
            t = schedule.cool(t, 1.0, 0.2);
        }
        assert!((t - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_validate_pattern_and_powell() {
        assert!(PatternSearchConfig::default().validate().is_ok());
        assert!(PatternSearchConfig::default()
            .with_n_positions(0)
            .validate()
            .is_err());
        assert!(PowellsMethodConfig::default()
            .with_iters_p_dim(0)
            .validate()
            .is_err());
        assert!(RandomRestartConfig::default()
            .with_n_iter_restart(0)
            .validate()
            .is_err());
    }
}
