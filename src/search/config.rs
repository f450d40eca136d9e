//! Run configuration.

use std::time::Duration;

use crate::space::Assignment;

/// Whether the objective is maximized or minimized.
///
/// Strategies always maximize; a minimized objective is negated on the way
/// in and reported in its own sign on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    /// Factor converting objective values to internal (maximized) scores
    /// and back.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Maximize => 1.0,
            Direction::Minimize => -1.0,
        }
    }
}

/// How several strategies share one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Composition {
    /// Each strategy runs in turn, for an equal share of the iteration
    /// budget or until it converges.
    #[default]
    Sequential,
    /// Strategies alternate batch by batch.
    RoundRobin,
}

/// Starting positions handed to the first strategy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Initialize {
    /// Points on a regular interior lattice.
    pub grid: usize,

    /// Corners of the space.
    pub vertices: usize,

    /// Uniform random feasible points.
    pub random: usize,

    /// Explicit starting assignments, proposed first.
    pub warm_start: Vec<Assignment>,
}

impl Default for Initialize {
    fn default() -> Self {
        Self {
            grid: 4,
            vertices: 4,
            random: 2,
            warm_start: Vec::new(),
        }
    }
}

impl Initialize {
    /// No generated points, only the given assignments.
    pub fn warm_start(assignments: Vec<Assignment>) -> Self {
        Self {
            grid: 0,
            vertices: 0,
            random: 0,
            warm_start: assignments,
        }
    }

    pub fn with_grid(mut self, n: usize) -> Self {
        self.grid = n;
        self
    }

    pub fn with_vertices(mut self, n: usize) -> Self {
        self.vertices = n;
        self
    }

    pub fn with_random(mut self, n: usize) -> Self {
        self.random = n;
        self
    }
}

/// Stop once the best score has not improved by more than
/// `max(tol_abs, tol_rel * |best|)` for `n_iter_no_change` iterations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EarlyStopping {
    pub n_iter_no_change: usize,
    pub tol_abs: f64,
    pub tol_rel: f64,
}

impl EarlyStopping {
    pub fn new(n_iter_no_change: usize) -> Self {
        Self {
            n_iter_no_change,
            tol_abs: 0.0,
            tol_rel: 0.0,
        }
    }

    pub fn with_tol_abs(mut self, tol: f64) -> Self {
        self.tol_abs = tol;
        self
    }

    pub fn with_tol_rel(mut self, tol: f64) -> Self {
        self.tol_rel = tol;
        self
    }

    /// Minimum gain over `best` that counts as an improvement.
    pub fn threshold(&self, best: f64) -> f64 {
        self.tol_abs.max(self.tol_rel * best.abs())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_iter_no_change == 0 {
            return Err("n_iter_no_change must be at least 1".into());
        }
        for (name, tol) in [("tol_abs", self.tol_abs), ("tol_rel", self.tol_rel)] {
            if !(tol >= 0.0 && tol.is_finite()) {
                return Err(format!("{name} must be non-negative, got {tol}"));
            }
        }
        Ok(())
    }
}

/// Configuration of a search run.
///
/// At least one of `n_iter`, `max_evaluations` or `max_time` must bound
/// the run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_blackbox::search::{Direction, EarlyStopping, SearchConfig};
///
/// let config = SearchConfig::default()
///     .with_n_iter(200)
///     .with_max_time(Duration::from_secs(5))
///     .with_early_stopping(EarlyStopping::new(30))
///     .with_direction(Direction::Minimize)
///     .with_random_state(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Maximum number of proposed positions, cache hits included
    /// (0 = unlimited).
    pub n_iter: usize,

    /// Maximum number of objective calls (0 = unlimited).
    pub max_evaluations: usize,

    /// Wall-clock ceiling, checked between iterations.
    pub max_time: Option<Duration>,

    /// Starting positions; `None` lets each strategy choose its own.
    pub initialize: Option<Initialize>,

    pub early_stopping: Option<EarlyStopping>,

    /// Reuse scores of already evaluated positions.
    pub memory: bool,

    /// Scores from an earlier run, in the objective's own sign.
    pub memory_warm_start: Vec<(Assignment, f64)>,

    /// Seed for the run's random source (`None` = random).
    pub random_state: Option<u64>,

    pub direction: Direction,

    pub composition: Composition,

    /// Evaluate population batches on the rayon pool (feature `parallel`).
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_iter: 100,
            max_evaluations: 0,
            max_time: None,
            initialize: None,
            early_stopping: None,
            memory: true,
            memory_warm_start: Vec::new(),
            random_state: None,
            direction: Direction::Maximize,
            composition: Composition::Sequential,
            parallel: false,
        }
    }
}

impl SearchConfig {
    pub fn with_n_iter(mut self, n: usize) -> Self {
        self.n_iter = n;
        self
    }

    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }

    pub fn with_max_time(mut self, limit: Duration) -> Self {
        self.max_time = Some(limit);
        self
    }

    pub fn with_initialize(mut self, initialize: Initialize) -> Self {
        self.initialize = Some(initialize);
        self
    }

    pub fn with_early_stopping(mut self, early_stopping: EarlyStopping) -> Self {
        self.early_stopping = Some(early_stopping);
        self
    }

    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory = enabled;
        self
    }

    pub fn with_memory_warm_start(mut self, entries: Vec<(Assignment, f64)>) -> Self {
        self.memory_warm_start = entries;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_iter == 0 && self.max_evaluations == 0 && self.max_time.is_none() {
            return Err("no budget: set n_iter, max_evaluations or max_time".into());
        }
        if self.max_time.is_some_and(|t| t.is_zero()) {
            return Err("max_time must be positive".into());
        }
        if let Some(es) = &self.early_stopping {
            es.validate()?;
        }
        if self.memory_warm_start.iter().any(|(_, s)| s.is_nan()) {
            return Err("memory_warm_start contains a NaN score".into());
        }
        if self.parallel && !cfg!(feature = "parallel") {
            return Err("parallel evaluation requires the `parallel` feature".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_requires_budget() {
        let config = SearchConfig::default().with_n_iter(0);
        assert!(config.validate().is_err());
        assert!(config.clone().with_max_evaluations(10).validate().is_ok());
        assert!(config.with_max_time(Duration::from_millis(10)).validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_time() {
        assert!(SearchConfig::default()
            .with_max_time(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_early_stopping() {
        assert!(EarlyStopping::new(0).validate().is_err());
        assert!(EarlyStopping::new(5).with_tol_abs(-1.0).validate().is_err());
        let es = EarlyStopping::new(5).with_tol_abs(0.1).with_tol_rel(0.01);
        assert!((es.threshold(100.0) - 1.0).abs() < 1e-12);
        assert!((es.threshold(1.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Maximize.sign(), 1.0);
        assert_eq!(Direction::Minimize.sign(), -1.0);
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_parallel_needs_feature() {
        assert!(SearchConfig::default().with_parallel(true).validate().is_err());
    }
}
