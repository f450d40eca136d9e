//! Configurations for the model-based strategies.

use super::acquisition::Acquisition;

fn check_sample_size(n: usize) -> Result<(), String> {
    if n == 0 {
        return Err("max_sample_size must be at least 1".into());
    }
    Ok(())
}

/// Configuration shared by the surrogate-driven optimizers.
///
/// # Examples
///
/// ```
/// use u_blackbox::smbo::{Acquisition, SmboConfig};
///
/// let config = SmboConfig::default()
///     .with_acquisition(Acquisition::UpperConfidenceBound { kappa: 2.0 })
///     .with_max_sample_size(2_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmboConfig {
    /// Criterion ranking candidates under the surrogate.
    pub acquisition: Acquisition,

    /// Spaces with at most this many positions are scanned exhaustively;
    /// larger ones are sampled with this many random positions.
    pub max_sample_size: usize,
}

impl Default for SmboConfig {
    fn default() -> Self {
        Self {
            acquisition: Acquisition::default(),
            max_sample_size: 10_000,
        }
    }
}

impl SmboConfig {
    pub fn with_acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn with_max_sample_size(mut self, n: usize) -> Self {
        self.max_sample_size = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.acquisition.validate()?;
        check_sample_size(self.max_sample_size)
    }
}

/// Configuration for [`TreeParzenEstimators`](super::TreeParzenEstimators).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TpeConfig {
    /// Fraction of observations modelled as "good".
    pub gamma: f64,

    /// Kernel bandwidth in unit-cube coordinates.
    pub bandwidth: f64,

    pub max_sample_size: usize,
}

impl Default for TpeConfig {
    fn default() -> Self {
        Self {
            gamma: 0.2,
            bandwidth: 0.1,
            max_sample_size: 10_000,
        }
    }
}

impl TpeConfig {
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn with_max_sample_size(mut self, n: usize) -> Self {
        self.max_sample_size = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(format!("gamma must be in (0, 1), got {}", self.gamma));
        }
        if !(self.bandwidth > 0.0 && self.bandwidth.is_finite()) {
            return Err(format!("bandwidth must be positive, got {}", self.bandwidth));
        }
        check_sample_size(self.max_sample_size)
    }
}
