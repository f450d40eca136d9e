//! Acquisition criteria ranking candidates under a surrogate.
//!
//! All criteria are in maximization form: larger is more promising.

/// Acquisition criterion.
///
/// # Examples
///
/// ```
/// use u_blackbox::smbo::Acquisition;
///
/// let ei = Acquisition::default();
/// // an uncertain candidate beats a certain one with the same mean
/// assert!(ei.score(1.0, 4.0, 1.0) > ei.score(1.0, 0.01, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acquisition {
    /// Expected improvement over the best score plus `xi`.
    ExpectedImprovement { xi: f64 },
    /// `mean + kappa * std`.
    UpperConfidenceBound { kappa: f64 },
    /// Probability of exceeding the best score plus `xi`.
    ProbabilityOfImprovement { xi: f64 },
}

impl Default for Acquisition {
    fn default() -> Self {
        Acquisition::ExpectedImprovement { xi: 0.03 }
    }
}

impl Acquisition {
    /// Criterion value for a prediction `(mean, variance)` given the best
    /// score observed so far.
    pub fn score(&self, mean: f64, variance: f64, best: f64) -> f64 {
        let std = variance.max(0.0).sqrt();
        match *self {
            Acquisition::ExpectedImprovement { xi } => {
                let gain = mean - best - xi;
                if std < 1e-12 {
                    return gain.max(0.0);
                }
                let z = gain / std;
                (gain * norm_cdf(z) + std * norm_pdf(z)).max(0.0)
            }
            Acquisition::UpperConfidenceBound { kappa } => mean + kappa * std,
            Acquisition::ProbabilityOfImprovement { xi } => {
                let gain = mean - best - xi;
                if std < 1e-12 {
                    return if gain > 0.0 { 1.0 } else { 0.0 };
                }
                norm_cdf(gain / std)
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (name, value) = match *self {
            Acquisition::ExpectedImprovement { xi } => ("xi", xi),
            Acquisition::UpperConfidenceBound { kappa } => ("kappa", kappa),
            Acquisition::ProbabilityOfImprovement { xi } => ("xi", xi),
        };
        if !(value >= 0.0 && value.is_finite()) {
            return Err(format!("{name} must be non-negative, got {value}"));
        }
        Ok(())
    }
}

/// Standard normal PDF.
pub(crate) fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun rational approximation).
pub(crate) fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let upper = norm_pdf(x.abs()) * poly;
    if x >= 0.0 {
        1.0 - upper
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn test_expected_improvement() {
        let ei = Acquisition::ExpectedImprovement { xi: 0.0 };
        assert_eq!(ei.score(1.0, 0.0, 2.0), 0.0);
        assert!((ei.score(3.0, 0.0, 2.0) - 1.0).abs() < 1e-12);
        assert!(ei.score(2.0, 1.0, 2.0) > 0.0);
        assert!(ei.score(2.5, 1.0, 2.0) > ei.score(1.5, 1.0, 2.0));
    }

    #[test]
    fn test_ucb_and_pi() {
        let ucb = Acquisition::UpperConfidenceBound { kappa: 2.0 };
        assert!((ucb.score(1.0, 4.0, 0.0) - 5.0).abs() < 1e-12);
        let pi = Acquisition::ProbabilityOfImprovement { xi: 0.0 };
        assert!((pi.score(2.0, 1.0, 2.0) - 0.5).abs() < 1e-6);
        assert_eq!(pi.score(3.0, 0.0, 2.0), 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(Acquisition::default().validate().is_ok());
        assert!(Acquisition::UpperConfidenceBound { kappa: -1.0 }
            .validate()
            .is_err());
    }
}
