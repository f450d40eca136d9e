//! Gaussian-process surrogate.

use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, DVector, Dyn};
use tracing::warn;

use super::surrogate::{mean_variance, Surrogate};

const SQRT_5: f64 = 2.236_067_977_499_79;

/// Jitter multipliers tried when the kernel matrix is not numerically
/// positive definite.
const JITTER_STEPS: [f64; 5] = [1.0, 10.0, 100.0, 1e3, 1e4];

/// Matérn 5/2 kernel with per-dimension length scales.
///
/// `k(a, b) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`,
/// `r = sqrt(Σ ((a_i - b_i) / l_i)²)`
fn matern52(a: &[f64], b: &[f64], length_scales: &[f64], signal_var: f64) -> f64 {
    let r_sq: f64 = a
        .iter()
        .zip(b)
        .zip(length_scales)
        .map(|((x, y), l)| ((x - y) / l).powi(2))
        .sum();
    let r = r_sq.sqrt();
    signal_var * (1.0 + SQRT_5 * r + 5.0 / 3.0 * r_sq) * (-SQRT_5 * r).exp()
}

struct Fitted {
    cholesky: Cholesky<f64, Dyn>,
    alpha: DVector<f64>,
    x_train: Vec<Vec<f64>>,
    length_scales: Vec<f64>,
}

/// Gaussian-process regression with a Matérn 5/2 kernel.
///
/// Targets are standardized before fitting; length scales follow the
/// spread of the training features. If the Cholesky factorization fails
/// even with added jitter the model falls back to the prior (mean and
/// variance of the targets).
pub struct GaussianProcess {
    noise_variance: f64,
    min_length_scale: f64,
    y_mean: f64,
    y_std: f64,
    fitted: Option<Fitted>,
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GaussianProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianProcess")
            .field("noise_variance", &self.noise_variance)
            .field("min_length_scale", &self.min_length_scale)
            .field("fitted", &self.fitted.is_some())
            .finish()
    }
}

impl GaussianProcess {
    pub fn new() -> Self {
        Self {
            noise_variance: 1e-6,
            min_length_scale: 0.05,
            y_mean: 0.0,
            y_std: 1.0,
            fitted: None,
        }
    }

    pub fn with_noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = v.max(0.0);
        self
    }

    pub fn with_min_length_scale(mut self, l: f64) -> Self {
        self.min_length_scale = l.max(f64::EPSILON);
        self
    }

    /// Whether the last fit produced a usable posterior.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn length_scales(&self, features: &[Vec<f64>]) -> Vec<f64> {
        let dims = features.first().map_or(0, Vec::len);
        (0..dims)
            .map(|d| {
                let column: Vec<f64> = features.iter().map(|x| x[d]).collect();
                mean_variance(&column).1.sqrt().max(self.min_length_scale)
            })
            .collect()
    }
}

impl Surrogate for GaussianProcess {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) {
        self.fitted = None;
        let (y_mean, y_var) = mean_variance(targets);
        self.y_mean = y_mean;
        self.y_std = y_var.sqrt().max(1e-10);
        if features.is_empty() {
            return;
        }

        let standardized: Vec<f64> = targets.iter().map(|y| (y - y_mean) / self.y_std).collect();
        let length_scales = self.length_scales(features);
        let n = features.len();
        let gram = DMatrix::from_fn(n, n, |i, j| {
            matern52(&features[i], &features[j], &length_scales, 1.0)
        });

        for step in JITTER_STEPS {
            let jitter = (self.noise_variance * step).max(1e-10 * step);
            let k = &gram + DMatrix::identity(n, n) * jitter;
            if let Some(cholesky) = Cholesky::new(k) {
                let alpha = cholesky.solve(&DVector::from_column_slice(&standardized));
                self.fitted = Some(Fitted {
                    cholesky,
                    alpha,
                    x_train: features.to_vec(),
                    length_scales,
                });
                return;
            }
        }
        warn!(samples = n, "gaussian process factorization failed, using prior");
    }

    fn predict_with_uncertainty(&self, x: &[f64]) -> (f64, f64) {
        let Some(model) = &self.fitted else {
            return (self.y_mean, self.y_std * self.y_std);
        };
        let k_star = DVector::from_fn(model.x_train.len(), |i, _| {
            matern52(x, &model.x_train[i], &model.length_scales, 1.0)
        });
        let mean = k_star.dot(&model.alpha);
        let v = model.cholesky.solve(&k_star);
        let var = (1.0 - k_star.dot(&v)).max(0.0);
        (
            self.y_mean + mean * self.y_std,
            var * self.y_std * self.y_std,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_training_points() {
        let xs: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64 / 5.0]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (3.0 * x[0]).sin()).collect();
        let mut gp = GaussianProcess::new();
        gp.fit(&xs, &ys);
        assert!(gp.is_fitted());
        for (x, y) in xs.iter().zip(&ys) {
            let (mean, var) = gp.predict_with_uncertainty(x);
            assert!((mean - y).abs() < 1e-3, "mean {mean} vs {y}");
            assert!(var < 1e-3);
        }
    }

    #[test]
    fn test_uncertainty_grows_away_from_data() {
        let xs = vec![vec![0.0], vec![0.1], vec![0.2]];
        let ys = vec![1.0, 2.0, 1.5];
        let mut gp = GaussianProcess::new();
        gp.fit(&xs, &ys);
        let (_, near) = gp.predict_with_uncertainty(&[0.1]);
        let (_, far) = gp.predict_with_uncertainty(&[1.0]);
        assert!(far > near);
    }

    #[test]
    fn test_duplicate_and_constant_inputs() {
        let xs = vec![vec![0.5, 0.0]; 4];
        let ys = vec![2.0; 4];
        let mut gp = GaussianProcess::new();
        gp.fit(&xs, &ys);
        let (mean, var) = gp.predict_with_uncertainty(&[0.5, 0.0]);
        assert!(mean.is_finite() && var.is_finite());
        assert!((mean - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_unfitted_prior() {
        let gp = GaussianProcess::new();
        assert_eq!(gp.predict_with_uncertainty(&[0.3]), (0.0, 1.0));
    }
}
