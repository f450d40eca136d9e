/// A regression model approximating the objective.
///
/// Features are positions scaled to the unit cube; targets are scores in
/// maximization form. Implementations must tolerate constant features and
/// constant targets.
pub trait Surrogate: Send {
    /// Re-trains on the full data set. `features` and `targets` have equal
    /// length.
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]);

    /// Predicted mean and variance at `x`. Before any fit the prediction is
    /// `(0.0, 1.0)`.
    fn predict_with_uncertainty(&self, x: &[f64]) -> (f64, f64);
}

impl Surrogate for Box<dyn Surrogate> {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) {
        (**self).fit(features, targets)
    }

    fn predict_with_uncertainty(&self, x: &[f64]) -> (f64, f64) {
        (**self).predict_with_uncertainty(x)
    }
}

/// Mean and (population) variance of `values`; `(0.0, 0.0)` when empty.
pub(crate) fn mean_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_variance() {
        assert_eq!(mean_variance(&[]), (0.0, 0.0));
        let (m, v) = mean_variance(&[1.0, 3.0]);
        assert!((m - 2.0).abs() < 1e-12);
        assert!((v - 1.0).abs() < 1e-12);
    }
}
