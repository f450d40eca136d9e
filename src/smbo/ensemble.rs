use super::forest::RandomForest;
use super::gp::GaussianProcess;
use super::surrogate::{mean_variance, Surrogate};

/// Average of several surrogates.
///
/// The mean is the mean of the members' means; the variance is the mean of
/// their variances plus the variance of their means.
pub struct EnsembleRegressor {
    members: Vec<Box<dyn Surrogate>>,
}

impl Default for EnsembleRegressor {
    /// Gaussian process, random forest and extra trees.
    fn default() -> Self {
        Self::new(vec![
            Box::new(GaussianProcess::new()),
            Box::new(RandomForest::default()),
            Box::new(RandomForest::extra_trees()),
        ])
    }
}

impl std::fmt::Debug for EnsembleRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleRegressor")
            .field("members", &self.members.len())
            .finish()
    }
}

impl EnsembleRegressor {
    pub fn new(members: Vec<Box<dyn Surrogate>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Surrogate for EnsembleRegressor {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) {
        for member in &mut self.members {
            member.fit(features, targets);
        }
    }

    fn predict_with_uncertainty(&self, x: &[f64]) -> (f64, f64) {
        if self.members.is_empty() {
            return (0.0, 1.0);
        }
        let (means, variances): (Vec<f64>, Vec<f64>) = self
            .members
            .iter()
            .map(|m| m.predict_with_uncertainty(x))
            .unzip();
        let (mean, spread) = mean_variance(&means);
        let (within, _) = mean_variance(&variances);
        (mean, within + spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64, f64);

    impl Surrogate for Fixed {
        fn fit(&mut self, _: &[Vec<f64>], _: &[f64]) {}

        fn predict_with_uncertainty(&self, _: &[f64]) -> (f64, f64) {
            (self.0, self.1)
        }
    }

    #[test]
    fn test_combines_members() {
        let ensemble =
            EnsembleRegressor::new(vec![Box::new(Fixed(1.0, 0.5)), Box::new(Fixed(3.0, 1.5))]);
        let (mean, var) = ensemble.predict_with_uncertainty(&[0.0]);
        assert!((mean - 2.0).abs() < 1e-12);
        // mean variance 1.0 plus spread of means 1.0
        assert!((var - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_members_fit() {
        let xs: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64 / 7.0]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x[0] * 4.0).collect();
        let mut ensemble = EnsembleRegressor::default();
        assert_eq!(ensemble.len(), 3);
        ensemble.fit(&xs, &ys);
        let (low, _) = ensemble.predict_with_uncertainty(&[0.0]);
        let (high, _) = ensemble.predict_with_uncertainty(&[1.0]);
        assert!(high > low);
    }
}
