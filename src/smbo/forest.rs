//! Tree-ensemble surrogates (random forest and extremely randomized trees).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::surrogate::{mean_variance, Surrogate};
use crate::random::create_rng;

/// Split rule of the trees in a [`RandomForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TreeKind {
    /// Bootstrap samples, best split over a random feature subset.
    #[default]
    RandomForest,
    /// Full sample, one random threshold per candidate feature.
    ExtraTrees,
}

/// Configuration for [`RandomForest`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForestConfig {
    pub kind: TreeKind,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Seed of the forest's own sampling; the fit is deterministic for a
    /// given data set.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            kind: TreeKind::RandomForest,
            n_trees: 16,
            max_depth: 10,
            min_samples_leaf: 1,
            seed: 0,
        }
    }
}

impl ForestConfig {
    pub fn with_kind(mut self, kind: TreeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_n_trees(mut self, n: usize) -> Self {
        self.n_trees = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_trees == 0 {
            return Err("n_trees must be at least 1".into());
        }
        if self.min_samples_leaf == 0 {
            return Err("min_samples_leaf must be at least 1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        mean: f64,
        variance: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, x: &[f64]) -> (f64, f64) {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { mean, variance } => return (*mean, *variance),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if x[*feature] <= *threshold { *left } else { *right },
            }
        }
    }
}

struct Builder<'a> {
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    config: &'a ForestConfig,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn leaf(&mut self, rows: &[usize]) -> usize {
        let values: Vec<f64> = rows.iter().map(|&r| self.targets[r]).collect();
        let (mean, variance) = mean_variance(&values);
        self.nodes.push(Node::Leaf { mean, variance });
        self.nodes.len() - 1
    }

    fn build(&mut self, rows: &mut [usize], depth: usize) -> usize {
        let min_leaf = self.config.min_samples_leaf;
        if depth >= self.config.max_depth || rows.len() < 2 * min_leaf {
            return self.leaf(rows);
        }
        let Some((feature, threshold)) = self.best_split(rows) else {
            return self.leaf(rows);
        };

        let features = self.features;
        rows.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));
        let cut = rows.partition_point(|&r| features[r][feature] <= threshold);
        if cut < min_leaf || rows.len() - cut < min_leaf {
            return self.leaf(rows);
        }

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            mean: 0.0,
            variance: 0.0,
        });
        let (left_rows, right_rows) = rows.split_at_mut(cut);
        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        index
    }

    /// Feature and threshold with the lowest summed squared error, or
    /// `None` if no split separates the rows.
    fn best_split(&mut self, rows: &[usize]) -> Option<(usize, f64)> {
        let dims = self.features[rows[0]].len();
        let mut candidates: Vec<usize> = (0..dims).collect();
        candidates.shuffle(&mut *self.rng);
        if self.config.kind == TreeKind::RandomForest {
            candidates.truncate(((dims as f64).sqrt().ceil() as usize).max(1));
        }

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in candidates {
            let mut values: Vec<f64> = rows.iter().map(|&r| self.features[r][feature]).collect();
            values.sort_by(f64::total_cmp);
            values.dedup();
            if values.len() < 2 {
                continue;
            }
            let thresholds: Vec<f64> = match self.config.kind {
                TreeKind::RandomForest => values.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect(),
                TreeKind::ExtraTrees => {
                    let lo = values[0];
                    let hi = values[values.len() - 1];
                    // keep the threshold strictly below the largest value
                    vec![lo + self.rng.random::<f64>() * (hi - lo) * (1.0 - f64::EPSILON)]
                }
            };
            for threshold in thresholds {
                let sse = self.split_error(rows, feature, threshold);
                if best.is_none_or(|(b, _, _)| sse < b) {
                    best = Some((sse, feature, threshold));
                }
            }
        }
        best.map(|(_, f, t)| (f, t))
    }

    fn split_error(&self, rows: &[usize], feature: usize, threshold: f64) -> f64 {
        let (mut left, mut right): (Vec<f64>, Vec<f64>) = (Vec::new(), Vec::new());
        for &r in rows {
            if self.features[r][feature] <= threshold {
                left.push(self.targets[r]);
            } else {
                right.push(self.targets[r]);
            }
        }
        let (_, lv) = mean_variance(&left);
        let (_, rv) = mean_variance(&right);
        lv * left.len() as f64 + rv * right.len() as f64
    }
}

/// Ensemble of regression trees.
///
/// The prediction is the mean of the tree predictions; the variance adds
/// the spread between trees to the mean within-leaf variance.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<Tree>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    /// Forest of extremely randomized trees with otherwise default settings.
    pub fn extra_trees() -> Self {
        Self::new(ForestConfig::default().with_kind(TreeKind::ExtraTrees))
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl Surrogate for RandomForest {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) {
        self.trees.clear();
        let n = features.len().min(targets.len());
        if n == 0 {
            return;
        }
        let mut rng = create_rng(self.config.seed ^ n as u64);
        for _ in 0..self.config.n_trees.max(1) {
            let mut rows: Vec<usize> = match self.config.kind {
                TreeKind::RandomForest => (0..n).map(|_| rng.random_range(0..n)).collect(),
                TreeKind::ExtraTrees => (0..n).collect(),
            };
            let mut builder = Builder {
                features,
                targets,
                config: &self.config,
                rng: &mut rng,
                nodes: Vec::new(),
            };
            builder.build(&mut rows, 0);
            self.trees.push(Tree {
                nodes: builder.nodes,
            });
        }
    }

    fn predict_with_uncertainty(&self, x: &[f64]) -> (f64, f64) {
        if self.trees.is_empty() {
            return (0.0, 1.0);
        }
        let (means, variances): (Vec<f64>, Vec<f64>) =
            self.trees.iter().map(|t| t.predict(x)).unzip();
        let (mean, between) = mean_variance(&means);
        let (within, _) = mean_variance(&variances);
        (mean, between + within)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let xs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 19.0, 0.5]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| if x[0] < 0.5 { 0.0 } else { 10.0 }).collect();
        (xs, ys)
    }

    #[test]
    fn test_forest_learns_step() {
        for kind in [TreeKind::RandomForest, TreeKind::ExtraTrees] {
            let (xs, ys) = step_data();
            let mut forest = RandomForest::new(ForestConfig::default().with_kind(kind));
            forest.fit(&xs, &ys);
            let (low, _) = forest.predict_with_uncertainty(&[0.1, 0.5]);
            let (high, _) = forest.predict_with_uncertainty(&[0.9, 0.5]);
            assert!(high - low > 5.0, "{kind:?}: {low} vs {high}");
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (xs, ys) = step_data();
        let mut a = RandomForest::default();
        let mut b = RandomForest::default();
        a.fit(&xs, &ys);
        b.fit(&xs, &ys);
        for x in [0.0, 0.33, 0.5, 0.77] {
            assert_eq!(
                a.predict_with_uncertainty(&[x, 0.5]),
                b.predict_with_uncertainty(&[x, 0.5])
            );
        }
    }

    #[test]
    fn test_constant_features_give_single_leaf() {
        let xs = vec![vec![0.0]; 5];
        let ys = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut forest = RandomForest::extra_trees();
        forest.fit(&xs, &ys);
        let (mean, var) = forest.predict_with_uncertainty(&[0.0]);
        assert!((mean - 3.0).abs() < 1e-12);
        assert!((var - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(ForestConfig::default().validate().is_ok());
        assert!(ForestConfig::default().with_n_trees(0).validate().is_err());
    }
}
