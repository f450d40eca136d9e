use std::collections::HashSet;

use rand::RngCore;
use tracing::debug;

use super::candidates::{candidate_pool, initial_design};
use super::config::SmboConfig;
use super::ensemble::EnsembleRegressor;
use super::forest::{ForestConfig, RandomForest};
use super::gp::GaussianProcess;
use super::surrogate::Surrogate;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{argmax, InitQueue, OptimizerStrategy};

/// Sequential model-based optimization over any [`Surrogate`].
///
/// After the starting design is scored, each proposal is the unvisited
/// candidate with the highest acquisition value under a surrogate fitted
/// to every finite score seen so far. Features are positions scaled to
/// the unit cube; categorical indices are treated as ordinal.
#[derive(Debug)]
pub struct SurrogateOptimizer<S> {
    name: &'static str,
    config: SmboConfig,
    surrogate: S,
    init: InitQueue,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
    seen: HashSet<Position>,
    best: Option<f64>,
}

/// Gaussian-process surrogate with expected improvement by default.
pub type BayesianOptimizer = SurrogateOptimizer<GaussianProcess>;

/// Random-forest (or extra-trees) surrogate.
pub type ForestOptimizer = SurrogateOptimizer<RandomForest>;

/// Surrogate averaging a Gaussian process and two tree ensembles.
pub type EnsembleOptimizer = SurrogateOptimizer<EnsembleRegressor>;

impl<S: Surrogate> SurrogateOptimizer<S> {
    /// Optimizer around a caller-supplied surrogate.
    pub fn with_surrogate(surrogate: S, config: SmboConfig) -> Self {
        Self::named("surrogate_optimizer", surrogate, config)
    }

    fn named(name: &'static str, surrogate: S, config: SmboConfig) -> Self {
        Self {
            name,
            config,
            surrogate,
            init: InitQueue::default(),
            features: Vec::new(),
            targets: Vec::new(),
            seen: HashSet::new(),
            best: None,
        }
    }

    pub fn config(&self) -> &SmboConfig {
        &self.config
    }

    pub fn surrogate(&self) -> &S {
        &self.surrogate
    }

    /// Number of distinct positions the surrogate is trained on.
    pub fn training_size(&self) -> usize {
        self.targets.len()
    }
}

impl SurrogateOptimizer<GaussianProcess> {
    pub fn new(config: SmboConfig) -> Self {
        Self::named("bayesian_optimization", GaussianProcess::new(), config)
    }
}

impl Default for SurrogateOptimizer<GaussianProcess> {
    fn default() -> Self {
        Self::new(SmboConfig::default())
    }
}

impl SurrogateOptimizer<RandomForest> {
    pub fn new(config: SmboConfig, forest: ForestConfig) -> Self {
        Self::named("forest_optimizer", RandomForest::new(forest), config)
    }
}

impl Default for SurrogateOptimizer<RandomForest> {
    fn default() -> Self {
        Self::new(SmboConfig::default(), ForestConfig::default())
    }
}

impl SurrogateOptimizer<EnsembleRegressor> {
    pub fn new(config: SmboConfig) -> Self {
        Self::named("ensemble_optimizer", EnsembleRegressor::default(), config)
    }
}

impl Default for SurrogateOptimizer<EnsembleRegressor> {
    fn default() -> Self {
        Self::new(SmboConfig::default())
    }
}

impl<S: Surrogate> OptimizerStrategy for SurrogateOptimizer<S> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        let design = if initial.is_empty() {
            initial_design(space, rng)
        } else {
            initial.to_vec()
        };
        self.init = InitQueue::new(space, rng, &design, 1);
        self.features.clear();
        self.targets.clear();
        self.seen.clear();
        self.best = None;
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        if let Some(start) = self.init.current() {
            return vec![start.clone()];
        }
        let best = match self.best {
            Some(best) if self.targets.len() >= 2 => best,
            _ => return vec![space.random_feasible_position(rng)],
        };
        let pool = candidate_pool(space, memory, &self.seen, self.config.max_sample_size, rng);
        let acquisition: Vec<f64> = pool
            .iter()
            .map(|p| {
                let (mean, variance) = self.surrogate.predict_with_uncertainty(&space.normalize(p));
                self.config.acquisition.score(mean, variance, best)
            })
            .collect();
        match argmax(&acquisition) {
            Some(i) => vec![pool[i].clone()],
            // every feasible position has been seen
            None => vec![space.random_feasible_position(rng)],
        }
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        _rng: &mut dyn RngCore,
    ) {
        let mut added = false;
        for (position, &score) in proposed.iter().zip(scores) {
            if !self.init.is_done() {
                self.init.advance(position, score);
            }
            if !self.seen.insert(position.clone()) || !score.is_finite() {
                continue;
            }
            self.features.push(space.normalize(position));
            self.targets.push(score);
            self.best = Some(self.best.map_or(score, |b| b.max(score)));
            added = true;
        }
        if added {
            self.surrogate.fit(&self.features, &self.targets);
            debug!(strategy = self.name, n = self.targets.len(), "surrogate refit");
        }
    }
}
