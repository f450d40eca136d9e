use rand::RngCore;
use tracing::{debug, warn};

use super::config::RandomRestartConfig;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Restarts an inner strategy from a fresh random position whenever it
/// stagnates.
///
/// A sub-run stagnates after `n_iter_restart` iterations without improving
/// its own best score, or when the inner strategy reports convergence. The
/// global best is kept by the shared memory, so restarts never lose it.
///
/// # Examples
///
/// ```
/// use u_blackbox::local::{HillClimbing, RandomRestart, RandomRestartConfig};
///
/// let strategy = RandomRestart::new(
///     HillClimbing::default(),
///     RandomRestartConfig::default().with_n_iter_restart(15),
/// );
/// ```
pub struct RandomRestart {
    config: RandomRestartConfig,
    inner: Box<dyn OptimizerStrategy>,
    sub_best: f64,
    stale: usize,
    restarts: usize,
}

impl RandomRestart {
    pub fn new<S>(inner: S, config: RandomRestartConfig) -> Self
    where
        S: OptimizerStrategy + 'static,
    {
        Self {
            config,
            inner: Box::new(inner),
            sub_best: f64::NEG_INFINITY,
            stale: 0,
            restarts: 0,
        }
    }

    /// Number of restarts performed so far.
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    fn may_restart(&self) -> bool {
        self.config.max_restarts.is_none_or(|m| self.restarts < m)
    }

    fn restart(&mut self, space: &SearchSpace, rng: &mut dyn RngCore) {
        let start = space.random_feasible_position(rng);
        if let Err(e) = self.inner.initialize(space, rng, &[start]) {
            warn!(error = %e, "inner strategy refused restart");
            return;
        }
        self.restarts += 1;
        self.sub_best = f64::NEG_INFINITY;
        self.stale = 0;
        debug!(restarts = self.restarts, "random restart");
    }
}

impl std::fmt::Debug for RandomRestart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomRestart")
            .field("config", &self.config)
            .field("inner", &self.inner.name())
            .field("restarts", &self.restarts)
            .finish()
    }
}

impl OptimizerStrategy for RandomRestart {
    fn name(&self) -> &'static str {
        "random_restart"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.inner.initialize(space, rng, initial)?;
        self.sub_best = f64::NEG_INFINITY;
        self.stale = 0;
        self.restarts = 0;
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        self.inner.propose(space, memory, rng)
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        self.inner.update(space, proposed, scores, rng);

        let round_best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if round_best > self.sub_best {
            self.sub_best = round_best;
            self.stale = 0;
        } else {
            self.stale += proposed.len();
        }

        if (self.stale >= self.config.n_iter_restart || self.inner.is_converged())
            && self.may_restart()
        {
            self.restart(space, rng);
        }
    }

    fn is_converged(&self) -> bool {
        !self.may_restart() && self.inner.is_converged()
    }
}
