use std::collections::HashSet;

use rand::RngCore;

use super::candidates::{candidate_pool, initial_design};
use super::config::TpeConfig;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{argmax, InitQueue, OptimizerStrategy};

/// Log of a Gaussian kernel density at `x`, up to a constant shared by
/// densities with the same bandwidth and dimension.
fn log_density(x: &[f64], points: &[&[f64]], bandwidth: f64) -> f64 {
    let inv = 1.0 / (2.0 * bandwidth * bandwidth);
    let logs: Vec<f64> = points
        .iter()
        .map(|p| {
            let d2: f64 = x.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum();
            -d2 * inv
        })
        .collect();
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = logs.iter().map(|l| (l - max).exp()).sum();
    max + sum.ln() - (points.len() as f64).ln()
}

/// Tree-structured Parzen estimators.
///
/// Splits the scored positions into the best `gamma` fraction and the
/// rest, fits a kernel density to each, and proposes the unvisited
/// candidate maximizing the density ratio `l(x) / g(x)`.
#[derive(Debug, Clone)]
pub struct TreeParzenEstimators {
    config: TpeConfig,
    init: InitQueue,
    observations: Vec<(Vec<f64>, f64)>,
    seen: HashSet<Position>,
}

impl Default for TreeParzenEstimators {
    fn default() -> Self {
        Self::new(TpeConfig::default())
    }
}

impl TreeParzenEstimators {
    pub fn new(config: TpeConfig) -> Self {
        Self {
            config,
            init: InitQueue::default(),
            observations: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn config(&self) -> &TpeConfig {
        &self.config
    }

    /// Good and bad feature sets, best first. `None` until both are
    /// non-empty.
    fn split(&self) -> Option<(Vec<&[f64]>, Vec<&[f64]>)> {
        let n = self.observations.len();
        if n < 2 {
            return None;
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| self.observations[b].1.total_cmp(&self.observations[a].1));
        let n_good = ((self.config.gamma * n as f64).ceil() as usize).clamp(1, n - 1);
        let features: Vec<&[f64]> = order.iter().map(|&i| self.observations[i].0.as_slice()).collect();
        let (good, bad) = features.split_at(n_good);
        Some((good.to_vec(), bad.to_vec()))
    }
}

impl OptimizerStrategy for TreeParzenEstimators {
    fn name(&self) -> &'static str {
        "tree_parzen_estimators"
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
        self.observations.clear();
        self.seen.clear();
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
        let Some((good, bad)) = self.split() else {
            return vec![space.random_feasible_position(rng)];
        };
        let pool = candidate_pool(space, memory, &self.seen, self.config.max_sample_size, rng);
        let bw = self.config.bandwidth;
        let ratio: Vec<f64> = pool
            .iter()
            .map(|p| {
                let x = space.normalize(p);
                log_density(&x, &good, bw) - log_density(&x, &bad, bw)
            })
            .collect();
        match argmax(&ratio) {
            Some(i) => vec![pool[i].clone()],
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
        for (position, &score) in proposed.iter().zip(scores) {
            if !self.init.is_done() {
                self.init.advance(position, score);
            }
            if self.seen.insert(position.clone()) && score.is_finite() {
                self.observations.push((space.normalize(position), score));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;

    #[test]
    fn test_log_density_prefers_nearby() {
        let pts: Vec<&[f64]> = vec![&[0.0, 0.0][..], &[0.1, 0.0][..]];
        assert!(log_density(&[0.05, 0.0], &pts, 0.1) > log_density(&[0.9, 0.9], &pts, 0.1));
    }

    #[test]
    fn test_far_from_kernels_stays_finite() {
        let pts: Vec<&[f64]> = vec![&[0.0][..]];
        assert!(log_density(&[1.0], &pts, 1e-3).is_finite());
    }

    #[test]
    fn test_tpe_improves_on_design() {
        let space = SearchSpace::new(vec![
            Dimension::integer("x", 0, 29),
            Dimension::integer("y", 0, 29),
        ])
        .unwrap();
        let objective = |p: &Position| -((p[0] as f64 - 20.0).powi(2) + (p[1] as f64 - 9.0).powi(2));
        let mut tpe = TreeParzenEstimators::default();
        let mut rng = create_rng(5);
        tpe.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut tpe, &space, 60, 5, objective);
        let curve = memory.best_so_far();
        let design_best = curve[8];
        let final_best = *curve.last().unwrap();
        assert!(final_best >= design_best);
        assert!(final_best >= -20.0, "best {final_best}");
    }

    #[test]
    fn test_tpe_degenerate() {
        let space = SearchSpace::new(vec![Dimension::real_grid("r", vec![0.5])]).unwrap();
        let mut tpe = TreeParzenEstimators::default();
        let mut rng = create_rng(0);
        tpe.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut tpe, &space, 4, 0, |_| 0.0);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_invalid_gamma() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 0, 3)]).unwrap();
        let mut tpe = TreeParzenEstimators::new(TpeConfig::default().with_gamma(0.0));
        let mut rng = create_rng(0);
        assert!(tpe.initialize(&space, &mut rng, &[]).is_err());
    }
}
