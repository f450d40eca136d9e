use rand::{Rng, RngCore};
use tracing::debug;

use super::config::EvolutionStrategyConfig;
use super::members::{collapsed, discrete_recombination, seed_generation, Member};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::random::standard_normal;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Smallest mutation scale (fraction of a dimension) an individual may
/// adapt down to.
const MIN_SIGMA: f64 = 1e-3;

#[derive(Debug, Clone)]
struct Individual {
    member: Member,
    sigma: f64,
}

/// Evolution strategy with self-adaptive mutation scale.
///
/// Every individual carries its own `sigma`. Offspring inherit a log-normal
/// perturbation of the parent's `sigma` and are mutated with Gaussian noise
/// of that scale. Survivors are chosen by truncation from parents and
/// offspring (`mu + lambda`) or from offspring alone (`mu, lambda`).
///
/// # References
///
/// - Beyer & Schwefel (2002), "Evolution strategies: A comprehensive
///   introduction"
#[derive(Debug, Clone)]
pub struct EvolutionStrategy {
    config: EvolutionStrategyConfig,
    parents: Vec<Individual>,
    pending: Vec<(Position, f64)>,
    generation: usize,
}

impl Default for EvolutionStrategy {
    fn default() -> Self {
        Self::new(EvolutionStrategyConfig::default())
    }
}

impl EvolutionStrategy {
    pub fn new(config: EvolutionStrategyConfig) -> Self {
        Self {
            config,
            parents: Vec::new(),
            pending: Vec::new(),
            generation: 0,
        }
    }

    /// Current mutation scales of the parents.
    pub fn sigmas(&self) -> Vec<f64> {
        self.parents.iter().map(|i| i.sigma).collect()
    }

    fn breed(&self, space: &SearchSpace, rng: &mut dyn RngCore) -> Vec<(Position, f64)> {
        let n = self.parents.len();
        let tau = 1.0 / (space.dimension_count() as f64).sqrt();
        (0..self.config.offspring)
            .map(|_| {
                let first = &self.parents[rng.random_range(0..n)];
                let (base, parent_sigma) =
                    if n > 1 && rng.random::<f64>() < self.config.crossover_rate {
                        let second = &self.parents[rng.random_range(0..n)];
                        let child = discrete_recombination(
                            &[&first.member.position, &second.member.position],
                            rng,
                        );
                        (child, 0.5 * (first.sigma + second.sigma))
                    } else {
                        (first.member.position.clone(), first.sigma)
                    };
                let sigma =
                    (parent_sigma * (tau * standard_normal(rng)).exp()).clamp(MIN_SIGMA, 1.0);
                let mut coords = space.to_continuous(&base);
                for (c, &k) in coords.iter_mut().zip(space.sizes()) {
                    *c += sigma * (k - 1) as f64 * standard_normal(rng);
                }
                space.clamp_continuous(&mut coords);
                (space.from_continuous(&coords), sigma)
            })
            .collect()
    }
}

impl OptimizerStrategy for EvolutionStrategy {
    fn name(&self) -> &'static str {
        "evolution_strategy"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.parents.clear();
        self.generation = 0;
        let sigma = self.config.initial_sigma;
        self.pending = seed_generation(space, rng, initial, self.config.population)
            .into_iter()
            .map(|p| (p, sigma))
            .collect();
        Ok(())
    }

    fn propose(
        &self,
        _space: &SearchSpace,
        _memory: &EvaluationMemory,
        _rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        self.pending.iter().map(|(p, _)| p.clone()).collect()
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        let offspring: Vec<Individual> = proposed
            .iter()
            .zip(scores)
            .zip(&self.pending)
            .map(|((p, &score), &(_, sigma))| Individual {
                member: Member {
                    position: p.clone(),
                    score,
                },
                sigma,
            })
            .collect();

        let mut pool = if self.parents.is_empty() || self.config.replace_parents {
            offspring
        } else {
            let mut pool = std::mem::take(&mut self.parents);
            pool.extend(offspring);
            pool
        };
        pool.sort_by(|a, b| {
            b.member
                .score
                .partial_cmp(&a.member.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pool.truncate(self.config.population);
        self.parents = pool;

        self.generation += 1;
        debug!(
            generation = self.generation,
            best = self.parents.first().map_or(f64::NEG_INFINITY, |i| i.member.score),
            "evolution step"
        );
        self.pending = self.breed(space, rng);
    }

    fn is_converged(&self) -> bool {
        collapsed(self.parents.iter().map(|i| &i.member.position))
            && self.parents.iter().all(|i| i.sigma <= MIN_SIGMA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;

    fn space() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("a", 0, 30),
            Dimension::integer("b", 0, 30),
            Dimension::integer("c", 0, 30),
        ])
        .unwrap()
    }

    fn objective(p: &Position) -> f64 {
        -p.iter().map(|&i| (i as f64 - 20.0).abs()).sum::<f64>()
    }

    #[test]
    fn test_generation_sizes() {
        let space = space();
        let mut es = EvolutionStrategy::new(
            EvolutionStrategyConfig::default()
                .with_population(4)
                .with_offspring(7),
        );
        let mut rng = create_rng(0);
        es.initialize(&space, &mut rng, &[]).unwrap();
        let memory = EvaluationMemory::new();
        let first = es.propose(&space, &memory, &mut rng);
        assert_eq!(first.len(), 4);
        let scores: Vec<f64> = first.iter().map(objective).collect();
        es.update(&space, &first, &scores, &mut rng);
        assert_eq!(es.propose(&space, &memory, &mut rng).len(), 7);
        assert_eq!(es.sigmas().len(), 4);
    }

    #[test]
    fn test_plus_selection_keeps_elite() {
        let space = space();
        let mut es = EvolutionStrategy::default();
        let mut rng = create_rng(5);
        es.initialize(&space, &mut rng, &[]).unwrap();
        let memory = EvaluationMemory::new();
        let mut best = f64::NEG_INFINITY;
        for _ in 0..10 {
            let proposed = es.propose(&space, &memory, &mut rng);
            let scores: Vec<f64> = proposed.iter().map(objective).collect();
            es.update(&space, &proposed, &scores, &mut rng);
            let elite = es.parents[0].member.score;
            assert!(elite >= best);
            best = elite;
        }
    }

    #[test]
    fn test_comma_selection_improves() {
        let space = space();
        let mut es = EvolutionStrategy::new(
            EvolutionStrategyConfig::default().with_replace_parents(true),
        );
        let mut rng = create_rng(8);
        es.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut es, &space, 25, 8, objective);
        let first = memory.history()[..10]
            .iter()
            .map(|r| r.score())
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(memory.best().map(|(_, s)| s).unwrap() > first);
    }
}
