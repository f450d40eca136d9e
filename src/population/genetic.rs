use rand::{Rng, RngCore};
use tracing::debug;

use super::config::GeneticAlgorithmConfig;
use super::members::{
    collapsed, discrete_recombination, fittest, seed_generation, sort_best_first, Member,
};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Step width used to walk an infeasible child back into the feasible set.
const REPAIR_EPSILON: f64 = 0.3;
const REPAIR_ATTEMPTS: usize = 10;

/// Genetic algorithm over grid positions.
///
/// Each child is produced either by mutation (a random climb from one
/// selected parent) or by crossover (discrete recombination of `n_parents`
/// parents drawn from the fitter half), in proportion to `mutation_rate`
/// and `crossover_rate`. Survivors are the best `population` members of
/// parents plus offspring, or of offspring alone with `replace_parents`.
///
/// # References
///
/// - Holland (1975), "Adaptation in Natural and Artificial Systems"
/// - Goldberg (1989), "Genetic Algorithms in Search, Optimization, and
///   Machine Learning"
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    config: GeneticAlgorithmConfig,
    population: Vec<Member>,
    pending: Vec<Position>,
    generation: usize,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self::new(GeneticAlgorithmConfig::default())
    }
}

impl GeneticAlgorithm {
    pub fn new(config: GeneticAlgorithmConfig) -> Self {
        Self {
            config,
            population: Vec::new(),
            pending: Vec::new(),
            generation: 0,
        }
    }

    /// Current members, best first.
    pub fn population(&self) -> impl Iterator<Item = (&Position, f64)> {
        self.population.iter().map(|m| (&m.position, m.score))
    }

    fn child(&self, space: &SearchSpace, scores: &[f64], rng: &mut dyn RngCore) -> Position {
        let c = &self.config;
        let total = c.mutation_rate + c.crossover_rate;
        let mut child = if rng.random_range(0.0..total) < c.mutation_rate {
            let parent = &self.population[c.selection.select(scores, rng)].position;
            space.climb(parent, c.epsilon, c.perturbation, rng)
        } else {
            // population is sorted, so the fitter half is a prefix
            let half = (self.population.len() / 2).max(c.n_parents);
            let half_scores = &scores[..half];
            let parents: Vec<&Position> = (0..c.n_parents)
                .map(|_| &self.population[c.selection.select(half_scores, rng)].position)
                .collect();
            discrete_recombination(&parents, rng)
        };
        for _ in 0..REPAIR_ATTEMPTS {
            if space.is_feasible(&child) {
                break;
            }
            child = space.climb(&child, REPAIR_EPSILON, c.perturbation, rng);
        }
        child
    }
}

impl OptimizerStrategy for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "genetic_algorithm"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.population.clear();
        self.generation = 0;
        self.pending = seed_generation(space, rng, initial, self.config.population);
        Ok(())
    }

    fn propose(
        &self,
        _space: &SearchSpace,
        _memory: &EvaluationMemory,
        _rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        self.pending.clone()
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        if self.population.is_empty() || self.config.replace_parents {
            self.population = fittest(proposed, scores, self.config.population);
        } else {
            self.population
                .extend(proposed.iter().zip(scores).map(|(p, &score)| Member {
                    position: p.clone(),
                    score,
                }));
            sort_best_first(&mut self.population);
            self.population.truncate(self.config.population);
        }
        self.generation += 1;
        debug!(
            generation = self.generation,
            best = self.population.first().map_or(f64::NEG_INFINITY, |m| m.score),
            "genetic generation"
        );

        let member_scores: Vec<f64> = self.population.iter().map(|m| m.score).collect();
        self.pending = (0..self.config.offspring)
            .map(|_| self.child(space, &member_scores, rng))
            .collect();
    }

    fn is_converged(&self) -> bool {
        collapsed(self.population.iter().map(|m| &m.position))
    }
}
