//! Population-based strategies.
//!
//! Each generation is proposed as one batch and must be scored completely
//! before [`update`](crate::strategy::OptimizerStrategy::update):
//!
//! - [`ParticleSwarm`]: velocity-driven particles
//! - [`DifferentialEvolution`]: rand/1/bin mutation with greedy selection
//! - [`EvolutionStrategy`]: self-adaptive Gaussian mutation
//! - [`GeneticAlgorithm`]: selection, recombination and elitist survival
//! - [`ParallelTempering`]: replica exchange between annealing chains
//!
//! Generation zero consists of the starting positions (or random feasible
//! positions); the best `population` of them seed the members. All but
//! parallel tempering report convergence once every member shares one
//! position.

mod config;
mod differential;
mod evolution;
mod genetic;
mod members;
mod selection;
mod swarm;
mod tempering;

pub use config::{
    DifferentialEvolutionConfig, EvolutionStrategyConfig, GeneticAlgorithmConfig,
    ParallelTemperingConfig, ParticleSwarmConfig,
};
pub use differential::DifferentialEvolution;
pub use evolution::EvolutionStrategy;
pub use genetic::GeneticAlgorithm;
pub use selection::Selection;
pub use swarm::ParticleSwarm;
pub use tempering::ParallelTempering;
