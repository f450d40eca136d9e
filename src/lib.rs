//! Gradient-free black-box optimization over discretized search spaces.
//!
//! Given an objective over a product of finite parameter grids, the crate
//! searches for the assignment with the best score using interchangeable
//! strategies behind one protocol:
//!
//! - **Local**: hill climbing (plain, stochastic, repulsing), simulated
//!   annealing, pattern search, Powell's method and random restarts.
//! - **Global**: random search and grid search.
//! - **Population**: particle swarm, differential evolution, evolution
//!   strategies, a genetic algorithm and parallel tempering.
//! - **Model-based**: Bayesian optimization, forest and ensemble
//!   surrogates, and tree-structured Parzen estimators.
//!
//! # Architecture
//!
//! [`space::SearchSpace`] maps integer positions to parameter values.
//! [`memory::EvaluationMemory`] caches every score so no position is sent to
//! the objective twice. Strategies implement
//! [`strategy::OptimizerStrategy`] and never see the objective; the
//! [`search::SearchController`] proposes, evaluates, records and updates
//! until a stopping rule fires.
//!
//! # Example
//!
//! ```
//! use u_blackbox::global::GridSearch;
//! use u_blackbox::search::{SearchConfig, SearchRunner};
//! use u_blackbox::space::{Assignment, Dimension, SearchSpace};
//!
//! let space = SearchSpace::new(vec![
//!     Dimension::integer("x", 0, 4),
//!     Dimension::integer("y", 0, 4),
//! ])
//! .unwrap();
//! let objective = |a: &Assignment| (a.int("x").unwrap_or(0) + a.int("y").unwrap_or(0)) as f64;
//!
//! let result = SearchRunner::run(&space, objective, GridSearch::default(), &SearchConfig::default())
//!     .unwrap();
//! assert_eq!(result.best_score, Some(8.0));
//! assert_eq!(result.evaluations, 25);
//! ```

pub mod error;
pub mod global;
pub mod local;
pub mod memory;
pub mod population;
pub mod random;
pub mod search;
pub mod smbo;
pub mod space;
pub mod strategy;

pub use error::{Result, SearchError};
