//! Sequential model-based optimization.
//!
//! A regression [`Surrogate`] is trained on every finite score observed so
//! far; the next proposal maximizes an [`Acquisition`] criterion over a
//! candidate pool (the whole space when small, a random sample otherwise).
//!
//! - [`BayesianOptimizer`]: Gaussian-process surrogate
//! - [`ForestOptimizer`]: random-forest or extra-trees surrogate
//! - [`EnsembleOptimizer`]: average of several surrogates
//! - [`TreeParzenEstimators`]: density ratio of good vs. bad observations
//!
//! Without explicit starting positions each strategy first scores a small
//! design of lattice points, corners and random points.

mod acquisition;
mod candidates;
mod config;
mod ensemble;
mod forest;
mod gp;
mod optimizer;
mod surrogate;
mod tpe;

pub use acquisition::Acquisition;
pub use config::{SmboConfig, TpeConfig};
pub use ensemble::EnsembleRegressor;
pub use forest::{ForestConfig, RandomForest, TreeKind};
pub use gp::GaussianProcess;
pub use optimizer::{BayesianOptimizer, EnsembleOptimizer, ForestOptimizer, SurrogateOptimizer};
pub use surrogate::Surrogate;
pub use tpe::TreeParzenEstimators;
