//! Search runs.
//!
//! A [`SearchController`] binds one [`SearchSpace`](crate::space::SearchSpace),
//! one [`Objective`], one or more strategies and one shared
//! [`EvaluationMemory`](crate::memory::EvaluationMemory), and drives them
//! until a budget, convergence, early stopping or cancellation ends the run.
//!
//! Budgets:
//!
//! - `n_iter` counts proposed positions, cache hits and infeasible
//!   proposals included
//! - `max_evaluations` counts objective calls only
//! - a batch is started only if it fits both; a started batch always
//!   completes before the strategy is updated

mod config;
mod controller;
mod objective;
mod result;

pub use config::{Composition, Direction, EarlyStopping, Initialize, SearchConfig};
pub use controller::{SearchController, SearchRunner, SearchState};
pub use objective::{Fallible, Objective, ObjectiveError};
pub use result::{SearchResult, StopReason};
