//! Global search strategies.
//!
//! - [`RandomSearch`]: independent uniform draws
//! - [`GridSearch`]: deterministic traversal of the whole space

mod grid;
mod random;

pub use grid::{GridSearch, GridSearchConfig};
pub use random::RandomSearch;
