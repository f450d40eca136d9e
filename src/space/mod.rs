//! Discretized search space.
//!
//! Every parameter dimension is an ordered, finite list of candidate values.
//! Strategies work on [`Position`]s (one index per dimension); the objective
//! sees decoded [`Assignment`]s.
//!
//! - [`Dimension`]: one declared parameter (integer range, stepped real
//!   range, explicit real grid, or categorical set)
//! - [`SearchSpace`]: the product of dimensions plus optional constraints

mod dimension;
mod position;
mod search_space;
mod value;

pub use dimension::{Dimension, DimensionKind};
pub use position::Position;
pub use search_space::{Constraint, SearchSpace};
pub use value::{Assignment, ParamValue};
