//! Local search strategies.
//!
//! Trajectory methods that keep one current position and explore its
//! neighbourhood:
//!
//! - [`HillClimbing`]: greedy moves to the best of a few sampled neighbours
//! - [`StochasticHillClimbing`]: occasionally accepts worse neighbours
//! - [`RepulsingHillClimbing`]: widens the step after failing to improve
//! - [`SimulatedAnnealing`]: temperature-controlled acceptance
//! - [`PatternSearch`]: compass pattern that shrinks on failure
//! - [`PowellsMethod`]: coordinate line searches with extrapolation
//! - [`RandomRestart`]: restarts any inner strategy on stagnation
//!
//! Every proposal steers clear of positions already in memory when an
//! unvisited neighbour exists.

mod annealing;
mod climber;
mod config;
mod hill_climbing;
mod pattern;
mod powell;
mod restart;

pub use annealing::{acceptance_probability, SimulatedAnnealing};
pub use config::{
    CoolingSchedule, HillClimbingConfig, PatternSearchConfig, PowellsMethodConfig,
    RandomRestartConfig, RepulsingHillClimbingConfig, SimulatedAnnealingConfig,
    StochasticHillClimbingConfig,
};
pub use hill_climbing::{HillClimbing, RepulsingHillClimbing, StochasticHillClimbing};
pub use pattern::PatternSearch;
pub use powell::PowellsMethod;
pub use restart::RandomRestart;
