use std::fmt;
use std::time::Duration;

use crate::memory::EvaluationRecord;
use crate::space::{Assignment, Position};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// `n_iter` proposals were made, or the next batch would exceed it.
    IterationBudget,
    /// `max_evaluations` objective calls were made, or the next batch
    /// would exceed it.
    EvaluationBudget,
    TimeLimit,
    /// Every strategy reported convergence.
    Converged,
    /// No sufficient improvement within the early-stopping window.
    EarlyStopped,
    /// The cancellation flag was raised.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::IterationBudget => "iteration budget exhausted",
            StopReason::EvaluationBudget => "evaluation budget exhausted",
            StopReason::TimeLimit => "time limit reached",
            StopReason::Converged => "converged",
            StopReason::EarlyStopped => "early stopped",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Outcome of a search run. Scores are in the objective's own sign.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best position found, `None` if nothing was evaluated.
    pub best_position: Option<Position>,

    pub best_assignment: Option<Assignment>,

    pub best_score: Option<f64>,

    /// Every logged evaluation in sequence order.
    pub history: Vec<EvaluationRecord>,

    /// Proposed positions, cache hits and infeasible proposals included.
    pub iterations: usize,

    /// Objective calls made.
    pub evaluations: usize,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

impl SearchResult {
    /// Logged scores in sequence order.
    pub fn score_history(&self) -> Vec<f64> {
        self.history.iter().map(EvaluationRecord::score).collect()
    }

    pub fn cancelled(&self) -> bool {
        self.stop_reason == StopReason::Cancelled
    }
}
