use std::error::Error;

use crate::space::Assignment;

/// Error type returned by fallible objectives.
pub type ObjectiveError = Box<dyn Error + Send + Sync>;

/// The external scoring function.
///
/// Must return the same score for the same assignment; the run caches
/// scores on that assumption. `Sync` so batches can be scored in parallel.
pub trait Objective: Sync {
    fn evaluate(&self, assignment: &Assignment) -> Result<f64, ObjectiveError>;
}

impl<F> Objective for F
where
    F: Fn(&Assignment) -> f64 + Sync,
{
    fn evaluate(&self, assignment: &Assignment) -> Result<f64, ObjectiveError> {
        Ok(self(assignment))
    }
}

/// Adapts a closure returning `Result` into an [`Objective`].
///
/// # Examples
///
/// ```
/// use u_blackbox::search::{Fallible, Objective, ObjectiveError};
/// use u_blackbox::space::Assignment;
///
/// let objective = Fallible(|a: &Assignment| -> Result<f64, ObjectiveError> {
///     let x = a.int("x").ok_or("missing x")?;
///     Ok(x as f64)
/// });
/// assert!(objective.evaluate(&Assignment::new()).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<F> Objective for Fallible<F>
where
    F: Fn(&Assignment) -> Result<f64, ObjectiveError> + Sync,
{
    fn evaluate(&self, assignment: &Assignment) -> Result<f64, ObjectiveError> {
        (self.0)(assignment)
    }
}
