use crate::space::Position;

/// One scored position. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationRecord {
    position: Position,
    score: f64,
    sequence: usize,
    strategy: Option<String>,
    warm_start: bool,
}

impl EvaluationRecord {
    pub(crate) fn new(
        position: Position,
        score: f64,
        sequence: usize,
        strategy: Option<String>,
        warm_start: bool,
    ) -> Self {
        Self {
            position,
            score,
            sequence,
            strategy,
            warm_start,
        }
    }

    /// Copy with a transformed score (used to report minimization runs in
    /// the objective's own sign).
    pub(crate) fn map_score(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            score: f(self.score),
            ..self.clone()
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Order in which the record entered the log, starting at 0.
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Name of the strategy that proposed the position.
    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    /// `true` if the score came from warm-start data rather than an
    /// objective call in this run.
    pub fn is_warm_start(&self) -> bool {
        self.warm_start
    }
}
