//! Evaluation memory: the shared cache of scored positions.
//!
//! One [`EvaluationMemory`] lives for the duration of a run. The controller
//! is its only writer; strategies read it to avoid proposing positions that
//! were already scored. Scores stored here are always in maximization form.

mod record;

pub use record::EvaluationRecord;

use std::collections::HashMap;

use crate::space::Position;

/// Map from canonical position to score, plus the ordered evaluation log.
///
/// # Examples
///
/// ```
/// use u_blackbox::memory::EvaluationMemory;
/// use u_blackbox::space::Position;
///
/// let mut memory = EvaluationMemory::new();
/// memory.record(Position::new(vec![1]), 2.0, Some("hill_climbing"));
/// memory.record(Position::new(vec![3]), 5.0, None);
///
/// // Recording a known position keeps the stored score.
/// assert_eq!(memory.record(Position::new(vec![1]), 9.0, None), 2.0);
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.best().map(|(_, s)| s), Some(5.0));
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationMemory {
    records: Vec<EvaluationRecord>,
    index: HashMap<Position, usize>,
    warm_start: HashMap<Position, f64>,
    best: Option<usize>,
    caching: bool,
}

impl Default for EvaluationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationMemory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            warm_start: HashMap::new(),
            best: None,
            caching: true,
        }
    }

    /// Enables or disables lookups. Without caching every `record` appends
    /// a new entry and [`get`](Self::get) always misses.
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    /// Preloads scores from an earlier run. They answer lookups but only
    /// enter the log once proposed again.
    pub fn with_warm_start(mut self, entries: impl IntoIterator<Item = (Position, f64)>) -> Self {
        self.warm_start.extend(entries);
        self
    }

    pub fn caching(&self) -> bool {
        self.caching
    }

    /// Stores a score. If the position is already known (and caching is on)
    /// nothing changes and the stored score is returned.
    pub fn record(&mut self, position: Position, score: f64, strategy: Option<&str>) -> f64 {
        self.push(position, score, strategy, false)
    }

    /// Moves a warm-start entry into the log. Returns its score, or `None`
    /// if `position` has no warm-start entry.
    pub fn promote_warm_start(&mut self, position: &Position, strategy: Option<&str>) -> Option<f64> {
        if self.caching {
            if let Some(&i) = self.index.get(position) {
                return Some(self.records[i].score());
            }
        }
        let score = *self.warm_start.get(position)?;
        Some(self.push(position.clone(), score, strategy, true))
    }

    fn push(&mut self, position: Position, score: f64, strategy: Option<&str>, warm: bool) -> f64 {
        if self.caching {
            if let Some(&i) = self.index.get(&position) {
                return self.records[i].score();
            }
        }
        let sequence = self.records.len();
        let improves = match self.best {
            Some(b) => score > self.records[b].score(),
            None => true,
        };
        if improves {
            self.best = Some(sequence);
        }
        self.index.entry(position.clone()).or_insert(sequence);
        self.records.push(EvaluationRecord::new(
            position,
            score,
            sequence,
            strategy.map(str::to_string),
            warm,
        ));
        score
    }

    /// Cached score for `position` (log first, then warm-start entries).
    pub fn get(&self, position: &Position) -> Option<f64> {
        if !self.caching {
            return None;
        }
        self.index
            .get(position)
            .map(|&i| self.records[i].score())
            .or_else(|| self.warm_start.get(position).copied())
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.get(position).is_some()
    }

    /// Whether `position` is answered by warm-start data but not yet logged.
    pub fn is_warm_only(&self, position: &Position) -> bool {
        self.caching && !self.index.contains_key(position) && self.warm_start.contains_key(position)
    }

    /// Best logged position and score; ties go to the earliest record.
    pub fn best(&self) -> Option<(&Position, f64)> {
        self.best_record().map(|r| (r.position(), r.score()))
    }

    pub fn best_record(&self) -> Option<&EvaluationRecord> {
        self.best.map(|i| &self.records[i])
    }

    /// The log, ordered by sequence number.
    pub fn history(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Best score seen after each record; non-decreasing.
    pub fn best_so_far(&self) -> Vec<f64> {
        let mut best = f64::NEG_INFINITY;
        self.records
            .iter()
            .map(|r| {
                best = best.max(r.score());
                best
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the memory, returning its log.
    pub fn into_history(self) -> Vec<EvaluationRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: usize) -> Position {
        Position::new(vec![i])
    }

    #[test]
    fn test_record_and_get() {
        let mut m = EvaluationMemory::new();
        assert!(m.is_empty());
        assert_eq!(m.record(p(0), 1.5, Some("random_search")), 1.5);
        assert_eq!(m.get(&p(0)), Some(1.5));
        assert_eq!(m.get(&p(1)), None);
        assert_eq!(m.history()[0].strategy(), Some("random_search"));
    }

    #[test]
    fn test_duplicate_keeps_first_score() {
        let mut m = EvaluationMemory::new();
        m.record(p(4), -3.0, None);
        assert_eq!(m.record(p(4), 100.0, None), -3.0);
        assert_eq!(m.len(), 1);
        assert_eq!(m.best(), Some((&p(4), -3.0)));
    }

    #[test]
    fn test_best_tie_goes_to_earliest() {
        let mut m = EvaluationMemory::new();
        m.record(p(0), 1.0, None);
        m.record(p(1), 7.0, None);
        m.record(p(2), 7.0, None);
        m.record(p(3), 2.0, None);
        let best = m.best_record().unwrap();
        assert_eq!(best.position(), &p(1));
        assert_eq!(best.sequence(), 1);
    }

    #[test]
    fn test_sequence_numbers_are_ordered() {
        let mut m = EvaluationMemory::new();
        for i in 0..5 {
            m.record(p(i), i as f64, None);
        }
        for (i, r) in m.history().iter().enumerate() {
            assert_eq!(r.sequence(), i);
        }
    }

    #[test]
    fn test_best_so_far_non_decreasing() {
        let mut m = EvaluationMemory::new();
        for (i, s) in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0].iter().enumerate() {
            m.record(p(i), *s, None);
        }
        assert_eq!(m.best_so_far(), vec![3.0, 3.0, 4.0, 4.0, 5.0, 9.0, 9.0]);
    }

    #[test]
    fn test_caching_disabled_appends_duplicates() {
        let mut m = EvaluationMemory::new().with_caching(false);
        m.record(p(0), 1.0, None);
        m.record(p(0), 2.0, None);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&p(0)), None);
        assert_eq!(m.best().map(|(_, s)| s), Some(2.0));
    }

    #[test]
    fn test_warm_start_lookup_and_promotion() {
        let mut m = EvaluationMemory::new().with_warm_start([(p(2), 8.0)]);
        assert_eq!(m.get(&p(2)), Some(8.0));
        assert!(m.is_warm_only(&p(2)));
        assert!(m.is_empty());

        assert_eq!(m.promote_warm_start(&p(2), Some("grid_search")), Some(8.0));
        assert!(!m.is_warm_only(&p(2)));
        assert_eq!(m.len(), 1);
        assert!(m.history()[0].is_warm_start());

        // Promoting again does not duplicate.
        assert_eq!(m.promote_warm_start(&p(2), None), Some(8.0));
        assert_eq!(m.len(), 1);
        assert_eq!(m.promote_warm_start(&p(3), None), None);
    }

    #[test]
    fn test_negative_infinity_never_best_over_finite() {
        let mut m = EvaluationMemory::new();
        m.record(p(0), f64::NEG_INFINITY, None);
        m.record(p(1), -1e300, None);
        assert_eq!(m.best().map(|(pos, _)| pos.clone()), Some(p(1)));
    }
}
