//! Parent selection for the genetic algorithm.
//!
//! Selection determines which members are chosen as parents. Different
//! schemes provide different selection pressure.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use rand::Rng;

/// Selection scheme for choosing parents.
///
/// All schemes **maximize** (higher score = better). Non-finite scores
/// (infeasible members) get the lowest possible weight.
///
/// # Examples
///
/// ```
/// use u_blackbox::population::Selection;
/// use u_blackbox::random::create_rng;
///
/// let mut rng = create_rng(42);
/// let scores = [1.0, 9.0, 4.0];
/// let parent = Selection::Tournament(3).select(&scores, &mut rng);
/// assert!(parent < scores.len());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Tournament selection: pick `k` members at random, select the best.
    ///
    /// Higher `k` = stronger selection pressure.
    /// - k=2: light pressure (good for diversity)
    /// - k=3-5: moderate pressure (typical default)
    /// - k>5: strong pressure (risk of premature convergence)
    Tournament(usize),

    /// Score-proportionate (roulette wheel) selection on scores shifted
    /// so the worst member has near-zero weight.
    ///
    /// **Warning**: Susceptible to super-individual dominance when
    /// score variance is high.
    Roulette,

    /// Linear rank selection: weight `n - rank`, best rank 0.
    ///
    /// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
    /// Algorithms"
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index from `scores`.
    ///
    /// # Panics
    /// Panics if `scores` is empty.
    pub fn select<R: Rng + ?Sized>(&self, scores: &[f64], rng: &mut R) -> usize {
        assert!(!scores.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => tournament(scores, *k, rng),
            Selection::Roulette => roulette(scores, rng),
            Selection::Rank => rank(scores, rng),
        }
    }
}

fn tournament<R: Rng + ?Sized>(scores: &[f64], k: usize, rng: &mut R) -> usize {
    let n = scores.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if scores[idx] > scores[best] {
            best = idx;
        }
    }
    best
}

fn roulette<R: Rng + ?Sized>(scores: &[f64], rng: &mut R) -> usize {
    let n = scores.len();
    if n == 1 {
        return 0;
    }

    let floor = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !floor.is_finite() {
        return rng.random_range(0..n);
    }

    let epsilon = 1e-10;
    let weights: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_finite() { s - floor + epsilon } else { epsilon })
        .collect();

    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

fn rank<R: Rng + ?Sized>(scores: &[f64], rng: &mut R) -> usize {
    let n = scores.len();
    if n == 1 {
        return 0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (rank, &idx) in order.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return idx;
        }
    }

    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn counts(selection: Selection, scores: &[f64], n: usize) -> Vec<u32> {
        let mut rng = create_rng(42);
        let mut counts = vec![0u32; scores.len()];
        for _ in 0..n {
            counts[selection.select(scores, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let counts = counts(Selection::Tournament(4), &[1.0, 5.0, 10.0, 8.0], 10_000);
        assert!(
            counts[2] > 6000,
            "expected best to be selected >60% of the time, got {counts:?}"
        );
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let counts = counts(Selection::Tournament(1), &[1.0, 5.0, 10.0, 8.0], 10_000);
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_roulette_favors_best() {
        let counts = counts(Selection::Roulette, &[1.0, 50.0, 100.0, 20.0], 10_000);
        assert!(counts[2] > counts[0], "{counts:?}");
    }

    #[test]
    fn test_rank_favors_best() {
        let counts = counts(Selection::Rank, &[1.0, 50.0, 100.0, 20.0], 10_000);
        assert!(counts[2] > counts[0], "{counts:?}");
    }

    #[test]
    fn test_infeasible_rarely_chosen() {
        let scores = [f64::NEG_INFINITY, 1.0, 2.0];
        for selection in [Selection::Roulette, Selection::Rank, Selection::Tournament(2)] {
            let c = counts(selection, &scores, 5000);
            assert!(c[0] < c[2], "{selection:?}: {c:?}");
        }
        let c = counts(Selection::Roulette, &[f64::NEG_INFINITY; 3], 3000);
        assert!(c.iter().all(|&x| x > 500), "{c:?}");
    }

    #[test]
    fn test_single_member() {
        let mut rng = create_rng(42);
        assert_eq!(Selection::Tournament(3).select(&[5.0], &mut rng), 0);
        assert_eq!(Selection::Roulette.select(&[5.0], &mut rng), 0);
        assert_eq!(Selection::Rank.select(&[5.0], &mut rng), 0);
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let mut rng = create_rng(42);
        Selection::Tournament(3).select(&[], &mut rng);
    }
}
