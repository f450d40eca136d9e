use proptest::prelude::*;

use u_blackbox::global::RandomSearch;
use u_blackbox::local::acceptance_probability;
use u_blackbox::memory::EvaluationMemory;
use u_blackbox::search::{SearchConfig, SearchRunner};
use u_blackbox::space::{Assignment, Dimension, Position, SearchSpace};

fn mixed_space() -> SearchSpace {
    SearchSpace::new(vec![
        Dimension::integer("n", -5, 12),
        Dimension::real("lr", 0.0, 1.0, 0.1),
        Dimension::real_grid("decay", vec![0.9, 0.99, 0.999]),
        Dimension::categorical("kind", vec!["linear", "rbf", "poly"]),
    ])
    .unwrap()
}

proptest! {
    #[test]
    fn decode_then_encode_is_identity(
        n in 0usize..18,
        lr in 0usize..11,
        decay in 0usize..3,
        kind in 0usize..3,
    ) {
        let space = mixed_space();
        let p = Position::new(vec![n, lr, decay, kind]);
        let assignment = space.decode(&p).unwrap();
        prop_assert_eq!(space.encode(&assignment).unwrap(), p);
    }

    #[test]
    fn wide_integer_round_trip(low in i64::MIN / 2..i64::MAX / 2, offset in 0usize..1000) {
        let space = SearchSpace::new(vec![Dimension::integer("n", low, low + 999)]).unwrap();
        let p = Position::new(vec![offset]);
        let assignment = space.decode(&p).unwrap();
        prop_assert_eq!(space.encode(&assignment).unwrap(), p);
    }

    #[test]
    fn memory_best_is_monotone(scores in prop::collection::vec(-1e6f64..1e6, 1..60)) {
        let mut memory = EvaluationMemory::new();
        for (i, s) in scores.iter().enumerate() {
            memory.record(Position::new(vec![i]), *s, None);
        }
        let curve = memory.best_so_far();
        prop_assert!(curve.windows(2).all(|w| w[1] >= w[0]));
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(memory.best().map(|(_, s)| s), Some(max));
    }

    #[test]
    fn acceptance_decreases_with_temperature(
        delta in -10.0f64..-1e-3,
        t in 1e-2f64..10.0,
        factor in 1.1f64..10.0,
    ) {
        prop_assert!(acceptance_probability(delta, t / factor) < acceptance_probability(delta, t));
    }

    #[test]
    fn run_history_is_reproducible(seed in any::<u64>()) {
        let space = mixed_space();
        let objective = |a: &Assignment| {
            a.int("n").unwrap_or(0) as f64 + a.real("lr").unwrap_or(0.0)
        };
        let config = SearchConfig::default().with_n_iter(15).with_random_state(seed);
        let a = SearchRunner::run(&space, objective, RandomSearch::new(), &config).unwrap();
        let b = SearchRunner::run(&space, objective, RandomSearch::new(), &config).unwrap();
        prop_assert_eq!(a.history, b.history);
    }
}
