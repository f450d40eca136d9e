use rand::Rng;

use crate::space::{Position, SearchSpace};

/// An evaluated population member.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Member {
    pub(crate) position: Position,
    pub(crate) score: f64,
}

/// Generation zero: the given starting positions, topped up with random
/// feasible positions to at least `size`.
pub(crate) fn seed_generation<R: Rng + ?Sized>(
    space: &SearchSpace,
    rng: &mut R,
    initial: &[Position],
    size: usize,
) -> Vec<Position> {
    let mut generation = initial.to_vec();
    while generation.len() < size {
        generation.push(space.random_feasible_position(rng));
    }
    generation
}

/// The `n` best of the scored positions, best first. Equal scores keep
/// their input order.
pub(crate) fn fittest(proposed: &[Position], scores: &[f64], n: usize) -> Vec<Member> {
    let mut members: Vec<Member> = proposed
        .iter()
        .zip(scores)
        .map(|(p, &s)| Member {
            position: p.clone(),
            score: s,
        })
        .collect();
    sort_best_first(&mut members);
    members.truncate(n);
    members
}

pub(crate) fn sort_best_first(members: &mut [Member]) {
    members.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Whether every member sits on the same position.
pub(crate) fn collapsed<'a>(mut positions: impl Iterator<Item = &'a Position>) -> bool {
    match positions.next() {
        Some(first) => positions.all(|p| p == first),
        None => false,
    }
}

/// Mean distance of the positions to their centroid in unit-cube
/// coordinates; exactly 0 for a collapsed population.
pub(crate) fn diversity<'a>(
    space: &SearchSpace,
    positions: impl Iterator<Item = &'a Position>,
) -> f64 {
    let points: Vec<Vec<f64>> = positions.map(|p| space.normalize(p)).collect();
    if points.len() < 2 || points.windows(2).all(|w| w[0] == w[1]) {
        return 0.0;
    }
    let dims = space.dimension_count();
    let n = points.len() as f64;
    let centroid: Vec<f64> = (0..dims)
        .map(|d| points.iter().map(|p| p[d]).sum::<f64>() / n)
        .collect();
    points
        .iter()
        .map(|p| {
            p.iter()
                .zip(&centroid)
                .map(|(a, c)| (a - c) * (a - c))
                .sum::<f64>()
                .sqrt()
        })
        .sum::<f64>()
        / n
}

/// Child taking each coordinate from a uniformly chosen parent.
/// `parents` must be non-empty.
pub(crate) fn discrete_recombination<R: Rng + ?Sized>(
    parents: &[&Position],
    rng: &mut R,
) -> Position {
    let dims = parents[0].len();
    Position::new(
        (0..dims)
            .map(|d| parents[rng.random_range(0..parents.len())][d])
            .collect(),
    )
}

/// `k` distinct indices from `0..n`, none equal to `exclude`.
pub(crate) fn distinct_indices<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    exclude: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).filter(|&i| i != exclude).collect();
    let mut out = Vec::with_capacity(k);
    for _ in 0..k.min(pool.len()) {
        out.push(pool.swap_remove(rng.random_range(0..pool.len())));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;

    fn space() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("x", 0, 10),
            Dimension::integer("y", 0, 0),
        ])
        .unwrap()
    }

    #[test]
    fn test_seed_generation_tops_up() {
        let space = space();
        let mut rng = create_rng(0);
        let start = vec![Position::new(vec![3, 0])];
        let generation = seed_generation(&space, &mut rng, &start, 4);
        assert_eq!(generation.len(), 4);
        assert_eq!(generation[0], start[0]);

        let many: Vec<Position> = (0..6).map(|i| Position::new(vec![i, 0])).collect();
        assert_eq!(seed_generation(&space, &mut rng, &many, 4).len(), 6);
    }

    #[test]
    fn test_fittest_sorted_and_stable() {
        let ps: Vec<Position> = (0..4).map(|i| Position::new(vec![i, 0])).collect();
        let best = fittest(&ps, &[1.0, 3.0, 3.0, f64::NEG_INFINITY], 3);
        let idx: Vec<usize> = best.iter().map(|m| m.position[0]).collect();
        assert_eq!(idx, vec![1, 2, 0]);
    }

    #[test]
    fn test_diversity_and_collapse() {
        let space = space();
        let same = vec![Position::new(vec![4, 0]); 3];
        assert!(collapsed(same.iter()));
        assert_eq!(diversity(&space, same.iter()), 0.0);
        let thirds = vec![Position::new(vec![7, 0]); 7];
        assert_eq!(diversity(&space, thirds.iter()), 0.0);

        let spread = vec![Position::new(vec![0, 0]), Position::new(vec![10, 0])];
        assert!(!collapsed(spread.iter()));
        assert!((diversity(&space, spread.iter()) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_distinct_indices() {
        let mut rng = create_rng(1);
        for _ in 0..50 {
            let mut picks = distinct_indices(5, 3, 2, &mut rng);
            assert!(!picks.contains(&2));
            picks.sort();
            picks.dedup();
            assert_eq!(picks.len(), 3);
        }
    }

    #[test]
    fn test_recombination_takes_parent_coordinates() {
        let mut rng = create_rng(3);
        let a = Position::new(vec![0, 0, 0, 0]);
        let b = Position::new(vec![1, 1, 1, 1]);
        for _ in 0..20 {
            let child = discrete_recombination(&[&a, &b], &mut rng);
            assert!(child.iter().all(|&v| v <= 1));
        }
    }
}
