use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use rand::Rng;

use super::dimension::Dimension;
use super::position::Position;
use super::value::Assignment;
use crate::error::{Result, SearchError};
use crate::random::Perturbation;

/// Attempts made by [`SearchSpace::random_feasible_position`] before giving up.
const FEASIBLE_RETRIES: usize = 100;

/// A predicate over decoded assignments. Positions failing any constraint
/// are never sent to the objective.
#[derive(Clone)]
pub struct Constraint {
    predicate: Arc<dyn Fn(&Assignment) -> bool + Send + Sync>,
}

impl Constraint {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Assignment) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        (self.predicate)(assignment)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constraint(..)")
    }
}

/// The product of all parameter dimensions.
///
/// Deterministic and side-effect free: the only state any method touches
/// is the random source passed in by the caller.
///
/// # Examples
///
/// ```
/// use u_blackbox::space::{Dimension, Position, SearchSpace};
///
/// let space = SearchSpace::new(vec![
///     Dimension::integer("x", 0, 9),
///     Dimension::categorical("kind", ["a", "b"]),
/// ])
/// .unwrap();
///
/// let p = Position::new(vec![7, 1]);
/// let params = space.decode(&p).unwrap();
/// assert_eq!(params.int("x"), Some(7));
/// assert_eq!(params.category("kind"), Some("b"));
/// assert_eq!(space.encode(&params).unwrap(), p);
/// ```
#[derive(Debug, Clone)]
pub struct SearchSpace {
    dimensions: Vec<Dimension>,
    sizes: Vec<usize>,
    constraints: Vec<Constraint>,
}

impl SearchSpace {
    /// Builds a space, rejecting empty or malformed declarations.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(SearchError::config("search space needs at least one dimension"));
        }
        let mut names = HashSet::new();
        for dim in &dimensions {
            dim.validate().map_err(SearchError::Configuration)?;
            if !names.insert(dim.name()) {
                return Err(SearchError::config(format!(
                    "duplicate dimension name '{}'",
                    dim.name()
                )));
            }
        }
        let sizes = dimensions.iter().map(Dimension::len).collect();
        Ok(Self {
            dimensions,
            sizes,
            constraints: Vec::new(),
        })
    }

    /// Adds a feasibility constraint.
    pub fn with_constraint<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Assignment) -> bool + Send + Sync + 'static,
    {
        self.constraints.push(Constraint::new(predicate));
        self
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of candidate values per dimension.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Inclusive index range `(0, k - 1)` of dimension `dim`.
    ///
    /// # Panics
    /// Panics if `dim >= dimension_count()`.
    pub fn bounds(&self, dim: usize) -> (usize, usize) {
        (0, self.sizes[dim] - 1)
    }

    /// Total number of positions, or `None` if it overflows `usize`.
    pub fn size(&self) -> Option<usize> {
        self.sizes
            .iter()
            .try_fold(1usize, |acc, &k| acc.checked_mul(k))
    }

    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.len() == self.sizes.len()
            && position.iter().zip(&self.sizes).all(|(&i, &k)| i < k)
    }

    /// Returns `OutOfDomain` unless `position` lies inside the space.
    pub fn check(&self, position: &Position) -> Result<()> {
        if position.len() != self.sizes.len() {
            return Err(SearchError::out_of_domain(
                "<position>",
                format!(
                    "expected {} indices, got {}",
                    self.sizes.len(),
                    position.len()
                ),
            ));
        }
        for ((&i, &k), dim) in position.iter().zip(&self.sizes).zip(&self.dimensions) {
            if i >= k {
                return Err(SearchError::out_of_domain(
                    dim.name(),
                    format!("index {i} outside 0..={}", k - 1),
                ));
            }
        }
        Ok(())
    }

    /// Position → parameter values.
    pub fn decode(&self, position: &Position) -> Result<Assignment> {
        self.check(position)?;
        Ok(self
            .dimensions
            .iter()
            .zip(position.iter())
            .filter_map(|(dim, &i)| dim.value_at(i).map(|v| (dim.name().to_string(), v)))
            .collect())
    }

    /// Parameter values → position. Fails with `OutOfDomain` for unknown or
    /// missing parameters and for values off the discretization grid.
    pub fn encode(&self, assignment: &Assignment) -> Result<Position> {
        for (name, _) in assignment.iter() {
            if !self.dimensions.iter().any(|d| d.name() == name) {
                return Err(SearchError::out_of_domain(name, "unknown parameter"));
            }
        }
        let mut indices = Vec::with_capacity(self.dimensions.len());
        for dim in &self.dimensions {
            let value = assignment
                .get(dim.name())
                .ok_or_else(|| SearchError::out_of_domain(dim.name(), "missing value"))?;
            let idx = dim.index_of(value).ok_or_else(|| {
                SearchError::out_of_domain(dim.name(), format!("{value} is not on the grid"))
            })?;
            indices.push(idx);
        }
        Ok(Position::new(indices))
    }

    /// Whether `position` satisfies every constraint.
    pub fn is_feasible(&self, position: &Position) -> bool {
        if self.constraints.is_empty() {
            return self.contains(position);
        }
        match self.decode(position) {
            Ok(params) => self.constraints.iter().all(|c| c.is_satisfied(&params)),
            Err(_) => false,
        }
    }

    /// Uniformly random position (constraints ignored).
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position::new(self.sizes.iter().map(|&k| rng.random_range(0..k)).collect())
    }

    /// Uniformly random position satisfying the constraints.
    ///
    /// Rejection sampling; after a bounded number of attempts the last draw
    /// is returned even if infeasible.
    pub fn random_feasible_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let mut candidate = self.random_position(rng);
        if self.constraints.is_empty() {
            return candidate;
        }
        for _ in 1..FEASIBLE_RETRIES {
            if self.is_feasible(&candidate) {
                break;
            }
            candidate = self.random_position(rng);
        }
        candidate
    }

    /// Axis moves of `step_sizes[d]` (default 1) in each direction, clamped
    /// to the bounds. Never contains `position` itself. Sorted.
    pub fn neighbors(&self, position: &Position, step_sizes: &[usize]) -> Vec<Position> {
        let mut out = BTreeSet::new();
        for (d, &k) in self.sizes.iter().enumerate() {
            let step = step_sizes.get(d).copied().unwrap_or(1).max(1);
            let here = position[d];
            for cand in [here.saturating_sub(step), (here + step).min(k - 1)] {
                if cand != here {
                    let mut next = position.to_vec();
                    next[d] = cand;
                    out.insert(Position::new(next));
                }
            }
        }
        out.into_iter().collect()
    }

    /// Euclidean distance with every axis scaled to `[0, 1]`.
    ///
    /// Single-valued dimensions contribute nothing.
    pub fn distance(&self, a: &Position, b: &Position) -> f64 {
        self.sizes
            .iter()
            .enumerate()
            .filter(|(_, &k)| k > 1)
            .map(|(d, &k)| {
                let diff = (a[d] as f64 - b[d] as f64) / (k - 1) as f64;
                diff * diff
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Position scaled to the unit cube (single-valued dimensions map to 0).
    pub fn normalize(&self, position: &Position) -> Vec<f64> {
        position
            .iter()
            .zip(&self.sizes)
            .map(|(&i, &k)| if k > 1 { i as f64 / (k - 1) as f64 } else { 0.0 })
            .collect()
    }

    /// Index-space coordinates of a position.
    pub fn to_continuous(&self, position: &Position) -> Vec<f64> {
        position.iter().map(|&i| i as f64).collect()
    }

    /// Clamps continuous coordinates into `[0, k - 1]` per dimension.
    pub fn clamp_continuous(&self, coords: &mut [f64]) {
        for (c, &k) in coords.iter_mut().zip(&self.sizes) {
            *c = if c.is_nan() { 0.0 } else { c.clamp(0.0, (k - 1) as f64) };
        }
    }

    /// Rounds continuous coordinates to the nearest grid position.
    /// Out-of-range coordinates are clamped to the bounds.
    pub fn from_continuous(&self, coords: &[f64]) -> Position {
        Position::new(
            coords
                .iter()
                .zip(&self.sizes)
                .map(|(&c, &k)| {
                    if c.is_nan() {
                        0
                    } else {
                        c.round().clamp(0.0, (k - 1) as f64) as usize
                    }
                })
                .collect(),
        )
    }

    /// Random local move: each coordinate is perturbed by noise with scale
    /// `epsilon * (k - 1)`, rounded and clamped. If that lands back on
    /// `position`, a single-step move along a random axis is taken instead.
    pub fn climb<R: Rng + ?Sized>(
        &self,
        position: &Position,
        epsilon: f64,
        perturbation: Perturbation,
        rng: &mut R,
    ) -> Position {
        let mut coords = self.to_continuous(position);
        for (c, &k) in coords.iter_mut().zip(&self.sizes) {
            if k > 1 {
                *c += perturbation.sample(rng) * epsilon * (k - 1) as f64;
            }
        }
        let candidate = self.from_continuous(&coords);
        if candidate == *position {
            self.nudge(position, rng)
        } else {
            candidate
        }
    }

    /// Moves one step along one random non-degenerate axis.
    /// Returns `position` unchanged when every dimension is single-valued.
    pub fn nudge<R: Rng + ?Sized>(&self, position: &Position, rng: &mut R) -> Position {
        let movable: Vec<usize> = (0..self.sizes.len()).filter(|&d| self.sizes[d] > 1).collect();
        if movable.is_empty() {
            return position.clone();
        }
        let d = movable[rng.random_range(0..movable.len())];
        let k = self.sizes[d];
        let mut next = position.to_vec();
        next[d] = match next[d] {
            0 => 1,
            i if i == k - 1 => i - 1,
            i if rng.random_bool(0.5) => i + 1,
            i => i - 1,
        };
        Position::new(next)
    }

    /// Position at flat index `flat` (last dimension varies fastest).
    ///
    /// # Panics
    /// Panics in debug builds if `flat` is outside `0..size()`.
    pub fn position_at(&self, mut flat: usize) -> Position {
        let mut indices = vec![0; self.sizes.len()];
        for d in (0..self.sizes.len()).rev() {
            indices[d] = flat % self.sizes[d];
            flat /= self.sizes[d];
        }
        debug_assert_eq!(flat, 0, "flat index outside the space");
        Position::new(indices)
    }

    /// Inverse of [`position_at`](Self::position_at).
    pub fn flat_index(&self, position: &Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        position
            .iter()
            .zip(&self.sizes)
            .try_fold(0usize, |acc, (&i, &k)| acc.checked_mul(k)?.checked_add(i))
    }

    /// Up to `n` positions spread over the interior on a regular lattice.
    pub fn grid_positions(&self, n: usize) -> Vec<Position> {
        if n == 0 {
            return Vec::new();
        }
        let free = self.sizes.iter().filter(|&&k| k > 1).count().max(1) as u32;
        let mut per_dim = 1usize;
        while per_dim.checked_pow(free).is_some_and(|c| c < n) {
            per_dim += 1;
        }
        let axes: Vec<Vec<usize>> = self
            .sizes
            .iter()
            .map(|&k| {
                let m = per_dim.min(k);
                let mut axis: Vec<usize> = (0..m)
                    .map(|i| ((i + 1) as f64 * (k - 1) as f64 / (m + 1) as f64).round() as usize)
                    .collect();
                axis.dedup();
                axis
            })
            .collect();
        lattice(&axes, n)
    }

    /// Up to `n` corners of the space.
    pub fn vertex_positions(&self, n: usize) -> Vec<Position> {
        let axes: Vec<Vec<usize>> = self
            .sizes
            .iter()
            .map(|&k| if k > 1 { vec![0, k - 1] } else { vec![0] })
            .collect();
        lattice(&axes, n)
    }
}

/// First `n` points of the cartesian product of `axes`, alternating between
/// the ends of the enumeration so both extremes are covered early.
fn lattice(axes: &[Vec<usize>], n: usize) -> Vec<Position> {
    let total = axes
        .iter()
        .try_fold(1usize, |acc, a| acc.checked_mul(a.len()))
        .unwrap_or(usize::MAX);
    let take = n.min(total);
    let mut out = Vec::with_capacity(take);
    let (mut lo, mut hi) = (0usize, total);
    while out.len() < take {
        let flat = if out.len() % 2 == 0 {
            lo += 1;
            lo - 1
        } else {
            hi -= 1;
            hi
        };
        let mut rest = flat;
        let mut indices = vec![0; axes.len()];
        for d in (0..axes.len()).rev() {
            indices[d] = axes[d][rest % axes[d].len()];
            rest /= axes[d].len();
        }
        out.push(Position::new(indices));
    }
    out
}
