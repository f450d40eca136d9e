use rand::{Rng, RngCore};
use tracing::debug;

use super::config::PowellsMethodConfig;
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::{argmax, InitQueue, OptimizerStrategy};

const INITIAL_WINDOW: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Line,
    Extrapolate,
}

/// Powell-style direction set search on the grid.
///
/// Runs a sampled line search along one dimension at a time, keeping the
/// best point of each line. After every cycle over all dimensions it
/// evaluates the point extrapolated along the net cycle displacement and
/// halves the line-search window.
#[derive(Debug, Clone)]
pub struct PowellsMethod {
    config: PowellsMethodConfig,
    init: InitQueue,
    current: Option<(Position, f64)>,
    origin: Option<Position>,
    dim: usize,
    window: f64,
    phase: Phase,
    pending: Vec<Position>,
    round: Vec<(Position, f64)>,
}

impl Default for PowellsMethod {
    fn default() -> Self {
        Self::new(PowellsMethodConfig::default())
    }
}

impl PowellsMethod {
    pub fn new(config: PowellsMethodConfig) -> Self {
        Self {
            config,
            init: InitQueue::default(),
            current: None,
            origin: None,
            dim: 0,
            window: INITIAL_WINDOW,
            phase: Phase::Line,
            pending: Vec::new(),
            round: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&(Position, f64)> {
        self.current.as_ref()
    }

    /// Dimension whose line is being searched.
    pub fn active_dimension(&self) -> usize {
        self.dim
    }

    /// Sample points along dimension `d` through the current position.
    fn line(&self, space: &SearchSpace, d: usize, rng: &mut dyn RngCore) -> Vec<Position> {
        let Some((center, _)) = &self.current else {
            return Vec::new();
        };
        let k = space.sizes()[d];
        if k < 2 {
            return Vec::new();
        }
        let half = ((self.window * (k - 1) as f64).round() as usize).max(1);
        let lo = center[d].saturating_sub(half);
        let hi = (center[d] + half).min(k - 1);
        let n = self.config.iters_p_dim;
        let mut values: Vec<usize> = if n == 1 {
            vec![rng.random_range(lo..=hi)]
        } else {
            (0..n)
                .map(|i| lo + ((i * (hi - lo)) as f64 / (n - 1) as f64).round() as usize)
                .collect()
        };
        values.dedup();
        values
            .into_iter()
            .filter(|&v| v != center[d])
            .map(|v| {
                let mut next = center.to_vec();
                next[d] = v;
                Position::new(next)
            })
            .collect()
    }

    /// Prepares the next non-empty round, starting at dimension `self.dim`.
    fn plan(&mut self, space: &SearchSpace, rng: &mut dyn RngCore) {
        self.round.clear();
        let dims = space.dimension_count();
        while self.dim < dims {
            let line = self.line(space, self.dim, rng);
            if !line.is_empty() {
                self.phase = Phase::Line;
                self.pending = line;
                return;
            }
            self.dim += 1;
        }
        // cycle complete
        self.dim = 0;
        let extrapolated = match (&self.current, &self.origin) {
            (Some((cur, _)), Some(origin)) if cur != origin => {
                let coords: Vec<f64> = cur
                    .iter()
                    .zip(origin.iter())
                    .map(|(&c, &o)| 2.0 * c as f64 - o as f64)
                    .collect();
                Some(space.from_continuous(&coords)).filter(|p| p != cur)
            }
            _ => None,
        };
        self.window = (self.window * 0.5).max(f64::EPSILON);
        self.origin = self.current.as_ref().map(|(p, _)| p.clone());
        match extrapolated {
            Some(point) => {
                self.phase = Phase::Extrapolate;
                self.pending = vec![point];
            }
            None => {
                self.phase = Phase::Line;
                self.pending = (0..dims)
                    .map(|d| self.line(space, d, rng))
                    .find(|l| !l.is_empty())
                    .unwrap_or_default();
            }
        }
        debug!(window = self.window, "powell cycle complete");
    }
}

impl OptimizerStrategy for PowellsMethod {
    fn name(&self) -> &'static str {
        "powells_method"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.init = InitQueue::new(space, rng, initial, 1);
        self.current = None;
        self.origin = None;
        self.dim = 0;
        self.window = INITIAL_WINDOW;
        self.phase = Phase::Line;
        self.pending.clear();
        self.round.clear();
        Ok(())
    }

    fn propose(
        &self,
        space: &SearchSpace,
        _memory: &EvaluationMemory,
        rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        if let Some(start) = self.init.current() {
            return vec![start.clone()];
        }
        match (self.pending.get(self.round.len()), &self.current) {
            (Some(next), _) => vec![next.clone()],
            (None, Some((center, _))) => vec![center.clone()],
            (None, None) => vec![space.random_feasible_position(rng)],
        }
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        for (position, &score) in proposed.iter().zip(scores) {
            if !self.init.is_done() {
                self.init.advance(position, score);
                if self.init.is_done() {
                    self.current = self.init.best().cloned();
                    self.origin = self.current.as_ref().map(|(p, _)| p.clone());
                    self.plan(space, rng);
                }
                continue;
            }
            self.round.push((position.clone(), score));
            if self.round.len() < self.pending.len() {
                continue;
            }
            let round_scores: Vec<f64> = self.round.iter().map(|(_, s)| *s).collect();
            let current = self.current.as_ref().map_or(f64::NEG_INFINITY, |c| c.1);
            if let Some(i) = argmax(&round_scores).filter(|&i| round_scores[i] > current) {
                self.current = Some(self.round.swap_remove(i));
            }
            if self.phase == Phase::Line {
                self.dim += 1;
            }
            self.plan(space, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;

    fn space() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("x", 0, 20),
            Dimension::integer("y", 0, 20),
        ])
        .unwrap()
    }

    #[test]
    fn test_line_varies_one_dimension() {
        let space = space();
        let mut pm = PowellsMethod::default();
        let mut rng = create_rng(0);
        let start = Position::new(vec![10, 10]);
        pm.initialize(&space, &mut rng, std::slice::from_ref(&start)).unwrap();
        pm.update(&space, &[start.clone()], &[0.0], &mut rng);

        assert_eq!(pm.active_dimension(), 0);
        assert!(!pm.pending.is_empty());
        for p in &pm.pending {
            assert_eq!(p[1], 10);
            assert_ne!(p[0], 10);
        }
    }

    #[test]
    fn test_powell_separable_optimum() {
        let space = space();
        let mut pm = PowellsMethod::default();
        let mut rng = create_rng(4);
        pm.initialize(&space, &mut rng, &[Position::new(vec![0, 0])]).unwrap();
        let memory = drive(&mut pm, &space, 80, 4, |p| {
            -((p[0] as f64 - 13.0).powi(2) + (p[1] as f64 - 6.0).powi(2))
        });
        let best = memory.best().map(|(_, s)| s).unwrap();
        assert!(best >= -2.0, "best {best}");
    }

    #[test]
    fn test_degenerate_space_proposes_current() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 1, 1)]).unwrap();
        let mut pm = PowellsMethod::default();
        let mut rng = create_rng(0);
        pm.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut pm, &space, 5, 0, |_| 1.0);
        assert_eq!(memory.len(), 1);
    }
}
