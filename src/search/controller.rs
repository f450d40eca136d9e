//! The iteration loop tying space, memory, strategies and objective
//! together.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::{Composition, Initialize, SearchConfig};
use super::objective::Objective;
use super::result::{SearchResult, StopReason};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::random::create_rng;
use crate::space::{Assignment, Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Controller states.
///
/// `Init` until the first [`step`](SearchController::step), which
/// initializes the strategies. Each step then passes through `Proposing`,
/// `Evaluating` and `Recording` and ends either back in `Proposing` or in
/// one of the two terminal states.
///
/// `Evaluating` and `Recording` are only held inside a step. A step whose
/// objective call fails leaves the controller in `Evaluating`, and every
/// later step returns the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    Proposing,
    Evaluating,
    Recording,
    /// Strategies converged or early stopping triggered.
    Converged,
    /// Iteration, evaluation or time budget spent, or cancelled.
    BudgetExhausted,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Converged | SearchState::BudgetExhausted)
    }
}

/// How one proposed position gets its score.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Infeasible,
    Cached,
    /// Index into the batch's objective calls.
    Fresh(usize),
}

/// Drives one search run.
///
/// Owns the search space, the objective, the strategies and the shared
/// [`EvaluationMemory`]. The objective is called only for feasible
/// positions missing from memory; every position of a batch is scored
/// before the proposing strategy is updated.
///
/// # Examples
///
/// ```
/// use u_blackbox::local::HillClimbing;
/// use u_blackbox::search::{SearchConfig, SearchController};
/// use u_blackbox::space::{Assignment, Dimension, SearchSpace};
///
/// let space = SearchSpace::new(vec![Dimension::integer("x", -10, 10)]).unwrap();
/// let objective = |a: &Assignment| -(a.int("x").unwrap_or(0) as f64 - 3.0).powi(2);
/// let config = SearchConfig::default().with_n_iter(100).with_random_state(7);
///
/// let mut controller = SearchController::new(
///     space,
///     objective,
///     vec![Box::new(HillClimbing::default())],
///     config,
/// )
/// .unwrap();
/// let result = controller.run().unwrap();
/// assert_eq!(result.best_score, Some(0.0));
/// ```
pub struct SearchController<O> {
    space: SearchSpace,
    objective: O,
    config: SearchConfig,
    strategies: Vec<Box<dyn OptimizerStrategy>>,
    initial: Vec<Position>,
    memory: EvaluationMemory,
    rng: StdRng,
    state: SearchState,
    active: usize,
    active_iterations: usize,
    turn: usize,
    iterations: usize,
    evaluations: usize,
    started: Option<Instant>,
    stop_reason: Option<StopReason>,
    failure: Option<SearchError>,
    cancel: Option<Arc<AtomicBool>>,
    /// Reference best score for early stopping and the iteration it was set.
    plateau: Option<(f64, usize)>,
}

impl<O> fmt::Debug for SearchController<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("SearchController")
            .field("strategies", &names)
            .field("state", &self.state)
            .field("iterations", &self.iterations)
            .field("evaluations", &self.evaluations)
            .finish()
    }
}

impl<O: Objective> SearchController<O> {
    /// Validates the run configuration and prepares memory and starting
    /// positions. Strategies are initialized by the first step.
    ///
    /// Fails with `Configuration` for an invalid config or an empty
    /// strategy list, and with `OutOfDomain` for warm-start assignments
    /// that do not lie on `space`.
    pub fn new(
        space: SearchSpace,
        objective: O,
        strategies: Vec<Box<dyn OptimizerStrategy>>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate().map_err(SearchError::Configuration)?;
        if strategies.is_empty() {
            return Err(SearchError::config("at least one strategy is required"));
        }

        let sign = config.direction.sign();
        let warm_start = config
            .memory_warm_start
            .iter()
            .map(|(assignment, score)| Ok((space.encode(assignment)?, sign * score)))
            .collect::<Result<Vec<_>>>()?;
        let memory = EvaluationMemory::new()
            .with_caching(config.memory)
            .with_warm_start(warm_start);

        let mut rng = create_rng(config.random_state.unwrap_or_else(rand::random));
        let initial = match &config.initialize {
            Some(init) => initial_positions(&space, init, &mut rng)?,
            None => Vec::new(),
        };

        Ok(Self {
            space,
            objective,
            config,
            strategies,
            initial,
            memory,
            rng,
            state: SearchState::Init,
            active: 0,
            active_iterations: 0,
            turn: 0,
            iterations: 0,
            evaluations: 0,
            started: None,
            stop_reason: None,
            failure: None,
            cancel: None,
            plateau: None,
        })
    }

    /// Controller for a single strategy.
    pub fn with_strategy<S>(
        space: SearchSpace,
        objective: O,
        strategy: S,
        config: SearchConfig,
    ) -> Result<Self>
    where
        S: OptimizerStrategy + 'static,
    {
        Self::new(space, objective, vec![Box::new(strategy)], config)
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn memory(&self) -> &EvaluationMemory {
        &self.memory
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Runs until a stopping rule fires.
    pub fn run(&mut self) -> Result<SearchResult> {
        self.run_with_cancel(None)
    }

    /// Runs until a stopping rule fires or `cancel` is raised. The flag is
    /// checked between iterations; a started batch always completes.
    pub fn run_with_cancel(&mut self, cancel: Option<Arc<AtomicBool>>) -> Result<SearchResult> {
        self.cancel = cancel;
        let reason = loop {
            self.step()?;
            if let Some(reason) = self.stop_reason {
                break reason;
            }
        };
        Ok(self.summarize(reason))
    }

    /// Result of a finished run, `None` while the run is still going.
    pub fn result(&self) -> Option<SearchResult> {
        self.stop_reason.map(|reason| self.summarize(reason))
    }

    /// Performs one propose/evaluate/record/update cycle and returns the
    /// resulting state.
    ///
    /// An objective failure is returned immediately and again from every
    /// later call.
    pub fn step(&mut self) -> Result<SearchState> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.state == SearchState::Init {
            self.initialize()?;
        }
        if let Some(reason) = self.interrupted() {
            return Ok(self.finish(reason));
        }
        let Some(index) = self.select_strategy() else {
            let reason = if self.strategies.iter().all(|s| s.is_converged()) {
                StopReason::Converged
            } else {
                StopReason::IterationBudget
            };
            return Ok(self.finish(reason));
        };

        self.state = SearchState::Proposing;
        let name = self.strategies[index].name();
        let proposed = self.strategies[index].propose(&self.space, &self.memory, &mut self.rng);
        if proposed.is_empty() {
            warn!(strategy = name, "strategy proposed no positions");
            return Ok(self.finish(StopReason::Converged));
        }

        let mut slots = Vec::with_capacity(proposed.len());
        let mut calls: Vec<(&Position, Assignment)> = Vec::new();
        let mut pending: HashMap<&Position, usize> = HashMap::new();
        for position in &proposed {
            self.space.check(position)?;
            let slot = if !self.space.is_feasible(position) {
                Slot::Infeasible
            } else if self.memory.contains(position) {
                Slot::Cached
            } else if let Some(&k) = pending.get(position).filter(|_| self.config.memory) {
                Slot::Fresh(k)
            } else {
                pending.insert(position, calls.len());
                calls.push((position, self.space.decode(position)?));
                Slot::Fresh(calls.len() - 1)
            };
            slots.push(slot);
        }

        if self.config.n_iter > 0 && self.iterations + proposed.len() > self.config.n_iter {
            return Ok(self.finish(StopReason::IterationBudget));
        }
        if self.config.max_evaluations > 0
            && self.evaluations + calls.len() > self.config.max_evaluations
        {
            return Ok(self.finish(StopReason::EvaluationBudget));
        }

        self.state = SearchState::Evaluating;
        let outcomes = score_batch(&self.objective, &calls, self.config.parallel);
        let n_calls = outcomes.len();

        self.state = SearchState::Recording;
        let sign = self.config.direction.sign();
        let mut scores = Vec::with_capacity(proposed.len());
        let mut failure = None;
        for (position, slot) in proposed.iter().zip(&slots) {
            let score = match *slot {
                Slot::Infeasible => f64::NEG_INFINITY,
                Slot::Cached => self
                    .memory
                    .promote_warm_start(position, Some(name))
                    .unwrap_or(f64::NEG_INFINITY),
                Slot::Fresh(k) => match outcomes.get(k) {
                    Some(Ok(value)) => {
                        self.memory.record(position.clone(), sign * value, Some(name))
                    }
                    Some(Err(err)) => {
                        failure.get_or_insert_with(|| err.clone());
                        continue;
                    }
                    // not called after an earlier failure
                    None => continue,
                },
            };
            scores.push(score);
        }
        self.evaluations += n_calls;
        self.iterations += proposed.len();
        self.active_iterations += proposed.len();

        if let Some(err) = failure {
            warn!(strategy = name, error = %err, "objective failed");
            self.state = SearchState::Evaluating;
            self.failure = Some(err.clone());
            return Err(err);
        }

        self.strategies[index].update(&self.space, &proposed, &scores, &mut self.rng);
        debug!(
            strategy = name,
            batch = proposed.len(),
            fresh = n_calls,
            iterations = self.iterations,
            best = ?self.memory.best().map(|(_, s)| sign * s),
            "iteration"
        );

        if self.stalled() {
            return Ok(self.finish(StopReason::EarlyStopped));
        }
        if self.config.n_iter > 0 && self.iterations >= self.config.n_iter {
            return Ok(self.finish(StopReason::IterationBudget));
        }
        if self.config.max_evaluations > 0 && self.evaluations >= self.config.max_evaluations {
            return Ok(self.finish(StopReason::EvaluationBudget));
        }
        self.state = SearchState::Proposing;
        Ok(self.state)
    }

    fn initialize(&mut self) -> Result<()> {
        for (i, strategy) in self.strategies.iter_mut().enumerate() {
            let initial: &[Position] = if i == 0 { &self.initial } else { &[] };
            strategy.initialize(&self.space, &mut self.rng, initial)?;
        }
        self.started = Some(Instant::now());
        self.state = SearchState::Proposing;
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        info!(
            strategies = ?names,
            n_iter = self.config.n_iter,
            max_evaluations = self.config.max_evaluations,
            max_time = ?self.config.max_time,
            initial = self.initial.len(),
            "search started"
        );
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Cancellation or time limit.
    fn interrupted(&self) -> Option<StopReason> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some(StopReason::Cancelled);
        }
        if self.config.max_time.is_some_and(|limit| self.elapsed() >= limit) {
            return Some(StopReason::TimeLimit);
        }
        None
    }

    /// Index of the strategy proposing next, `None` when none is left.
    fn select_strategy(&mut self) -> Option<usize> {
        let k = self.strategies.len();
        match self.config.composition {
            Composition::Sequential => {
                let share = if self.config.n_iter > 0 {
                    self.config.n_iter.div_ceil(k)
                } else {
                    usize::MAX
                };
                while self.active < k {
                    let strategy = &self.strategies[self.active];
                    if !strategy.is_converged() && self.active_iterations < share {
                        return Some(self.active);
                    }
                    debug!(
                        strategy = strategy.name(),
                        iterations = self.active_iterations,
                        converged = strategy.is_converged(),
                        "strategy finished"
                    );
                    self.active += 1;
                    self.active_iterations = 0;
                }
                None
            }
            Composition::RoundRobin => {
                let next = (0..k)
                    .map(|offset| (self.turn + offset) % k)
                    .find(|&i| !self.strategies[i].is_converged())?;
                self.turn = next + 1;
                Some(next)
            }
        }
    }

    /// Whether early stopping should end the run now.
    fn stalled(&mut self) -> bool {
        let Some(es) = &self.config.early_stopping else {
            return false;
        };
        let Some((_, best)) = self.memory.best() else {
            return false;
        };
        match self.plateau {
            Some((reference, since)) if best - reference <= es.threshold(reference) => {
                self.iterations - since >= es.n_iter_no_change
            }
            _ => {
                self.plateau = Some((best, self.iterations));
                false
            }
        }
    }

    fn finish(&mut self, reason: StopReason) -> SearchState {
        self.stop_reason = Some(reason);
        self.state = match reason {
            StopReason::Converged | StopReason::EarlyStopped => SearchState::Converged,
            _ => SearchState::BudgetExhausted,
        };
        let sign = self.config.direction.sign();
        info!(
            reason = %reason,
            iterations = self.iterations,
            evaluations = self.evaluations,
            best = ?self.memory.best().map(|(_, s)| sign * s),
            "search finished"
        );
        self.state
    }

    fn summarize(&self, reason: StopReason) -> SearchResult {
        let sign = self.config.direction.sign();
        let best = self.memory.best_record();
        SearchResult {
            best_position: best.map(|r| r.position().clone()),
            best_assignment: best.and_then(|r| self.space.decode(r.position()).ok()),
            best_score: best.map(|r| sign * r.score()),
            history: self
                .memory
                .history()
                .iter()
                .map(|r| r.map_score(|s| sign * s))
                .collect(),
            iterations: self.iterations,
            evaluations: self.evaluations,
            stop_reason: reason,
            elapsed: self.elapsed(),
        }
    }
}

/// Starting positions from an [`Initialize`] block: explicit assignments
/// first, then lattice, corner and random points, without repeats.
fn initial_positions(
    space: &SearchSpace,
    init: &Initialize,
    rng: &mut StdRng,
) -> Result<Vec<Position>> {
    let mut positions = init
        .warm_start
        .iter()
        .map(|a| space.encode(a))
        .collect::<Result<Vec<_>>>()?;
    positions.extend(space.grid_positions(init.grid));
    positions.extend(space.vertex_positions(init.vertices));
    positions.extend((0..init.random).map(|_| space.random_feasible_position(rng)));
    let mut seen = HashSet::new();
    positions.retain(|p| seen.insert(p.clone()));
    Ok(positions)
}

fn call<O: Objective + ?Sized>(
    objective: &O,
    position: &Position,
    assignment: &Assignment,
) -> Result<f64> {
    let failure = |message: String| SearchError::ObjectiveFailure {
        position: position.to_string(),
        message,
    };
    let value = objective
        .evaluate(assignment)
        .map_err(|e| failure(e.to_string()))?;
    if value.is_nan() {
        return Err(failure("objective returned NaN".into()));
    }
    Ok(value)
}

/// Calls the objective for every fresh position. Sequential scoring stops
/// at the first failure.
fn score_batch<O: Objective>(
    objective: &O,
    calls: &[(&Position, Assignment)],
    parallel: bool,
) -> Vec<Result<f64>> {
    #[cfg(feature = "parallel")]
    {
        if parallel && calls.len() > 1 {
            return calls
                .par_iter()
                .map(|(position, assignment)| call(objective, position, assignment))
                .collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    let mut outcomes = Vec::with_capacity(calls.len());
    for (position, assignment) in calls {
        let outcome = call(objective, position, assignment);
        let failed = outcome.is_err();
        outcomes.push(outcome);
        if failed {
            break;
        }
    }
    outcomes
}

/// Convenience entry point for single-strategy runs.
pub struct SearchRunner;

impl SearchRunner {
    /// Runs `strategy` on `space` until a stopping rule fires.
    pub fn run<O, S>(
        space: &SearchSpace,
        objective: O,
        strategy: S,
        config: &SearchConfig,
    ) -> Result<SearchResult>
    where
        O: Objective,
        S: OptimizerStrategy + 'static,
    {
        Self::run_with_cancel(space, objective, strategy, config, None)
    }

    /// Runs with an optional cancellation token.
    pub fn run_with_cancel<O, S>(
        space: &SearchSpace,
        objective: O,
        strategy: S,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult>
    where
        O: Objective,
        S: OptimizerStrategy + 'static,
    {
        SearchController::with_strategy(space.clone(), objective, strategy, config.clone())?
            .run_with_cancel(cancel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use rand::RngCore;

    use super::*;
    use crate::global::GridSearch;
    use crate::search::{Composition, Direction, EarlyStopping, Fallible, ObjectiveError};
    use crate::space::Dimension;

    /// Proposes the same batch forever.
    struct Repeat(Vec<Position>);

    impl OptimizerStrategy for Repeat {
        fn name(&self) -> &'static str {
            "repeat"
        }

        fn initialize(
            &mut self,
            _: &SearchSpace,
            _: &mut dyn RngCore,
            _: &[Position],
        ) -> Result<()> {
            Ok(())
        }

        fn propose(
            &self,
            _: &SearchSpace,
            _: &EvaluationMemory,
            _: &mut dyn RngCore,
        ) -> Vec<Position> {
            self.0.clone()
        }

        fn update(
            &mut self,
            _: &SearchSpace,
            proposed: &[Position],
            scores: &[f64],
            _: &mut dyn RngCore,
        ) {
            assert_eq!(proposed.len(), scores.len());
        }
    }

    fn line(n: i64) -> SearchSpace {
        SearchSpace::new(vec![Dimension::integer("x", 0, n - 1)]).unwrap()
    }

    fn pos(i: usize) -> Position {
        Position::new(vec![i])
    }

    #[test]
    fn test_state_machine() {
        let objective = |a: &Assignment| a.int("x").unwrap_or(0) as f64;
        let config = SearchConfig::default().with_n_iter(2).with_random_state(0);
        let mut c =
            SearchController::with_strategy(line(5), objective, Repeat(vec![pos(1)]), config)
                .unwrap();
        assert_eq!(c.state(), SearchState::Init);
        assert_eq!(c.step().unwrap(), SearchState::Proposing);
        assert_eq!(c.step().unwrap(), SearchState::BudgetExhausted);
        assert_eq!(c.stop_reason(), Some(StopReason::IterationBudget));
        // terminal state is sticky
        assert_eq!(c.step().unwrap(), SearchState::BudgetExhausted);
        assert_eq!(c.iterations(), 2);
        assert_eq!(c.evaluations(), 1);
    }

    #[test]
    fn test_duplicates_in_batch_scored_once() {
        let calls = AtomicUsize::new(0);
        let objective = |_: &Assignment| {
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        };
        let config = SearchConfig::default().with_n_iter(3);
        let batch = Repeat(vec![pos(2), pos(2), pos(3)]);
        let result = SearchRunner::run(&line(5), &objective, batch, &config).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(result.evaluations, 2);
        assert_eq!(result.history.len(), 2);
    }

    #[test]
    fn test_batch_must_fit_budget() {
        let objective = |_: &Assignment| 0.0;
        let config = SearchConfig::default().with_n_iter(5);
        let batch = Repeat(vec![pos(0), pos(1), pos(2)]);
        let result = SearchRunner::run(&line(5), objective, batch, &config).unwrap();
        assert_eq!(result.iterations, 3);
        assert_eq!(result.stop_reason, StopReason::IterationBudget);
    }

    #[test]
    fn test_evaluation_budget_counts_misses_only() {
        let objective = |_: &Assignment| 0.0;
        let config = SearchConfig::default()
            .with_n_iter(0)
            .with_max_evaluations(2);
        let batch = Repeat(vec![pos(0), pos(1)]);
        let result = SearchRunner::run(&line(5), objective, batch, &config).unwrap();
        assert_eq!(result.evaluations, 2);
        assert_eq!(result.stop_reason, StopReason::EvaluationBudget);
    }

    #[test]
    fn test_infeasible_not_recorded() {
        let space = line(5).with_constraint(|a| a.int("x") != Some(4));
        let calls = AtomicUsize::new(0);
        let objective = |_: &Assignment| {
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        };
        let config = SearchConfig::default().with_n_iter(4);
        let batch = Repeat(vec![pos(4), pos(0)]);
        let result = SearchRunner::run(&space, &objective, batch, &config).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert!(result.history.iter().all(|r| r.position() != &pos(4)));
    }

    #[test]
    fn test_warm_start_promoted_without_call() {
        let calls = AtomicUsize::new(0);
        let objective = |_: &Assignment| {
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        };
        let warm = Assignment::new().with("x", 3i64);
        let config = SearchConfig::default()
            .with_n_iter(1)
            .with_memory_warm_start(vec![(warm, 10.0)]);
        let result =
            SearchRunner::run(&line(5), &objective, Repeat(vec![pos(3)]), &config).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(result.evaluations, 0);
        assert_eq!(result.best_score, Some(10.0));
        assert!(result.history[0].is_warm_start());
    }

    #[test]
    fn test_nan_is_objective_failure() {
        let objective = |_: &Assignment| f64::NAN;
        let config = SearchConfig::default().with_n_iter(5);
        let mut c =
            SearchController::with_strategy(line(5), objective, Repeat(vec![pos(0)]), config)
                .unwrap();
        assert!(matches!(c.step(), Err(SearchError::ObjectiveFailure { .. })));
        assert_eq!(c.state(), SearchState::Evaluating);
        // failures are sticky
        assert!(c.step().is_err());
        assert_eq!(c.state(), SearchState::Evaluating);
        assert!(c.memory().is_empty());
    }

    #[test]
    fn test_failing_objective_surfaces_message() {
        let objective =
            Fallible(|_: &Assignment| -> std::result::Result<f64, ObjectiveError> {
                Err("simulation diverged".into())
            });
        let config = SearchConfig::default().with_n_iter(5);
        let err =
            SearchRunner::run(&line(5), objective, Repeat(vec![pos(0)]), &config).unwrap_err();
        match err {
            SearchError::ObjectiveFailure { message, .. } => assert!(message.contains("diverged")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_minimize_reports_own_sign() {
        let objective = |a: &Assignment| (a.int("x").unwrap_or(0) as f64 - 2.0).powi(2);
        let config = SearchConfig::default()
            .with_n_iter(100)
            .with_direction(Direction::Minimize);
        let result =
            SearchRunner::run(&line(5), objective, GridSearch::default(), &config).unwrap();
        assert_eq!(result.best_position, Some(pos(2)));
        assert_eq!(result.best_score, Some(0.0));
        assert!(result.history.iter().all(|r| r.score() >= 0.0));
    }

    #[test]
    fn test_early_stopping_on_plateau() {
        let objective = |_: &Assignment| 1.0;
        let config = SearchConfig::default()
            .with_n_iter(1_000)
            .with_early_stopping(EarlyStopping::new(5));
        let result =
            SearchRunner::run(&line(50), objective, Repeat(vec![pos(7)]), &config).unwrap();
        assert_eq!(result.stop_reason, StopReason::EarlyStopped);
        assert_eq!(result.iterations, 6);
    }

    #[test]
    fn test_cancel_before_start() {
        let flag = Arc::new(AtomicBool::new(true));
        let config = SearchConfig::default().with_n_iter(10);
        let objective = |_: &Assignment| 0.0;
        let batch = Repeat(vec![pos(0)]);
        let result =
            SearchRunner::run_with_cancel(&line(5), objective, batch, &config, Some(flag)).unwrap();
        assert!(result.cancelled());
        assert_eq!(result.iterations, 0);
        assert_eq!(result.best_score, None);
    }

    #[test]
    fn test_round_robin_alternates() {
        let config = SearchConfig::default()
            .with_n_iter(4)
            .with_composition(Composition::RoundRobin);
        let strategies: Vec<Box<dyn OptimizerStrategy>> =
            vec![Box::new(Repeat(vec![pos(0)])), Box::new(Repeat(vec![pos(1)]))];
        let mut c =
            SearchController::new(line(5), |_: &Assignment| 0.0, strategies, config).unwrap();
        let result = c.run().unwrap();
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.iterations, 4);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let config = SearchConfig::default().with_n_iter(0);
        assert!(matches!(
            SearchController::with_strategy(line(5), |_: &Assignment| 0.0, Repeat(vec![]), config),
            Err(SearchError::Configuration(_))
        ));
        let none: Vec<Box<dyn OptimizerStrategy>> = Vec::new();
        let config = SearchConfig::default();
        assert!(SearchController::new(line(5), |_: &Assignment| 0.0, none, config).is_err());
    }

    #[test]
    fn test_warm_start_off_grid_rejected() {
        let config = SearchConfig::default()
            .with_memory_warm_start(vec![(Assignment::new().with("x", 99i64), 1.0)]);
        assert!(matches!(
            SearchController::with_strategy(line(5), |_: &Assignment| 0.0, Repeat(vec![]), config),
            Err(SearchError::OutOfDomain { .. })
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batches_match_serial_history() {
        use crate::population::{DifferentialEvolution, DifferentialEvolutionConfig};

        let space = SearchSpace::new(vec![
            Dimension::integer("x", -20, 20),
            Dimension::integer("y", -20, 20),
        ])
        .unwrap();
        let objective = |a: &Assignment| {
            let x = a.int("x").unwrap_or(0) as f64;
            let y = a.int("y").unwrap_or(0) as f64;
            -(x * x + (y - 3.0).powi(2))
        };
        let run = |parallel: bool| {
            let de =
                DifferentialEvolution::new(DifferentialEvolutionConfig::default().with_population(8));
            let config = SearchConfig::default()
                .with_n_iter(100)
                .with_random_state(5)
                .with_parallel(parallel);
            let result = SearchRunner::run(&space, objective, de, &config).unwrap();
            result
                .history
                .iter()
                .map(|r| (r.position().clone(), r.score()))
                .collect::<Vec<_>>()
        };
        let serial = run(false);
        assert!(!serial.is_empty());
        assert_eq!(serial, run(true));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_failure_joins_whole_batch() {
        let calls = AtomicUsize::new(0);
        let objective = Fallible(|a: &Assignment| -> std::result::Result<f64, ObjectiveError> {
            calls.fetch_add(1, Ordering::Relaxed);
            match a.int("x") {
                Some(2) => Err("unstable at 2".into()),
                Some(x) => Ok(x as f64),
                None => Ok(0.0),
            }
        });
        let config = SearchConfig::default().with_n_iter(8).with_parallel(true);
        let batch = Repeat(vec![pos(0), pos(1), pos(2), pos(3)]);
        let mut c = SearchController::with_strategy(line(5), objective, batch, config).unwrap();

        match c.step() {
            Err(SearchError::ObjectiveFailure { message, .. }) => {
                assert!(message.contains("unstable"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert_eq!(c.evaluations(), 4);
        assert_eq!(c.memory().len(), 3);
        assert!(!c.memory().contains(&pos(2)));
        assert!(c.memory().contains(&pos(3)));
        assert!(c.step().is_err());
    }
}
