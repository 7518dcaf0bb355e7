//! Decomposition engine service for recursive problem solving.
//!
//! The engine drives one decomposition run: it expands the root problem
//! into a tree of subproblems via the caller's problem space, enforces the
//! configured limits before every node, evaluates siblings per the chosen
//! execution strategy, and combines memoized child solutions bottom-up.
//!
//! Failure handling is fail-fast: the first error terminates the run,
//! cancels in-flight siblings, and leaves the tree snapshot showing the
//! originating node as `Failed` while its ancestors stay `Solving`.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{CallbackPhase, DecomposeError, DecomposeResult};
use crate::domain::models::{Decomposition, DecompositionStatus, Limits, Subproblem};
use crate::domain::ports::ProblemSpace;
use crate::services::event_stream::{DecompositionEvent, EventSink};
use crate::services::limit_checker::LimitChecker;
use crate::services::solution_combiner::SolutionCombiner;

/// How sibling subproblems are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One sibling at a time, in decomposer order. The first failure stops
    /// later siblings from ever starting.
    Sequential,
    /// Siblings of one parent in flight together, interleaving at await
    /// points. `max_in_flight` caps each sibling group; `None` bounds a
    /// group only by the breadth limit. The first failure cancels the
    /// group's in-flight siblings.
    Concurrent { max_in_flight: Option<usize> },
}

impl ExecutionStrategy {
    /// Strictly ordered, one-at-a-time evaluation.
    pub fn sequential() -> Self {
        Self::Sequential
    }

    /// Concurrent evaluation bounded only by breadth.
    pub fn concurrent() -> Self {
        Self::Concurrent { max_in_flight: None }
    }

    /// Concurrent evaluation with at most `max_in_flight` siblings active.
    pub fn concurrent_capped(max_in_flight: usize) -> Self {
        Self::Concurrent {
            max_in_flight: Some(max_in_flight),
        }
    }

    fn validate(self) -> Result<(), String> {
        if let Self::Concurrent {
            max_in_flight: Some(0),
        } = self
        {
            return Err("max_in_flight must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::Concurrent { max_in_flight: None }
    }
}

/// Result of one decomposition run.
///
/// Runtime failures live here rather than in a `Result`: the tree snapshot
/// stays available for diagnostics whether or not the run succeeded.
#[derive(Debug)]
pub struct DecompositionOutcome<T, R> {
    /// Root solution when the run completed.
    pub solution: Option<R>,
    /// The full decomposition tree.
    pub decomposition: Decomposition<T, R>,
    /// The failure, when the run did not complete.
    pub error: Option<DecomposeError>,
}

impl<T, R> DecompositionOutcome<T, R> {
    /// Whether the run completed with a solution.
    pub fn is_success(&self) -> bool {
        self.decomposition.status == DecompositionStatus::Completed && self.solution.is_some()
    }

    /// Convert into a plain result, discarding the tree.
    pub fn into_result(self) -> DecomposeResult<R> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self.solution {
            Some(solution) => Ok(solution),
            None => Err(DecomposeError::Validation(
                "run finished without a solution".to_string(),
            )),
        }
    }
}

/// Engine that drives recursive decomposition runs.
///
/// The engine owns the problem space plus run configuration; each call to
/// [`Self::run`] or [`Self::run_with_events`] produces an independent
/// decomposition tree.
pub struct DecompositionEngine<S: ProblemSpace> {
    space: S,
    limits: Limits,
    strategy: ExecutionStrategy,
    run_id: Option<String>,
    cancellation: CancellationToken,
}

impl<S: ProblemSpace> DecompositionEngine<S> {
    /// Create an engine with default limits and strategy.
    pub fn new(space: S) -> Self {
        Self {
            space,
            limits: Limits::default(),
            strategy: ExecutionStrategy::default(),
            run_id: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set the safety limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Use a fixed run id instead of generating one per run.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Attach an external cancellation token.
    ///
    /// Cancelling the token abandons in-flight work and terminates the run
    /// as `Cancelled`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Run a decomposition without event streaming.
    ///
    /// Configuration problems are returned as `Err` before any node is
    /// created; runtime failures are reported inside the outcome.
    #[instrument(skip(self, problem))]
    pub async fn run(
        &self,
        problem: S::Problem,
    ) -> DecomposeResult<DecompositionOutcome<S::Problem, S::Solution>> {
        self.drive(problem, EventSink::disabled()).await
    }

    /// Run a decomposition, streaming lifecycle events to `event_tx`.
    ///
    /// Events are fire-and-forget snapshots: a full or closed channel loses
    /// events rather than slowing or failing the run.
    #[instrument(skip(self, problem, event_tx))]
    pub async fn run_with_events(
        &self,
        problem: S::Problem,
        event_tx: mpsc::Sender<DecompositionEvent<S::Problem, S::Solution>>,
    ) -> DecomposeResult<DecompositionOutcome<S::Problem, S::Solution>> {
        self.drive(problem, EventSink::new(event_tx)).await
    }

    fn validate(&self) -> DecomposeResult<()> {
        self.limits.validate().map_err(DecomposeError::Validation)?;
        self.strategy.validate().map_err(DecomposeError::Validation)?;
        Ok(())
    }

    async fn drive(
        &self,
        problem: S::Problem,
        sink: EventSink<S::Problem, S::Solution>,
    ) -> DecomposeResult<DecompositionOutcome<S::Problem, S::Solution>> {
        self.validate()?;

        let run_id = self
            .run_id
            .clone()
            .unwrap_or_else(Decomposition::<S::Problem, S::Solution>::generate_id);
        let mut tree = Decomposition::new(run_id, problem.clone()).with_limits(self.limits);
        let root_id = tree.root_id;
        tree.begin();

        tracing::info!(decomposition_id = %tree.id, "decomposition started");
        sink.emit(DecompositionEvent::Started {
            decomposition: tree.clone(),
        });

        let tree = RwLock::new(tree);
        let ctx = RunContext {
            space: &self.space,
            limits: self.limits,
            strategy: self.strategy,
            tree: &tree,
            sink: &sink,
            started: Instant::now(),
            cancellation: &self.cancellation,
            failed_node: OnceLock::new(),
        };

        let result = if self.cancellation.is_cancelled() {
            Err(DecomposeError::Cancelled)
        } else {
            tokio::select! {
                biased;
                () = self.cancellation.cancelled() => Err(DecomposeError::Cancelled),
                () = tokio::time::sleep(self.limits.timeout) => Err(DecomposeError::TimedOut {
                    elapsed: ctx.started.elapsed(),
                    timeout: self.limits.timeout,
                }),
                result = solve_node(&ctx, root_id, problem, 0) => result,
            }
        };

        match result {
            Ok(solution) => {
                let snapshot = {
                    let mut tree = tree.write().await;
                    tree.complete(solution.clone());
                    tree.clone()
                };
                tracing::info!(
                    decomposition_id = %snapshot.id,
                    total_subproblems = snapshot.stats.total_subproblems,
                    max_depth = snapshot.stats.max_depth_reached,
                    "decomposition completed"
                );
                sink.emit(DecompositionEvent::Completed {
                    decomposition: snapshot.clone(),
                });
                Ok(DecompositionOutcome {
                    solution: Some(solution),
                    decomposition: snapshot,
                    error: None,
                })
            }
            Err(err) => {
                let cancelled = matches!(err, DecomposeError::Cancelled);
                let snapshot = {
                    let mut tree = tree.write().await;
                    let mut detail = err.detail();
                    if !cancelled && detail.subproblem_id.is_none() {
                        // Recorded when the originating node was marked failed.
                        detail.subproblem_id = ctx.failed_node.get().copied();
                    }
                    if cancelled {
                        tree.cancel(detail);
                    } else {
                        tree.fail(detail);
                    }
                    tree.clone()
                };
                if cancelled {
                    tracing::info!(decomposition_id = %snapshot.id, "decomposition cancelled");
                    sink.emit(DecompositionEvent::Cancelled {
                        decomposition: snapshot.clone(),
                    });
                } else {
                    tracing::warn!(
                        decomposition_id = %snapshot.id,
                        error = %err,
                        "decomposition failed"
                    );
                    sink.emit(DecompositionEvent::Failed {
                        decomposition: snapshot.clone(),
                    });
                }
                Ok(DecompositionOutcome {
                    solution: None,
                    decomposition: snapshot,
                    error: Some(err),
                })
            }
        }
    }
}

/// Shared per-run state threaded through the recursive solver.
struct RunContext<'run, S: ProblemSpace> {
    space: &'run S,
    limits: Limits,
    strategy: ExecutionStrategy,
    tree: &'run RwLock<Decomposition<S::Problem, S::Solution>>,
    sink: &'run EventSink<S::Problem, S::Solution>,
    started: Instant,
    cancellation: &'run CancellationToken,
    failed_node: OnceLock<Uuid>,
}

/// Solve one node: limit check, then base case or decompose/evaluate/combine.
///
/// Failures are recorded on the originating node before the error
/// propagates; ancestors keep their `Solving` status.
fn solve_node<'run, S: ProblemSpace>(
    ctx: &'run RunContext<'run, S>,
    id: Uuid,
    data: S::Problem,
    depth: u32,
) -> BoxFuture<'run, DecomposeResult<S::Solution>> {
    Box::pin(async move {
        if ctx.cancellation.is_cancelled() {
            return Err(DecomposeError::Cancelled);
        }

        let total = ctx.tree.read().await.stats.total_subproblems;
        if let Err(err) = LimitChecker::check(&ctx.limits, depth, total, ctx.started.elapsed()) {
            return Err(fail_node(ctx, id, err).await);
        }

        ctx.tree.write().await.mark_solving(id);
        tracing::debug!(subproblem_id = %id, depth, "solving subproblem");

        let is_base = match ctx.space.is_base_case(&data, depth).await {
            Ok(flag) => flag,
            Err(err) => {
                let err = DecomposeError::callback(CallbackPhase::IsBaseCase, id, err);
                return Err(fail_node(ctx, id, err).await);
            }
        };

        if is_base {
            return match ctx.space.solve_base_case(&data, depth).await {
                Ok(solution) => {
                    record_solved(ctx, id, solution.clone(), true).await;
                    Ok(solution)
                }
                Err(err) => {
                    let err = DecomposeError::callback(CallbackPhase::SolveBaseCase, id, err);
                    Err(fail_node(ctx, id, err).await)
                }
            };
        }

        let mut child_data = match ctx.space.decompose(&data, depth).await {
            Ok(children) => children,
            Err(err) => {
                let err = DecomposeError::callback(CallbackPhase::Decompose, id, err);
                return Err(fail_node(ctx, id, err).await);
            }
        };

        if child_data.len() > ctx.limits.max_breadth {
            tracing::debug!(
                subproblem_id = %id,
                produced = child_data.len(),
                kept = ctx.limits.max_breadth,
                "breadth limit truncated children"
            );
            child_data.truncate(ctx.limits.max_breadth);
        }

        let mut retained = Vec::with_capacity(child_data.len());
        for candidate in child_data {
            match ctx.space.should_process(&candidate, depth + 1, None).await {
                Ok(true) => retained.push(candidate),
                Ok(false) => {
                    tracing::debug!(parent_id = %id, "subproblem filtered out");
                }
                Err(err) => {
                    let err = DecomposeError::callback(CallbackPhase::ShouldProcess, id, err);
                    return Err(fail_node(ctx, id, err).await);
                }
            }
        }

        // Create every retained child before any of them starts solving.
        let children = {
            let mut tree = ctx.tree.write().await;
            retained
                .into_iter()
                .map(|candidate| {
                    let child = Subproblem::child(id, depth + 1, candidate);
                    tree.insert(child.clone());
                    child
                })
                .collect::<Vec<_>>()
        };
        for child in &children {
            ctx.sink.emit(DecompositionEvent::SubproblemCreated {
                subproblem: child.clone(),
            });
        }

        let pairs = match ctx.strategy {
            ExecutionStrategy::Sequential => evaluate_sequential(ctx, &children).await?,
            ExecutionStrategy::Concurrent { max_in_flight } => {
                evaluate_concurrent(ctx, &children, max_in_flight).await?
            }
        };

        match ctx.space.combine(&data, pairs, depth).await {
            Ok(solution) => {
                record_solved(ctx, id, solution.clone(), false).await;
                Ok(solution)
            }
            Err(err) => {
                let err = DecomposeError::callback(CallbackPhase::Combine, id, err);
                Err(fail_node(ctx, id, err).await)
            }
        }
    })
}

/// Evaluate children one at a time, in decomposer order.
async fn evaluate_sequential<'run, S: ProblemSpace>(
    ctx: &'run RunContext<'run, S>,
    children: &[Subproblem<S::Problem, S::Solution>],
) -> DecomposeResult<Vec<(S::Problem, S::Solution)>> {
    let mut pairs = Vec::with_capacity(children.len());
    for child in children {
        let solution = solve_node(ctx, child.id, child.data.clone(), child.depth).await?;
        pairs.push((child.data.clone(), solution));
    }
    Ok(pairs)
}

/// Evaluate children concurrently, returning pairs in decomposer order
/// regardless of completion order.
///
/// The first failure drops the remaining futures, cancelling in-flight
/// siblings; abandoned nodes keep their last non-terminal status.
async fn evaluate_concurrent<'run, S: ProblemSpace>(
    ctx: &'run RunContext<'run, S>,
    children: &[Subproblem<S::Problem, S::Solution>],
    max_in_flight: Option<usize>,
) -> DecomposeResult<Vec<(S::Problem, S::Solution)>> {
    let mut combiner =
        SolutionCombiner::new(children.iter().map(|child| child.data.clone()).collect());
    let semaphore = max_in_flight.map(|cap| Arc::new(Semaphore::new(cap)));

    let mut in_flight = children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let result = solve_node(ctx, child.id, child.data.clone(), child.depth).await;
                (index, result)
            }
        })
        .collect::<FuturesUnordered<_>>();

    while let Some((index, result)) = in_flight.next().await {
        match result {
            Ok(solution) => combiner.record(index, solution),
            Err(err) => return Err(err),
        }
    }

    Ok(combiner.into_pairs())
}

/// Record a solution on a node and emit its terminal event.
async fn record_solved<'run, S: ProblemSpace>(
    ctx: &RunContext<'run, S>,
    id: Uuid,
    solution: S::Solution,
    base_case: bool,
) {
    let snapshot = {
        let mut tree = ctx.tree.write().await;
        tree.mark_solved(id, solution);
        tree.subproblem(id).cloned()
    };
    let Some(subproblem) = snapshot else {
        return;
    };
    tracing::debug!(subproblem_id = %id, base_case, "subproblem solved");
    ctx.sink.emit(if base_case {
        DecompositionEvent::BaseCaseSolved { subproblem }
    } else {
        DecompositionEvent::SolutionCombined { subproblem }
    });
}

/// Record a failure on its originating node, emit the failure event, and
/// hand the error back for propagation.
async fn fail_node<'run, S: ProblemSpace>(
    ctx: &RunContext<'run, S>,
    id: Uuid,
    err: DecomposeError,
) -> DecomposeError {
    let snapshot = {
        let mut tree = ctx.tree.write().await;
        tree.mark_failed(id, err.detail().with_subproblem(id));
        tree.subproblem(id).cloned()
    };
    // First failure wins; later failures never reach here under fail-fast.
    let _ = ctx.failed_node.set(id);
    if let Some(subproblem) = snapshot {
        ctx.sink.emit(DecompositionEvent::SubproblemFailed { subproblem });
    }
    tracing::debug!(subproblem_id = %id, error = %err, "subproblem failed");
    err
}
