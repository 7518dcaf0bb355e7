//! Decomposition event stream.
//!
//! Engine runs can emit an ordered stream of lifecycle events over a
//! caller-supplied channel. Payloads are snapshots: observers see clones of
//! nodes and trees, never live engine state. Emission is fire-and-forget;
//! a full or closed channel drops the event rather than stalling the run.

use tokio::sync::mpsc;

use crate::domain::models::{Decomposition, Subproblem};

/// Kind discriminant for [`DecompositionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Run started.
    Started,
    /// A child node was created.
    SubproblemCreated,
    /// A base case was solved.
    BaseCaseSolved,
    /// A composite node combined its children's solutions.
    SolutionCombined,
    /// A node failed.
    SubproblemFailed,
    /// Run completed successfully.
    Completed,
    /// Run failed.
    Failed,
    /// Run was cancelled.
    Cancelled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::SubproblemCreated => "subproblem_created",
            Self::BaseCaseSolved => "base_case_solved",
            Self::SolutionCombined => "solution_combined",
            Self::SubproblemFailed => "subproblem_failed",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted during a decomposition run.
///
/// Per-node guarantee: a node's created event precedes its terminal event.
/// Per-run guarantee: `Started` is first and exactly one of `Completed`,
/// `Failed`, or `Cancelled` is last. The root node never emits
/// `SubproblemCreated`; the `Started` snapshot already carries it.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum DecompositionEvent<T, R> {
    /// Run started; carries the initial tree.
    Started { decomposition: Decomposition<T, R> },
    /// A child node was created, before it starts solving.
    SubproblemCreated { subproblem: Subproblem<T, R> },
    /// A base case was solved; carries the solved node.
    BaseCaseSolved { subproblem: Subproblem<T, R> },
    /// A composite node was solved from its children; carries the node.
    SolutionCombined { subproblem: Subproblem<T, R> },
    /// A node failed; carries the failed node.
    SubproblemFailed { subproblem: Subproblem<T, R> },
    /// Run completed; carries the final tree.
    Completed { decomposition: Decomposition<T, R> },
    /// Run failed; carries the final tree.
    Failed { decomposition: Decomposition<T, R> },
    /// Run was cancelled; carries the final tree.
    Cancelled { decomposition: Decomposition<T, R> },
}

impl<T, R> DecompositionEvent<T, R> {
    /// The event's kind discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Started { .. } => EventKind::Started,
            Self::SubproblemCreated { .. } => EventKind::SubproblemCreated,
            Self::BaseCaseSolved { .. } => EventKind::BaseCaseSolved,
            Self::SolutionCombined { .. } => EventKind::SolutionCombined,
            Self::SubproblemFailed { .. } => EventKind::SubproblemFailed,
            Self::Completed { .. } => EventKind::Completed,
            Self::Failed { .. } => EventKind::Failed,
            Self::Cancelled { .. } => EventKind::Cancelled,
        }
    }

    /// The node snapshot, for node-scoped events.
    pub fn subproblem(&self) -> Option<&Subproblem<T, R>> {
        match self {
            Self::SubproblemCreated { subproblem }
            | Self::BaseCaseSolved { subproblem }
            | Self::SolutionCombined { subproblem }
            | Self::SubproblemFailed { subproblem } => Some(subproblem),
            _ => None,
        }
    }

    /// The tree snapshot, for run-scoped events.
    pub fn decomposition(&self) -> Option<&Decomposition<T, R>> {
        match self {
            Self::Started { decomposition }
            | Self::Completed { decomposition }
            | Self::Failed { decomposition }
            | Self::Cancelled { decomposition } => Some(decomposition),
            _ => None,
        }
    }
}

/// Fire-and-forget event emitter.
///
/// Wraps an optional channel sender. `emit` never blocks and never fails
/// the run: with no sender it is a no-op, and a full or closed channel
/// drops the event with a trace log.
#[derive(Debug, Clone)]
pub struct EventSink<T, R> {
    tx: Option<mpsc::Sender<DecompositionEvent<T, R>>>,
}

impl<T, R> EventSink<T, R> {
    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A sink that forwards events to `tx`.
    pub fn new(tx: mpsc::Sender<DecompositionEvent<T, R>>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Whether a receiver was attached at all.
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Emit one event without blocking.
    pub fn emit(&self, event: DecompositionEvent<T, R>) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(err) = tx.try_send(event) {
            tracing::trace!(error = %err, "decomposition event dropped");
        }
    }
}
