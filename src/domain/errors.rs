//! Domain errors for the Ramify decomposition engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Which caller-supplied callback raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPhase {
    /// The base-case predicate.
    IsBaseCase,
    /// The base-case solver.
    SolveBaseCase,
    /// The decomposer.
    Decompose,
    /// The solution combiner.
    Combine,
    /// The optional subproblem filter.
    ShouldProcess,
}

impl CallbackPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsBaseCase => "is_base_case",
            Self::SolveBaseCase => "solve_base_case",
            Self::Decompose => "decompose",
            Self::Combine => "combine",
            Self::ShouldProcess => "should_process",
        }
    }
}

impl std::fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a [`DecomposeError`], usable in serialized snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid configuration, rejected before any subproblem was created.
    Validation,
    /// A subproblem exceeded the configured depth limit.
    DepthExceeded,
    /// The run created more subproblems than allowed.
    SubproblemCountExceeded,
    /// The run exceeded its wall-clock budget.
    TimedOut,
    /// A caller-supplied callback returned an error.
    Callback,
    /// The run was cancelled externally.
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::DepthExceeded => "depth_exceeded",
            Self::SubproblemCountExceeded => "subproblem_count_exceeded",
            Self::TimedOut => "timed_out",
            Self::Callback => "callback",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a decomposition run.
#[derive(Debug, Error)]
pub enum DecomposeError {
    /// Configuration was rejected before the run started.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A subproblem sat deeper than the configured limit.
    #[error("Maximum depth exceeded: {depth} > {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },

    /// The run created more subproblems than the configured budget.
    #[error("Maximum subproblems exceeded: {total} > {max_subproblems}")]
    SubproblemCountExceeded { total: usize, max_subproblems: usize },

    /// The run outlived its wall-clock budget.
    #[error("Decomposition timed out: {}ms elapsed, {}ms allowed", elapsed.as_millis(), timeout.as_millis())]
    TimedOut { elapsed: Duration, timeout: Duration },

    /// A caller-supplied callback returned an error.
    #[error("Callback {phase} failed for subproblem {subproblem_id}: {source}")]
    Callback {
        phase: CallbackPhase,
        subproblem_id: Uuid,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The run was cancelled externally.
    #[error("Decomposition cancelled")]
    Cancelled,
}

impl DecomposeError {
    /// Wrap a callback error with its phase and originating subproblem.
    pub fn callback(phase: CallbackPhase, subproblem_id: Uuid, source: anyhow::Error) -> Self {
        Self::Callback {
            phase,
            subproblem_id,
            source: source.into(),
        }
    }

    /// The serializable discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::SubproblemCountExceeded { .. } => ErrorKind::SubproblemCountExceeded,
            Self::TimedOut { .. } => ErrorKind::TimedOut,
            Self::Callback { .. } => ErrorKind::Callback,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The subproblem this error originated from, when one is known.
    pub fn subproblem_id(&self) -> Option<Uuid> {
        match self {
            Self::Callback { subproblem_id, .. } => Some(*subproblem_id),
            _ => None,
        }
    }

    /// Snapshot summary for storing on nodes and decompositions.
    pub fn detail(&self) -> FailureDetail {
        let phase = match self {
            Self::Callback { phase, .. } => Some(*phase),
            _ => None,
        };
        FailureDetail {
            kind: self.kind(),
            phase,
            message: self.to_string(),
            subproblem_id: self.subproblem_id(),
        }
    }
}

/// Serializable failure summary recorded on failed nodes and on the
/// decomposition itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// What kind of failure this was.
    pub kind: ErrorKind,
    /// Which callback failed, for callback errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<CallbackPhase>,
    /// Human-readable message, including the underlying cause.
    pub message: String,
    /// The node the failure originated from, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subproblem_id: Option<Uuid>,
}

impl FailureDetail {
    /// Attribute this failure to a specific subproblem.
    pub fn with_subproblem(mut self, subproblem_id: Uuid) -> Self {
        self.subproblem_id = Some(subproblem_id);
        self
    }
}

pub type DecomposeResult<T> = Result<T, DecomposeError>;
