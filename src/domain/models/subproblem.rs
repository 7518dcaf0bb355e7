//! Subproblem domain model.
//!
//! Subproblems are the nodes of a decomposition tree. Each one carries a
//! problem payload, tracks its own solving lifecycle, and records either a
//! solution or a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::FailureDetail;

/// Status of a subproblem in its solving lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubproblemStatus {
    /// Created but not yet picked up
    Pending,
    /// Currently being solved (directly or via its children)
    Solving,
    /// Solved; the solution slot is populated
    Solved,
    /// Failed; the error slot is populated
    Failed,
}

impl Default for SubproblemStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl SubproblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Solving => "solving",
            Self::Solved => "solved",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "solving" => Some(Self::Solving),
            "solved" => Some(Self::Solved),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Solved | Self::Failed)
    }

    /// Check if this is an active (non-terminal) state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Valid transitions from this status.
    ///
    /// `Pending -> Failed` covers nodes rejected by a limit check before
    /// they begin solving.
    pub fn valid_transitions(&self) -> Vec<SubproblemStatus> {
        match self {
            Self::Pending => vec![Self::Solving, Self::Failed],
            Self::Solving => vec![Self::Solved, Self::Failed],
            Self::Solved => vec![],
            Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// A node in a decomposition tree.
///
/// Terminal state is single-assignment: once a subproblem is `Solved` or
/// `Failed` it never changes again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subproblem<T, R> {
    /// Unique identifier
    pub id: Uuid,
    /// Parent node; `None` for the root
    pub parent_id: Option<Uuid>,
    /// Distance from the root (root is 0)
    pub depth: u32,
    /// The problem payload
    pub data: T,
    /// Current status
    pub status: SubproblemStatus,
    /// Solution, populated exactly when solved
    pub solution: Option<R>,
    /// Failure summary, populated exactly when failed
    pub error: Option<FailureDetail>,
    /// Diagnostic labels with no behavioral significance
    pub tags: Vec<String>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When solving started
    pub started_at: Option<DateTime<Utc>>,
    /// When a terminal status was reached
    pub completed_at: Option<DateTime<Utc>>,
}

impl<T, R> Subproblem<T, R> {
    /// Create a root subproblem (depth 0, no parent).
    pub fn root(data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            depth: 0,
            data,
            status: SubproblemStatus::default(),
            solution: None,
            error: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Create a child node at the given depth.
    pub fn child(parent_id: Uuid, depth: u32, data: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(parent_id),
            depth,
            data,
            status: SubproblemStatus::default(),
            solution: None,
            error: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Create a child of an existing subproblem.
    pub fn child_of(parent: &Self, data: T) -> Self {
        Self::child(parent.id, parent.depth + 1, data)
    }

    /// Add a diagnostic tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: SubproblemStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status, updating lifecycle timestamps.
    pub fn transition_to(&mut self, new_status: SubproblemStatus) -> Result<(), String> {
        if !self.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }

        self.status = new_status;
        match new_status {
            SubproblemStatus::Solving => self.started_at = Some(Utc::now()),
            SubproblemStatus::Solved | SubproblemStatus::Failed => {
                self.completed_at = Some(Utc::now());
            }
            SubproblemStatus::Pending => {}
        }

        Ok(())
    }

    /// Check if this subproblem is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if this is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Time from creation to terminal status, if terminal.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.created_at)
    }
}
