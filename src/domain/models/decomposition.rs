//! Decomposition domain model.
//!
//! A decomposition is the full tree produced by one engine run: a node
//! registry, per-parent child ordering, aggregate stats, and the run-level
//! status/solution/error slots. Mutation goes through the `mark_*` and
//! terminal methods so the stats stay consistent with the nodes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::FailureDetail;
use crate::domain::models::limits::Limits;
use crate::domain::models::subproblem::{Subproblem, SubproblemStatus};

/// Status of a decomposition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionStatus {
    /// Created but not yet started
    Pending,
    /// Run in progress
    InProgress,
    /// Root solved successfully
    Completed,
    /// Run failed
    Failed,
    /// Run cancelled externally
    Cancelled,
}

impl Default for DecompositionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl DecompositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<DecompositionStatus> {
        match self {
            Self::Pending => vec![Self::InProgress, Self::Cancelled],
            Self::InProgress => vec![Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed => vec![],
            Self::Failed => vec![],
            Self::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// Aggregate counters for one decomposition run.
///
/// `pending_subproblems` counts every non-terminal node, including nodes
/// currently solving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionStats {
    /// Nodes created so far (the root counts)
    pub total_subproblems: usize,
    /// Nodes that reached `Solved`
    pub solved_subproblems: usize,
    /// Nodes that reached `Failed`
    pub failed_subproblems: usize,
    /// Nodes not yet terminal
    pub pending_subproblems: usize,
    /// Deepest node created so far (root is 0)
    pub max_depth_reached: u32,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
}

impl DecompositionStats {
    pub fn new() -> Self {
        Self {
            total_subproblems: 0,
            solved_subproblems: 0,
            failed_subproblems: 0,
            pending_subproblems: 0,
            max_depth_reached: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Wall-clock duration of the run, if finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|done| done - self.started_at)
    }
}

impl Default for DecompositionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// The tree produced by one decomposition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition<T, R> {
    /// Run identifier, caller-supplied or generated
    pub id: String,
    /// The unique node with no parent
    pub root_id: Uuid,
    /// Node registry
    pub nodes: HashMap<Uuid, Subproblem<T, R>>,
    /// Child ids per parent, in the order the decomposer produced them
    pub children: HashMap<Uuid, Vec<Uuid>>,
    /// Run status
    pub status: DecompositionStatus,
    /// Root solution, populated when completed
    pub solution: Option<R>,
    /// Failure summary, populated when failed or cancelled
    pub error: Option<FailureDetail>,
    /// Aggregate counters
    pub stats: DecompositionStats,
    /// Limits the run executed under
    pub limits: Limits,
}

impl<T, R> Decomposition<T, R> {
    /// Create a decomposition with its root node.
    pub fn new(id: impl Into<String>, root_data: T) -> Self {
        let root = Subproblem::root(root_data);
        let root_id = root.id;
        let mut decomposition = Self {
            id: id.into(),
            root_id,
            nodes: HashMap::new(),
            children: HashMap::new(),
            status: DecompositionStatus::default(),
            solution: None,
            error: None,
            stats: DecompositionStats::new(),
            limits: Limits::default(),
        };
        decomposition.insert(root);
        decomposition
    }

    /// Record the limits the run executes under, for snapshot diagnostics.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Generate a fresh run identifier.
    pub fn generate_id() -> String {
        format!("decomp-{}", Uuid::new_v4())
    }

    /// The root node.
    pub fn root(&self) -> Option<&Subproblem<T, R>> {
        self.nodes.get(&self.root_id)
    }

    /// Look up a node by id.
    pub fn subproblem(&self, id: Uuid) -> Option<&Subproblem<T, R>> {
        self.nodes.get(&id)
    }

    /// Child ids of a node, in decomposer order.
    pub fn children_of(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Iterate all nodes in no particular order.
    pub fn subproblems(&self) -> impl Iterator<Item = &Subproblem<T, R>> {
        self.nodes.values()
    }

    /// Count nodes currently in the given status.
    pub fn count_by_status(&self, status: SubproblemStatus) -> usize {
        self.nodes.values().filter(|n| n.status == status).count()
    }

    /// Insert a node, updating stats and parent adjacency.
    pub fn insert(&mut self, subproblem: Subproblem<T, R>) {
        self.stats.total_subproblems += 1;
        self.stats.pending_subproblems += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(subproblem.depth);
        if let Some(parent_id) = subproblem.parent_id {
            self.children.entry(parent_id).or_default().push(subproblem.id);
        }
        self.nodes.insert(subproblem.id, subproblem);
    }

    /// Move a node to `Solving`. Returns whether the write applied.
    pub fn mark_solving(&mut self, id: Uuid) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => node.transition_to(SubproblemStatus::Solving).is_ok(),
            None => false,
        }
    }

    /// Record a node's solution and move it to `Solved`.
    ///
    /// First terminal write wins; a node already terminal is left unchanged
    /// and `false` is returned.
    pub fn mark_solved(&mut self, id: Uuid, solution: R) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        if node.transition_to(SubproblemStatus::Solved).is_err() {
            return false;
        }
        node.solution = Some(solution);
        self.stats.solved_subproblems += 1;
        self.stats.pending_subproblems = self.stats.pending_subproblems.saturating_sub(1);
        true
    }

    /// Record a node's failure and move it to `Failed`.
    ///
    /// First terminal write wins, as with [`Self::mark_solved`].
    pub fn mark_failed(&mut self, id: Uuid, error: FailureDetail) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        if node.transition_to(SubproblemStatus::Failed).is_err() {
            return false;
        }
        node.error = Some(error);
        self.stats.failed_subproblems += 1;
        self.stats.pending_subproblems = self.stats.pending_subproblems.saturating_sub(1);
        true
    }

    /// Move the run to `InProgress`.
    pub fn begin(&mut self) -> bool {
        self.apply_status(DecompositionStatus::InProgress)
    }

    /// Terminate the run as `Completed` with the root solution.
    pub fn complete(&mut self, solution: R) -> bool {
        if !self.apply_status(DecompositionStatus::Completed) {
            return false;
        }
        self.solution = Some(solution);
        self.stats.finished_at = Some(Utc::now());
        true
    }

    /// Terminate the run as `Failed`.
    pub fn fail(&mut self, error: FailureDetail) -> bool {
        if !self.apply_status(DecompositionStatus::Failed) {
            return false;
        }
        self.error = Some(error);
        self.stats.finished_at = Some(Utc::now());
        true
    }

    /// Terminate the run as `Cancelled`.
    pub fn cancel(&mut self, error: FailureDetail) -> bool {
        if !self.apply_status(DecompositionStatus::Cancelled) {
            return false;
        }
        self.error = Some(error);
        self.stats.finished_at = Some(Utc::now());
        true
    }

    fn apply_status(&mut self, new_status: DecompositionStatus) -> bool {
        if !self.status.can_transition_to(new_status) {
            return false;
        }
        self.status = new_status;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{DecomposeError, ErrorKind};

    fn failure() -> FailureDetail {
        DecomposeError::Validation("boom".to_string()).detail()
    }

    #[test]
    fn test_new_creates_root() {
        let decomposition = Decomposition::<u64, u64>::new("run-1", 5);
        assert_eq!(decomposition.id, "run-1");
        assert_eq!(decomposition.status, DecompositionStatus::Pending);

        let root = decomposition.root().expect("root exists");
        assert_eq!(root.data, 5);
        assert_eq!(root.depth, 0);

        assert_eq!(decomposition.stats.total_subproblems, 1);
        assert_eq!(decomposition.stats.pending_subproblems, 1);
        assert_eq!(decomposition.stats.max_depth_reached, 0);
    }

    #[test]
    fn test_generated_id_shape() {
        let id = Decomposition::<u64, u64>::generate_id();
        assert!(id.starts_with("decomp-"));
    }

    #[test]
    fn test_children_preserve_insertion_order() {
        let mut decomposition = Decomposition::<u64, u64>::new("run", 10);
        let root_id = decomposition.root_id;

        for payload in [7, 3, 9] {
            let root = decomposition.root().expect("root exists");
            let child = Subproblem::child_of(root, payload);
            decomposition.insert(child);
        }

        let order: Vec<u64> = decomposition
            .children_of(root_id)
            .iter()
            .map(|id| decomposition.subproblem(*id).expect("child exists").data)
            .collect();
        assert_eq!(order, vec![7, 3, 9]);
        assert_eq!(decomposition.stats.total_subproblems, 4);
        assert_eq!(decomposition.stats.max_depth_reached, 1);
    }

    #[test]
    fn test_stats_bookkeeping() {
        let mut decomposition = Decomposition::<u64, u64>::new("run", 10);
        let root_id = decomposition.root_id;
        let root = decomposition.root().expect("root exists");
        let child = Subproblem::child_of(root, 9);
        let child_id = child.id;
        decomposition.insert(child);

        assert!(decomposition.mark_solving(child_id));
        assert_eq!(decomposition.stats.pending_subproblems, 2);

        assert!(decomposition.mark_solved(child_id, 81));
        assert_eq!(decomposition.stats.solved_subproblems, 1);
        assert_eq!(decomposition.stats.pending_subproblems, 1);

        assert!(decomposition.mark_solving(root_id));
        assert!(decomposition.mark_failed(root_id, failure()));
        assert_eq!(decomposition.stats.failed_subproblems, 1);
        assert_eq!(decomposition.stats.pending_subproblems, 0);
    }

    #[test]
    fn test_terminal_writes_are_first_wins() {
        let mut decomposition = Decomposition::<u64, u64>::new("run", 10);
        let root_id = decomposition.root_id;

        assert!(decomposition.mark_solving(root_id));
        assert!(decomposition.mark_solved(root_id, 1));
        assert!(!decomposition.mark_solved(root_id, 2));
        assert!(!decomposition.mark_failed(root_id, failure()));

        let root = decomposition.root().expect("root exists");
        assert_eq!(root.solution, Some(1));
        assert_eq!(decomposition.stats.solved_subproblems, 1);
        assert_eq!(decomposition.stats.failed_subproblems, 0);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut decomposition = Decomposition::<u64, u64>::new("run", 10);
        assert!(decomposition.begin());
        assert_eq!(decomposition.status, DecompositionStatus::InProgress);

        assert!(decomposition.complete(3_628_800));
        assert_eq!(decomposition.status, DecompositionStatus::Completed);
        assert_eq!(decomposition.solution, Some(3_628_800));
        assert!(decomposition.stats.finished_at.is_some());
        assert!(decomposition.stats.duration().is_some());

        // Terminal is final
        assert!(!decomposition.fail(failure()));
        assert_eq!(decomposition.status, DecompositionStatus::Completed);
    }

    #[test]
    fn test_cancel_before_start() {
        let mut decomposition = Decomposition::<u64, u64>::new("run", 10);
        assert!(decomposition.cancel(DecomposeError::Cancelled.detail()));
        assert_eq!(decomposition.status, DecompositionStatus::Cancelled);
        assert_eq!(decomposition.error.as_ref().map(|e| e.kind), Some(ErrorKind::Cancelled));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut decomposition = Decomposition::<u64, u64>::new("run-json", 10)
            .with_limits(Limits::default().with_max_depth(7));
        decomposition.begin();
        let json = serde_json::to_value(&decomposition).expect("serialize decomposition");
        assert_eq!(json["id"], "run-json");
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["stats"]["total_subproblems"], 1);
        // The snapshot records the limits the run executed under.
        assert_eq!(json["limits"]["max_depth"], 7);
    }
}
