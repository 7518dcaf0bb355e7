//! Safety limits for decomposition runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Safety limits applied to every decomposition run.
///
/// Depth, node count, and wall-clock budget are checked before each node is
/// processed; breadth is applied by truncating each decomposer result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum node depth (root is 0).
    pub max_depth: u32,
    /// Children kept per decompose call; later children are dropped.
    pub max_breadth: usize,
    /// Maximum nodes created across the whole run.
    pub max_subproblems: usize,
    /// Wall-clock budget for the whole run.
    pub timeout: Duration,
}

impl Limits {
    /// Default maximum depth.
    pub const DEFAULT_MAX_DEPTH: u32 = 10;
    /// Default maximum children per node.
    pub const DEFAULT_MAX_BREADTH: usize = 10;
    /// Default maximum nodes per run.
    pub const DEFAULT_MAX_SUBPROBLEMS: usize = 1000;
    /// Default wall-clock budget.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Set the depth limit.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the breadth limit.
    pub fn with_max_breadth(mut self, max_breadth: usize) -> Self {
        self.max_breadth = max_breadth;
        self
    }

    /// Set the node budget.
    pub fn with_max_subproblems(mut self, max_subproblems: usize) -> Self {
        self.max_subproblems = max_subproblems;
        self
    }

    /// Set the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate limits.
    ///
    /// `max_depth` of zero is legal and means the root must be a base case.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_breadth == 0 {
            return Err("max_breadth must be at least 1".to_string());
        }
        if self.max_subproblems == 0 {
            return Err("max_subproblems must be at least 1".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_breadth: Self::DEFAULT_MAX_BREADTH,
            max_subproblems: Self::DEFAULT_MAX_SUBPROBLEMS,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}
