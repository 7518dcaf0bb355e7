//! Limit checking for decomposition runs.
//!
//! Checks run before every node is processed, in a fixed order: depth,
//! then node count, then wall-clock timeout. The first violation wins.

use std::time::Duration;

use crate::domain::errors::{DecomposeError, DecomposeResult};
use crate::domain::models::Limits;

/// Stateless limit checker.
///
/// All inputs are passed in explicitly, so checks are pure and direct to
/// test: the engine supplies the node's depth, the current node total, and
/// the elapsed time since the run started.
pub struct LimitChecker;

impl LimitChecker {
    /// Check all limits in order: depth, count, timeout.
    pub fn check(
        limits: &Limits,
        depth: u32,
        total_subproblems: usize,
        elapsed: Duration,
    ) -> DecomposeResult<()> {
        Self::check_depth(limits, depth)?;
        Self::check_count(limits, total_subproblems)?;
        Self::check_timeout(limits, elapsed)?;
        Ok(())
    }

    /// Reject nodes deeper than the configured maximum.
    pub fn check_depth(limits: &Limits, depth: u32) -> DecomposeResult<()> {
        if depth > limits.max_depth {
            return Err(DecomposeError::DepthExceeded {
                depth,
                max_depth: limits.max_depth,
            });
        }
        Ok(())
    }

    /// Reject runs that created more nodes than the configured budget.
    pub fn check_count(limits: &Limits, total_subproblems: usize) -> DecomposeResult<()> {
        if total_subproblems > limits.max_subproblems {
            return Err(DecomposeError::SubproblemCountExceeded {
                total: total_subproblems,
                max_subproblems: limits.max_subproblems,
            });
        }
        Ok(())
    }

    /// Reject runs that outlived their wall-clock budget.
    pub fn check_timeout(limits: &Limits, elapsed: Duration) -> DecomposeResult<()> {
        if elapsed > limits.timeout {
            return Err(DecomposeError::TimedOut {
                elapsed,
                timeout: limits.timeout,
            });
        }
        Ok(())
    }
}
