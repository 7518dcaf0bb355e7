//! Ramify - Recursive Problem Decomposition Engine
//!
//! Ramify solves problems by recursively splitting them into subproblems,
//! solving the base cases, and combining child solutions back up the tree.
//! Callers describe their domain through the [`ProblemSpace`] trait (or ad
//! hoc with [`FnSpace`] closures); the engine supplies recursion management,
//! safety limits, sequential or concurrent sibling evaluation, cancellation,
//! and a live event stream.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Decomposition tree models, limits, errors,
//!   and the problem space ports
//! - **Service Layer** (`services`): The engine and its supporting services
//!
//! # Example
//!
//! ```
//! use ramify::{DecompositionEngine, FnSpace};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let space = FnSpace::<u64, u64>::builder()
//!         .is_base_case(|n, _depth| Ok(*n <= 1))
//!         .solve_base_case(|_n, _depth| Ok(1))
//!         .decompose(|n, _depth| Ok(vec![n - 1]))
//!         .combine(|n, children, _depth| {
//!             Ok(children.into_iter().map(|(_, r)| r).product::<u64>() * n)
//!         })
//!         .build()?;
//!
//!     let outcome = DecompositionEngine::new(space).run(5).await?;
//!     assert_eq!(outcome.solution, Some(120));
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{
    CallbackPhase, DecomposeError, DecomposeResult, ErrorKind, FailureDetail,
};
pub use domain::models::{
    Decomposition, DecompositionStats, DecompositionStatus, Limits, Subproblem, SubproblemStatus,
};
pub use domain::ports::{FnSpace, FnSpaceBuilder, ProblemSpace};
pub use services::{
    DecompositionEngine, DecompositionEvent, DecompositionOutcome, EventKind, EventSink,
    ExecutionStrategy, LimitChecker, SolutionCombiner,
};
pub use tokio_util::sync::CancellationToken;

/// Decompose `problem` with default limits and strategy.
///
/// Convenience wrapper over [`DecompositionEngine`] for one-off runs that do
/// not need custom configuration or event streaming.
///
/// # Examples
///
/// ```
/// use ramify::{decompose, FnSpace};
///
/// # tokio_test::block_on(async {
/// let space = FnSpace::<u64, u64>::builder()
///     .is_base_case(|n, _| Ok(*n == 0))
///     .solve_base_case(|_, _| Ok(0))
///     .decompose(|n, _| Ok(vec![n - 1]))
///     .combine(|n, children, _| Ok(children[0].1 + n))
///     .build()?;
///
/// let outcome = decompose(space, 4).await?;
/// assert_eq!(outcome.solution, Some(10));
/// # anyhow::Ok(())
/// # }).unwrap();
/// ```
pub async fn decompose<S: ProblemSpace>(
    space: S,
    problem: S::Problem,
) -> DecomposeResult<DecompositionOutcome<S::Problem, S::Solution>> {
    DecompositionEngine::new(space).run(problem).await
}
