use anyhow::Result;
use async_trait::async_trait;

/// Port for caller-supplied problem-space callbacks.
///
/// A problem space tells the engine how to recognize and solve base cases,
/// how to split composite problems into ordered subproblems, and how to
/// combine child solutions into a parent solution. The engine owns
/// everything else: tree bookkeeping, limit checks, ordering, concurrency,
/// and failure propagation.
///
/// All methods receive the node's depth (root is 0) and may fail; a
/// returned error fails the whole run with the offending node attached.
///
/// # Examples
///
/// ```
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use ramify::domain::ports::ProblemSpace;
///
/// struct Fibonacci;
///
/// #[async_trait]
/// impl ProblemSpace for Fibonacci {
///     type Problem = u64;
///     type Solution = u64;
///
///     async fn is_base_case(&self, problem: &u64, _depth: u32) -> Result<bool> {
///         Ok(*problem <= 1)
///     }
///
///     async fn solve_base_case(&self, problem: &u64, _depth: u32) -> Result<u64> {
///         Ok(*problem)
///     }
///
///     async fn decompose(&self, problem: &u64, _depth: u32) -> Result<Vec<u64>> {
///         Ok(vec![problem - 1, problem - 2])
///     }
///
///     async fn combine(
///         &self,
///         _problem: &u64,
///         children: Vec<(u64, u64)>,
///         _depth: u32,
///     ) -> Result<u64> {
///         Ok(children.into_iter().map(|(_, solution)| solution).sum())
///     }
/// }
/// ```
#[async_trait]
pub trait ProblemSpace: Send + Sync {
    /// The problem payload type carried by tree nodes.
    type Problem: Clone + Send + Sync;
    /// The solution type produced for solved nodes.
    type Solution: Clone + Send + Sync;

    /// Decide whether a problem is directly solvable.
    ///
    /// # Arguments
    ///
    /// * `problem` - The node's payload
    /// * `depth` - The node's depth (root is 0)
    async fn is_base_case(&self, problem: &Self::Problem, depth: u32) -> Result<bool>;

    /// Solve a base-case problem directly.
    async fn solve_base_case(&self, problem: &Self::Problem, depth: u32)
        -> Result<Self::Solution>;

    /// Split a composite problem into smaller subproblems.
    ///
    /// The returned order is significant: children are created, evaluated
    /// for ordering purposes, and handed to [`Self::combine`] in exactly
    /// this order.
    async fn decompose(&self, problem: &Self::Problem, depth: u32) -> Result<Vec<Self::Problem>>;

    /// Combine child solutions into the parent's solution.
    ///
    /// # Arguments
    ///
    /// * `problem` - The parent node's payload
    /// * `children` - Each retained child's payload paired with its
    ///   solution, in decomposer order
    /// * `depth` - The parent node's depth
    async fn combine(
        &self,
        problem: &Self::Problem,
        children: Vec<(Self::Problem, Self::Solution)>,
        depth: u32,
    ) -> Result<Self::Solution>;

    /// Decide whether a decomposed child should be processed at all.
    ///
    /// Returning `Ok(false)` skips the child silently: no node is created
    /// and [`Self::combine`] never sees it. `parent_partial` is reserved
    /// for partial parent solutions and is currently always `None`.
    async fn should_process(
        &self,
        child: &Self::Problem,
        depth: u32,
        parent_partial: Option<&Self::Solution>,
    ) -> Result<bool> {
        let _ = (child, depth, parent_partial);
        Ok(true)
    }
}
