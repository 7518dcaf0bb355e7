//! Closure-backed problem space.
//!
//! [`FnSpace`] adapts plain closures to the [`ProblemSpace`] port so small
//! problem spaces don't need a hand-written trait impl. Closures are
//! synchronous; implement the trait directly when callbacks need to await.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::errors::{DecomposeError, DecomposeResult};
use crate::domain::ports::problem_space::ProblemSpace;

type BasePredicateFn<T> = Arc<dyn Fn(&T, u32) -> Result<bool> + Send + Sync>;
type SolveFn<T, R> = Arc<dyn Fn(&T, u32) -> Result<R> + Send + Sync>;
type DecomposeFn<T> = Arc<dyn Fn(&T, u32) -> Result<Vec<T>> + Send + Sync>;
type CombineFn<T, R> = Arc<dyn Fn(&T, Vec<(T, R)>, u32) -> Result<R> + Send + Sync>;
type FilterFn<T, R> = Arc<dyn Fn(&T, u32, Option<&R>) -> Result<bool> + Send + Sync>;

/// A [`ProblemSpace`] assembled from closures.
///
/// Built via [`FnSpace::builder`]; the builder rejects configurations with
/// any of the four required callbacks missing.
#[derive(Clone)]
pub struct FnSpace<T, R> {
    is_base_case: BasePredicateFn<T>,
    solve_base_case: SolveFn<T, R>,
    decompose: DecomposeFn<T>,
    combine: CombineFn<T, R>,
    should_process: Option<FilterFn<T, R>>,
}

impl<T, R> FnSpace<T, R> {
    /// Start building a closure-backed problem space.
    pub fn builder() -> FnSpaceBuilder<T, R> {
        FnSpaceBuilder::new()
    }
}

impl<T, R> std::fmt::Debug for FnSpace<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSpace")
            .field("has_filter", &self.should_process.is_some())
            .finish()
    }
}

#[async_trait]
impl<T, R> ProblemSpace for FnSpace<T, R>
where
    T: Clone + Send + Sync,
    R: Clone + Send + Sync,
{
    type Problem = T;
    type Solution = R;

    async fn is_base_case(&self, problem: &T, depth: u32) -> Result<bool> {
        (self.is_base_case)(problem, depth)
    }

    async fn solve_base_case(&self, problem: &T, depth: u32) -> Result<R> {
        (self.solve_base_case)(problem, depth)
    }

    async fn decompose(&self, problem: &T, depth: u32) -> Result<Vec<T>> {
        (self.decompose)(problem, depth)
    }

    async fn combine(&self, problem: &T, children: Vec<(T, R)>, depth: u32) -> Result<R> {
        (self.combine)(problem, children, depth)
    }

    async fn should_process(
        &self,
        child: &T,
        depth: u32,
        parent_partial: Option<&R>,
    ) -> Result<bool> {
        match &self.should_process {
            Some(filter) => filter(child, depth, parent_partial),
            None => Ok(true),
        }
    }
}

/// Builder for [`FnSpace`].
///
/// `build` fails with a validation error naming the first missing required
/// callback.
pub struct FnSpaceBuilder<T, R> {
    is_base_case: Option<BasePredicateFn<T>>,
    solve_base_case: Option<SolveFn<T, R>>,
    decompose: Option<DecomposeFn<T>>,
    combine: Option<CombineFn<T, R>>,
    should_process: Option<FilterFn<T, R>>,
}

impl<T, R> FnSpaceBuilder<T, R> {
    pub fn new() -> Self {
        Self {
            is_base_case: None,
            solve_base_case: None,
            decompose: None,
            combine: None,
            should_process: None,
        }
    }

    /// Set the base-case predicate.
    pub fn is_base_case(mut self, f: impl Fn(&T, u32) -> Result<bool> + Send + Sync + 'static) -> Self {
        self.is_base_case = Some(Arc::new(f));
        self
    }

    /// Set the base-case solver.
    pub fn solve_base_case(mut self, f: impl Fn(&T, u32) -> Result<R> + Send + Sync + 'static) -> Self {
        self.solve_base_case = Some(Arc::new(f));
        self
    }

    /// Set the decomposer.
    pub fn decompose(mut self, f: impl Fn(&T, u32) -> Result<Vec<T>> + Send + Sync + 'static) -> Self {
        self.decompose = Some(Arc::new(f));
        self
    }

    /// Set the solution combiner.
    pub fn combine(
        mut self,
        f: impl Fn(&T, Vec<(T, R)>, u32) -> Result<R> + Send + Sync + 'static,
    ) -> Self {
        self.combine = Some(Arc::new(f));
        self
    }

    /// Set the optional subproblem filter.
    pub fn should_process(
        mut self,
        f: impl Fn(&T, u32, Option<&R>) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        self.should_process = Some(Arc::new(f));
        self
    }

    /// Assemble the space, rejecting incomplete configurations.
    pub fn build(self) -> DecomposeResult<FnSpace<T, R>> {
        let is_base_case = self
            .is_base_case
            .ok_or_else(|| DecomposeError::Validation("is_base_case callback is required".to_string()))?;
        let solve_base_case = self
            .solve_base_case
            .ok_or_else(|| DecomposeError::Validation("solve_base_case callback is required".to_string()))?;
        let decompose = self
            .decompose
            .ok_or_else(|| DecomposeError::Validation("decompose callback is required".to_string()))?;
        let combine = self
            .combine
            .ok_or_else(|| DecomposeError::Validation("combine callback is required".to_string()))?;

        Ok(FnSpace {
            is_base_case,
            solve_base_case,
            decompose,
            combine,
            should_process: self.should_process,
        })
    }
}

impl<T, R> Default for FnSpaceBuilder<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    fn complete_builder() -> FnSpaceBuilder<u64, u64> {
        FnSpace::builder()
            .is_base_case(|n, _| Ok(*n <= 1))
            .solve_base_case(|_, _| Ok(1))
            .decompose(|n, _| Ok(vec![n - 1]))
            .combine(|n, children, _| {
                Ok(children.into_iter().map(|(_, s)| s).product::<u64>() * *n)
            })
    }

    #[tokio::test]
    async fn test_callbacks_are_forwarded() {
        let space = complete_builder().build().expect("complete builder");

        assert!(space.is_base_case(&1, 0).await.expect("predicate"));
        assert!(!space.is_base_case(&5, 0).await.expect("predicate"));
        assert_eq!(space.solve_base_case(&1, 0).await.expect("solve"), 1);
        assert_eq!(space.decompose(&5, 0).await.expect("decompose"), vec![4]);
        assert_eq!(
            space.combine(&5, vec![(4, 24)], 0).await.expect("combine"),
            120
        );
    }

    #[tokio::test]
    async fn test_filter_defaults_to_accept() {
        let space = complete_builder().build().expect("complete builder");
        assert!(space.should_process(&3, 1, None).await.expect("filter"));

        let space = complete_builder()
            .should_process(|n, _, _| Ok(n % 2 == 0))
            .build()
            .expect("complete builder with filter");
        assert!(space.should_process(&4, 1, None).await.expect("filter"));
        assert!(!space.should_process(&3, 1, None).await.expect("filter"));
    }

    #[test]
    fn test_build_rejects_missing_callbacks() {
        let err = FnSpace::<u64, u64>::builder()
            .is_base_case(|n, _| Ok(*n <= 1))
            .build()
            .expect_err("incomplete builder");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("solve_base_case"));

        let err = FnSpace::<u64, u64>::builder()
            .build()
            .expect_err("empty builder");
        assert!(err.to_string().contains("is_base_case"));
    }
}
