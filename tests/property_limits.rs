use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use ramify::{DecompositionEngine, ErrorKind, ExecutionStrategy, FnSpace, Limits};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
}

/// Uniform tree: every composite node has `fanout` children, leaves sit at
/// a fixed depth and each carries `value`.
fn uniform_tree_space(fanout: usize) -> FnSpace<(u32, u64), u64> {
    FnSpace::builder()
        .is_base_case(|(remaining, _), _| Ok(*remaining == 0))
        .solve_base_case(|(_, value), _| Ok(*value))
        .decompose(move |(remaining, value), _| Ok(vec![(*remaining - 1, *value); fanout]))
        .combine(|_, children, _| Ok(children.into_iter().map(|(_, s)| s).sum()))
        .build()
        .expect("complete space")
}

/// Chain that never reaches a base case.
fn chain_space() -> FnSpace<u64, u64> {
    FnSpace::builder()
        .is_base_case(|_, _| Ok(false))
        .solve_base_case(|n, _| Ok(*n))
        .decompose(|n, _| Ok(vec![n + 1]))
        .combine(|_, children, _| Ok(children.into_iter().map(|(_, s)| s).sum()))
        .build()
        .expect("complete space")
}

/// Tree that widens forever, `fanout` children per node.
fn widening_space(fanout: usize) -> FnSpace<u64, u64> {
    FnSpace::builder()
        .is_base_case(|_, _| Ok(false))
        .solve_base_case(|n, _| Ok(*n))
        .decompose(move |n, _| Ok(vec![*n + 1; fanout]))
        .combine(|_, children, _| Ok(children.into_iter().map(|(_, s)| s).sum()))
        .build()
        .expect("complete space")
}

proptest! {
    /// Property: Aggregation matches the closed form
    ///
    /// For a uniform tree of known fanout and depth, the combined solution
    /// and the node counters are fully determined, under either strategy.
    #[test]
    fn prop_aggregation_matches_closed_form(
        fanout in 1usize..4,
        depth in 0u32..4,
        value in 1u64..1000,
    ) {
        let sequential = runtime()
            .block_on(
                DecompositionEngine::new(uniform_tree_space(fanout))
                    .with_strategy(ExecutionStrategy::sequential())
                    .run((depth, value)),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let concurrent = runtime()
            .block_on(
                DecompositionEngine::new(uniform_tree_space(fanout))
                    .with_strategy(ExecutionStrategy::concurrent())
                    .run((depth, value)),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let leaves = (fanout as u64).pow(depth);
        prop_assert_eq!(sequential.solution, Some(value * leaves));
        prop_assert_eq!(concurrent.solution, Some(value * leaves));

        let mut expected_total = 0usize;
        let mut level = 1usize;
        for _ in 0..=depth {
            expected_total += level;
            level *= fanout;
        }

        for outcome in [&sequential, &concurrent] {
            let stats = &outcome.decomposition.stats;
            prop_assert!(outcome.is_success());
            prop_assert_eq!(stats.total_subproblems, expected_total);
            prop_assert_eq!(stats.solved_subproblems, stats.total_subproblems);
            prop_assert_eq!(stats.failed_subproblems, 0);
            prop_assert_eq!(stats.pending_subproblems, 0);
            prop_assert_eq!(stats.max_depth_reached, depth);
        }
    }

    /// Property: The depth limit bounds the created tree
    ///
    /// An endless chain fails with a depth error exactly one level past the
    /// limit, so both the deepest node and the node count are determined.
    #[test]
    fn prop_depth_limit_bounds_created_nodes(max_depth in 0u32..20) {
        let limits = Limits::default()
            .with_max_depth(max_depth)
            .with_max_subproblems(10_000);
        let outcome = runtime()
            .block_on(
                DecompositionEngine::new(chain_space())
                    .with_limits(limits)
                    .run(0),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let err = outcome.error.expect("chain must exceed the depth limit");
        prop_assert_eq!(err.kind(), ErrorKind::DepthExceeded);

        let stats = &outcome.decomposition.stats;
        prop_assert_eq!(stats.max_depth_reached, max_depth + 1);
        prop_assert_eq!(stats.total_subproblems, max_depth as usize + 2);
        prop_assert_eq!(stats.failed_subproblems, 1);
    }

    /// Property: The count limit bounds the created tree
    ///
    /// A node passes the gate before its batch of children is created, so
    /// the overshoot is at most one sibling group.
    #[test]
    fn prop_count_limit_bounds_created_nodes(
        max_subproblems in 1usize..60,
        fanout in 1usize..5,
    ) {
        let limits = Limits::default()
            .with_max_depth(10_000)
            .with_max_breadth(fanout)
            .with_max_subproblems(max_subproblems);
        let outcome = runtime()
            .block_on(
                DecompositionEngine::new(widening_space(fanout))
                    .with_limits(limits)
                    .with_strategy(ExecutionStrategy::sequential())
                    .run(0),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let err = outcome
            .error
            .expect("unbounded tree must exceed the count limit");
        prop_assert_eq!(err.kind(), ErrorKind::SubproblemCountExceeded);

        let total = outcome.decomposition.stats.total_subproblems;
        prop_assert!(
            total <= max_subproblems + fanout,
            "total {} exceeded {} + {}",
            total,
            max_subproblems,
            fanout
        );
    }
}
