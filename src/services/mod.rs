pub mod decomposition_engine;
pub mod event_stream;
pub mod limit_checker;
pub mod solution_combiner;

pub use decomposition_engine::{DecompositionEngine, DecompositionOutcome, ExecutionStrategy};
pub use event_stream::{DecompositionEvent, EventKind, EventSink};
pub use limit_checker::LimitChecker;
pub use solution_combiner::SolutionCombiner;
