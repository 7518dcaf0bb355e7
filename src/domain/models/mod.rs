pub mod decomposition;
pub mod limits;
pub mod subproblem;

pub use decomposition::{Decomposition, DecompositionStats, DecompositionStatus};
pub use limits::Limits;
pub use subproblem::{Subproblem, SubproblemStatus};
