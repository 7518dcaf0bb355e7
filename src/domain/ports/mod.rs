//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the seam between the engine and caller code:
//! - `ProblemSpace`: the callback contract a problem type must implement
//! - `FnSpace`: a closure-backed `ProblemSpace` for the common case
//!
//! The engine depends only on these traits, never on concrete spaces.

pub mod fn_space;
pub mod problem_space;

pub use fn_space::{FnSpace, FnSpaceBuilder};
pub use problem_space::ProblemSpace;
