//! Domain layer for the Ramify decomposition engine
//!
//! This module contains the core domain models and port definitions.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{CallbackPhase, DecomposeError, DecomposeResult, ErrorKind, FailureDetail};
