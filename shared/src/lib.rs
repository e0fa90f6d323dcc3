//! Shared types for the stock reconciliation workflow
//!
//! Contains the values that cross the workflow boundary: the upstream
//! change records, the per-run outcome handed back to callers, and the
//! logging helpers every component uses.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
