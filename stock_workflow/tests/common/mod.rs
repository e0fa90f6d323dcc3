//! Common test utilities and infrastructure
//!
//! This module provides shared test utilities, fixtures, and helpers
//! used across all workflow test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::{RecordingBrowser, TestFixtures};
pub use helpers::{TestHelpers, WorkflowBuilder};
