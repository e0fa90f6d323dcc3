//! Stock workflow library for reconciling sheet-driven stock changes
//!
//! This library fills the stock site's item template from a spreadsheet of
//! stock changes and uploads it through the site's UI, once for stock in and
//! once for stock out. Every external system sits behind a trait in
//! [`traits`] so the workflow can be driven by mocks or fakes in tests.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod workflow;

// Re-export commonly used types
pub use config::{Timings, WorkflowConfig};
pub use crate::core::{partition, reconcile, Partition, TemplateRow, TemplateTable};
pub use error::{BrowserError, FailureClass, WorkflowError, WorkflowResult};
pub use traits::*;
pub use workflow::{plan_passes, Pass, PassReport, Stage, StockWorkflow};
