//! Pure reconciliation logic
//!
//! Nothing in here touches the file system, the network or the browser.

pub mod partitioner;
pub mod reconciler;
pub mod size_matcher;
pub mod template;

pub use partitioner::{partition, Partition};
pub use reconciler::{reconcile, RowMatch};
pub use size_matcher::{SizeGroup, SizeMatch};
pub use template::{TemplateError, TemplateFormat, TemplateRow, TemplateTable};
