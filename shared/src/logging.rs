//! Shared logging utilities for consistent tracing across a workflow run

use crate::types::RunId;
use chrono::Utc;
use tracing::{error, info};

/// Build the filter directive used for every component of the workflow
pub fn filter_directive(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("stock_workflow={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize tracing subscriber with an optional log level
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let directive = filter_directive(log_level);
    println!("📊 Log level: {directive}");

    // try_init so repeated calls (tests, embedding callers) are harmless
    let _ = fmt()
        .with_env_filter(EnvFilter::new(&directive))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Emit an event tagged with the run it belongs to
#[doc(hidden)]
#[macro_export]
macro_rules! run_event {
    ($level:expr, $run_id:expr, $($arg:tt)*) => {
        tracing::event!($level, run = %$run_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! run_info {
    ($run_id:expr, $($arg:tt)*) => {
        $crate::run_event!(tracing::Level::INFO, $run_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! run_warn {
    ($run_id:expr, $($arg:tt)*) => {
        $crate::run_event!(tracing::Level::WARN, $run_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! run_error {
    ($run_id:expr, $($arg:tt)*) => {
        $crate::run_event!(tracing::Level::ERROR, $run_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! run_debug {
    ($run_id:expr, $($arg:tt)*) => {
        $crate::run_event!(tracing::Level::DEBUG, $run_id, $($arg)*)
    };
}

pub fn log_startup(run_id: &RunId, details: &str) {
    info!(run = %run_id, started_at = %Utc::now().to_rfc3339(), "🚀 Starting {details}");
}

/// Failure of one step of the run; the error is also attached as a field
pub fn log_error(run_id: &RunId, context: &str, error: &dyn std::fmt::Display) {
    error!(run = %run_id, error = %error, "❌ {context} failed: {error}");
}

pub fn log_success(run_id: &RunId, message: &str) {
    info!(run = %run_id, "✅ {message}");
}

/// Milestone inside a run, e.g. a partition summary or a reconciled pass
pub fn log_progress(run_id: &RunId, action: &str, details: &str) {
    info!(run = %run_id, "📋 {action}: {details}");
}
