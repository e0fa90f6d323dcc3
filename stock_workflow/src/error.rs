//! Workflow-specific error types

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use shared::SharedError;

use crate::core::template::TemplateError;

/// Whether a failure is worth repeating the same action for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Fatal,
}

/// Failures raised by the browser boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Timed out after {waited:?} waiting for {locator} to be {condition}")]
    Timeout {
        locator: String,
        condition: String,
        waited: Duration,
    },

    #[error("Stale element reference: {locator}")]
    StaleElement { locator: String },

    #[error("No such element: {locator}")]
    NoSuchElement { locator: String },

    #[error("Browser session error: {message}")]
    Session { message: String },

    #[error("WebDriver protocol error ({code}): {message}")]
    Protocol { code: String, message: String },

    #[error("WebDriver transport error: {message}")]
    Http { message: String },
}

impl BrowserError {
    pub fn timeout(locator: impl ToString, condition: &str, waited: Duration) -> Self {
        Self::Timeout {
            locator: locator.to_string(),
            condition: condition.to_string(),
            waited,
        }
    }

    pub fn stale(locator: impl ToString) -> Self {
        Self::StaleElement {
            locator: locator.to_string(),
        }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Timeouts and stale references are transient, everything else is fatal
    pub fn class(&self) -> FailureClass {
        match self {
            BrowserError::Timeout { .. } | BrowserError::StaleElement { .. } => FailureClass::Transient,
            _ => FailureClass::Fatal,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Browser interaction failed: {0}")]
    Browser(#[from] BrowserError),

    #[error("Template download did not appear in {dir} within {waited:?}")]
    DownloadTimeout { dir: PathBuf, waited: Duration },

    #[error("Record source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Template {operation} failed on {path}: {source}")]
    ArtifactIo {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {path} is missing required columns: {}", missing.join(", "))]
    TemplateSchema { path: PathBuf, missing: Vec<String> },

    #[error("Template {path} has no item rows")]
    EmptyTemplate { path: PathBuf },

    #[error("Missing credentials for {location}: {}", keys.join(", "))]
    MissingCredentials { location: String, keys: Vec<String> },

    #[error("Configuration error: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),
}

impl WorkflowError {
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable { reason: reason.into() }
    }

    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            reason: reason.into(),
        }
    }

    pub fn artifact_io(operation: &str, path: &Path, source: std::io::Error) -> Self {
        Self::ArtifactIo {
            operation: operation.to_string(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Codec failures are reported as I/O on the artifact; a missing column is a schema error
    pub fn template(operation: &str, path: &Path, error: TemplateError) -> Self {
        let source = match error {
            TemplateError::MissingColumns(missing) => {
                return Self::TemplateSchema {
                    path: path.to_path_buf(),
                    missing,
                };
            }
            TemplateError::Csv(e) => match e.into_kind() {
                csv::ErrorKind::Io(io) => io,
                other => std::io::Error::new(std::io::ErrorKind::InvalidData, format!("{other:?}")),
            },
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
        };
        Self::artifact_io(operation, path, source)
    }

    pub fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
