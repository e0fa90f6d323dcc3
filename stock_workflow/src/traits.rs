//! Trait definitions with mockall annotations for testing
//!
//! These are the seams between the workflow and the outside world: the
//! upstream record source, the credential store for the stock site, and the
//! browser session that drives the site's UI. Every trait is object safe so
//! the workflow can hold the browser as a boxed session.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use shared::RemoteRecord;

use crate::error::{BrowserError, WorkflowResult};

/// Opaque selector understood by the browser collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Id(String),
    Name(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(expr) => write!(f, "xpath={expr}"),
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Name(name) => write!(f, "name={name}"),
        }
    }
}

/// Login for the stock site
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upstream source of stock change records
#[mockall::automock]
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every change record for this run
    ///
    /// # Returns
    /// The records in source order. An empty source is `Ok(vec![])`;
    /// `SourceUnavailable` when the source cannot be reached or is not configured.
    async fn fetch_records(&self) -> WorkflowResult<Vec<RemoteRecord>>;
}

/// Credential lookup for the stock site, keyed by location
#[mockall::automock]
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Resolve the site login for a location
    ///
    /// # Returns
    /// `MissingCredentials` naming every absent key
    async fn credentials(&self, location: &str) -> WorkflowResult<Credentials>;
}

/// Primitive interactions with one browser session
///
/// Every method may fail with a transient `BrowserError` (timeout or stale
/// element); callers wrap them in a `RetryPolicy`.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn refresh_page(&self) -> Result<(), BrowserError>;

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError>;

    /// Clear the element and type `text` into it
    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    /// Clear the element, type `text` and press Enter
    async fn type_and_submit(&self, locator: &Locator, text: &str) -> Result<(), BrowserError>;

    async fn wait_until_present(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    async fn wait_until_clickable(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    /// Hand a local file path to a file input element
    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), BrowserError>;

    /// End the session and release the browser
    async fn quit(&self) -> Result<(), BrowserError>;
}

/// Factory for browser sessions
#[mockall::automock]
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open a session whose downloads land in `download_dir`
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn Browser>, BrowserError>;
}
