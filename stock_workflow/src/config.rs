//! Workflow configuration
//!
//! Values come from three layers, later ones winning: built-in defaults, the
//! process environment (optionally seeded from a `.env` file), and the CLI
//! flags applied by the binary.
//!
//! ## Environment
//! - `ITEMS_SPREADSHEET_ID`: spreadsheet holding the change records (required to fetch)
//! - `ITEMS_SHEET_RANGE`: A1 range of the records, default `Sheet2!A2:F`
//! - Sheets API credential, first match wins: `GOOGLE_SHEETS_ACCESS_TOKEN`
//!   (a bearer token), `GOOGLE_APPLICATION_CREDENTIALS` (a service-account
//!   key file), `GOOGLE_API_KEY`, then `service_account_key.json` in the
//!   working directory when it exists
//! - `STOCK_SITE_LOGIN_URL`: login page of the stock site
//! - `WEBDRIVER_URL`: WebDriver endpoint, default `http://localhost:9515`
//! - `STOCK_WORKFLOW_BASE_DIR`: root for per-location working directories

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOGIN_URL: &str = "https://fronocloud.com/login";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet2!A2:F";
/// Key file picked up from the working directory when nothing else is configured
pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "service_account_key.json";

/// Stock site addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub login_url: String,
    /// Path segment the site lands on after login
    pub dashboard_path: String,
    /// Path segment of the stock in/out page
    pub stock_page_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            dashboard_path: "/dashboard".to_string(),
            stock_page_path: "/stockinout".to_string(),
        }
    }
}

/// How the Sheets API call authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetAuth {
    ApiKey(String),
    BearerToken(String),
    /// Service-account key file; a token is minted for each fetch
    ServiceAccount(PathBuf),
    None,
}

/// Location of the change records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub spreadsheet_id: Option<String>,
    pub range: String,
    pub auth: SheetAuth,
    pub api_base: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            range: DEFAULT_SHEET_RANGE.to_string(),
            auth: SheetAuth::None,
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
        }
    }
}

/// Template artifact naming in the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Extension without the dot
    pub extension: String,
    /// Suffix the browser gives to downloads still in flight
    pub partial_suffix: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            extension: "xlsx".to_string(),
            partial_suffix: ".crdownload".to_string(),
        }
    }
}

/// Every wait the workflow performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// Upper bound on a single wait for a UI element
    pub ui_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    /// Pause after login before reading the landing URL
    pub login_settle: Duration,
    /// Pause after selecting a direction or opening a dialog
    pub step_settle: Duration,
    /// Pause before handing the artifact to the file input
    pub pre_upload_settle: Duration,
    /// Pause after confirming an upload
    pub post_upload_settle: Duration,
    /// Pause after the page refresh between passes
    pub refresh_settle: Duration,
    pub download_poll_interval: Duration,
    pub download_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            ui_timeout: Duration::from_secs(10),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            login_settle: Duration::from_secs(1),
            step_settle: Duration::from_secs(2),
            pre_upload_settle: Duration::from_secs(2),
            post_upload_settle: Duration::from_secs(3),
            refresh_settle: Duration::from_secs(3),
            download_poll_interval: Duration::from_secs(1),
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl Timings {
    /// No settling and millisecond waits, for driving fakes
    pub fn immediate() -> Self {
        Self {
            ui_timeout: Duration::from_millis(50),
            retry_attempts: 3,
            retry_delay: Duration::ZERO,
            login_settle: Duration::ZERO,
            step_settle: Duration::ZERO,
            pre_upload_settle: Duration::ZERO,
            post_upload_settle: Duration::ZERO,
            refresh_settle: Duration::ZERO,
            download_poll_interval: Duration::from_millis(5),
            download_timeout: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub base_dir: PathBuf,
    pub webdriver_url: String,
    pub headless: bool,
    pub site: SiteConfig,
    pub sheet: SheetConfig,
    pub template: TemplateConfig,
    pub timings: Timings,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            site: SiteConfig::default(),
            sheet: SheetConfig::default(),
            template: TemplateConfig::default(),
            timings: Timings::default(),
        }
    }
}

impl WorkflowConfig {
    /// Load `.env` if present, then overlay the process environment on the defaults
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        if config.sheet.auth == SheetAuth::None && Path::new(DEFAULT_SERVICE_ACCOUNT_FILE).is_file() {
            config.sheet.auth = SheetAuth::ServiceAccount(PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE));
        }
        config
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = non_empty("STOCK_WORKFLOW_BASE_DIR") {
            config.base_dir = PathBuf::from(dir);
        }
        if let Some(url) = non_empty("WEBDRIVER_URL") {
            config.webdriver_url = url;
        }
        if let Some(url) = non_empty("STOCK_SITE_LOGIN_URL") {
            config.site.login_url = url;
        }

        config.sheet.spreadsheet_id = non_empty("ITEMS_SPREADSHEET_ID");
        if let Some(range) = non_empty("ITEMS_SHEET_RANGE") {
            config.sheet.range = range;
        }
        config.sheet.auth = if let Some(token) = non_empty("GOOGLE_SHEETS_ACCESS_TOKEN") {
            SheetAuth::BearerToken(token)
        } else if let Some(path) = non_empty("GOOGLE_APPLICATION_CREDENTIALS") {
            SheetAuth::ServiceAccount(PathBuf::from(path))
        } else if let Some(key) = non_empty("GOOGLE_API_KEY") {
            SheetAuth::ApiKey(key)
        } else {
            SheetAuth::None
        };

        config
    }

    /// Per-location working directory that receives the template download
    pub fn work_dir(&self, location: &str) -> PathBuf {
        work_dir_for(&self.base_dir, location)
    }
}

pub fn work_dir_for(base_dir: &Path, location: &str) -> PathBuf {
    base_dir.join(location).join("stock_in_data")
}
