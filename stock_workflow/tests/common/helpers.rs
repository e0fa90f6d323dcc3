//! Test helpers and builder patterns for workflow tests
//!
//! This module provides convenient helper functions and builder patterns
//! to reduce test boilerplate and improve maintainability.

use std::path::{Path, PathBuf};

use shared::{Outcome, OutcomeStatus, RemoteRecord};
use stock_workflow::config::{SiteConfig, TemplateConfig, Timings};
use stock_workflow::services::EnvCredentialSource;
use stock_workflow::*;
use tempfile::TempDir;

use super::fixtures::{FakeLauncher, RecordingBrowser, TestFixtures};

pub type TestWorkflow = StockWorkflow<MockRecordSource, EnvCredentialSource, FakeLauncher>;

/// Workflow under test plus the handles needed to inspect it afterwards
pub struct TestRun {
    pub workflow: TestWorkflow,
    pub browser: RecordingBrowser,
    pub work_dir: PathBuf,
    // Keeps the working directory alive for the duration of the test
    _temp: TempDir,
}

impl TestRun {
    pub async fn run(&self) -> Outcome {
        self.workflow.run_stock_workflow(TestFixtures::LOCATION).await
    }

    pub async fn run_at(&self, location: &str) -> Outcome {
        self.workflow.run_stock_workflow(location).await
    }
}

/// Builder pattern for creating test workflows with sensible defaults
pub struct WorkflowBuilder {
    records: Result<Vec<RemoteRecord>, String>,
    with_credentials: bool,
    browser: RecordingBrowser,
    timings: Timings,
    template_extension: String,
}

impl WorkflowBuilder {
    /// Credentials present, empty record source, fake site with a template to download
    pub fn new() -> Self {
        Self {
            records: Ok(Vec::new()),
            with_credentials: true,
            browser: RecordingBrowser::new(),
            timings: Timings::immediate(),
            template_extension: "csv".to_string(),
        }
    }

    pub fn with_records(mut self, records: Vec<RemoteRecord>) -> Self {
        self.records = Ok(records);
        self
    }

    /// Record source that fails with `SourceUnavailable`
    pub fn with_unavailable_source(mut self, reason: &str) -> Self {
        self.records = Err(reason.to_string());
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.with_credentials = false;
        self
    }

    /// Site that hands out `.xlsx` workbooks, with the store expecting them
    pub fn with_workbook_template(mut self) -> Self {
        self.template_extension = "xlsx".to_string();
        self.browser = self.browser.serving_workbook();
        self
    }

    /// Configure the fake browser with a setup function
    pub fn with_browser<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(RecordingBrowser) -> RecordingBrowser,
    {
        self.browser = setup(self.browser);
        self
    }

    pub fn build(self) -> TestRun {
        let temp = tempfile::tempdir().unwrap();

        let mut records = MockRecordSource::new();
        match self.records {
            Ok(rows) => {
                records.expect_fetch_records().returning(move || Ok(rows.clone()));
            }
            Err(reason) => {
                records
                    .expect_fetch_records()
                    .returning(move || Err(WorkflowError::source_unavailable(reason.clone())));
            }
        }

        let (user_key, password_key) = EnvCredentialSource::key_names(TestFixtures::LOCATION);
        let credentials = if self.with_credentials {
            EnvCredentialSource::from_pairs([
                (user_key, TestFixtures::USERNAME.to_string()),
                (password_key, TestFixtures::PASSWORD.to_string()),
            ])
        } else {
            EnvCredentialSource::from_pairs(Vec::<(String, String)>::new())
        };

        let config = WorkflowConfig {
            base_dir: temp.path().to_path_buf(),
            site: SiteConfig {
                login_url: TestFixtures::LOGIN_URL.to_string(),
                ..SiteConfig::default()
            },
            template: TemplateConfig {
                extension: self.template_extension,
                ..TemplateConfig::default()
            },
            timings: self.timings,
            ..WorkflowConfig::default()
        };
        let work_dir = config.work_dir(TestFixtures::LOCATION);

        let workflow = StockWorkflow::new(records, credentials, FakeLauncher::new(self.browser.clone()), config);

        TestRun {
            workflow,
            browser: self.browser,
            work_dir,
            _temp: temp,
        }
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Test helper functions for common operations and assertions
pub struct TestHelpers;

impl TestHelpers {
    pub fn assert_status(outcome: &Outcome, status: OutcomeStatus) {
        assert_eq!(
            outcome.status, status,
            "unexpected outcome for {}: {}",
            outcome.location, outcome.detail
        );
    }

    /// Number of CSV or workbook templates in `dir`
    pub fn template_files(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| {
                    let name = e.file_name().to_string_lossy().to_string();
                    name.ends_with(".csv") || name.ends_with(".xlsx")
                })
                .count(),
            Err(_) => 0,
        }
    }

    pub fn clicked(browser: &RecordingBrowser, locator: &Locator) -> usize {
        browser.count(&format!("click {locator}"))
    }

    /// Calls other than login, navigation and session release
    pub fn ui_actions(browser: &RecordingBrowser) -> Vec<String> {
        browser
            .calls()
            .into_iter()
            .filter(|c| {
                !(c.starts_with("navigate ")
                    || c == "current_url"
                    || c == "quit"
                    || c.starts_with("wait_present name=")
                    || c.starts_with("send_keys name=")
                    || c.starts_with("submit name="))
            })
            .collect()
    }
}
