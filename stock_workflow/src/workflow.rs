//! End-to-end stock reconciliation run
//!
//! One run logs in, fetches the change records, splits them by direction and
//! then executes one pass per direction, stock in first. The passes share a
//! single template artifact and the page is refreshed between them because
//! the site keeps UI state across a submission. Every failure is folded into
//! the returned `Outcome`; the browser session is released on every path.

use std::fmt;

use shared::logging::{log_error, log_progress, log_startup, log_success};
use shared::{run_debug, run_info, run_warn, Direction, Outcome, RemoteRecord, RunId};

use crate::config::WorkflowConfig;
use crate::core::{partition, reconcile, Partition};
use crate::error::{WorkflowError, WorkflowResult};
use crate::services::{SiteLogin, TemplateStore, UiActuator};
use crate::traits::{Browser, BrowserLauncher, CredentialSource, Credentials, RecordSource};

/// Locators for the stock in/out page
pub mod ui {
    use shared::Direction;

    use crate::traits::Locator;

    pub fn direction_option(direction: Direction) -> Locator {
        Locator::xpath(format!(
            "//select[@id='basicSelect']/option[text()='{}']",
            direction.label()
        ))
    }

    pub fn add_new_stock() -> Locator {
        Locator::xpath("//button[contains(text(), ' Add New Stock')]")
    }

    pub fn menu() -> Locator {
        Locator::xpath("//*[@data-original-title='Menu']")
    }

    pub fn import_item_stock() -> Locator {
        Locator::xpath("//a[contains(text(), 'Import Item Stock')]")
    }

    pub fn download_item_file() -> Locator {
        Locator::xpath("//button[contains(text(), 'Download Item File')]")
    }

    pub fn file_input() -> Locator {
        Locator::id("stockitemimport")
    }

    pub fn upload_button() -> Locator {
        Locator::xpath("//button[contains(text(), 'Upload file')]")
    }
}

/// One direction's share of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass<'a> {
    pub direction: Direction,
    pub bucket: &'a [RemoteRecord],
}

/// Passes in the order they must execute
pub fn plan_passes(partition: &Partition) -> Vec<Pass<'_>> {
    Direction::ORDERED
        .iter()
        .map(|&direction| Pass {
            direction,
            bucket: partition.bucket(direction),
        })
        .collect()
}

/// What a pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassReport {
    Executed {
        direction: Direction,
        rows_updated: usize,
        rows_total: usize,
        reused_template: bool,
    },
    Skipped {
        direction: Direction,
    },
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassReport::Executed {
                direction,
                rows_updated,
                rows_total,
                reused_template,
            } => write!(
                f,
                "{direction}: {rows_updated}/{rows_total} rows updated ({} template)",
                if *reused_template { "reused" } else { "downloaded" }
            ),
            PassReport::Skipped { direction } => write!(f, "{direction}: skipped, no records"),
        }
    }
}

/// Step of the run a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Credentials,
    Launch,
    Login,
    FetchRecords,
    Refresh,
    Pass(Direction),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Credentials => write!(f, "credential lookup"),
            Stage::Launch => write!(f, "browser launch"),
            Stage::Login => write!(f, "login"),
            Stage::FetchRecords => write!(f, "record fetch"),
            Stage::Refresh => write!(f, "page refresh"),
            Stage::Pass(direction) => write!(f, "{direction} pass"),
        }
    }
}

#[derive(Debug)]
struct StageFailure {
    stage: Stage,
    error: WorkflowError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageFailure>;
}

impl<T, E: Into<WorkflowError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, StageFailure> {
        self.map_err(|e| StageFailure {
            stage,
            error: e.into(),
        })
    }
}

enum RunSummary {
    NoOp(String),
    Completed { reports: Vec<PassReport>, dropped: usize },
}

/// Stateless driver for stock runs; holds only its collaborators and configuration
pub struct StockWorkflow<S, C, L>
where
    S: RecordSource,
    C: CredentialSource,
    L: BrowserLauncher,
{
    records: S,
    credentials: C,
    launcher: L,
    config: WorkflowConfig,
}

impl<S, C, L> StockWorkflow<S, C, L>
where
    S: RecordSource,
    C: CredentialSource,
    L: BrowserLauncher,
{
    pub fn new(records: S, credentials: C, launcher: L, config: WorkflowConfig) -> Self {
        Self {
            records,
            credentials,
            launcher,
            config,
        }
    }

    /// Run the whole workflow for one location
    ///
    /// Never returns an error: failures come back as `Outcome::failure` with the
    /// failing stage named in the detail.
    pub async fn run_stock_workflow(&self, location: &str) -> Outcome {
        let run_id = RunId::new(location);
        log_startup(&run_id, &format!("stock workflow for {location}"));

        match self.execute(&run_id).await {
            Ok(RunSummary::NoOp(detail)) => {
                run_info!(run_id, "💤 Nothing to do: {}", detail);
                Outcome::no_op(location, detail)
            }
            Ok(RunSummary::Completed { reports, dropped }) => {
                let mut detail = reports.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
                if dropped > 0 {
                    detail.push_str(&format!("; {dropped} records with unrecognised direction dropped"));
                }
                log_success(&run_id, &format!("Stock workflow finished: {detail}"));
                Outcome::success(location, detail)
            }
            Err(StageFailure { stage, error }) => {
                log_error(&run_id, &stage.to_string(), &error);
                Outcome::failure(location, format!("{stage} failed: {error}"))
            }
        }
    }

    async fn execute(&self, run_id: &RunId) -> Result<RunSummary, StageFailure> {
        let location = shared::validate_location(run_id.location()).at(Stage::Setup)?;
        let credentials = self.credentials.credentials(location).await.at(Stage::Credentials)?;

        let store = TemplateStore::new(
            run_id.clone(),
            self.config.work_dir(location),
            &self.config.template,
            &self.config.timings,
        );
        store.ensure_work_dir().await.at(Stage::Launch)?;
        let browser = self.launcher.launch(store.work_dir()).await.at(Stage::Launch)?;
        run_debug!(run_id, "🌐 Browser session opened, downloads go to {}", store.work_dir().display());

        let result = self.drive(run_id, browser.as_ref(), &store, &credentials).await;

        match browser.quit().await {
            Ok(()) => run_info!(run_id, "🧹 Browser session released"),
            Err(e) => run_warn!(run_id, "⚠️ Failed to release browser session: {}", e),
        }
        result
    }

    async fn drive(
        &self,
        run_id: &RunId,
        browser: &dyn Browser,
        store: &TemplateStore,
        credentials: &Credentials,
    ) -> Result<RunSummary, StageFailure> {
        let timings = &self.config.timings;
        let actuator = UiActuator::from_timings(browser, timings);

        SiteLogin::new(&self.config.site, timings)
            .sign_in(run_id, &actuator, credentials)
            .await
            .at(Stage::Login)?;

        let records = self.records.fetch_records().await.at(Stage::FetchRecords)?;
        if records.is_empty() {
            return Ok(RunSummary::NoOp("no records to reconcile".to_string()));
        }

        let split = partition(&records);
        log_progress(run_id, "Partitioned records", &split.summary());
        if !split.dropped.is_empty() {
            let directions: Vec<&str> = split.dropped.iter().map(|r| r.direction.as_str()).collect();
            run_warn!(
                run_id,
                "⚠️ Dropped {} records with unrecognised direction: {:?}",
                split.dropped.len(),
                directions
            );
        }
        if split.is_empty() {
            return Ok(RunSummary::NoOp(format!(
                "{} records fetched, none for stock in or stock out ({} dropped)",
                records.len(),
                split.dropped.len()
            )));
        }

        let mut reports = Vec::new();
        for (index, pass) in plan_passes(&split).into_iter().enumerate() {
            if index > 0 {
                actuator.refresh().await.at(Stage::Refresh)?;
                tokio::time::sleep(timings.refresh_settle).await;
                run_debug!(run_id, "🔄 Page refreshed before {} pass", pass.direction);
            }

            if pass.bucket.is_empty() {
                run_info!(run_id, "⏭️ Skipping {} pass, no records", pass.direction);
                reports.push(PassReport::Skipped {
                    direction: pass.direction,
                });
                continue;
            }

            let report = self
                .run_pass(run_id, &actuator, store, pass)
                .await
                .at(Stage::Pass(pass.direction))?;
            reports.push(report);
        }

        Ok(RunSummary::Completed {
            reports,
            dropped: split.dropped.len(),
        })
    }

    /// Select direction, open the import dialog, fill the template and upload it
    async fn run_pass(
        &self,
        run_id: &RunId,
        actuator: &UiActuator<'_>,
        store: &TemplateStore,
        pass: Pass<'_>,
    ) -> WorkflowResult<PassReport> {
        let timings = &self.config.timings;
        run_info!(
            run_id,
            "📦 Starting {} pass with {} records",
            pass.direction,
            pass.bucket.len()
        );

        actuator.click_when_ready(&ui::direction_option(pass.direction)).await?;
        tokio::time::sleep(timings.step_settle).await;
        actuator.click_when_ready(&ui::add_new_stock()).await?;
        tokio::time::sleep(timings.step_settle).await;
        actuator.click_when_ready(&ui::menu()).await?;
        actuator.click_when_ready(&ui::import_item_stock()).await?;
        tokio::time::sleep(timings.step_settle).await;

        let download = ui::download_item_file();
        let acquired = store
            .acquire_or_reuse(|| async { actuator.click_when_ready(&download).await.map_err(WorkflowError::from) })
            .await?;

        let mut table = store.clear(&acquired.path).await?;
        let matched = reconcile(&mut table.rows, pass.bucket);
        for m in &matched {
            let row = &table.rows[m.row];
            run_debug!(
                run_id,
                "✏️ {} {} size {}: qty={} price={} (record {})",
                row.item_name,
                row.color_name,
                row.size_name,
                row.stock_qty,
                row.cost_price,
                m.record + 1
            );
        }
        store.persist(&table, &acquired.path).await?;
        log_progress(
            run_id,
            &format!("Reconciled {} template", pass.direction),
            &format!("{} of {} rows updated", matched.len(), table.rows.len()),
        );

        tokio::time::sleep(timings.pre_upload_settle).await;
        actuator.upload_when_present(&ui::file_input(), &acquired.path).await?;
        actuator.click_when_ready(&ui::upload_button()).await?;
        tokio::time::sleep(timings.post_upload_settle).await;
        run_info!(run_id, "📤 Uploaded {} template {}", pass.direction, acquired.path.display());

        Ok(PassReport::Executed {
            direction: pass.direction,
            rows_updated: matched.len(),
            rows_total: table.rows.len(),
            reused_template: acquired.reused,
        })
    }
}
