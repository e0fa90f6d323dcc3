//! Main entry point for the stock workflow binary
//!
//! Wires the real services into the workflow, runs it once for a location and
//! prints the outcome as JSON.

use std::path::PathBuf;

use clap::Parser;

use shared::{logging, Outcome};
use stock_workflow::{
    services::{EnvCredentialSource, SheetsRecordSource, WebDriverLauncher},
    StockWorkflow, WorkflowConfig,
};

/// Reconcile sheet stock changes into the item template and upload them
#[derive(Parser)]
#[command(name = "stock-workflow")]
#[command(about = "Runs the stock in / stock out template upload for one location")]
pub struct Args {
    /// Location whose credentials and working directory are used
    #[arg(long, default_value = "kolkata")]
    pub location: String,

    /// Root directory for per-location working directories
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// WebDriver endpoint (chromedriver or a Selenium grid)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Template file extension; `xlsx` (the default) selects the workbook codec, anything else is read as CSV
    #[arg(long)]
    pub template_ext: Option<String>,
}

impl Args {
    /// Overlay the flags onto the environment-derived configuration
    fn apply(&self, mut config: WorkflowConfig) -> WorkflowConfig {
        if let Some(dir) = &self.base_dir {
            config.base_dir = dir.clone();
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(ext) = &self.template_ext {
            config.template.extension = ext.trim_start_matches('.').to_string();
        }
        config.headless |= self.headless;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let config = args.apply(WorkflowConfig::from_env());
    let started = chrono::Utc::now();

    let workflow = StockWorkflow::new(
        SheetsRecordSource::new(config.sheet.clone()),
        EnvCredentialSource::new(),
        WebDriverLauncher::new(&config.webdriver_url, config.headless),
        config,
    );
    let outcome: Outcome = workflow.run_stock_workflow(&args.location).await;

    tracing::debug!(
        "Run took {} ms",
        (outcome.finished_at - started).num_milliseconds()
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
