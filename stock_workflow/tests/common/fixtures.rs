//! Test fixtures and fakes for workflow tests
//!
//! This module provides consistent test data plus a recording browser fake
//! that behaves enough like the stock site to drive whole runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shared::RemoteRecord;
use stock_workflow::workflow::ui;
use stock_workflow::{Browser, BrowserError, BrowserLauncher, Locator};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const LOCATION: &'static str = "testloc";
    pub const LOGIN_URL: &'static str = "https://stock.test/login";
    pub const DASHBOARD_URL: &'static str = "https://stock.test/dashboard";
    pub const STOCK_PAGE_URL: &'static str = "https://stock.test/stockinout";
    pub const USERNAME: &'static str = "store.testloc";
    pub const PASSWORD: &'static str = "test-password";
    pub const TEMPLATE_FILE: &'static str = "item_stock_template.csv";
    pub const WORKBOOK_FILE: &'static str = "ItemStock.xlsx";

    /// Template as the site hands it out: quantities and prices blank
    pub const TEMPLATE_CSV: &'static str = "\
Item Name,Color Name,Size Name,Stock Qty,Cost price,Barcode
D1,RED,38,,,890001
D1,RED,39,,,890002
D1,BLUE,39,,,890003
D2,BLACK,42.5,,,890004
";

    /// [`Self::TEMPLATE_CSV`] as the site's single-sheet workbook
    pub fn template_workbook() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (row, line) in Self::TEMPLATE_CSV.lines().enumerate() {
            for (col, cell) in line.split(',').enumerate().filter(|(_, cell)| !cell.is_empty()) {
                let (row, col) = (row as u32, col as u16);
                match cell.parse::<f64>() {
                    Ok(number) => sheet.write_number(row, col, number).unwrap(),
                    Err(_) => sheet.write_string(row, col, cell).unwrap(),
                };
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    pub fn record(design: &str, color: &str, size: &str, qty: &str, price: &str, direction: &str) -> RemoteRecord {
        RemoteRecord {
            design_no: design.to_string(),
            color: color.to_string(),
            size_expr: size.to_string(),
            qty: qty.to_string(),
            price: price.to_string(),
            direction: direction.to_string(),
        }
    }

    /// Range record covering both RED rows of D1
    pub fn stock_in_record() -> RemoteRecord {
        Self::record("D1", "RED", "38-40", "5", "250", "Stock In")
    }

    /// Single size record; 42.5 rounds to 42 under ties-to-even
    pub fn stock_out_record() -> RemoteRecord {
        Self::record("D2", "BLACK", "42", "2", "310", "STOCK OUT")
    }

    pub fn mixed_records() -> Vec<RemoteRecord> {
        vec![Self::stock_in_record(), Self::stock_out_record()]
    }

    pub fn unrecognised_records() -> Vec<RemoteRecord> {
        vec![
            Self::record("D1", "RED", "38", "1", "100", "returned"),
            Self::record("D2", "BLACK", "42", "1", "100", ""),
        ]
    }
}

/// Everything the fake saw, shared between the test and the boxed session
#[derive(Default)]
struct BrowserState {
    calls: Vec<String>,
    url: String,
    download_dir: Option<PathBuf>,
    serve_template: bool,
    serve_workbook: bool,
    failing: Option<(Locator, BrowserError)>,
    failing_current_url: Option<BrowserError>,
    uploads: Vec<Vec<u8>>,
    downloads: usize,
    launches: usize,
}

/// Browser fake that records every primitive call
///
/// Clicking "Download Item File" writes `TestFixtures::TEMPLATE_CSV` (or the
/// workbook form of it) into the download directory given at launch.
/// Uploading reads the file back so tests can inspect what would have been
/// submitted.
#[derive(Clone)]
pub struct RecordingBrowser {
    state: Arc<Mutex<BrowserState>>,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        let state = BrowserState {
            serve_template: true,
            ..BrowserState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every wait and click on `locator` fails with `error`
    pub fn failing_on(self, locator: Locator, error: BrowserError) -> Self {
        self.state.lock().unwrap().failing = Some((locator, error));
        self
    }

    /// Reading the current URL fails with `error`
    pub fn failing_current_url(self, error: BrowserError) -> Self {
        self.state.lock().unwrap().failing_current_url = Some(error);
        self
    }

    /// The download button hands out an `.xlsx` workbook
    pub fn serving_workbook(self) -> Self {
        self.state.lock().unwrap().serve_workbook = true;
        self
    }

    /// The download button does nothing
    pub fn without_template(self) -> Self {
        self.state.lock().unwrap().serve_template = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Uploaded files as text, for CSV templates
    pub fn uploads(&self) -> Vec<String> {
        self.upload_bytes()
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .collect()
    }

    pub fn upload_bytes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn downloads(&self) -> usize {
        self.state.lock().unwrap().downloads
    }

    pub fn launches(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.as_str() == call)
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn check_failing(&self, locator: &Locator) -> Result<(), BrowserError> {
        match &self.state.lock().unwrap().failing {
            Some((failing, error)) if failing == locator => Err(error.clone()),
            _ => Ok(()),
        }
    }

    fn serve_download(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.serve_template {
            return;
        }
        if let Some(dir) = state.download_dir.clone() {
            if state.serve_workbook {
                std::fs::write(dir.join(TestFixtures::WORKBOOK_FILE), TestFixtures::template_workbook()).unwrap();
            } else {
                std::fs::write(dir.join(TestFixtures::TEMPLATE_FILE), TestFixtures::TEMPLATE_CSV).unwrap();
            }
            state.downloads += 1;
        }
    }
}

#[async_trait::async_trait]
impl Browser for RecordingBrowser {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("navigate {url}"));
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.record("current_url".to_string());
        let state = self.state.lock().unwrap();
        match &state.failing_current_url {
            Some(error) => Err(error.clone()),
            None => Ok(state.url.clone()),
        }
    }

    async fn refresh_page(&self) -> Result<(), BrowserError> {
        self.record("refresh".to_string());
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.record(format!("click {locator}"));
        self.check_failing(locator)?;
        if *locator == ui::download_item_file() {
            self.serve_download();
        }
        Ok(())
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> Result<(), BrowserError> {
        self.record(format!("send_keys {locator} {text}"));
        Ok(())
    }

    async fn type_and_submit(&self, locator: &Locator, _text: &str) -> Result<(), BrowserError> {
        self.record(format!("submit {locator}"));
        // Successful login lands on the dashboard
        self.state.lock().unwrap().url = TestFixtures::DASHBOARD_URL.to_string();
        Ok(())
    }

    async fn wait_until_present(&self, locator: &Locator, _timeout: std::time::Duration) -> Result<(), BrowserError> {
        self.record(format!("wait_present {locator}"));
        self.check_failing(locator)
    }

    async fn wait_until_clickable(&self, locator: &Locator, _timeout: std::time::Duration) -> Result<(), BrowserError> {
        self.record(format!("wait_clickable {locator}"));
        self.check_failing(locator)
    }

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), BrowserError> {
        self.record(format!("upload {locator}"));
        let contents = std::fs::read(path).unwrap();
        self.state.lock().unwrap().uploads.push(contents);
        Ok(())
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        self.record("quit".to_string());
        Ok(())
    }
}

/// Launcher handing out the shared recording browser
pub struct FakeLauncher {
    browser: RecordingBrowser,
}

impl FakeLauncher {
    pub fn new(browser: RecordingBrowser) -> Self {
        Self { browser }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn Browser>, BrowserError> {
        {
            let mut state = self.browser.state.lock().unwrap();
            state.launches += 1;
            state.download_dir = Some(download_dir.to_path_buf());
        }
        Ok(Box::new(self.browser.clone()))
    }
}
