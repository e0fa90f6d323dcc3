//! Change records from a Google Sheets range
//!
//! The range holds one change per row:
//! `Design No. | Color | Size | Qty | Price | Stock In / Out`.
//! Rows the API returns short (it drops trailing empty cells) or without a
//! design number are skipped and logged one by one; they never fail the fetch.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use shared::RemoteRecord;

use crate::config::{SheetAuth, SheetConfig};
use crate::services::google_auth::{ServiceAccountKey, SHEETS_READONLY_SCOPE};
use crate::error::{WorkflowError, WorkflowResult};
use crate::traits::RecordSource;

/// Cells a row must carry to form a record
pub const RECORD_WIDTH: usize = 6;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Real record source backed by the Sheets v4 values endpoint
pub struct SheetsRecordSource {
    client: reqwest::Client,
    sheet: SheetConfig,
}

impl SheetsRecordSource {
    pub fn new(sheet: SheetConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            sheet,
        }
    }

    fn values_url(&self, spreadsheet_id: &str) -> WorkflowResult<url::Url> {
        let mut url = url::Url::parse(&self.sheet.api_base)
            .map_err(|e| WorkflowError::config("sheets api base", e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| WorkflowError::config("sheets api base", "cannot be a base url"))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", self.sheet.range.as_str()]);
        if let SheetAuth::ApiKey(key) = &self.sheet.auth {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait]
impl RecordSource for SheetsRecordSource {
    async fn fetch_records(&self) -> WorkflowResult<Vec<RemoteRecord>> {
        let spreadsheet_id = self
            .sheet
            .spreadsheet_id
            .as_deref()
            .ok_or_else(|| WorkflowError::source_unavailable("ITEMS_SPREADSHEET_ID environment variable not set"))?;

        let url = self.values_url(spreadsheet_id)?;
        let mut request = self.client.get(url);
        match &self.sheet.auth {
            SheetAuth::BearerToken(token) => request = request.bearer_auth(token),
            SheetAuth::ServiceAccount(path) => {
                let key = ServiceAccountKey::from_file(path).await?;
                let token = key.access_token(&self.client, SHEETS_READONLY_SCOPE).await?;
                request = request.bearer_auth(token);
            }
            SheetAuth::ApiKey(_) | SheetAuth::None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkflowError::source_unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::source_unavailable(format!(
                "sheets api returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| WorkflowError::source_unavailable(format!("undecodable response: {e}")))?;

        if range.values.is_empty() {
            info!("No data found in the spreadsheet");
            return Ok(Vec::new());
        }

        let (records, malformed) = parse_rows(&range.values);
        for error in &malformed {
            warn!("⚠️ Skipping row: {}", error);
        }
        info!(
            "Fetched {} records from sheet ({} malformed rows skipped)",
            records.len(),
            malformed.len()
        );
        Ok(records)
    }
}

/// Convert raw rows into records, collecting a `MalformedRecord` for each bad row
///
/// Row numbers in the errors are 1-based positions within the fetched range.
pub fn parse_rows(rows: &[Vec<Value>]) -> (Vec<RemoteRecord>, Vec<WorkflowError>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut malformed = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Ok(record) => records.push(record),
            Err(reason) => malformed.push(WorkflowError::malformed(index + 1, reason)),
        }
    }

    (records, malformed)
}

fn parse_row(row: &[Value]) -> Result<RemoteRecord, String> {
    if row.len() < RECORD_WIDTH {
        return Err(format!("expected {RECORD_WIDTH} cells, found {}", row.len()));
    }

    let cells: Vec<String> = row.iter().take(RECORD_WIDTH).map(cell_text).collect();
    if cells[0].trim().is_empty() {
        return Err("design number is empty".to_string());
    }

    Ok(RemoteRecord {
        design_no: cells[0].clone(),
        color: cells[1].clone(),
        size_expr: cells[2].clone(),
        qty: cells[3].clone(),
        price: cells[4].clone(),
        direction: cells[5].clone(),
    })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
