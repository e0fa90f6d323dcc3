//! In-memory model of the item template
//!
//! The site hands out a header-row table listing every item variant, as an
//! `.xlsx` workbook or as delimited text. Only five columns matter to the
//! workflow; every other column is carried through untouched so the file can
//! be uploaded back in the shape it was downloaded.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use thiserror::Error;

pub const ITEM_NAME: &str = "Item Name";
pub const COLOR_NAME: &str = "Color Name";
pub const SIZE_NAME: &str = "Size Name";
pub const STOCK_QTY: &str = "Stock Qty";
pub const COST_PRICE: &str = "Cost price";

/// Columns a template must carry to be reconciled
pub const REQUIRED_COLUMNS: [&str; 5] = [ITEM_NAME, COLOR_NAME, SIZE_NAME, STOCK_QTY, COST_PRICE];

/// On-disk encoding of the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Csv,
    Xlsx,
}

impl TemplateFormat {
    /// `xlsx` selects the workbook codec; any other extension is read as CSV
    pub fn from_extension(extension: &str) -> Self {
        if extension.trim_start_matches('.').eq_ignore_ascii_case("xlsx") {
            TemplateFormat::Xlsx
        } else {
            TemplateFormat::Csv
        }
    }
}

/// Positions of the required columns in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    item_name: usize,
    color_name: usize,
    size_name: usize,
    stock_qty: usize,
    cost_price: usize,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self, TemplateError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingColumns(missing));
        }

        let position = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            item_name: position(ITEM_NAME),
            color_name: position(COLOR_NAME),
            size_name: position(SIZE_NAME),
            stock_qty: position(STOCK_QTY),
            cost_price: position(COST_PRICE),
        })
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("unreadable workbook: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("cannot write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),
}

/// One item variant in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    pub item_name: String,
    pub color_name: String,
    pub size_name: String,
    pub stock_qty: String,
    pub cost_price: String,
    /// Cells of the columns the workflow does not own, in header order; the
    /// five required positions are kept blank and filled from the fields above
    other_cells: Vec<String>,
}

impl TemplateRow {
    /// Build a row with only the reconciled columns, for callers without a file
    pub fn new(item_name: &str, color_name: &str, size_name: &str) -> Self {
        Self {
            item_name: item_name.to_string(),
            color_name: color_name.to_string(),
            size_name: size_name.to_string(),
            stock_qty: String::new(),
            cost_price: String::new(),
            other_cells: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.stock_qty.clear();
        self.cost_price.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.stock_qty.is_empty() && self.cost_price.is_empty()
    }
}

/// Header plus rows, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTable {
    headers: Vec<String>,
    columns: ColumnMap,
    format: TemplateFormat,
    pub rows: Vec<TemplateRow>,
}

impl TemplateTable {
    pub fn decode(format: TemplateFormat, bytes: &[u8]) -> Result<Self, TemplateError> {
        match format {
            TemplateFormat::Csv => Self::parse(bytes),
            TemplateFormat::Xlsx => Self::parse_xlsx(bytes),
        }
    }

    /// Parse CSV bytes; short lines are padded, the header decides the width
    pub fn parse(bytes: &[u8]) -> Result<Self, TemplateError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut lines = Vec::new();
        for record in reader.records() {
            lines.push(record?.iter().map(str::to_string).collect());
        }

        Self::from_grid(TemplateFormat::Csv, headers, lines)
    }

    /// Parse the first worksheet of an `.xlsx` workbook
    pub fn parse_xlsx(bytes: &[u8]) -> Result<Self, TemplateError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
        let range = workbook.worksheet_range_at(0).ok_or(TemplateError::NoWorksheet)??;

        let mut lines = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        let headers = lines.next().unwrap_or_default();
        // Trailing rows the sheet reports with no content at all are not items
        let lines = lines.filter(|cells| cells.iter().any(|c| !c.is_empty())).collect();

        Self::from_grid(TemplateFormat::Xlsx, headers, lines)
    }

    fn from_grid(format: TemplateFormat, headers: Vec<String>, lines: Vec<Vec<String>>) -> Result<Self, TemplateError> {
        let columns = ColumnMap::resolve(&headers)?;

        let rows = lines
            .into_iter()
            .map(|mut cells| {
                if cells.len() < headers.len() {
                    cells.resize(headers.len(), String::new());
                }
                let mut take = |index: usize| std::mem::take(&mut cells[index]);
                let item_name = take(columns.item_name);
                let color_name = take(columns.color_name);
                let size_name = take(columns.size_name);
                let stock_qty = take(columns.stock_qty);
                let cost_price = take(columns.cost_price);
                TemplateRow {
                    item_name,
                    color_name,
                    size_name,
                    stock_qty,
                    cost_price,
                    other_cells: cells,
                }
            })
            .collect();

        Ok(Self {
            headers,
            columns,
            format,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn format(&self) -> TemplateFormat {
        self.format
    }

    /// Blank quantity and price on every row
    pub fn clear(&mut self) {
        self.rows.iter_mut().for_each(TemplateRow::clear);
    }

    /// Every row as full cells in header order
    fn lines(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let mut cells = row.other_cells.clone();
            if cells.len() < self.headers.len() {
                cells.resize(self.headers.len(), String::new());
            }
            cells[self.columns.item_name] = row.item_name.clone();
            cells[self.columns.color_name] = row.color_name.clone();
            cells[self.columns.size_name] = row.size_name.clone();
            cells[self.columns.stock_qty] = row.stock_qty.clone();
            cells[self.columns.cost_price] = row.cost_price.clone();
            cells
        })
    }

    /// Serialize in the format the table was read from, keeping header and column order
    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        match self.format {
            TemplateFormat::Csv => self.to_csv(),
            TemplateFormat::Xlsx => self.to_xlsx(),
        }
    }

    fn to_csv(&self) -> Result<Vec<u8>, TemplateError> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for cells in self.lines() {
            writer.write_record(&cells)?;
        }

        writer
            .into_inner()
            .map_err(|e| TemplateError::Csv(csv::Error::from(e.into_error())))
    }

    fn to_xlsx(&self) -> Result<Vec<u8>, TemplateError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string(0, col as u16, header.as_str())?;
        }
        for (index, cells) in self.lines().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match numeric(cell) {
                    Some(value) => {
                        sheet.write_number(row, col, value)?;
                    }
                    None if cell.is_empty() => {}
                    None => {
                        sheet.write_string(row, col, cell.as_str())?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Text of a workbook cell; whole floats lose their fraction (`38.0` reads as `38`)
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Cells that read back as exactly the same text are written as numbers
fn numeric(cell: &str) -> Option<f64> {
    let value: f64 = cell.parse().ok()?;
    (value.is_finite() && value.to_string() == cell).then_some(value)
}
