//! Service-specific tests
//!
//! Each service has its own test file with dedicated fixtures and helpers.


// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::path::Path;

    use shared::RunId;

    use crate::config::{TemplateConfig, Timings};
    use crate::services::template_store::TemplateStore;

    /// Header and rows of a small downloaded template
    pub const TEMPLATE_CSV: &str = "\
Item Name,Color Name,Size Name,Stock Qty,Cost price,Barcode
D1,RED,38,,,890001
D1,RED,39,,,890002
D2,BLUE,M,,,890003
";

    pub fn test_run_id() -> RunId {
        RunId::new("testloc")
    }

    /// CSV store over `dir` with fast polling and a short download timeout
    pub fn store_in(dir: &Path) -> TemplateStore {
        store_with_extension(dir, "csv")
    }

    /// Same as [`store_in`] for `.xlsx` templates
    pub fn workbook_store_in(dir: &Path) -> TemplateStore {
        store_with_extension(dir, "xlsx")
    }

    fn store_with_extension(dir: &Path, extension: &str) -> TemplateStore {
        let template = TemplateConfig {
            extension: extension.to_string(),
            ..TemplateConfig::default()
        };
        TemplateStore::new(test_run_id(), dir.to_path_buf(), &template, &Timings::immediate())
    }

    /// [`TEMPLATE_CSV`] as a single-sheet workbook
    pub fn template_workbook() -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (row, line) in TEMPLATE_CSV.lines().enumerate() {
            for (col, cell) in line.split(',').enumerate() {
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(number) => sheet.write_number(row as u32, col as u16, number).unwrap(),
                    Err(_) => sheet.write_string(row as u32, col as u16, cell).unwrap(),
                };
            }
        }
        workbook.save_to_buffer().unwrap()
    }
}
