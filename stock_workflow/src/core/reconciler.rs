//! Template reconciliation
//!
//! Each template row takes quantity and price from the first record in the
//! bucket with the same design number, the same colour (case-sensitive) and a
//! size group containing the row's size. A record with a size range feeds
//! every row whose size falls inside it. Rows without a match stay blank.

use shared::RemoteRecord;

use super::size_matcher;
use super::template::TemplateRow;

/// Which record filled which row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMatch {
    pub row: usize,
    pub record: usize,
}

/// First record in bucket order that structurally matches the row
pub fn find_match(row: &TemplateRow, bucket: &[RemoteRecord]) -> Option<usize> {
    bucket.iter().position(|record| {
        record.design_no == row.item_name
            && record.color == row.color_name
            && size_matcher::matches(&row.size_name, &record.size_expr)
    })
}

/// Fill quantity and price on matched rows, returning the matches in row order
///
/// Values are copied verbatim. `bucket` is only read.
pub fn reconcile(rows: &mut [TemplateRow], bucket: &[RemoteRecord]) -> Vec<RowMatch> {
    let mut matched = Vec::new();

    for (row_index, row) in rows.iter_mut().enumerate() {
        if let Some(record_index) = find_match(row, bucket) {
            let record = &bucket[record_index];
            row.stock_qty = record.qty.clone();
            row.cost_price = record.price.clone();
            matched.push(RowMatch {
                row: row_index,
                record: record_index,
            });
        }
    }

    matched
}
