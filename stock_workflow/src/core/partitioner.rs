//! Routing of change records into the stock-in and stock-out buckets

use shared::{Direction, RemoteRecord};

/// Records split by direction, input order preserved within each bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub stock_in: Vec<RemoteRecord>,
    pub stock_out: Vec<RemoteRecord>,
    /// Records whose direction matched neither recognised value
    pub dropped: Vec<RemoteRecord>,
}

impl Partition {
    pub fn bucket(&self, direction: Direction) -> &[RemoteRecord] {
        match direction {
            Direction::StockIn => &self.stock_in,
            Direction::StockOut => &self.stock_out,
        }
    }

    /// True when neither bucket has anything to submit
    pub fn is_empty(&self) -> bool {
        self.stock_in.is_empty() && self.stock_out.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} items for stock in, {} items for stock out, {} dropped",
            self.stock_in.len(),
            self.stock_out.len(),
            self.dropped.len()
        )
    }
}

/// Split records by case-insensitive direction; the input is not mutated
pub fn partition(records: &[RemoteRecord]) -> Partition {
    let mut split = Partition::default();

    for record in records {
        match record.direction() {
            Some(Direction::StockIn) => split.stock_in.push(record.clone()),
            Some(Direction::StockOut) => split.stock_out.push(record.clone()),
            None => split.dropped.push(record.clone()),
        }
    }

    split
}
