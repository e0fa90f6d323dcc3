//! Core shared types and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

/// Identifier for a single workflow run, scoped to a location
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    location: String,
    id: Uuid,
}

impl RunId {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            id: Uuid::new_v4(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Check a location id before it becomes part of env keys and paths
///
/// Only ASCII letters, digits, `_` and `-` are accepted.
pub fn validate_location(location: &str) -> SharedResult<&str> {
    let valid = !location.is_empty()
        && location
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(location)
    } else {
        Err(SharedError::InvalidConfig {
            field: "location".to_string(),
            value: location.to_string(),
        })
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.id.simple().to_string();
        write!(f, "{}/{}", self.location, &simple[..8])
    }
}

/// Direction of a stock change as written in the record source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    StockIn,
    StockOut,
}

impl Direction {
    /// Both directions, in the order their passes must run
    pub const ORDERED: [Direction; 2] = [Direction::StockIn, Direction::StockOut];

    /// Case-insensitive exact match against "stock in" / "stock out"
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("stock in") {
            Some(Direction::StockIn)
        } else if raw.eq_ignore_ascii_case("stock out") {
            Some(Direction::StockOut)
        } else {
            None
        }
    }

    /// Option text used by the stock page's direction selector
    pub fn label(&self) -> &'static str {
        match self {
            Direction::StockIn => "Stock In",
            Direction::StockOut => "Stock Out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::StockIn => write!(f, "stock in"),
            Direction::StockOut => write!(f, "stock out"),
        }
    }
}

impl FromStr for Direction {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::parse(s).ok_or_else(|| SharedError::UnknownDirection { input: s.to_string() })
    }
}

/// One upstream change entry
///
/// `qty` and `price` are carried exactly as the source wrote them; the
/// external system owns their formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub design_no: String,
    pub color: String,
    pub size_expr: String,
    pub qty: String,
    pub price: String,
    pub direction: String,
}

impl RemoteRecord {
    /// Parsed direction, `None` when the raw value is neither recognised string
    pub fn direction(&self) -> Option<Direction> {
        Direction::parse(&self.direction)
    }
}

/// Terminal status of one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    NoOp,
    Failure,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "success"),
            OutcomeStatus::NoOp => write!(f, "no-op"),
            OutcomeStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Result of a workflow run, returned to and stored by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub location: String,
    pub status: OutcomeStatus,
    pub detail: String,
    pub finished_at: DateTime<Utc>,
}

impl Outcome {
    pub fn success(location: &str, detail: impl Into<String>) -> Self {
        Self::with_status(location, OutcomeStatus::Success, detail)
    }

    pub fn no_op(location: &str, detail: impl Into<String>) -> Self {
        Self::with_status(location, OutcomeStatus::NoOp, detail)
    }

    pub fn failure(location: &str, detail: impl Into<String>) -> Self {
        Self::with_status(location, OutcomeStatus::Failure, detail)
    }

    fn with_status(location: &str, status: OutcomeStatus, detail: impl Into<String>) -> Self {
        Self {
            location: location.to_string(),
            status,
            detail: detail.into(),
            finished_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failure
    }
}
