//! Size-group containment
//!
//! The record source writes sizes either as a single value (`"39"`) or as an
//! inclusive range (`"38-44"`); template rows carry one concrete size that may
//! be written as a float (`"38.0"`). Matching is total: anything that fails to
//! parse is simply not a match, which leaves the template row blank.
//!
//! Template sizes are rounded half-to-even (`38.5 -> 38`, `39.5 -> 40`).

use std::fmt;

use thiserror::Error;

/// A single size or an inclusive `[start, end]` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGroup {
    Single(i64),
    Range { start: i64, end: i64 },
}

/// Why a size expression could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSize {
    #[error("empty size")]
    Empty,
    #[error("'{0}' is not an integer size")]
    NotAnInteger(String),
    #[error("'{0}' is not a START-END range")]
    MalformedRange(String),
    #[error("'{0}' is not a numeric size")]
    NotANumber(String),
}

/// Result of testing a template size against a size group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeMatch {
    Matched,
    Unmatched,
    Invalid(InvalidSize),
}

impl SizeMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, SizeMatch::Matched)
    }
}

impl SizeGroup {
    /// Parse `"N"` or `"A-B"`; tokens are trimmed, a reversed range still parses
    pub fn parse(expr: &str) -> Result<Self, InvalidSize> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(InvalidSize::Empty);
        }

        if expr.contains('-') {
            let mut parts = expr.split('-');
            let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(InvalidSize::MalformedRange(expr.to_string()));
            };
            let start = parse_int(start).ok_or_else(|| InvalidSize::MalformedRange(expr.to_string()))?;
            let end = parse_int(end).ok_or_else(|| InvalidSize::MalformedRange(expr.to_string()))?;
            Ok(SizeGroup::Range { start, end })
        } else {
            parse_int(expr)
                .map(SizeGroup::Single)
                .ok_or_else(|| InvalidSize::NotAnInteger(expr.to_string()))
        }
    }

    pub fn contains(&self, size: i64) -> bool {
        match *self {
            SizeGroup::Single(value) => value == size,
            SizeGroup::Range { start, end } => start <= size && size <= end,
        }
    }
}

impl fmt::Display for SizeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeGroup::Single(value) => write!(f, "{value}"),
            SizeGroup::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

fn parse_int(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// Round a template size to the nearest integer, ties to even
pub fn round_size(template_size: &str) -> Result<i64, InvalidSize> {
    let raw = template_size.trim();
    if raw.is_empty() {
        return Err(InvalidSize::Empty);
    }
    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidSize::NotANumber(raw.to_string()))?;
    let rounded = value.round_ties_even();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return Err(InvalidSize::NotANumber(raw.to_string()));
    }
    Ok(rounded as i64)
}

/// Test a template row's size against a record's size expression
pub fn check(template_size: &str, sheet_size_expr: &str) -> SizeMatch {
    let size = match round_size(template_size) {
        Ok(size) => size,
        Err(invalid) => return SizeMatch::Invalid(invalid),
    };
    match SizeGroup::parse(sheet_size_expr) {
        Ok(group) if group.contains(size) => SizeMatch::Matched,
        Ok(_) => SizeMatch::Unmatched,
        Err(invalid) => SizeMatch::Invalid(invalid),
    }
}

/// Fail-closed boolean form of [`check`]
pub fn matches(template_size: &str, sheet_size_expr: &str) -> bool {
    check(template_size, sheet_size_expr).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_containment_is_inclusive() {
        assert!(matches("38", "38-44"));
        assert!(matches("44", "38-44"));
        assert!(matches("41.0", "38-44"));
        assert!(!matches("37", "38-44"));
        assert!(!matches("45", "38-44"));
    }

    #[test]
    fn test_single_value_exact_match() {
        assert!(matches("39", "39"));
        assert!(matches("39.0", "39"));
        assert!(!matches("40", "39"));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(round_size("38.5"), Ok(38));
        assert_eq!(round_size("39.5"), Ok(40));
        assert_eq!(round_size("38.49"), Ok(38));
        assert_eq!(round_size("38.51"), Ok(39));
        assert!(matches("38.5", "38"));
        assert!(!matches("38.5", "39"));
    }

    #[test]
    fn test_whitespace_in_tokens_is_tolerated() {
        assert!(matches(" 40 ", " 38 - 44 "));
        assert!(matches("40", "40 "));
    }

    #[test]
    fn test_malformed_expressions_fail_closed() {
        for expr in ["", "   ", "XL", "38-", "-44", "38-44-50", "38.0", "38.5-40", "a-b", "--"] {
            assert!(!matches("40", expr), "expected no match for {expr:?}");
        }
    }

    #[test]
    fn test_reversed_range_never_matches() {
        assert_eq!(SizeGroup::parse("44-38"), Ok(SizeGroup::Range { start: 44, end: 38 }));
        for size in 30..50 {
            assert!(!matches(&size.to_string(), "44-38"));
        }
    }

    #[test]
    fn test_non_numeric_template_size_fails_closed() {
        assert_eq!(check("XL", "38-44"), SizeMatch::Invalid(InvalidSize::NotANumber("XL".to_string())));
        assert_eq!(check("", "38-44"), SizeMatch::Invalid(InvalidSize::Empty));
        assert!(!matches("NaN", "38-44"));
        assert!(!matches("inf", "38-44"));
    }

    #[test]
    fn test_invalid_size_messages() {
        assert_eq!(InvalidSize::Empty.to_string(), "empty size");
        assert_eq!(
            SizeGroup::parse("38-").unwrap_err().to_string(),
            "'38-' is not a START-END range"
        );
        assert_eq!(round_size("XL").unwrap_err().to_string(), "'XL' is not a numeric size");
    }

    #[test]
    fn test_property_range_iff_between_bounds() {
        for start in 30..36 {
            for end in start..start + 6 {
                let expr = format!("{start}-{end}");
                for tenths in 280..420 {
                    let size = tenths as f64 / 10.0;
                    let rounded = size.round_ties_even() as i64;
                    let expected = start <= rounded && rounded <= end;
                    assert_eq!(matches(&format!("{size}"), &expr), expected, "{size} in {expr}");
                }
            }
        }
    }

    #[test]
    fn test_property_single_iff_equal() {
        for n in 30..50 {
            for tenths in 290..510 {
                let size = tenths as f64 / 10.0;
                let expected = size.round_ties_even() as i64 == n;
                assert_eq!(matches(&format!("{size}"), &n.to_string()), expected);
            }
        }
    }

    #[test]
    fn test_size_group_display_roundtrip_shape() {
        assert_eq!(SizeGroup::Single(39).to_string(), "39");
        assert_eq!(SizeGroup::Range { start: 38, end: 44 }.to_string(), "38-44");
    }
}
