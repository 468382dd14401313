//! Comparable projection: typed cast applied to operands before comparison

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

static ISO_DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})$")
        .expect("ISO-8601 pattern must compile")
});

/// Comparison operator of an assertion group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=` or `==`
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    /// Tokens in match priority order (two-character tokens first).
    pub(super) const TOKENS: [(&'static str, Self); 7] = [
        ("==", Self::Eq),
        ("!=", Self::Ne),
        ("<=", Self::Le),
        (">=", Self::Ge),
        ("=", Self::Eq),
        ("<", Self::Lt),
        (">", Self::Gt),
    ];
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        })
    }
}

/// An operand after projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    Number(f64),
    Null,
    Text(String),
}

/// Project a display string onto its comparable form.
///
/// - only digits and `.` → number
/// - strict ISO-8601 date-time → epoch milliseconds
/// - literal `null` → null
/// - anything else → raw string
#[must_use]
pub fn project(text: &str) -> Comparable {
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        if let Ok(n) = text.parse::<f64>() {
            return Comparable::Number(n);
        }
    }
    if ISO_DATE_TIME.is_match(text) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Comparable::Number(dt.timestamp_millis() as f64);
        }
    }
    if text == "null" {
        return Comparable::Null;
    }
    Comparable::Text(text.to_string())
}

/// Compare two projected operands.
///
/// Ordering operators only apply between two numbers or two strings;
/// any other pairing is `false`.
#[must_use]
pub fn compare(lhs: &Comparable, op: Operator, rhs: &Comparable) -> bool {
    match op {
        Operator::Eq => lhs == rhs,
        Operator::Ne => lhs != rhs,
        _ => {
            let ordering = match (lhs, rhs) {
                (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
                (Comparable::Text(a), Comparable::Text(b)) => Some(a.cmp(b)),
                _ => None,
            };
            match ordering {
                Some(o) => match op {
                    Operator::Lt => o == Ordering::Less,
                    Operator::Le => o != Ordering::Greater,
                    Operator::Gt => o == Ordering::Greater,
                    Operator::Ge => o != Ordering::Less,
                    Operator::Eq | Operator::Ne => unreachable!("handled above"),
                },
                None => false,
            }
        }
    }
}
