//! Diamond pattern builder
//!
//! Builds a centered diamond of letters read cyclically from a fixed
//! alphabet. Every second row is hollowed to an outline.

use thiserror::Error;

/// Alphabet the rows are read from
pub const ALPHABET: &str = "FORMULAQSOLUTIONS";

/// Smallest accepted row count
pub const MIN_LINES: i64 = 1;

/// Largest accepted row count
pub const MAX_LINES: i64 = 100;

const FILLER: char = '-';

/// User-facing errors for the `lines` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternInputError {
    #[error("Please enter a valid integer.")]
    InvalidInteger,

    #[error("Please enter a number between 1 and 100.")]
    OutOfRange,
}

impl PatternInputError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            PatternInputError::InvalidInteger => "invalid_integer",
            PatternInputError::OutOfRange => "out_of_range",
        }
    }
}

/// Parse and range-check the raw `lines` field.
///
/// Surrounding whitespace, a leading sign and single underscores between
/// digits (`1_0`) are accepted. A well-formed integer that does not fit in
/// 64 bits is reported as out of range.
pub fn parse_line_count(raw: &str) -> Result<i64, PatternInputError> {
    let literal = integer_literal(raw.trim()).ok_or(PatternInputError::InvalidInteger)?;
    let n = literal
        .parse::<i64>()
        .map_err(|_| PatternInputError::OutOfRange)?;

    if !(MIN_LINES..=MAX_LINES).contains(&n) {
        return Err(PatternInputError::OutOfRange);
    }

    Ok(n)
}

/// Canonical `[-]digits` form of a decimal literal, or `None` if malformed
fn integer_literal(s: &str) -> Option<String> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };

    let mut literal = String::from(sign);
    for group in digits.split('_') {
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        literal.push_str(group);
    }

    Some(literal)
}

/// Build the diamond for `n` rows.
///
/// Returns an empty list when `n` is outside `[1, 100]`. Even counts are
/// promoted to the next odd number so the diamond has a midpoint.
pub fn build_pattern(n: i64) -> Vec<String> {
    if !(MIN_LINES..=MAX_LINES).contains(&n) {
        return Vec::new();
    }

    let n = (if n % 2 == 0 { n + 1 } else { n }) as usize;
    let alphabet: Vec<char> = ALPHABET.chars().collect();
    let mid = n / 2;

    let rows: Vec<String> = (0..n)
        .map(|i| {
            let length = if i <= mid {
                2 * i + 1
            } else {
                (2 * mid + 1) - 2 * (i - mid)
            };

            let mut chars: Vec<char> = (0..length)
                .map(|j| alphabet[(i + j) % alphabet.len()])
                .collect();

            if (i + 1) % 2 == 0 && length > 2 {
                chars[1..length - 1].fill(FILLER);
            }

            chars.into_iter().collect()
        })
        .collect();

    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    rows.iter().map(|r| center(r, width)).collect()
}

/// Pad `row` with spaces to `width`; an odd leftover goes to the right.
fn center(row: &str, width: usize) -> String {
    let len = row.chars().count();
    if len >= width {
        return row.to_string();
    }

    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), row, " ".repeat(right))
}
