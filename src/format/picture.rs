//! COBOL-style picture numeric formatting
//!
//! A picture such as `+9(12)V9(6)` describes a signed fixed-point number
//! with 12 integer digits and 6 fraction digits, emitted without a decimal
//! point. The original system only recognized an enumerated set of
//! pictures; this parser accepts the general `[+|-]9(i)[V9(f)]` grammar.

use crate::error::{Error, Result};

/// A parsed picture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureFormat {
    /// Whether a leading sign character is emitted
    pub signed: bool,
    /// Number of integer digits
    pub integer_digits: usize,
    /// Number of fraction digits (0 when no `V` clause)
    pub fraction_digits: usize,
}

impl PictureFormat {
    /// Parse a picture string like `9(7)`, `+9(12)V9(6)`, or `-9(3)V9(2)`
    pub fn parse(picture: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidPicture {
            picture: picture.to_string(),
            message: message.to_string(),
        };

        let mut rest = picture.trim();
        let signed = match rest.chars().next() {
            Some('+') | Some('-') => {
                rest = &rest[1..];
                true
            }
            _ => false,
        };

        let (integer_digits, after) = parse_digit_clause(rest)
            .ok_or_else(|| invalid("expected integer clause like 9(n)"))?;

        let fraction_digits = if after.is_empty() {
            0
        } else {
            let after = after
                .strip_prefix('V')
                .ok_or_else(|| invalid("expected 'V' before fraction clause"))?;
            let (digits, tail) = parse_digit_clause(after)
                .ok_or_else(|| invalid("expected fraction clause like 9(n)"))?;
            if !tail.is_empty() {
                return Err(invalid("trailing characters after fraction clause"));
            }
            digits
        };

        if integer_digits == 0 {
            return Err(invalid("integer digit count must be at least 1"));
        }

        Ok(Self {
            signed,
            integer_digits,
            fraction_digits,
        })
    }

    /// Total emitted width: sign (if any) + integer + fraction digits
    pub fn width(&self) -> usize {
        usize::from(self.signed) + self.integer_digits + self.fraction_digits
    }
}

/// Parse a `9(n)` clause, returning the digit count and the remaining input
fn parse_digit_clause(input: &str) -> Option<(usize, &str)> {
    let rest = input.strip_prefix("9(")?;
    let close = rest.find(')')?;
    let count: usize = rest[..close].parse().ok()?;
    Some((count, &rest[close + 1..]))
}

/// Format a value according to a picture.
///
/// The value is parsed as a decimal number; non-numeric input degrades to
/// zero, matching the row-level resilience policy of the transformation
/// engine. Integer digits that overflow the picture are truncated from the
/// left, keeping the least significant digits.
pub fn format_picture(value: &str, picture: &PictureFormat) -> String {
    let parsed: f64 = value.trim().parse().unwrap_or(0.0);
    let negative = parsed < 0.0;
    let magnitude = parsed.abs();

    // Render with the picture's fraction precision, then strip the point.
    let rendered = format!("{magnitude:.prec$}", prec = picture.fraction_digits);
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (rendered, String::new()),
    };

    let int_digits = if int_part.len() > picture.integer_digits {
        int_part[int_part.len() - picture.integer_digits..].to_string()
    } else {
        format!("{int_part:0>width$}", width = picture.integer_digits)
    };

    let mut out = String::with_capacity(picture.width());
    if picture.signed {
        out.push(if negative { '-' } else { '+' });
    }
    out.push_str(&int_digits);
    out.push_str(&frac_part);
    out
}
