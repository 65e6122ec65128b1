//! Value formatting utilities
//!
//! Padding/truncation to fixed field widths and COBOL-style picture
//! numeric formatting. Leaf module; everything here is pure.

mod picture;

pub use picture::{format_picture, PictureFormat};

use serde::{Deserialize, Serialize};

/// Which side of a value receives pad characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadSide {
    /// Pad on the left (right-align), typical for numeric fields
    Left,
    /// Pad on the right (left-align), typical for text fields
    #[default]
    Right,
}

/// Pad or truncate `value` to exactly `length` characters.
///
/// A non-positive `length` means "no padding/truncation" and returns the
/// value unchanged. Values already at or above the target length are
/// truncated to exactly `length` characters.
pub fn pad_value(value: &str, length: i64, side: PadSide, pad_char: char) -> String {
    if length <= 0 {
        return value.to_string();
    }
    let length = length as usize;
    let char_count = value.chars().count();

    if char_count >= length {
        return value.chars().take(length).collect();
    }

    let padding: String = std::iter::repeat(pad_char)
        .take(length - char_count)
        .collect();
    match side {
        PadSide::Left => format!("{padding}{value}"),
        PadSide::Right => format!("{value}{padding}"),
    }
}
