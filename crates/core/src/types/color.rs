//! Soft validation for color attribute values.
//!
//! Color values are free text. A value that is neither a common color name nor
//! a `#RGB`/`#RRGGBB` hex code is still accepted; callers only raise an advisory.

/// Color names recognized without an advisory (compared case-insensitively).
pub const COMMON_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "purple", "pink", "orange", "brown",
    "gray", "cyan", "magenta", "silver", "gold", "navy", "teal", "maroon", "olive", "lime",
    "aqua",
];

/// Returns true if `value` is a `#RGB` or `#RRGGBB` hex color.
///
/// ```
/// use univendor_core::is_hex_color;
///
/// assert!(is_hex_color("#fff"));
/// assert!(is_hex_color("#A1B2C3"));
/// assert!(!is_hex_color("#abcd"));
/// assert!(!is_hex_color("fff"));
/// ```
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Returns true if `value` is a common color name or a hex color.
#[must_use]
pub fn is_recognized_color(value: &str) -> bool {
    if is_hex_color(value) {
        return true;
    }
    let lower = value.to_lowercase();
    COMMON_COLORS.contains(&lower.as_str())
}
