//! Names, titles and number formatting for frames and log output.

use crate::models::FrameKey;
use crate::settings::OutputFormat;

/// Deterministic file name for a frame, e.g. `"2-17.png"`.
///
/// # Examples
///
/// ```
/// use flowmap_core::formatting::frame_file_name;
/// use flowmap_core::models::FrameKey;
/// use flowmap_core::settings::OutputFormat;
///
/// assert_eq!(frame_file_name(FrameKey::new(2, 17), OutputFormat::Png), "2-17.png");
/// assert_eq!(frame_file_name(FrameKey::new(0, 0), OutputFormat::Svg), "0-0.svg");
/// ```
pub fn frame_file_name(key: FrameKey, format: OutputFormat) -> String {
    format!("{}-{}.{}", key.year, key.day, format.extension())
}

/// Title drawn above a frame.
pub fn frame_title(key: FrameKey) -> String {
    format!(
        "Bird Observations and Movements: Year {} Day {}",
        key.year, key.day
    )
}

/// Format an unsigned count with thousands separators.
///
/// # Examples
///
/// ```
/// use flowmap_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a signed net flow with an explicit sign, e.g. `"+1,200"`, `"-7"`.
pub fn format_net_flow(value: i64) -> String {
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    match value.signum() {
        1 => format!("+{}", grouped),
        -1 => format!("-{}", grouped),
        _ => grouped,
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
