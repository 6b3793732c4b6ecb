//! `hh:mm:ss` time strings.
//!
//! Times travel through the crate as whole milliseconds (`u64`). This module
//! converts between that representation and the `hh:mm:ss` text a user types.
//!
//! # Example
//!
//! ```
//! use framepick::{format_milliseconds, parse_time};
//!
//! assert_eq!(parse_time("0:1:53")?, 113_000);
//! assert_eq!(format_milliseconds(113_000), "00:01:53");
//! # Ok::<(), framepick::FrameError>(())
//! ```

use crate::error::FrameError;

const MILLISECONDS_PER_SECOND: u64 = 1_000;
const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;

/// Parse an `hh:mm:ss` string into milliseconds.
///
/// Exactly three colon-separated fields of ASCII digits are accepted. Fields
/// may have any width, and minutes and seconds are not checked against 60:
/// `"0:0:90"` is ninety seconds.
///
/// # Errors
///
/// Returns [`FrameError::Format`] for any other shape, for empty or
/// non-numeric fields, and when the total overflows a `u64`.
pub fn parse_time(text: &str) -> Result<u64, FrameError> {
    let trimmed = text.trim();
    let fields: Vec<&str> = trimmed.split(':').collect();
    if fields.len() != 3 {
        return Err(FrameError::format(
            text,
            format!("expected 3 fields, found {}", fields.len()),
        ));
    }

    let hours = parse_field(text, fields[0], "hours")?;
    let minutes = parse_field(text, fields[1], "minutes")?;
    let seconds = parse_field(text, fields[2], "seconds")?;

    hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|total| total.checked_add(minutes.checked_mul(SECONDS_PER_MINUTE)?))
        .and_then(|total| total.checked_add(seconds))
        .and_then(|total| total.checked_mul(MILLISECONDS_PER_SECOND))
        .ok_or_else(|| FrameError::format(text, "time is too large"))
}

fn parse_field(text: &str, field: &str, name: &str) -> Result<u64, FrameError> {
    if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(FrameError::format(
            text,
            format!("{name} must be a non-negative integer"),
        ));
    }
    field
        .parse::<u64>()
        .map_err(|error| FrameError::format(text, format!("{name}: {error}")))
}

/// Format milliseconds as zero-padded `hh:mm:ss`.
///
/// Sub-second remainders are dropped, never rounded. Hours grow past two
/// digits for very long media.
pub fn format_milliseconds(milliseconds: u64) -> String {
    let total_seconds = milliseconds / MILLISECONDS_PER_SECOND;
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
