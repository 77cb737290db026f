//! Clock text helpers
//!
//! Formatting of remaining time as `HH:MM:SS` and parsing of user-entered
//! durations such as `90`, `90s`, `2m` or `1.5h`.

use crate::error::ClockError;

/// Format seconds as `HH:MM:SS`. Hours are not capped at 24.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Seconds left in a countdown of `duration_secs` after `elapsed_ticks`
pub fn remaining_secs(duration_secs: u64, elapsed_ticks: u64) -> u64 {
    duration_secs.saturating_sub(elapsed_ticks)
}

/// Parse a duration into whole seconds.
///
/// A trailing `s`, `m` or `h` selects the unit (seconds when absent).
/// Fractional results are truncated: `"1.5m"` is 90, `"0.5s"` is rejected.
pub fn parse_duration(text: &str) -> Result<u64, ClockError> {
    let input = text.trim();
    if input.is_empty() {
        return Err(ClockError::Empty);
    }

    let lower = input.to_ascii_lowercase();
    let (number, multiplier) = match lower.as_bytes()[lower.len() - 1] {
        b's' => (&lower[..lower.len() - 1], 1.0),
        b'm' => (&lower[..lower.len() - 1], 60.0),
        b'h' => (&lower[..lower.len() - 1], 3600.0),
        _ => (lower.as_str(), 1.0),
    };

    let invalid = || ClockError::Invalid {
        input: input.to_string(),
    };
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    let secs = (value * multiplier).trunc();
    if secs > u64::MAX as f64 {
        return Err(invalid());
    }
    match secs as u64 {
        0 => Err(ClockError::Zero {
            input: input.to_string(),
        }),
        secs => Ok(secs),
    }
}
