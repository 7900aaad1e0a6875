//! Parsing and formatting of human-entered durations.
//!
//! Accepted forms:
//!
//! ```text
//! 90      -> 90 s
//! 5s      -> 5 s
//! 2m      -> 120 s
//! 1:30    -> 90 s
//! 1:00:00 -> 3600 s
//! ```

use crate::error::ValidationError;

/// Parse a duration string into seconds.
///
/// Colon groups accumulate left to right in base 60, so `1:2:3` is
/// `(1 * 60 + 2) * 60 + 3`. A unit suffix is only allowed on the plain form.
pub fn parse_duration(value: &str) -> Result<u64, ValidationError> {
    let cleaned = value.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }

    if cleaned.contains(':') {
        if cleaned.ends_with('s') || cleaned.ends_with('m') {
            return Err(ValidationError::SuffixOnColonForm);
        }
        let mut total: u64 = 0;
        for part in cleaned.split(':') {
            if !is_digits(part) {
                return Err(ValidationError::NonDigitGroup);
            }
            let group = part.parse::<u64>().map_err(|_| ValidationError::Overflow)?;
            total = total
                .checked_mul(60)
                .and_then(|t| t.checked_add(group))
                .ok_or(ValidationError::Overflow)?;
        }
        return Ok(total);
    }

    let (digits, multiplier) = if let Some(rest) = cleaned.strip_suffix('m') {
        (rest, 60)
    } else if let Some(rest) = cleaned.strip_suffix('s') {
        (rest, 1)
    } else {
        (cleaned.as_str(), 1)
    };

    if !is_digits(digits) {
        return Err(ValidationError::NotNumeric);
    }
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or(ValidationError::Overflow)
}

/// Parse a positive whole number such as a round or cycle count.
pub fn parse_count(field: &str, value: &str) -> Result<u32, ValidationError> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return Err(ValidationError::Empty);
    }
    if !is_digits(cleaned) {
        return Err(ValidationError::NotACount {
            field: field.to_string(),
        });
    }
    cleaned.parse::<u32>().map_err(|_| ValidationError::NotACount {
        field: field.to_string(),
    })
}

/// Render seconds as `mm:ss`, or `hh:mm:ss` when there are whole hours and
/// `include_hours` is set. Without hours, minutes keep growing past 59.
pub fn format_seconds(seconds: u64, include_hours: bool) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if include_hours && hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{:02}:{secs:02}", seconds / 60)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
