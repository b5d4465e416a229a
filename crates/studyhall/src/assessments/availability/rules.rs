use chrono::{NaiveDateTime, NaiveTime};

use super::config::AvailabilityConfig;

/// Clock applied to a start date when no explicit time is configured.
pub(crate) const DEFAULT_START_TIME: &str = "00:00";
/// Clock applied to an end date when no explicit time is configured.
pub(crate) const DEFAULT_END_TIME: &str = "23:59";

/// Raised for clock strings that do not parse as `HH:MM`. The evaluator
/// fails closed on these rather than letting a malformed bound read as open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed clock time '{value}': expected HH:MM")]
pub struct TemporalParseError {
    pub value: String,
}

pub(crate) fn parse_clock(raw: &str) -> Result<NaiveTime, TemporalParseError> {
    let malformed = || TemporalParseError {
        value: raw.to_string(),
    };

    let (hour, minute) = match raw.split_once(':') {
        Some(parts) => parts,
        None => return Err(malformed()),
    };

    let hour = hour.trim().parse::<u32>().map_err(|_| malformed())?;
    let minute = minute.trim().parse::<u32>().map_err(|_| malformed())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

/// Local-time instant before which access is denied, when a start date is set.
/// The clock string composes onto the date with seconds zeroed.
pub fn start_instant(config: &AvailabilityConfig) -> Result<Option<NaiveDateTime>, TemporalParseError> {
    match config.start_date {
        Some(date) => {
            let clock = parse_clock(config.start_time.as_deref().unwrap_or(DEFAULT_START_TIME))?;
            Ok(Some(date.and_time(clock)))
        }
        None => Ok(None),
    }
}

/// Submission deadline instant, when an end date is set. Composed the same
/// way as the start bound, defaulting to the end of the day at 23:59.
pub fn submission_deadline(
    config: &AvailabilityConfig,
) -> Result<Option<NaiveDateTime>, TemporalParseError> {
    match config.end_date {
        Some(date) => {
            let clock = parse_clock(config.end_time.as_deref().unwrap_or(DEFAULT_END_TIME))?;
            Ok(Some(date.and_time(clock)))
        }
        None => Ok(None),
    }
}

/// Number of attempts a student may consume, or `None` for unlimited.
/// Attempts are capped whenever multiple attempts are disallowed or an
/// explicit cap is configured; a stored 0 behaves like the unset default.
pub fn effective_attempt_cap(config: &AvailabilityConfig) -> Option<u32> {
    if config.allow_multiple_attempts && config.max_attempts.is_none() {
        return None;
    }

    match config.max_attempts {
        Some(0) | None => Some(1),
        Some(limit) => Some(limit),
    }
}
