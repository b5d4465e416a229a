mod config;
mod rules;
mod verdict;

pub use config::{AvailabilityConfig, ConfigPatch, ConfigValidationError, StudentAccess};
pub use rules::{effective_attempt_cap, start_instant, submission_deadline, TemporalParseError};
pub use verdict::AvailabilityVerdict;

use chrono::NaiveDateTime;

/// Decide whether a student may attempt an assessment right now.
///
/// Pure over its inputs: the stored config, the publish flag, the caller's
/// clock, and the student's committed attempt count. Rules apply in strict
/// precedence; the first blocking rule wins.
pub fn evaluate(
    config: &AvailabilityConfig,
    published: bool,
    now: NaiveDateTime,
    attempt_count: u32,
) -> Result<AvailabilityVerdict, TemporalParseError> {
    if !published {
        return Ok(AvailabilityVerdict::NotPublished);
    }

    if config.student_access == StudentAccess::Disabled {
        return Ok(AvailabilityVerdict::AccessDisabled);
    }

    if let Some(start) = rules::start_instant(config)? {
        if now < start {
            return Ok(AvailabilityVerdict::NotStarted {
                available_at: start,
            });
        }
    }

    let deadline = rules::submission_deadline(config)?;
    if let Some(deadline) = deadline {
        if now > deadline {
            return Ok(AvailabilityVerdict::DeadlinePassed { deadline });
        }
    }

    if let Some(limit) = rules::effective_attempt_cap(config) {
        if attempt_count >= limit {
            return Ok(AvailabilityVerdict::MaxAttemptsReached {
                attempts: attempt_count,
                limit,
            });
        }
    }

    Ok(AvailabilityVerdict::Available {
        deadline,
        remaining_ms: deadline.map(|deadline| (deadline - now).num_milliseconds().max(0)),
    })
}
