use chrono::NaiveDateTime;

/// Categorical answer to "can this student attempt this assessment right
/// now". Variants are ordered by evaluation precedence; the first matching
/// rule wins, so a disabled assessment reports `AccessDisabled` even when it
/// is also past its deadline.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityVerdict {
    NotPublished,
    AccessDisabled,
    NotStarted {
        available_at: NaiveDateTime,
    },
    DeadlinePassed {
        deadline: NaiveDateTime,
    },
    MaxAttemptsReached {
        attempts: u32,
        limit: u32,
    },
    Available {
        deadline: Option<NaiveDateTime>,
        remaining_ms: Option<i64>,
    },
}

impl AvailabilityVerdict {
    pub const fn status_label(&self) -> &'static str {
        match self {
            AvailabilityVerdict::NotPublished => "not_published",
            AvailabilityVerdict::AccessDisabled => "access_disabled",
            AvailabilityVerdict::NotStarted { .. } => "not_started",
            AvailabilityVerdict::DeadlinePassed { .. } => "deadline_passed",
            AvailabilityVerdict::MaxAttemptsReached { .. } => "max_attempts_reached",
            AvailabilityVerdict::Available { .. } => "available",
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, AvailabilityVerdict::Available { .. })
    }

    /// Human-readable explanation for a blocked verdict, rendered as-is by
    /// the front end. `None` when the assessment is available.
    pub fn reason(&self) -> Option<String> {
        match self {
            AvailabilityVerdict::NotPublished => Some("assessment is not published".to_string()),
            AvailabilityVerdict::AccessDisabled => {
                Some("student access is disabled for this assessment".to_string())
            }
            AvailabilityVerdict::NotStarted { available_at } => {
                Some(format!("assessment opens at {available_at}"))
            }
            AvailabilityVerdict::DeadlinePassed { deadline } => {
                Some(format!("submission deadline {deadline} has passed"))
            }
            AvailabilityVerdict::MaxAttemptsReached { attempts, limit } => Some(format!(
                "maximum of {limit} attempt(s) reached ({attempts} recorded)"
            )),
            AvailabilityVerdict::Available { .. } => None,
        }
    }
}
