use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rules;
use super::rules::TemporalParseError;

/// Whether students may reach the assessment at all, and through which mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentAccess {
    Online,
    Offline,
    Disabled,
}

impl StudentAccess {
    pub const fn label(self) -> &'static str {
        match self {
            StudentAccess::Online => "online",
            StudentAccess::Offline => "offline",
            StudentAccess::Disabled => "disabled",
        }
    }
}

/// Canonical availability configuration embedded in an assessment document.
/// Deserializing fills every omitted field from the default table, so a
/// stored partial document always normalizes to a complete config. Unknown
/// keys are preserved in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityConfig {
    pub total_marks: i32,
    pub passing_marks: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub student_access: StudentAccess,
    pub allow_multiple_attempts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    pub enable_reminder: bool,
    /// Hours before the deadline at which reminders fire.
    #[serde(rename = "reminderBefore")]
    pub reminder_before_hours: u32,
    pub send_notification_on_start: bool,
    pub auto_unavailable: bool,
    pub show_results: bool,
    pub shuffle_questions: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            total_marks: 100,
            passing_marks: 40,
            start_date: None,
            start_time: None,
            end_date: None,
            end_time: None,
            student_access: StudentAccess::Online,
            allow_multiple_attempts: false,
            max_attempts: None,
            enable_reminder: false,
            reminder_before_hours: 24,
            send_notification_on_start: false,
            auto_unavailable: true,
            show_results: true,
            shuffle_questions: false,
            extra: BTreeMap::new(),
        }
    }
}

impl AvailabilityConfig {
    /// Write-path validation. The read path never re-validates; documents
    /// that predate a rule keep evaluating under fail-closed semantics.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.total_marks <= 0 {
            return Err(ConfigValidationError::NonPositiveTotalMarks(
                self.total_marks,
            ));
        }
        if self.passing_marks < 0 {
            return Err(ConfigValidationError::NegativePassingMarks(
                self.passing_marks,
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigValidationError::ZeroMaxAttempts);
        }

        if let Some(raw) = &self.start_time {
            rules::parse_clock(raw)?;
        }
        if let Some(raw) = &self.end_time {
            rules::parse_clock(raw)?;
        }

        if let (Some(start), Some(end)) = (
            rules::start_instant(self)?,
            rules::submission_deadline(self)?,
        ) {
            if start >= end {
                return Err(ConfigValidationError::InvertedWindow { start, end });
            }
        }

        Ok(())
    }
}

/// Partial configuration supplied by a teacher edit. Fields left out of the
/// payload keep their stored values; unknown keys flow into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub total_marks: Option<i32>,
    pub passing_marks: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<String>,
    pub student_access: Option<StudentAccess>,
    pub allow_multiple_attempts: Option<bool>,
    pub max_attempts: Option<u32>,
    pub enable_reminder: Option<bool>,
    #[serde(rename = "reminderBefore")]
    pub reminder_before_hours: Option<u32>,
    pub send_notification_on_start: Option<bool>,
    pub auto_unavailable: Option<bool>,
    pub show_results: Option<bool>,
    pub shuffle_questions: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigPatch {
    /// Shallow-merge this patch over `base`: supplied keys win, absent keys
    /// keep the stored value, extras merge key-wise. Pure; persisting the
    /// result is the caller's responsibility.
    pub fn apply_to(&self, base: &AvailabilityConfig) -> AvailabilityConfig {
        let mut merged = base.clone();

        if let Some(value) = self.total_marks {
            merged.total_marks = value;
        }
        if let Some(value) = self.passing_marks {
            merged.passing_marks = value;
        }
        if let Some(value) = self.start_date {
            merged.start_date = Some(value);
        }
        if let Some(value) = &self.start_time {
            merged.start_time = Some(value.clone());
        }
        if let Some(value) = self.end_date {
            merged.end_date = Some(value);
        }
        if let Some(value) = &self.end_time {
            merged.end_time = Some(value.clone());
        }
        if let Some(value) = self.student_access {
            merged.student_access = value;
        }
        if let Some(value) = self.allow_multiple_attempts {
            merged.allow_multiple_attempts = value;
        }
        if let Some(value) = self.max_attempts {
            merged.max_attempts = Some(value);
        }
        if let Some(value) = self.enable_reminder {
            merged.enable_reminder = value;
        }
        if let Some(value) = self.reminder_before_hours {
            merged.reminder_before_hours = value;
        }
        if let Some(value) = self.send_notification_on_start {
            merged.send_notification_on_start = value;
        }
        if let Some(value) = self.auto_unavailable {
            merged.auto_unavailable = value;
        }
        if let Some(value) = self.show_results {
            merged.show_results = value;
        }
        if let Some(value) = self.shuffle_questions {
            merged.shuffle_questions = value;
        }

        for (key, value) in &self.extra {
            merged.extra.insert(key.clone(), value.clone());
        }

        merged
    }
}

/// Rejections raised when persisting an edited configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("total marks must be positive (got {0})")]
    NonPositiveTotalMarks(i32),
    #[error("passing marks must not be negative (got {0})")]
    NegativePassingMarks(i32),
    #[error("max attempts must be at least 1")]
    ZeroMaxAttempts,
    #[error(transparent)]
    MalformedClock(#[from] TemporalParseError),
    #[error("availability window is inverted: start {start} is not before end {end}")]
    InvertedWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}
