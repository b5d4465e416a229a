use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityConfig;

/// Identifier wrapper for assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the owning course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub String);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for platform users (students and staff alike).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gradeable unit categories supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Quiz,
    Coding,
    Assignment,
}

impl AssessmentKind {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentKind::Quiz => "quiz",
            AssessmentKind::Coding => "coding",
            AssessmentKind::Assignment => "assignment",
        }
    }
}

/// Question snapshot carried on the assessment document. Question content is
/// authored elsewhere; the availability core only preserves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub points: i32,
}

/// An assessment document as stored for a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub kind: AssessmentKind,
    pub questions: Vec<Question>,
    pub published: bool,
    pub config: AvailabilityConfig,
    /// Stamped when the sweeper auto-closes the assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_unavailable_at: Option<NaiveDateTime>,
}

/// Coarse lifecycle derived from the stored flags. `Closed` is terminal for
/// the availability core; reopening is a manual editing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentLifecycle {
    Draft,
    Published,
    Closed,
}

impl Assessment {
    pub fn lifecycle(&self) -> AssessmentLifecycle {
        if self.published {
            AssessmentLifecycle::Published
        } else if self.auto_unavailable_at.is_some() {
            AssessmentLifecycle::Closed
        } else {
            AssessmentLifecycle::Draft
        }
    }
}

/// One completed submission by a student against an assessment. The count of
/// these records per (assessment, student) pair is the attempt count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub assessment_id: AssessmentId,
    pub user_id: UserId,
    pub submitted_at: NaiveDateTime,
}

/// Notification categories emitted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DeadlineReminder,
    AssessmentAvailable,
    AssessmentClosed,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::DeadlineReminder => "deadline_reminder",
            NotificationKind::AssessmentAvailable => "assessment_available",
            NotificationKind::AssessmentClosed => "assessment_closed",
        }
    }
}

/// Persisted notification addressed to one student. Read-state is mutated by
/// the student-facing UI, never by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub user_id: UserId,
    pub assessment_id: AssessmentId,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}
