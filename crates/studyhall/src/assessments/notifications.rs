use std::sync::Arc;

use chrono::NaiveDateTime;

use super::availability::{submission_deadline, TemporalParseError};
use super::domain::{Assessment, NotificationKind, NotificationRecord};
use super::repository::{EnrollmentDirectory, NotificationError, NotificationSink, StoreError};

/// Fans availability events out to every student enrolled in the
/// assessment's course, one persisted record per student.
///
/// Calls are not idempotent: invoking the same transition twice duplicates
/// records. Callers own not re-firing for a transition already announced.
pub struct NotificationDispatcher<E, N> {
    enrollment: Arc<E>,
    sink: Arc<N>,
}

impl<E, N> NotificationDispatcher<E, N>
where
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(enrollment: Arc<E>, sink: Arc<N>) -> Self {
        Self { enrollment, sink }
    }

    /// Deadline reminders. A no-op returning 0 unless reminders are enabled;
    /// the message embeds the configured lead time.
    pub fn send_reminders(
        &self,
        assessment: &Assessment,
        now: NaiveDateTime,
    ) -> Result<usize, DispatchError> {
        if !assessment.config.enable_reminder {
            return Ok(0);
        }

        let message = format!(
            "Reminder: '{}' is due within {} hour(s).",
            assessment.title, assessment.config.reminder_before_hours
        );
        self.fan_out(assessment, NotificationKind::DeadlineReminder, message, now)
    }

    /// Opening announcement. A no-op returning 0 unless configured.
    pub fn send_availability(
        &self,
        assessment: &Assessment,
        now: NaiveDateTime,
    ) -> Result<usize, DispatchError> {
        if !assessment.config.send_notification_on_start {
            return Ok(0);
        }

        let message = format!("'{}' is now available for attempts.", assessment.title);
        self.fan_out(
            assessment,
            NotificationKind::AssessmentAvailable,
            message,
            now,
        )
    }

    /// Closure announcement, fired when the sweeper (or a manual unpublish
    /// flow) closes the assessment.
    pub fn send_closure(
        &self,
        assessment: &Assessment,
        now: NaiveDateTime,
    ) -> Result<usize, DispatchError> {
        let message = format!(
            "'{}' is closed; the submission deadline has passed.",
            assessment.title
        );
        self.fan_out(assessment, NotificationKind::AssessmentClosed, message, now)
    }

    fn fan_out(
        &self,
        assessment: &Assessment,
        kind: NotificationKind,
        message: String,
        now: NaiveDateTime,
    ) -> Result<usize, DispatchError> {
        let deadline = submission_deadline(&assessment.config)?;
        let students = self.enrollment.enrolled_students(&assessment.course_id)?;

        for student in &students {
            self.sink.create(NotificationRecord {
                user_id: student.clone(),
                assessment_id: assessment.id.clone(),
                kind,
                message: message.clone(),
                deadline,
                read: false,
                created_at: now,
            })?;
        }

        Ok(students.len())
    }
}

/// Error raised while fanning out notifications.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] NotificationError),
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
}
