use chrono::NaiveDateTime;

use super::availability::AvailabilityConfig;
use super::domain::{Assessment, AssessmentId, AttemptRecord, CourseId, NotificationRecord, UserId};

/// Storage abstraction over the platform's assessment documents so the
/// availability core can be exercised without the hosted document store.
pub trait AssessmentStore: Send + Sync {
    fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError>;

    /// Replace the embedded config document. Merge-into-canonical happens in
    /// the service layer; the store persists whole sub-documents so writers
    /// never clobber unrelated fields they did not read.
    fn update_config(
        &self,
        id: &AssessmentId,
        config: AvailabilityConfig,
    ) -> Result<(), StoreError>;

    fn set_published(
        &self,
        id: &AssessmentId,
        published: bool,
        auto_unavailable_at: Option<NaiveDateTime>,
    ) -> Result<(), StoreError>;

    /// All currently published assessments, the sweep scan set.
    fn published(&self) -> Result<Vec<Assessment>, StoreError>;
}

/// Query and append submission attempts per (assessment, student) pair.
///
/// `count_attempts` is an uncached equality query reflecting latest committed
/// state; `record_attempt` is invoked only by the submission flow. Two racing
/// submitters can each observe the pre-write count, so the max-attempt cap is
/// advisory unless the backing store serializes attempt creation.
pub trait AttemptLedger: Send + Sync {
    fn count_attempts(
        &self,
        assessment_id: &AssessmentId,
        user_id: &UserId,
    ) -> Result<u32, StoreError>;

    fn record_attempt(
        &self,
        assessment_id: &AssessmentId,
        user_id: &UserId,
        submitted_at: NaiveDateTime,
    ) -> Result<AttemptRecord, StoreError>;
}

/// Enrollment lookup owned by the course subsystem.
pub trait EnrollmentDirectory: Send + Sync {
    fn enrolled_students(&self, course_id: &CourseId) -> Result<Vec<UserId>, StoreError>;
}

/// Outbound notification persistence (the student-facing inbox).
pub trait NotificationSink: Send + Sync {
    fn create(&self, record: NotificationRecord) -> Result<(), NotificationError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
