//! Assessment availability, attempt control, and deadline notifications.
//!
//! The hosted document store, identity service, and course CRUD surfaces sit
//! behind the port traits in [`repository`]; everything in here is exercised
//! against in-memory implementations in tests and in the bundled API service.

pub mod auth;
pub mod availability;
pub mod domain;
pub mod notifications;
pub mod repository;
pub mod router;
pub mod service;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use auth::{AuthContext, Role};
pub use availability::{
    evaluate, AvailabilityConfig, AvailabilityVerdict, ConfigPatch, ConfigValidationError,
    StudentAccess, TemporalParseError,
};
pub use domain::{
    Assessment, AssessmentId, AssessmentKind, AssessmentLifecycle, AttemptRecord, CourseId,
    NotificationKind, NotificationRecord, Question, UserId,
};
pub use notifications::{DispatchError, NotificationDispatcher};
pub use repository::{
    AssessmentStore, AttemptLedger, EnrollmentDirectory, NotificationError, NotificationSink,
    StoreError,
};
pub use router::{assessment_router, AssessmentState};
pub use service::{
    AssessmentService, AssessmentServiceError, AvailabilityDecision, AvailabilityView,
    SubmissionOutcome,
};
pub use sweeper::{DeadlineSweeper, SweepError, SweepFailure, SweepOutcome, SweepReport};
