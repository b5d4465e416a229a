use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::auth::{AuthContext, Role};
use super::availability::{
    self, AvailabilityConfig, AvailabilityVerdict, ConfigPatch, ConfigValidationError,
    TemporalParseError,
};
use super::domain::{Assessment, AssessmentId, AttemptRecord, UserId};
use super::notifications::DispatchError;
use super::repository::{AssessmentStore, AttemptLedger, NotificationError, StoreError};
use super::sweeper::SweepError;

/// Service composing the assessment store, attempt ledger, and availability
/// evaluation. Each call is a single read-evaluate round trip; the service
/// holds no per-request state.
pub struct AssessmentService<S, L> {
    store: Arc<S>,
    ledger: Arc<L>,
}

impl<S, L> AssessmentService<S, L>
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
{
    pub fn new(store: Arc<S>, ledger: Arc<L>) -> Self {
        Self { store, ledger }
    }

    pub fn load(&self, id: &AssessmentId) -> Result<Assessment, AssessmentServiceError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| AssessmentServiceError::UnknownAssessment(id.clone()))
    }

    /// Availability check for one student. A pure read: it never consumes an
    /// attempt slot.
    pub fn check_availability(
        &self,
        id: &AssessmentId,
        user_id: &UserId,
        now: NaiveDateTime,
    ) -> Result<AvailabilityDecision, AssessmentServiceError> {
        let assessment = self.load(id)?;
        let attempt_count = self.ledger.count_attempts(id, user_id)?;
        let verdict = availability::evaluate(
            &assessment.config,
            assessment.published,
            now,
            attempt_count,
        )?;

        Ok(AvailabilityDecision {
            assessment_id: id.clone(),
            user_id: user_id.clone(),
            attempt_count,
            verdict,
        })
    }

    /// The canonical config with every default filled, as served to editors.
    pub fn resolved_config(
        &self,
        id: &AssessmentId,
    ) -> Result<AvailabilityConfig, AssessmentServiceError> {
        Ok(self.load(id)?.config)
    }

    /// Validate and persist a teacher's partial config edit. The stored
    /// config is untouched when validation rejects the merge.
    pub fn update_config(
        &self,
        auth: &AuthContext,
        id: &AssessmentId,
        patch: &ConfigPatch,
    ) -> Result<AvailabilityConfig, AssessmentServiceError> {
        if !auth.can_manage_assessments() {
            return Err(AssessmentServiceError::Forbidden(auth.role));
        }

        let assessment = self.load(id)?;
        let merged = patch.apply_to(&assessment.config);
        merged.validate()?;

        self.store.update_config(id, merged.clone())?;
        Ok(merged)
    }

    /// Submission flow: gate on the availability verdict, then append to the
    /// ledger. The gate is advisory under concurrent submitters (the ledger
    /// write is not serialized with the count).
    pub fn submit_attempt(
        &self,
        id: &AssessmentId,
        user_id: &UserId,
        now: NaiveDateTime,
    ) -> Result<SubmissionOutcome, AssessmentServiceError> {
        let decision = self.check_availability(id, user_id, now)?;
        if !decision.verdict.is_available() {
            return Ok(SubmissionOutcome::Refused(decision));
        }

        let record = self.ledger.record_attempt(id, user_id, now)?;
        Ok(SubmissionOutcome::Recorded { record, decision })
    }
}

/// Evaluator output plus the inputs a caller needs to act on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityDecision {
    pub assessment_id: AssessmentId,
    pub user_id: UserId,
    /// Committed attempts at evaluation time.
    pub attempt_count: u32,
    pub verdict: AvailabilityVerdict,
}

impl AvailabilityDecision {
    pub fn view(&self) -> AvailabilityView {
        let (available_at, deadline, remaining_time) = match &self.verdict {
            AvailabilityVerdict::NotStarted { available_at } => (Some(*available_at), None, None),
            AvailabilityVerdict::DeadlinePassed { deadline } => (None, Some(*deadline), None),
            AvailabilityVerdict::Available {
                deadline,
                remaining_ms,
            } => (None, *deadline, *remaining_ms),
            _ => (None, None, None),
        };

        AvailabilityView {
            success: true,
            available: self.verdict.is_available(),
            status: self.verdict.status_label(),
            reason: self.verdict.reason(),
            available_at,
            deadline,
            remaining_time,
        }
    }
}

/// Wire shape of the availability check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityView {
    pub success: bool,
    pub available: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    /// Milliseconds until the deadline; absent when no deadline is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<i64>,
}

/// Result of the submission flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Recorded {
        record: AttemptRecord,
        /// The decision that admitted the attempt; its `attempt_count` is
        /// the pre-submission value.
        decision: AvailabilityDecision,
    },
    Refused(AvailabilityDecision),
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("assessment '{0}' not found")]
    UnknownAssessment(AssessmentId),
    #[error("role '{}' may not manage assessment settings", .0.label())]
    Forbidden(Role),
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
}
