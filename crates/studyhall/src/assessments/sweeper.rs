use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::availability::{submission_deadline, TemporalParseError};
use super::domain::{Assessment, AssessmentId};
use super::notifications::{DispatchError, NotificationDispatcher};
use super::repository::{AssessmentStore, EnrollmentDirectory, NotificationSink, StoreError};

/// Closes published assessments whose submission deadline has passed and
/// announces the closure to enrolled students.
///
/// Per assessment: `published --deadline exceeded & autoUnavailable--> closed`
/// (`published = false`, `auto_unavailable_at` stamped). Closed is terminal
/// here; the `published` guard keeps repeated sweeps from re-firing
/// notifications.
pub struct DeadlineSweeper<S, E, N> {
    store: Arc<S>,
    dispatcher: Arc<NotificationDispatcher<E, N>>,
}

impl<S, E, N> DeadlineSweeper<S, E, N>
where
    S: AssessmentStore + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<NotificationDispatcher<E, N>>) -> Self {
        Self { store, dispatcher }
    }

    /// Apply the closure transition to one assessment. No-op when the
    /// assessment is unpublished, has no deadline, keeps `auto_unavailable`
    /// off (the teacher unpublishes manually), or is still inside its window.
    pub fn sweep(
        &self,
        assessment: &Assessment,
        now: NaiveDateTime,
    ) -> Result<SweepOutcome, SweepError> {
        if !assessment.published || !assessment.config.auto_unavailable {
            return Ok(SweepOutcome::untouched());
        }

        let deadline = match submission_deadline(&assessment.config)? {
            Some(deadline) => deadline,
            None => return Ok(SweepOutcome::untouched()),
        };
        if now <= deadline {
            return Ok(SweepOutcome::untouched());
        }

        self.store.set_published(&assessment.id, false, Some(now))?;

        let mut closed = assessment.clone();
        closed.published = false;
        closed.auto_unavailable_at = Some(now);
        let notified = self.dispatcher.send_closure(&closed, now)?;

        info!(
            assessment = %assessment.id,
            %deadline,
            notified,
            "assessment auto-closed past deadline"
        );

        Ok(SweepOutcome {
            updated: true,
            notified,
        })
    }

    /// Batch pass over every published assessment. A failing assessment is
    /// logged and reported without halting the rest of the batch.
    pub fn sweep_all(&self, now: NaiveDateTime) -> Result<SweepReport, SweepError> {
        let candidates = self.store.published()?;

        let mut report = SweepReport {
            scanned: candidates.len(),
            closed: 0,
            notified: 0,
            failures: Vec::new(),
        };

        for assessment in &candidates {
            match self.sweep(assessment, now) {
                Ok(outcome) => {
                    if outcome.updated {
                        report.closed += 1;
                    }
                    report.notified += outcome.notified;
                }
                Err(error) => {
                    warn!(
                        assessment = %assessment.id,
                        %error,
                        "sweep failed for assessment, continuing batch"
                    );
                    report.failures.push(SweepFailure {
                        assessment_id: assessment.id.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Result of sweeping a single assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub updated: bool,
    pub notified: usize,
}

impl SweepOutcome {
    const fn untouched() -> Self {
        Self {
            updated: false,
            notified: 0,
        }
    }
}

/// Aggregate result of a batch sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub closed: usize,
    pub notified: usize,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    pub assessment_id: AssessmentId,
    pub error: String,
}

/// Error raised by the sweeper.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Temporal(#[from] TemporalParseError),
}
