use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use super::auth::AuthContext;
use super::availability::ConfigPatch;
use super::domain::{AssessmentId, UserId};
use super::notifications::NotificationDispatcher;
use super::repository::{
    AssessmentStore, AttemptLedger, EnrollmentDirectory, NotificationSink, StoreError,
};
use super::service::{AssessmentService, AssessmentServiceError, SubmissionOutcome};
use super::sweeper::DeadlineSweeper;

/// Shared handler state bundling the service facade with the dispatcher and
/// sweeper it fans out to.
pub struct AssessmentState<S, L, E, N> {
    pub service: Arc<AssessmentService<S, L>>,
    pub dispatcher: Arc<NotificationDispatcher<E, N>>,
    pub sweeper: Arc<DeadlineSweeper<S, E, N>>,
}

impl<S, L, E, N> Clone for AssessmentState<S, L, E, N> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            dispatcher: self.dispatcher.clone(),
            sweeper: self.sweeper.clone(),
        }
    }
}

/// Router builder exposing the assessment availability API.
pub fn assessment_router<S, L, E, N>(state: AssessmentState<S, L, E, N>) -> Router
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments/:id/check-availability",
            post(check_availability_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/config",
            get(get_config_handler::<S, L, E, N>).put(put_config_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/attempts",
            post(submit_attempt_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/notifications/reminders",
            post(reminders_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/notifications/availability",
            post(availability_notice_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/notifications/closure",
            post(closure_handler::<S, L, E, N>),
        )
        .route(
            "/api/v1/assessments/:id/sweep",
            post(sweep_handler::<S, L, E, N>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailabilityCheckRequest {
    pub(crate) user_id: UserId,
    /// Evaluation clock override; defaults to the server's local time.
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
}

/// Clock override accepted by the trigger endpoints (sweep, notifications).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TriggerRequest {
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn error_response(error: &AssessmentServiceError) -> Response {
    let status = match error {
        AssessmentServiceError::UnknownAssessment(_)
        | AssessmentServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        AssessmentServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "success": false,
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

pub(crate) async fn check_availability_handler<S, L, E, N>(
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    Json(request): Json<AvailabilityCheckRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    let id = AssessmentId(id);
    let now = request.now.unwrap_or_else(local_now);

    match state.service.check_availability(&id, &request.user_id, now) {
        Ok(decision) => (StatusCode::OK, Json(decision.view())).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn get_config_handler<S, L, E, N>(
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match state.service.resolved_config(&AssessmentId(id)) {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn put_config_handler<S, L, E, N>(
    auth: AuthContext,
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    Json(patch): Json<ConfigPatch>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    match state
        .service
        .update_config(&auth, &AssessmentId(id), &patch)
    {
        Ok(config) => (StatusCode::OK, Json(config)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn submit_attempt_handler<S, L, E, N>(
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    Json(request): Json<AvailabilityCheckRequest>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    let id = AssessmentId(id);
    let now = request.now.unwrap_or_else(local_now);

    match state.service.submit_attempt(&id, &request.user_id, now) {
        Ok(SubmissionOutcome::Recorded { record, decision }) => {
            let payload = json!({
                "success": true,
                "recorded": true,
                "attemptCount": decision.attempt_count + 1,
                "submittedAt": record.submitted_at,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Ok(SubmissionOutcome::Refused(decision)) => {
            let mut view = decision.view();
            view.success = false;
            (StatusCode::CONFLICT, Json(view)).into_response()
        }
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn reminders_handler<S, L, E, N>(
    auth: AuthContext,
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    request: Option<Json<TriggerRequest>>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    dispatch_notifications(&state, &auth, &AssessmentId(id), request, |d, a, now| {
        d.send_reminders(a, now)
    })
}

pub(crate) async fn availability_notice_handler<S, L, E, N>(
    auth: AuthContext,
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    request: Option<Json<TriggerRequest>>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    dispatch_notifications(&state, &auth, &AssessmentId(id), request, |d, a, now| {
        d.send_availability(a, now)
    })
}

pub(crate) async fn closure_handler<S, L, E, N>(
    auth: AuthContext,
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    request: Option<Json<TriggerRequest>>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    dispatch_notifications(&state, &auth, &AssessmentId(id), request, |d, a, now| {
        d.send_closure(a, now)
    })
}

fn dispatch_notifications<S, L, E, N, F>(
    state: &AssessmentState<S, L, E, N>,
    auth: &AuthContext,
    id: &AssessmentId,
    request: Option<Json<TriggerRequest>>,
    send: F,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
    F: FnOnce(
        &NotificationDispatcher<E, N>,
        &super::domain::Assessment,
        NaiveDateTime,
    ) -> Result<usize, super::notifications::DispatchError>,
{
    if !auth.can_manage_assessments() {
        return error_response(&AssessmentServiceError::Forbidden(auth.role));
    }

    let now = request
        .and_then(|Json(request)| request.now)
        .unwrap_or_else(local_now);

    let assessment = match state.service.load(id) {
        Ok(assessment) => assessment,
        Err(error) => return error_response(&error),
    };

    match send(&state.dispatcher, &assessment, now) {
        Ok(sent_count) => {
            let payload = json!({
                "success": true,
                "sentCount": sent_count,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(&AssessmentServiceError::Dispatch(error)),
    }
}

pub(crate) async fn sweep_handler<S, L, E, N>(
    auth: AuthContext,
    State(state): State<AssessmentState<S, L, E, N>>,
    Path(id): Path<String>,
    request: Option<Json<TriggerRequest>>,
) -> Response
where
    S: AssessmentStore + 'static,
    L: AttemptLedger + 'static,
    E: EnrollmentDirectory + 'static,
    N: NotificationSink + 'static,
{
    if !auth.can_manage_assessments() {
        return error_response(&AssessmentServiceError::Forbidden(auth.role));
    }

    let now = request
        .and_then(|Json(request)| request.now)
        .unwrap_or_else(local_now);

    let assessment = match state.service.load(&AssessmentId(id)) {
        Ok(assessment) => assessment,
        Err(error) => return error_response(&error),
    };

    match state.sweeper.sweep(&assessment, now) {
        Ok(outcome) => {
            let payload = json!({
                "success": true,
                "updated": outcome.updated,
                "notified": outcome.notified,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(&AssessmentServiceError::Sweep(error)),
    }
}
