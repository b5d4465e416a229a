//! Integration specifications for the assessment availability workflow.
//!
//! Scenarios run end-to-end through the public service facade and HTTP router
//! so config edits, attempt counting, and verdicts are validated without
//! reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{NaiveDate, NaiveDateTime};

    use studyhall::assessments::{
        Assessment, AssessmentId, AssessmentKind, AssessmentService, AssessmentState,
        AssessmentStore, AttemptLedger, AttemptRecord, AuthContext, AvailabilityConfig, CourseId,
        DeadlineSweeper, EnrollmentDirectory, NotificationDispatcher, NotificationError,
        NotificationRecord, NotificationSink, Question, Role, StoreError, UserId,
    };

    pub const COURSE: &str = "course-systems-200";

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        date(year, month, day)
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    pub fn teacher() -> AuthContext {
        AuthContext {
            user_id: UserId("teacher-grace".to_string()),
            role: Role::Teacher,
        }
    }

    pub fn student(id: &str) -> UserId {
        UserId(format!("student-{id}"))
    }

    pub fn midterm() -> Assessment {
        Assessment {
            id: AssessmentId("assess-midterm".to_string()),
            course_id: CourseId(COURSE.to_string()),
            title: "Scheduling Midterm".to_string(),
            description: "Covers preemption, priority inversion, and run queues.".to_string(),
            kind: AssessmentKind::Coding,
            questions: vec![Question {
                id: "q1".to_string(),
                prompt: "Implement a two-level feedback queue.".to_string(),
                points: 40,
            }],
            published: true,
            config: AvailabilityConfig::default(),
            auto_unavailable_at: None,
        }
    }

    #[derive(Default, Clone)]
    pub struct DocumentStore {
        records: Arc<Mutex<HashMap<AssessmentId, Assessment>>>,
    }

    impl DocumentStore {
        pub fn seed(&self, assessment: Assessment) {
            self.records
                .lock()
                .expect("store mutex poisoned")
                .insert(assessment.id.clone(), assessment);
        }

        pub fn get(&self, id: &AssessmentId) -> Option<Assessment> {
            self.records
                .lock()
                .expect("store mutex poisoned")
                .get(id)
                .cloned()
        }
    }

    impl AssessmentStore for DocumentStore {
        fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
            Ok(self.get(id))
        }

        fn update_config(
            &self,
            id: &AssessmentId,
            config: AvailabilityConfig,
        ) -> Result<(), StoreError> {
            let mut guard = self.records.lock().expect("store mutex poisoned");
            match guard.get_mut(id) {
                Some(assessment) => {
                    assessment.config = config;
                    Ok(())
                }
                None => Err(StoreError::NotFound),
            }
        }

        fn set_published(
            &self,
            id: &AssessmentId,
            published: bool,
            auto_unavailable_at: Option<NaiveDateTime>,
        ) -> Result<(), StoreError> {
            let mut guard = self.records.lock().expect("store mutex poisoned");
            match guard.get_mut(id) {
                Some(assessment) => {
                    assessment.published = published;
                    assessment.auto_unavailable_at = auto_unavailable_at;
                    Ok(())
                }
                None => Err(StoreError::NotFound),
            }
        }

        fn published(&self) -> Result<Vec<Assessment>, StoreError> {
            let guard = self.records.lock().expect("store mutex poisoned");
            Ok(guard
                .values()
                .filter(|assessment| assessment.published)
                .cloned()
                .collect())
        }
    }

    #[derive(Default, Clone)]
    pub struct Ledger {
        attempts: Arc<Mutex<Vec<AttemptRecord>>>,
    }

    impl AttemptLedger for Ledger {
        fn count_attempts(
            &self,
            assessment_id: &AssessmentId,
            user_id: &UserId,
        ) -> Result<u32, StoreError> {
            let guard = self.attempts.lock().expect("ledger mutex poisoned");
            Ok(guard
                .iter()
                .filter(|attempt| {
                    attempt.assessment_id == *assessment_id && attempt.user_id == *user_id
                })
                .count() as u32)
        }

        fn record_attempt(
            &self,
            assessment_id: &AssessmentId,
            user_id: &UserId,
            submitted_at: NaiveDateTime,
        ) -> Result<AttemptRecord, StoreError> {
            let record = AttemptRecord {
                assessment_id: assessment_id.clone(),
                user_id: user_id.clone(),
                submitted_at,
            };
            self.attempts
                .lock()
                .expect("ledger mutex poisoned")
                .push(record.clone());
            Ok(record)
        }
    }

    #[derive(Default, Clone)]
    pub struct Roster {
        students: Arc<Mutex<Vec<UserId>>>,
    }

    impl Roster {
        pub fn enroll(&self, ids: &[&str]) {
            let mut guard = self.students.lock().expect("roster mutex poisoned");
            guard.extend(ids.iter().map(|id| student(id)));
        }
    }

    impl EnrollmentDirectory for Roster {
        fn enrolled_students(&self, course_id: &CourseId) -> Result<Vec<UserId>, StoreError> {
            let guard = self.students.lock().expect("roster mutex poisoned");
            if course_id.0 == COURSE {
                Ok(guard.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[derive(Default, Clone)]
    pub struct Inbox {
        records: Arc<Mutex<Vec<NotificationRecord>>>,
    }

    impl NotificationSink for Inbox {
        fn create(&self, record: NotificationRecord) -> Result<(), NotificationError> {
            self.records
                .lock()
                .expect("inbox mutex poisoned")
                .push(record);
            Ok(())
        }
    }

    pub struct World {
        pub store: Arc<DocumentStore>,
        pub service: Arc<AssessmentService<DocumentStore, Ledger>>,
        pub state: AssessmentState<DocumentStore, Ledger, Roster, Inbox>,
    }

    pub fn world() -> World {
        let store = Arc::new(DocumentStore::default());
        let ledger = Arc::new(Ledger::default());
        let roster = Arc::new(Roster::default());
        roster.enroll(&["amara", "boris"]);
        let inbox = Arc::new(Inbox::default());

        let service = Arc::new(AssessmentService::new(store.clone(), ledger));
        let dispatcher = Arc::new(NotificationDispatcher::new(roster, inbox));
        let sweeper = Arc::new(DeadlineSweeper::new(store.clone(), dispatcher.clone()));

        let state = AssessmentState {
            service: service.clone(),
            dispatcher,
            sweeper,
        };

        World {
            store,
            service,
            state,
        }
    }
}

use common::*;
use serde_json::json;
use studyhall::assessments::{assessment_router, ConfigPatch, SubmissionOutcome};

#[test]
fn window_lifecycle_from_draft_to_capped_attempts() {
    let world = world();
    let mut midterm = midterm();
    midterm.config.allow_multiple_attempts = true;
    midterm.config.max_attempts = Some(2);
    world.store.seed(midterm.clone());

    // Teacher opens a one-week window.
    let patch: ConfigPatch = serde_json::from_value(json!({
        "startDate": "2024-10-07",
        "startTime": "09:00",
        "endDate": "2024-10-14",
        "endTime": "17:00",
    }))
    .expect("patch parses");
    world
        .service
        .update_config(&teacher(), &midterm.id, &patch)
        .expect("config update succeeds");

    // Before the window opens the student is told when it starts.
    let decision = world
        .service
        .check_availability(&midterm.id, &student("amara"), at(2024, 10, 6, 12, 0))
        .expect("evaluates");
    assert_eq!(decision.verdict.status_label(), "not_started");

    // Inside the window the first two submissions land, the third is refused.
    for expected_count in 1..=2 {
        let outcome = world
            .service
            .submit_attempt(&midterm.id, &student("amara"), at(2024, 10, 8, 10, 0))
            .expect("submission flows");
        match outcome {
            SubmissionOutcome::Recorded { decision, .. } => {
                assert_eq!(decision.attempt_count + 1, expected_count);
            }
            other => panic!("expected recorded attempt, got {other:?}"),
        }
    }

    let outcome = world
        .service
        .submit_attempt(&midterm.id, &student("amara"), at(2024, 10, 8, 11, 0))
        .expect("submission flows");
    match outcome {
        SubmissionOutcome::Refused(decision) => {
            assert_eq!(decision.verdict.status_label(), "max_attempts_reached");
        }
        other => panic!("expected refusal, got {other:?}"),
    }

    // A different student is unaffected by amara's ledger entries.
    let decision = world
        .service
        .check_availability(&midterm.id, &student("boris"), at(2024, 10, 8, 11, 0))
        .expect("evaluates");
    assert!(decision.verdict.is_available());

    // Past the deadline everyone is blocked, regardless of attempts left.
    let decision = world
        .service
        .check_availability(&midterm.id, &student("boris"), at(2024, 10, 14, 17, 1))
        .expect("evaluates");
    assert_eq!(decision.verdict.status_label(), "deadline_passed");
}

#[tokio::test]
async fn http_surface_round_trips_config_and_checks() {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    let world = world();
    world.store.seed(midterm());
    let router = assessment_router(world.state.clone());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/assessments/assess-midterm/config")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-id", "teacher-grace")
                .header("x-user-role", "teacher")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "endDate": "2024-10-14" })).expect("encodes"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::post("/api/v1/assessments/assess-midterm/check-availability")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "userId": "student-amara",
                        "now": "2024-10-10T12:00:00",
                    }))
                    .expect("encodes"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload.get("available"), Some(&json!(true)));
    assert_eq!(payload.get("deadline"), Some(&json!("2024-10-14T23:59:00")));
    assert!(payload
        .get("remainingTime")
        .and_then(serde_json::Value::as_i64)
        .expect("remaining time present")
        > 0);
}
