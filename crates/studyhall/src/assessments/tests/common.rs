use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::assessments::auth::{AuthContext, Role};
use crate::assessments::availability::AvailabilityConfig;
use crate::assessments::domain::{
    Assessment, AssessmentId, AssessmentKind, AttemptRecord, CourseId, NotificationRecord,
    Question, UserId,
};
use crate::assessments::notifications::NotificationDispatcher;
use crate::assessments::repository::{
    AssessmentStore, AttemptLedger, EnrollmentDirectory, NotificationError, NotificationSink,
    StoreError,
};
use crate::assessments::router::{assessment_router, AssessmentState};
use crate::assessments::service::AssessmentService;
use crate::assessments::sweeper::DeadlineSweeper;

pub(super) const COURSE: &str = "course-algo-101";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(year, month, day)
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn student(id: &str) -> UserId {
    UserId(format!("student-{id}"))
}

pub(super) fn teacher_auth() -> AuthContext {
    AuthContext {
        user_id: UserId("teacher-ada".to_string()),
        role: Role::Teacher,
    }
}

pub(super) fn student_auth() -> AuthContext {
    AuthContext {
        user_id: UserId("student-01".to_string()),
        role: Role::Student,
    }
}

pub(super) fn assessment(id: &str) -> Assessment {
    Assessment {
        id: AssessmentId(format!("assess-{id}")),
        course_id: CourseId(COURSE.to_string()),
        title: "Binary Search Quiz".to_string(),
        description: "Weekly graded quiz on divide-and-conquer searching.".to_string(),
        kind: AssessmentKind::Quiz,
        questions: vec![Question {
            id: "q1".to_string(),
            prompt: "State the loop invariant of binary search.".to_string(),
            points: 10,
        }],
        published: true,
        config: AvailabilityConfig::default(),
        auto_unavailable_at: None,
    }
}

pub(super) fn windowed_assessment(
    id: &str,
    start: (NaiveDate, &str),
    end: (NaiveDate, &str),
) -> Assessment {
    let mut assessment = assessment(id);
    assessment.config.start_date = Some(start.0);
    assessment.config.start_time = Some(start.1.to_string());
    assessment.config.end_date = Some(end.0);
    assessment.config.end_time = Some(end.1.to_string());
    assessment
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    records: Arc<Mutex<HashMap<AssessmentId, Assessment>>>,
}

impl MemoryStore {
    pub(super) fn seed(&self, assessment: Assessment) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(assessment.id.clone(), assessment);
    }

    pub(super) fn get(&self, id: &AssessmentId) -> Option<Assessment> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl AssessmentStore for MemoryStore {
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
pub(super) struct MemoryLedger {
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl MemoryLedger {
    pub(super) fn seed(&self, assessment_id: &AssessmentId, user_id: &UserId, count: u32) {
        let mut guard = self.attempts.lock().expect("ledger mutex poisoned");
        for n in 0..count {
            guard.push(AttemptRecord {
                assessment_id: assessment_id.clone(),
                user_id: user_id.clone(),
                submitted_at: at(2024, 1, 1, 10, n.min(59)),
            });
        }
    }

    pub(super) fn total(&self) -> usize {
        self.attempts.lock().expect("ledger mutex poisoned").len()
    }
}

impl AttemptLedger for MemoryLedger {
    fn count_attempts(
        &self,
        assessment_id: &AssessmentId,
        user_id: &UserId,
    ) -> Result<u32, StoreError> {
        let guard = self.attempts.lock().expect("ledger mutex poisoned");
        let count = guard
            .iter()
            .filter(|attempt| {
                attempt.assessment_id == *assessment_id && attempt.user_id == *user_id
            })
            .count();
        Ok(count as u32)
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
pub(super) struct MemoryRoster {
    rosters: Arc<Mutex<HashMap<CourseId, Vec<UserId>>>>,
}

impl MemoryRoster {
    pub(super) fn enroll(&self, course: &str, students: &[&str]) {
        self.rosters.lock().expect("roster mutex poisoned").insert(
            CourseId(course.to_string()),
            students.iter().map(|id| student(id)).collect(),
        );
    }
}

impl EnrollmentDirectory for MemoryRoster {
    fn enrolled_students(&self, course_id: &CourseId) -> Result<Vec<UserId>, StoreError> {
        let guard = self.rosters.lock().expect("roster mutex poisoned");
        Ok(guard.get(course_id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl MemorySink {
    pub(super) fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for MemorySink {
    fn create(&self, record: NotificationRecord) -> Result<(), NotificationError> {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(record);
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl AssessmentStore for UnavailableStore {
    fn fetch(&self, _id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
        Err(StoreError::Unavailable("document store offline".to_string()))
    }

    fn update_config(
        &self,
        _id: &AssessmentId,
        _config: AvailabilityConfig,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("document store offline".to_string()))
    }

    fn set_published(
        &self,
        _id: &AssessmentId,
        _published: bool,
        _auto_unavailable_at: Option<NaiveDateTime>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("document store offline".to_string()))
    }

    fn published(&self) -> Result<Vec<Assessment>, StoreError> {
        Err(StoreError::Unavailable("document store offline".to_string()))
    }
}

pub(super) struct FailingSink;

impl NotificationSink for FailingSink {
    fn create(&self, _record: NotificationRecord) -> Result<(), NotificationError> {
        Err(NotificationError::Transport(
            "notification queue rejected write".to_string(),
        ))
    }
}

pub(super) struct TestHarness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) ledger: Arc<MemoryLedger>,
    pub(super) sink: Arc<MemorySink>,
    pub(super) service: Arc<AssessmentService<MemoryStore, MemoryLedger>>,
    pub(super) dispatcher: Arc<NotificationDispatcher<MemoryRoster, MemorySink>>,
    pub(super) sweeper: Arc<DeadlineSweeper<MemoryStore, MemoryRoster, MemorySink>>,
}

/// In-memory wiring with three students enrolled in the default course.
pub(super) fn harness() -> TestHarness {
    let store = Arc::new(MemoryStore::default());
    let ledger = Arc::new(MemoryLedger::default());
    let roster = Arc::new(MemoryRoster::default());
    roster.enroll(COURSE, &["amara", "boris", "chen"]);
    let sink = Arc::new(MemorySink::default());

    let service = Arc::new(AssessmentService::new(store.clone(), ledger.clone()));
    let dispatcher = Arc::new(NotificationDispatcher::new(roster.clone(), sink.clone()));
    let sweeper = Arc::new(DeadlineSweeper::new(store.clone(), dispatcher.clone()));

    TestHarness {
        store,
        ledger,
        sink,
        service,
        dispatcher,
        sweeper,
    }
}

impl TestHarness {
    pub(super) fn state(
        &self,
    ) -> AssessmentState<MemoryStore, MemoryLedger, MemoryRoster, MemorySink> {
        AssessmentState {
            service: self.service.clone(),
            dispatcher: self.dispatcher.clone(),
            sweeper: self.sweeper.clone(),
        }
    }

    pub(super) fn router(&self) -> axum::Router {
        assessment_router(self.state())
    }
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
