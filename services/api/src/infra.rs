use chrono::{Duration, NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use studyhall::assessments::{
    Assessment, AssessmentId, AssessmentKind, AssessmentService, AssessmentState, AssessmentStore,
    AttemptLedger, AttemptRecord, AvailabilityConfig, CourseId, DeadlineSweeper,
    EnrollmentDirectory, NotificationDispatcher, NotificationError, NotificationRecord,
    NotificationSink, Question, StoreError, UserId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiState = AssessmentState<
    InMemoryAssessmentStore,
    InMemoryAttemptLedger,
    InMemoryEnrollmentDirectory,
    InMemoryNotificationSink,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentStore {
    records: Arc<Mutex<HashMap<AssessmentId, Assessment>>>,
}

impl InMemoryAssessmentStore {
    pub(crate) fn insert(&self, assessment: Assessment) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(assessment.id.clone(), assessment);
    }
}

impl AssessmentStore for InMemoryAssessmentStore {
    fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
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
pub(crate) struct InMemoryAttemptLedger {
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl AttemptLedger for InMemoryAttemptLedger {
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
pub(crate) struct InMemoryEnrollmentDirectory {
    rosters: Arc<Mutex<HashMap<CourseId, Vec<UserId>>>>,
}

impl InMemoryEnrollmentDirectory {
    pub(crate) fn enroll(&self, course: &CourseId, students: Vec<UserId>) {
        self.rosters
            .lock()
            .expect("roster mutex poisoned")
            .insert(course.clone(), students);
    }
}

impl EnrollmentDirectory for InMemoryEnrollmentDirectory {
    fn enrolled_students(&self, course_id: &CourseId) -> Result<Vec<UserId>, StoreError> {
        let guard = self.rosters.lock().expect("roster mutex poisoned");
        Ok(guard.get(course_id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationSink {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
}

impl InMemoryNotificationSink {
    pub(crate) fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn create(&self, record: NotificationRecord) -> Result<(), NotificationError> {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(record);
        Ok(())
    }
}

/// The full set of in-memory adapters backing one service process.
#[derive(Default, Clone)]
pub(crate) struct Backend {
    pub(crate) store: Arc<InMemoryAssessmentStore>,
    pub(crate) ledger: Arc<InMemoryAttemptLedger>,
    pub(crate) roster: Arc<InMemoryEnrollmentDirectory>,
    pub(crate) sink: Arc<InMemoryNotificationSink>,
}

impl Backend {
    pub(crate) fn assessment_state(&self) -> ApiState {
        let service = Arc::new(AssessmentService::new(
            self.store.clone(),
            self.ledger.clone(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            self.roster.clone(),
            self.sink.clone(),
        ));
        let sweeper = Arc::new(DeadlineSweeper::new(self.store.clone(), dispatcher.clone()));

        AssessmentState {
            service,
            dispatcher,
            sweeper,
        }
    }
}

pub(crate) const DEMO_COURSE: &str = "course-rust-101";

/// Seed one demo course with a roster and three representative assessments:
/// an always-open quiz, a windowed lab with reminders, and an expired survey
/// the sweeper will close.
pub(crate) fn seed_demo_course(backend: &Backend, today: NaiveDate) -> Vec<AssessmentId> {
    let course = CourseId(DEMO_COURSE.to_string());
    backend.roster.enroll(
        &course,
        vec![
            UserId("student-ines".to_string()),
            UserId("student-jun".to_string()),
            UserId("student-priya".to_string()),
        ],
    );

    let quiz = Assessment {
        id: AssessmentId("assess-ownership-quiz".to_string()),
        course_id: course.clone(),
        title: "Ownership & Borrowing Quiz".to_string(),
        description: "Untimed checkpoint quiz on moves, borrows, and lifetimes.".to_string(),
        kind: AssessmentKind::Quiz,
        questions: vec![Question {
            id: "q1".to_string(),
            prompt: "Why does the borrow checker reject aliased mutation?".to_string(),
            points: 5,
        }],
        published: true,
        config: AvailabilityConfig::default(),
        auto_unavailable_at: None,
    };

    let mut lab_config = AvailabilityConfig::default();
    lab_config.start_date = Some(today - Duration::days(3));
    lab_config.start_time = Some("09:00".to_string());
    lab_config.end_date = Some(today + Duration::days(4));
    lab_config.end_time = Some("17:00".to_string());
    lab_config.allow_multiple_attempts = true;
    lab_config.max_attempts = Some(3);
    lab_config.enable_reminder = true;
    lab_config.send_notification_on_start = true;
    let lab = Assessment {
        id: AssessmentId("assess-lifetimes-lab".to_string()),
        course_id: course.clone(),
        title: "Lifetimes Lab".to_string(),
        description: "Graded lab: annotate and fix lifetime errors.".to_string(),
        kind: AssessmentKind::Coding,
        questions: Vec::new(),
        published: true,
        config: lab_config,
        auto_unavailable_at: None,
    };

    let mut survey_config = AvailabilityConfig::default();
    survey_config.end_date = Some(today - Duration::days(1));
    survey_config.end_time = Some("18:00".to_string());
    let survey = Assessment {
        id: AssessmentId("assess-intro-survey".to_string()),
        course_id: course,
        title: "Intro Survey".to_string(),
        description: "Background survey from week one; collection has ended.".to_string(),
        kind: AssessmentKind::Assignment,
        questions: Vec::new(),
        published: true,
        config: survey_config,
        auto_unavailable_at: None,
    };

    let ids = vec![quiz.id.clone(), lab.id.clone(), survey.id.clone()];
    backend.store.insert(quiz);
    backend.store.insert(lab);
    backend.store.insert(survey);
    ids
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM:SS ({err})"))
}
