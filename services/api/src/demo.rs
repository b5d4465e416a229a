use crate::infra::{parse_date, parse_datetime, seed_demo_course, Backend, DEMO_COURSE};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use clap::Args;
use studyhall::assessments::{
    AssessmentId, AvailabilityDecision, AvailabilityVerdict, SubmissionOutcome, UserId,
};
use studyhall::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Anchor date for the demo timeline (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Sweep clock (YYYY-MM-DDTHH:MM:SS). Defaults to the current local time.
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());

    let backend = Backend::default();
    seed_demo_course(&backend, now.date());
    let state = backend.assessment_state();

    let report = state.sweeper.sweep_all(now)?;

    println!("Deadline sweep at {now}");
    println!(
        "- scanned {} published assessment(s), closed {}, notified {} student(s)",
        report.scanned, report.closed, report.notified
    );
    for failure in &report.failures {
        println!(
            "- failed to sweep {}: {}",
            failure.assessment_id.0, failure.error
        );
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let backend = Backend::default();
    seed_demo_course(&backend, today);
    let state = backend.assessment_state();

    let student = UserId("student-ines".to_string());
    let lab = AssessmentId("assess-lifetimes-lab".to_string());
    let survey = AssessmentId("assess-intro-survey".to_string());

    println!("Assessment availability demo (course {DEMO_COURSE}, student {})", student.0);

    // The lab window opened three days ago at 09:00; check the evening before.
    let before_open = (today - Duration::days(4))
        .and_hms_opt(20, 0, 0)
        .expect("valid time");
    let decision = state
        .service
        .check_availability(&lab, &student, before_open)?;
    render_decision("lab before its window", &decision);

    let in_window = today.and_hms_opt(10, 0, 0).expect("valid time");
    let decision = state.service.check_availability(&lab, &student, in_window)?;
    render_decision("lab inside its window", &decision);

    println!("\nSubmitting attempts against the lab (cap of 3):");
    for minute in 0..4 {
        let submitted_at = today
            .and_hms_opt(10, 5 + minute, 0)
            .expect("valid time");
        match state.service.submit_attempt(&lab, &student, submitted_at)? {
            SubmissionOutcome::Recorded { decision, .. } => {
                println!("- attempt {} recorded at {submitted_at}", decision.attempt_count + 1);
            }
            SubmissionOutcome::Refused(decision) => {
                render_decision("submission refused", &decision);
            }
        }
    }

    println!("\nThe intro survey's deadline has already passed:");
    let decision = state.service.check_availability(&survey, &student, in_window)?;
    render_decision("survey", &decision);

    println!("\nRunning the deadline sweep:");
    let report = state.sweeper.sweep_all(in_window)?;
    println!(
        "- scanned {}, closed {}, notified {} student(s)",
        report.scanned, report.closed, report.notified
    );

    let inbox = backend.sink.records();
    println!("- {} notification record(s) now persisted", inbox.len());
    if let Some(record) = inbox.first() {
        println!("  e.g. [{}] {}", record.kind.label(), record.message);
    }

    Ok(())
}

fn render_decision(stage: &str, decision: &AvailabilityDecision) {
    match &decision.verdict {
        AvailabilityVerdict::Available {
            deadline: Some(deadline),
            remaining_ms: Some(remaining_ms),
        } => {
            let hours = *remaining_ms as f64 / 3_600_000.0;
            println!("- {stage}: available (deadline {deadline}, {hours:.1}h remaining)");
        }
        AvailabilityVerdict::Available { .. } => {
            println!("- {stage}: available (no deadline configured)");
        }
        blocked => println!(
            "- {stage}: {} ({})",
            blocked.status_label(),
            blocked.reason().unwrap_or_default()
        ),
    }
}
