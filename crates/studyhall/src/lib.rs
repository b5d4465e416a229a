//! Core library for the StudyHall learning platform's assessment service:
//! availability evaluation, attempt control, deadline sweeping, and the HTTP
//! surface that exposes them.

pub mod assessments;
pub mod config;
pub mod error;
pub mod telemetry;
