use academy_shared::ValidationError;
use academy_store::{ApplicationStatus, StoreError};
use thiserror::Error;

use crate::mailer::MailError;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Application not found: {0}")]
    ApplicationNotFound(i64),

    #[error("Application {id} is {status}, not pending")]
    ApplicationNotPending { id: i64, status: ApplicationStatus },

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Mock test not found: {0}")]
    TestNotFound(String),

    #[error("Mock test {test_id} is not open: {reason}")]
    TestNotOpen { test_id: String, reason: &'static str },

    #[error("Student {student} already submitted test {test_id}")]
    AlreadySubmitted { student: String, test_id: String },

    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    #[error("Question {question_id} not found in test {test_id}")]
    QuestionNotFound { test_id: String, question_id: String },

    #[error("Points {points} out of range for question {question_id} (max {max})")]
    PointsOutOfRange {
        question_id: String,
        points: f64,
        max: f64,
    },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} sign-in is disabled")]
    SignInDisabled(&'static str),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

pub type Result<T> = std::result::Result<T, PortalError>;
