use thiserror::Error;

/// A record that breaks one of the declared data invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid student code: {0:?} (expected S followed by 5 digits)")]
    InvalidStudentCode(String),

    #[error("Student code space exhausted")]
    StudentCodesExhausted,

    #[error("Question {question_id} must have exactly one correct option, found {found}")]
    CorrectOptionCount { question_id: String, found: usize },

    #[error("Field `{field}` must not be empty")]
    EmptyField { field: &'static str },

    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("Value out of range for `{field}`: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("Record id {id:?} does not match its expected form {expected:?}")]
    IdMismatch { id: String, expected: String },

    #[error("Duplicate id in collection: {0}")]
    DuplicateId(String),
}
