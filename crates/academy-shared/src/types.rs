use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{STUDENT_CODE_DIGITS, STUDENT_CODE_PREFIX};
use crate::error::ValidationError;

fn student_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^S[0-9]{5}$").expect("static regex"))
}

/// Human-facing student identifier, `S` followed by five digits (`S00042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentCode(String);

impl StudentCode {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if student_code_pattern().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ValidationError::InvalidStudentCode(s.to_string()))
        }
    }

    pub fn from_number(n: u32) -> Result<Self, ValidationError> {
        if n >= 10u32.pow(STUDENT_CODE_DIGITS as u32) {
            return Err(ValidationError::StudentCodesExhausted);
        }
        Ok(Self(format!(
            "{STUDENT_CODE_PREFIX}{n:0width$}",
            width = STUDENT_CODE_DIGITS
        )))
    }

    /// The numeric part of the code.
    pub fn number(&self) -> u32 {
        // The pattern guarantees five ASCII digits after the prefix.
        self.0[1..].parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StudentCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StudentCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StudentCode> for String {
    fn from(code: StudentCode) -> Self {
        code.0
    }
}

/// Identity of one browsing context (a tab or window) of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
