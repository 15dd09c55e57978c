//! Record shapes persisted under the storage keys.
//!
//! Field names serialize in camelCase so stored JSON keeps the shape every
//! page and portal agrees on. Optional or later-added fields carry
//! `#[serde(default)]` so older stored records still decode.

use std::collections::BTreeMap;
use std::fmt;

use academy_shared::StudentCode;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// An enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Numeric record id.
    pub id: i64,
    pub name: String,
    /// Human-facing code used to sign in (`S00042`).
    pub student_id: StudentCode,
    /// Stored as entered; the portal never hashes it.
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    /// Paper codes the student is enrolled in.
    #[serde(default)]
    pub papers: Vec<String>,
    /// Grade history per paper code.
    #[serde(default)]
    pub grades: BTreeMap<String, Vec<GradeEntry>>,
    /// Attendance percentage per paper code.
    #[serde(default)]
    pub attendance: BTreeMap<String, f64>,
    #[serde(default)]
    pub payment_history: Vec<PaymentItem>,
    #[serde(default)]
    pub enrolled_on: Option<NaiveDate>,
}

/// One recorded score for a paper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub score: f64,
    pub date: NaiveDate,
    pub exam_type: String,
    /// Set when the grade was produced by grading a mock test.
    #[serde(default)]
    pub test_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

/// A fee line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
}

// ---------------------------------------------------------------------------
// Faculty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacultyMember {
    /// Sign-in id (`F001`).
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub title: String,
    /// Paper codes this member teaches.
    #[serde(default)]
    pub papers: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// A prospective student's enrollment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub qualification: String,
    pub program: String,
    pub papers: Vec<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CourseLevel {
    #[serde(rename = "Applied Knowledge")]
    AppliedKnowledge,
    #[serde(rename = "Applied Skills")]
    AppliedSkills,
    #[serde(rename = "Strategic Professional")]
    StrategicProfessional,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyllabusTopic {
    pub topic: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Slug of the title (`financial-reporting`).
    pub id: String,
    pub title: String,
    /// Paper code (`FR`).
    #[serde(default)]
    pub code: String,
    pub level: CourseLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub syllabus: Vec<SyllabusTopic>,
    #[serde(default)]
    pub faculty_ids: Vec<String>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Mock tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TestStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct McqOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Question {
    #[serde(rename = "MCQ")]
    Mcq {
        id: String,
        text: String,
        options: Vec<McqOption>,
        points: f64,
    },
    #[serde(rename = "Theoretical")]
    Theoretical {
        id: String,
        text: String,
        points: f64,
    },
}

impl Question {
    pub fn id(&self) -> &str {
        match self {
            Self::Mcq { id, .. } | Self::Theoretical { id, .. } => id,
        }
    }

    pub fn points(&self) -> f64 {
        match self {
            Self::Mcq { points, .. } | Self::Theoretical { points, .. } => *points,
        }
    }

    /// Id of the correct option, for MCQ questions with exactly one.
    pub fn correct_option(&self) -> Option<&str> {
        match self {
            Self::Mcq { options, .. } => {
                let mut correct = options.iter().filter(|o| o.is_correct);
                match (correct.next(), correct.next()) {
                    (Some(only), None) => Some(only.id.as_str()),
                    _ => None,
                }
            }
            Self::Theoretical { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockTest {
    pub id: String,
    pub title: String,
    /// Paper code the test belongs to.
    pub paper: String,
    /// Authoring faculty member.
    pub faculty_id: String,
    pub status: TestStatus,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub scheduled_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub is_locked: bool,
}

impl MockTest {
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(Question::points).sum()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub question_id: String,
    #[serde(default)]
    pub selected_option_id: Option<String>,
    #[serde(default)]
    pub text_answer: Option<String>,
    /// Points awarded by auto-grading or a faculty override.
    #[serde(default)]
    pub awarded_points: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

/// A student's single completed attempt at a mock test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmission {
    pub id: String,
    pub student_id: StudentCode,
    pub test_id: String,
    pub answers: Vec<StudentAnswer>,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub is_graded: bool,
    #[serde(default)]
    pub total_points: f64,
    pub submitted_at: DateTime<Utc>,
}

impl StudentSubmission {
    pub fn answer(&self, question_id: &str) -> Option<&StudentAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Calendar event id: numeric for stored events, a synthetic string for
/// events derived from mock tests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum EventId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Class,
    Deadline,
    Exam,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EventId,
    pub date: NaiveDate,
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub paper: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub join_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Site content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    Student,
    Faculty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Points into the student or faculty collection, per `author_type`.
    pub author_id: String,
    pub author_type: AuthorType,
    pub date: NaiveDate,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vlog {
    pub id: i64,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub role: String,
    /// 1 to 5 stars.
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqItem {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub image_url: String,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_link: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Students,
    Faculty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub date: NaiveDate,
    pub audience: Audience,
}

/// Single object stored under `contactDetails`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub office_hours: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PopupNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HighAchiever {
    pub id: i64,
    pub name: String,
    pub paper: String,
    pub score: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}
