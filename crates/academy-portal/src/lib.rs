//! # academy-portal
//!
//! Workflows behind the student, faculty and admin portals, built on the
//! tab accessor and repositories of `academy-store`: admissions, mock-test
//! authoring and grading, the calendar view, portal sign-in, popup tracking,
//! and the two external collaborators (simulated mail and the chat
//! assistant).

pub mod admissions;
pub mod assessments;
pub mod assistant;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod mailer;
pub mod popups;

mod error;

pub use admissions::{Admissions, ApplicationForm, NewStudent};
pub use assessments::Assessments;
pub use assistant::{Assistant, ChatRole, ChatTurn, CompletionClient, CompletionError};
pub use auth::{current_user, sign_in, sign_out, Principal, Role};
pub use calendar::{derive_exam_events, merge_events, CalendarView};
pub use config::PortalConfig;
pub use error::{PortalError, Result};
pub use mailer::{Email, LogMailer, MailError, Mailer};
