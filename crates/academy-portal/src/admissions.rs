//! Admissions: the application lifecycle and student creation.
//!
//! Applications live in one of three lists, keyed by status. Approving or
//! rejecting moves the record from the pending list to the decided list;
//! both decisions are final and records are never deleted. Approval also
//! creates the student and enrolls them in the matching courses, all in the
//! same transaction, then sends the welcome email.

use academy_shared::constants::{counters, keys};
use academy_shared::{StudentCode, ValidationError};
use academy_store::records::validate_email;
use academy_store::repository::application_key;
use academy_store::{seed, Application, ApplicationStatus, Course, Record, Student, Tab, Txn};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{PortalError, Result};
use crate::mailer::{render_template, Email, Mailer};

const GENERATED_PASSWORD_LEN: usize = 10;

/// Public admissions form input.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub qualification: String,
    pub program: String,
    pub papers: Vec<String>,
}

/// Manual admission input.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub papers: Vec<String>,
    /// Generated when `None`.
    pub password: Option<String>,
}

pub struct Admissions<'a> {
    tab: &'a Tab,
    mailer: &'a dyn Mailer,
    mail_from: String,
}

impl<'a> Admissions<'a> {
    pub fn new(tab: &'a Tab, mailer: &'a dyn Mailer, mail_from: impl Into<String>) -> Self {
        Self {
            tab,
            mailer,
            mail_from: mail_from.into(),
        }
    }

    pub fn list(&self, status: ApplicationStatus) -> Vec<Application> {
        self.tab.applications(status).list()
    }

    /// Store a new pending application.
    pub fn submit(&self, form: ApplicationForm) -> Result<Application> {
        let application = self.tab.transaction(|txn| {
            let key = application_key(ApplicationStatus::Pending);
            let mut pending: Vec<Application> = txn.load(key, &[])?;
            let floor = max_application_id(txn)? + 1;
            let id = txn.next_counter(counters::APPLICATION_RECORD, floor)?;

            let application = Application {
                id,
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                phone: form.phone,
                address: form.address,
                qualification: form.qualification,
                program: form.program.trim().to_string(),
                papers: form.papers,
                status: ApplicationStatus::Pending,
                submitted_at: Utc::now(),
                decided_at: None,
            };
            application.validate()?;

            pending.push(application.clone());
            txn.store(key, &pending)?;
            Ok::<_, PortalError>(application)
        })?;

        tracing::info!(
            id = application.id,
            program = %application.program,
            "application submitted"
        );
        Ok(application)
    }

    /// Move application `id` from the `from` list to the `to` list, setting
    /// its status to `to`. Only a pending application can move, and never
    /// back to pending. The move creates no student; use [`Self::approve`]
    /// for that.
    pub fn move_application(
        &self,
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<Application> {
        if from != ApplicationStatus::Pending {
            return Err(PortalError::ApplicationNotPending { id, status: from });
        }
        if to == ApplicationStatus::Pending {
            return Err(PortalError::ApplicationNotPending { id, status: to });
        }
        self.tab.transaction(|txn| move_in(txn, id, from, to))
    }

    /// Approve a pending application, creating the student.
    pub fn approve(&self, id: i64) -> Result<Student> {
        let (application, password, student) = self.tab.transaction(|txn| {
            let application =
                move_in(txn, id, ApplicationStatus::Pending, ApplicationStatus::Approved)?;
            let password = generate_password();
            let student = create_student_in(
                txn,
                NewStudent {
                    name: application.name.clone(),
                    email: application.email.clone(),
                    phone: application.phone.clone(),
                    address: application.address.clone(),
                    papers: application.papers.clone(),
                    password: Some(password.clone()),
                },
            )?;
            Ok::<_, PortalError>((application, password, student))
        })?;

        tracing::info!(
            application = id,
            student = %student.student_id,
            "application approved"
        );

        if let Err(e) = self.send_welcome(&student, &application.program, &password) {
            tracing::error!(student = %student.student_id, error = %e, "welcome email not sent");
        }
        Ok(student)
    }

    pub fn reject(&self, id: i64) -> Result<Application> {
        let application =
            self.move_application(id, ApplicationStatus::Pending, ApplicationStatus::Rejected)?;
        tracing::info!(application = id, "application rejected");
        Ok(application)
    }

    /// Admit a student directly, without an application.
    pub fn admit(&self, new: NewStudent) -> Result<Student> {
        let student = self.tab.transaction(|txn| create_student_in(txn, new))?;
        tracing::info!(student = %student.student_id, "student admitted manually");
        Ok(student)
    }

    fn send_welcome(&self, student: &Student, program: &str, password: &str) -> Result<()> {
        let template = self
            .tab
            .get_item(keys::WELCOME_EMAIL_TEMPLATE)
            .unwrap_or_else(|| seed::WELCOME_EMAIL_TEMPLATE.to_string());
        let papers = student.papers.join(", ");

        let body = render_template(
            &template,
            &[
                ("name", student.name.as_str()),
                ("studentId", student.student_id.as_str()),
                ("password", password),
                ("program", program),
                ("papers", papers.as_str()),
                ("email", student.email.as_str()),
            ],
        )?;

        self.mailer.send(Email {
            from: self.mail_from.clone(),
            to: student.email.clone(),
            subject: "Welcome to the Academy".to_string(),
            body,
        })?;
        Ok(())
    }
}

fn max_application_id(txn: &mut Txn<'_>) -> Result<i64> {
    let mut max = 0;
    for status in [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ] {
        let list: Vec<Application> = txn.load(application_key(status), &[])?;
        max = list.iter().map(|a| a.id).fold(max, i64::max);
    }
    Ok(max)
}

fn move_in(
    txn: &mut Txn<'_>,
    id: i64,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<Application> {
    let from_key = application_key(from);
    let to_key = application_key(to);

    let mut source: Vec<Application> = txn.load(from_key, &[])?;
    let Some(pos) = source.iter().position(|a| a.id == id) else {
        return Err(locate_elsewhere(txn, id, from)?);
    };

    let mut application = source.remove(pos);
    application.status = to;
    application.decided_at = Some(Utc::now());

    let mut target: Vec<Application> = txn.load(to_key, &[])?;
    target.retain(|a| a.id != id);
    target.push(application.clone());

    txn.store(from_key, &source)?;
    txn.store(to_key, &target)?;
    tracing::debug!(id, %from, %to, "application moved");
    Ok(application)
}

/// Build the error for an application missing from `expected`'s list.
fn locate_elsewhere(
    txn: &mut Txn<'_>,
    id: i64,
    expected: ApplicationStatus,
) -> Result<PortalError> {
    for status in [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ] {
        if status == expected {
            continue;
        }
        let list: Vec<Application> = txn.load(application_key(status), &[])?;
        if list.iter().any(|a| a.id == id) {
            return Ok(PortalError::ApplicationNotPending { id, status });
        }
    }
    Ok(PortalError::ApplicationNotFound(id))
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Allocate a student code and record id, store the student and enroll them
/// in every course whose code is among their papers.
fn create_student_in(txn: &mut Txn<'_>, new: NewStudent) -> Result<Student> {
    validate_email(new.email.trim())?;

    let mut students: Vec<Student> = txn.load(keys::STUDENTS, &seed::students())?;

    // Counters start past anything already stored, readable or not, so
    // seeded and imported students never collide with allocated ones.
    let held = txn.held_back(keys::STUDENTS);
    let held_codes = held
        .iter()
        .filter_map(|v| v.get("studentId")?.as_str())
        .filter_map(|code| StudentCode::parse(code).ok())
        .map(|code| code.number());
    let code_floor = students
        .iter()
        .map(|s| s.student_id.number())
        .chain(held_codes)
        .map(i64::from)
        .max()
        .unwrap_or(0)
        + 1;
    let id_floor = students
        .iter()
        .map(|s| s.id)
        .chain(held.iter().filter_map(|v| v.get("id")?.as_i64()))
        .max()
        .unwrap_or(0)
        + 1;

    let code_number = txn.next_counter(counters::STUDENT_CODE, code_floor)?;
    let code_number =
        u32::try_from(code_number).map_err(|_| ValidationError::StudentCodesExhausted)?;
    let student_id = StudentCode::from_number(code_number)?;
    let id = txn.next_counter(counters::STUDENT_RECORD, id_floor)?;

    let student = Student {
        id,
        name: new.name.trim().to_string(),
        student_id,
        password: new.password.unwrap_or_else(generate_password),
        email: new.email.trim().to_string(),
        phone: new.phone,
        address: new.address,
        papers: new.papers,
        grades: Default::default(),
        attendance: Default::default(),
        payment_history: Vec::new(),
        enrolled_on: Some(Utc::now().date_naive()),
    };

    students.push(student.clone());
    txn.store(keys::STUDENTS, &students)?;

    let mut courses: Vec<Course> = txn.load(keys::COURSES, &seed::courses())?;
    let mut enrolled = false;
    for course in courses.iter_mut() {
        if student.papers.contains(&course.code) && !course.student_ids.contains(&student.id) {
            course.student_ids.push(student.id);
            enrolled = true;
        }
    }
    if enrolled {
        txn.store(keys::COURSES, &courses)?;
    }

    Ok(student)
}
