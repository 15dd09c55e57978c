//! [`Record`] implementations and invariant checks for every stored model.

use academy_shared::ValidationError;
use serde_json::Value;

use crate::models::*;
use crate::schema::Record;

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(())
    }
}

/// Loose shape check: one `@` with something on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Lowercase, ASCII-alphanumeric words joined by single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && !id.ends_with('-')
        && !id.contains("--")
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
        })
    }
}

impl Record for Student {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        // `student_id` is a `StudentCode`, so its pattern holds by construction.
        require("name", &self.name)?;
        validate_email(&self.email)?;
        for (paper, pct) in &self.attendance {
            if !(0.0..=100.0).contains(pct) {
                return Err(ValidationError::OutOfRange {
                    field: "attendance",
                    value: format!("{paper}={pct}"),
                });
            }
        }
        Ok(())
    }

    // Untagged data may carry the grade map under its older `scores` name.
    fn migrate(mut record: Value, from: u32) -> Value {
        if from < 1 {
            if let Some(obj) = record.as_object_mut() {
                if !obj.contains_key("grades") {
                    if let Some(scores) = obj.remove("scores") {
                        obj.insert("grades".to_string(), scores);
                    }
                }
            }
        }
        record
    }
}

impl Record for FacultyMember {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        validate_email(&self.email)
    }
}

impl Record for Application {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        validate_email(&self.email)?;
        require("program", &self.program)?;
        if self.papers.is_empty() {
            return Err(ValidationError::EmptyField { field: "papers" });
        }
        Ok(())
    }
}

impl Record for Course {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        if !is_slug(&self.id) {
            return Err(ValidationError::IdMismatch {
                id: self.id.clone(),
                expected: slugify(&self.title),
            });
        }
        Ok(())
    }
}

impl Record for MockTest {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        require("title", &self.title)?;
        require("paper", &self.paper)?;
        for question in &self.questions {
            non_negative("points", question.points())?;
            if let Question::Mcq { id, options, .. } = question {
                let found = options.iter().filter(|o| o.is_correct).count();
                if found != 1 {
                    return Err(ValidationError::CorrectOptionCount {
                        question_id: id.clone(),
                        found,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Record for StudentSubmission {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)?;
        require("testId", &self.test_id)?;
        non_negative("totalPoints", self.total_points)?;
        for answer in &self.answers {
            if let Some(points) = answer.awarded_points {
                non_negative("awardedPoints", points)?;
            }
        }
        Ok(())
    }
}

impl Record for CalendarEvent {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return Err(ValidationError::OutOfRange {
                    field: "endTime",
                    value: end.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Record for BlogPost {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("authorId", &self.author_id)
    }
}

impl Record for Vlog {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("videoUrl", &self.video_url)
    }
}

impl Record for GalleryImage {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("url", &self.url)
    }
}

impl Record for Testimonial {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::OutOfRange {
                field: "rating",
                value: self.rating.to_string(),
            });
        }
        Ok(())
    }
}

impl Record for FaqItem {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("question", &self.question)?;
        require("answer", &self.answer)
    }
}

impl Record for HeroSlide {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("imageUrl", &self.image_url)
    }
}

impl Record for Announcement {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)
    }
}

impl Record for PopupNotification {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("id", &self.id)
    }
}

impl Record for HighAchiever {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        non_negative("score", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Financial Reporting (FR)"), "financial-reporting-fr");
        assert_eq!(slugify("  Audit & Assurance  "), "audit-assurance");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.com").is_ok());
        for bad in ["", "a", "a@b", "@b.com", "a@b@c.com", "a@b."] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
    }

    fn mcq(correct: &[bool]) -> Question {
        Question::Mcq {
            id: "q1".into(),
            text: "?".into(),
            options: correct
                .iter()
                .enumerate()
                .map(|(i, c)| McqOption {
                    id: format!("o{i}"),
                    text: format!("option {i}"),
                    is_correct: *c,
                })
                .collect(),
            points: 2.0,
        }
    }

    fn test_with(question: Question) -> MockTest {
        MockTest {
            id: "t1".into(),
            title: "FR mock".into(),
            paper: "FR".into(),
            faculty_id: "F001".into(),
            status: TestStatus::Draft,
            questions: vec![question],
            scheduled_start_time: None,
            duration_minutes: None,
            is_locked: false,
        }
    }

    #[test]
    fn mcq_needs_exactly_one_correct_option() {
        assert!(test_with(mcq(&[false, true, false])).validate().is_ok());
        assert!(matches!(
            test_with(mcq(&[true, true])).validate(),
            Err(ValidationError::CorrectOptionCount { found: 2, .. })
        ));
        assert!(matches!(
            test_with(mcq(&[false, false])).validate(),
            Err(ValidationError::CorrectOptionCount { found: 0, .. })
        ));
    }

    #[test]
    fn course_ids_must_be_slugs() {
        let mut course = Course {
            id: "financial-reporting".into(),
            title: "Financial Reporting".into(),
            code: "FR".into(),
            level: CourseLevel::AppliedSkills,
            description: String::new(),
            duration: String::new(),
            syllabus: vec![],
            faculty_ids: vec![],
            student_ids: vec![],
        };
        assert!(course.validate().is_ok());
        course.id = "Financial Reporting".into();
        assert!(course.validate().is_err());
    }

    #[test]
    fn legacy_student_scores_are_renamed() {
        let raw = serde_json::json!({"id": 1, "scores": {"FR": []}});
        let migrated = Student::migrate(raw, 0);
        assert!(migrated.get("grades").is_some());
        assert!(migrated.get("scores").is_none());
    }
}
