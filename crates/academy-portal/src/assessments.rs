//! Mock-test authoring, attempts and grading.
//!
//! MCQ answers are graded when the attempt is submitted. Theoretical answers
//! wait for a faculty member to award points. Once every answer carries
//! points the submission is graded and its percentage score is written into
//! the student's grade history, in the same transaction as the submission.

use academy_shared::constants::keys;
use academy_shared::{StudentCode, ValidationError};
use academy_store::{
    seed, GradeEntry, MockTest, Question, Record, Student, StudentAnswer, StudentSubmission,
    SubmissionStatus, Tab, TestStatus, Txn,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{PortalError, Result};

/// Label recorded on grade entries produced by mock tests.
pub const MOCK_TEST_EXAM_TYPE: &str = "Mock Test";

pub struct Assessments<'a> {
    tab: &'a Tab,
}

impl<'a> Assessments<'a> {
    pub fn new(tab: &'a Tab) -> Self {
        Self { tab }
    }

    // ------------------------------------------------------------------
    // Authoring
    // ------------------------------------------------------------------

    /// Create an empty draft test.
    pub fn create_test(&self, title: &str, paper: &str, faculty_id: &str) -> Result<MockTest> {
        let test = MockTest {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            paper: paper.to_string(),
            faculty_id: faculty_id.to_string(),
            status: TestStatus::Draft,
            questions: Vec::new(),
            scheduled_start_time: None,
            duration_minutes: None,
            is_locked: false,
        };
        self.tab.mock_tests().upsert(test.clone())?;
        tracing::info!(test = %test.id, paper, "mock test created");
        Ok(test)
    }

    pub fn save_test(&self, test: MockTest) -> Result<()> {
        self.tab.mock_tests().upsert(test)?;
        Ok(())
    }

    pub fn publish(&self, test_id: &str) -> Result<MockTest> {
        let test = self.find_test(test_id)?;
        if test.questions.is_empty() {
            return Err(ValidationError::EmptyField { field: "questions" }.into());
        }
        self.modify_test(test_id, |t| t.status = TestStatus::Published)
    }

    pub fn set_locked(&self, test_id: &str, locked: bool) -> Result<MockTest> {
        self.modify_test(test_id, |t| t.is_locked = locked)
    }

    pub fn schedule(&self, test_id: &str, start: Option<DateTime<Utc>>) -> Result<MockTest> {
        self.modify_test(test_id, |t| t.scheduled_start_time = start)
    }

    fn find_test(&self, test_id: &str) -> Result<MockTest> {
        self.tab
            .mock_tests()
            .get(&test_id.to_string())
            .ok_or_else(|| PortalError::TestNotFound(test_id.to_string()))
    }

    fn modify_test(&self, test_id: &str, f: impl FnOnce(&mut MockTest)) -> Result<MockTest> {
        self.tab
            .mock_tests()
            .update(&test_id.to_string(), f)?
            .ok_or_else(|| PortalError::TestNotFound(test_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Attempts
    // ------------------------------------------------------------------

    pub fn submit_attempt(
        &self,
        student: &StudentCode,
        test_id: &str,
        answers: Vec<StudentAnswer>,
    ) -> Result<StudentSubmission> {
        self.submit_attempt_at(student, test_id, answers, Utc::now())
    }

    /// Record `student`'s one attempt at `test_id` as of `now`.
    pub fn submit_attempt_at(
        &self,
        student: &StudentCode,
        test_id: &str,
        answers: Vec<StudentAnswer>,
        now: DateTime<Utc>,
    ) -> Result<StudentSubmission> {
        let submission = self.tab.transaction(|txn| {
            let tests: Vec<MockTest> = txn.load(keys::MOCK_TESTS, &[])?;
            let test = tests
                .into_iter()
                .find(|t| t.id == test_id)
                .ok_or_else(|| PortalError::TestNotFound(test_id.to_string()))?;
            ensure_open(&test, now)?;

            let students: Vec<Student> = txn.load(keys::STUDENTS, &seed::students())?;
            if !students.iter().any(|s| &s.student_id == student) {
                return Err(PortalError::StudentNotFound(student.to_string()));
            }

            let mut submissions: Vec<StudentSubmission> = txn.load(keys::STUDENT_SUBMISSIONS, &[])?;
            if submissions
                .iter()
                .any(|s| &s.student_id == student && s.test_id == test_id)
            {
                return Err(PortalError::AlreadySubmitted {
                    student: student.to_string(),
                    test_id: test_id.to_string(),
                });
            }

            let answers = auto_grade(&test, answers)?;
            let mut submission = StudentSubmission {
                id: Uuid::new_v4().to_string(),
                student_id: student.clone(),
                test_id: test_id.to_string(),
                answers,
                status: SubmissionStatus::Submitted,
                is_graded: false,
                total_points: 0.0,
                submitted_at: now,
            };
            refresh_totals(&mut submission);
            submission.validate()?;

            submissions.push(submission.clone());
            txn.store(keys::STUDENT_SUBMISSIONS, &submissions)?;

            if submission.is_graded {
                record_grade(txn, &test, &submission, now)?;
            }
            Ok::<_, PortalError>(submission)
        })?;

        tracing::info!(
            submission = %submission.id,
            student = %student,
            test = test_id,
            graded = submission.is_graded,
            "mock test submitted"
        );
        Ok(submission)
    }

    /// Award `points` (and optional feedback) for one answer.
    pub fn grade_answer(
        &self,
        submission_id: &str,
        question_id: &str,
        points: f64,
        feedback: Option<String>,
    ) -> Result<StudentSubmission> {
        let now = Utc::now();
        let submission = self.tab.transaction(|txn| {
            let mut submissions: Vec<StudentSubmission> = txn.load(keys::STUDENT_SUBMISSIONS, &[])?;
            let submission = submissions
                .iter_mut()
                .find(|s| s.id == submission_id)
                .ok_or_else(|| PortalError::SubmissionNotFound(submission_id.to_string()))?;

            let tests: Vec<MockTest> = txn.load(keys::MOCK_TESTS, &[])?;
            let test = tests
                .into_iter()
                .find(|t| t.id == submission.test_id)
                .ok_or_else(|| PortalError::TestNotFound(submission.test_id.clone()))?;

            let question = test.question(question_id).ok_or_else(|| PortalError::QuestionNotFound {
                test_id: test.id.clone(),
                question_id: question_id.to_string(),
            })?;
            if !points.is_finite() || points < 0.0 || points > question.points() {
                return Err(PortalError::PointsOutOfRange {
                    question_id: question_id.to_string(),
                    points,
                    max: question.points(),
                });
            }

            match submission.answers.iter_mut().find(|a| a.question_id == question_id) {
                Some(answer) => {
                    answer.awarded_points = Some(points);
                    answer.feedback = feedback;
                }
                None => submission.answers.push(StudentAnswer {
                    question_id: question_id.to_string(),
                    awarded_points: Some(points),
                    feedback,
                    ..Default::default()
                }),
            }
            refresh_totals(submission);
            let graded = submission.clone();

            txn.store(keys::STUDENT_SUBMISSIONS, &submissions)?;
            if graded.is_graded {
                record_grade(txn, &test, &graded, now)?;
            }
            Ok::<_, PortalError>(graded)
        })?;

        tracing::info!(
            submission = submission_id,
            question = question_id,
            points,
            graded = submission.is_graded,
            "answer graded"
        );
        Ok(submission)
    }

    /// Submissions still waiting for manual grading.
    pub fn pending_grading(&self) -> Vec<StudentSubmission> {
        self.tab.submissions().filter(|s| !s.is_graded)
    }
}

fn ensure_open(test: &MockTest, now: DateTime<Utc>) -> Result<()> {
    let reason = if test.status != TestStatus::Published {
        Some("not published")
    } else if test.is_locked {
        Some("locked")
    } else if test.scheduled_start_time.map_or(false, |start| now < start) {
        Some("not started yet")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(PortalError::TestNotOpen {
            test_id: test.id.clone(),
            reason,
        }),
        None => Ok(()),
    }
}

/// One answer per question in test order. MCQ answers get their points now;
/// unanswered questions score zero; written answers wait for a grader.
fn auto_grade(test: &MockTest, mut given: Vec<StudentAnswer>) -> Result<Vec<StudentAnswer>> {
    if let Some(stray) = given.iter().find(|a| test.question(&a.question_id).is_none()) {
        return Err(PortalError::QuestionNotFound {
            test_id: test.id.clone(),
            question_id: stray.question_id.clone(),
        });
    }

    let mut graded = Vec::with_capacity(test.questions.len());
    for question in &test.questions {
        let pos = given.iter().position(|a| a.question_id == question.id());
        let mut answer = match pos {
            Some(pos) => given.swap_remove(pos),
            None => StudentAnswer {
                question_id: question.id().to_string(),
                ..Default::default()
            },
        };
        answer.feedback = None;
        answer.awarded_points = match question {
            Question::Mcq { points, .. } => {
                let correct = answer.selected_option_id.is_some()
                    && answer.selected_option_id.as_deref() == question.correct_option();
                Some(if correct { *points } else { 0.0 })
            }
            Question::Theoretical { .. } => {
                let blank = answer
                    .text_answer
                    .as_deref()
                    .map_or(true, |t| t.trim().is_empty());
                if blank {
                    Some(0.0)
                } else {
                    None
                }
            }
        };
        graded.push(answer);
    }
    Ok(graded)
}

fn refresh_totals(submission: &mut StudentSubmission) {
    submission.total_points = submission
        .answers
        .iter()
        .filter_map(|a| a.awarded_points)
        .sum();
    submission.is_graded = submission.answers.iter().all(|a| a.awarded_points.is_some());
    submission.status = if submission.is_graded {
        SubmissionStatus::Graded
    } else {
        SubmissionStatus::Submitted
    };
}

/// Percentage score, rounded to two decimals.
pub fn percentage(points: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    ((points / total) * 10_000.0).round() / 100.0
}

/// Write the submission's score into the student's grade history, replacing
/// any earlier entry for the same test.
fn record_grade(
    txn: &mut Txn<'_>,
    test: &MockTest,
    submission: &StudentSubmission,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut students: Vec<Student> = txn.load(keys::STUDENTS, &seed::students())?;
    let Some(student) = students
        .iter_mut()
        .find(|s| s.student_id == submission.student_id)
    else {
        return Err(PortalError::StudentNotFound(submission.student_id.to_string()));
    };

    let entries = student.grades.entry(test.paper.clone()).or_default();
    entries.retain(|g| g.test_id.as_deref() != Some(test.id.as_str()));
    entries.push(GradeEntry {
        score: percentage(submission.total_points, test.total_points()),
        date: now.date_naive(),
        exam_type: MOCK_TEST_EXAM_TYPE.to_string(),
        test_id: Some(test.id.clone()),
    });

    txn.store(keys::STUDENTS, &students)?;
    tracing::debug!(student = %submission.student_id, paper = %test.paper, "grade recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_store::{LocalStore, McqOption};

    fn mcq(id: &str, correct: &str, points: f64) -> Question {
        Question::Mcq {
            id: id.to_string(),
            text: format!("Question {id}"),
            options: ["a", "b", "c"]
                .iter()
                .map(|o| McqOption {
                    id: o.to_string(),
                    text: o.to_uppercase(),
                    is_correct: *o == correct,
                })
                .collect(),
            points,
        }
    }

    fn essay(id: &str, points: f64) -> Question {
        Question::Theoretical {
            id: id.to_string(),
            text: format!("Discuss {id}"),
            points,
        }
    }

    fn published(tab: &Tab, questions: Vec<Question>) -> MockTest {
        let assessments = Assessments::new(tab);
        let mut test = assessments.create_test("Week 1", "FR", "F001").unwrap();
        test.questions = questions;
        assessments.save_test(test.clone()).unwrap();
        assessments.publish(&test.id).unwrap()
    }

    fn pick(question_id: &str, option: &str) -> StudentAnswer {
        StudentAnswer {
            question_id: question_id.to_string(),
            selected_option_id: Some(option.to_string()),
            ..Default::default()
        }
    }

    fn code(s: &str) -> StudentCode {
        StudentCode::parse(s).unwrap()
    }

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(2.0, 3.0), 66.67);
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(10.0, 10.0), 100.0);
    }

    #[test]
    fn publishing_requires_questions() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = assessments.create_test("Empty", "FR", "F001").unwrap();

        let err = assessments.publish(&test.id).unwrap_err();
        assert!(matches!(
            err,
            PortalError::Validation(ValidationError::EmptyField { field: "questions" })
        ));
    }

    #[test]
    fn draft_and_locked_tests_refuse_attempts() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let draft = assessments.create_test("Draft", "FR", "F001").unwrap();

        let err = assessments
            .submit_attempt(&code("S00001"), &draft.id, Vec::new())
            .unwrap_err();
        assert!(matches!(err, PortalError::TestNotOpen { reason: "not published", .. }));

        let test = published(&tab, vec![mcq("q1", "a", 1.0)]);
        assessments.set_locked(&test.id, true).unwrap();
        let err = assessments
            .submit_attempt(&code("S00001"), &test.id, Vec::new())
            .unwrap_err();
        assert!(matches!(err, PortalError::TestNotOpen { reason: "locked", .. }));
    }

    #[test]
    fn scheduled_test_opens_at_its_start() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![mcq("q1", "a", 1.0)]);
        let start = Utc::now() + chrono::Duration::hours(1);
        assessments.schedule(&test.id, Some(start)).unwrap();

        let early = assessments.submit_attempt_at(
            &code("S00001"),
            &test.id,
            vec![pick("q1", "a")],
            start - chrono::Duration::minutes(5),
        );
        assert!(matches!(early, Err(PortalError::TestNotOpen { reason: "not started yet", .. })));

        let on_time = assessments
            .submit_attempt_at(&code("S00001"), &test.id, vec![pick("q1", "a")], start)
            .unwrap();
        assert!(on_time.is_graded);
    }

    #[test]
    fn mcq_only_attempt_is_graded_and_recorded() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![mcq("q1", "a", 2.0), mcq("q2", "b", 2.0)]);

        let submission = assessments
            .submit_attempt(&code("S00001"), &test.id, vec![pick("q1", "a"), pick("q2", "c")])
            .unwrap();
        assert!(submission.is_graded);
        assert_eq!(submission.status, SubmissionStatus::Graded);
        assert_eq!(submission.total_points, 2.0);

        let student = tab.students().find_by_code(&code("S00001")).unwrap();
        let entry = student.grades["FR"]
            .iter()
            .find(|g| g.test_id.as_deref() == Some(test.id.as_str()))
            .unwrap();
        assert_eq!(entry.score, 50.0);
        assert_eq!(entry.exam_type, MOCK_TEST_EXAM_TYPE);
    }

    #[test]
    fn second_attempt_is_rejected() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![mcq("q1", "a", 1.0)]);

        assessments
            .submit_attempt(&code("S00002"), &test.id, vec![pick("q1", "a")])
            .unwrap();
        let err = assessments
            .submit_attempt(&code("S00002"), &test.id, vec![pick("q1", "b")])
            .unwrap_err();
        assert!(matches!(err, PortalError::AlreadySubmitted { .. }));
        assert_eq!(tab.submissions().for_test(&test.id).len(), 1);
    }

    #[test]
    fn answers_to_unknown_questions_are_rejected() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![mcq("q1", "a", 1.0)]);

        let err = assessments
            .submit_attempt(&code("S00001"), &test.id, vec![pick("q9", "a")])
            .unwrap_err();
        assert!(matches!(err, PortalError::QuestionNotFound { .. }));
        assert!(!tab.submissions().is_stored());
    }

    #[test]
    fn written_answers_wait_for_a_grader() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![mcq("q1", "a", 2.0), essay("q2", 8.0)]);

        let answers = vec![
            pick("q1", "a"),
            StudentAnswer {
                question_id: "q2".into(),
                text_answer: Some("IFRS 15 recognises revenue...".into()),
                ..Default::default()
            },
        ];
        let submission = assessments
            .submit_attempt(&code("S00001"), &test.id, answers)
            .unwrap();
        assert!(!submission.is_graded);
        assert_eq!(assessments.pending_grading().len(), 1);

        let err = assessments
            .grade_answer(&submission.id, "q2", 9.0, None)
            .unwrap_err();
        assert!(matches!(err, PortalError::PointsOutOfRange { .. }));

        let graded = assessments
            .grade_answer(&submission.id, "q2", 6.0, Some("Good structure".into()))
            .unwrap();
        assert!(graded.is_graded);
        assert_eq!(graded.total_points, 8.0);
        assert_eq!(
            graded.answer("q2").and_then(|a| a.feedback.as_deref()),
            Some("Good structure")
        );

        // Regrading replaces the earlier grade entry.
        assessments.grade_answer(&submission.id, "q2", 8.0, None).unwrap();
        let student = tab.students().find_by_code(&code("S00001")).unwrap();
        let entries: Vec<_> = student.grades["FR"]
            .iter()
            .filter(|g| g.test_id.as_deref() == Some(test.id.as_str()))
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 100.0);
    }

    #[test]
    fn blank_written_answer_scores_zero() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let assessments = Assessments::new(&tab);
        let test = published(&tab, vec![essay("q1", 5.0)]);

        let submission = assessments
            .submit_attempt(&code("S00001"), &test.id, Vec::new())
            .unwrap();
        assert!(submission.is_graded);
        assert_eq!(submission.answers.len(), 1);
        assert_eq!(submission.answers[0].awarded_points, Some(0.0));
    }
}
