//! End-to-end portal flows across tabs of one store.

use academy_portal::{
    derive_exam_events, merge_events, Admissions, ApplicationForm, Assessments, CalendarView,
    LogMailer, PortalError,
};
use academy_shared::constants::keys;
use academy_store::{
    seed, Application, ApplicationStatus, CalendarEvent, EventId, EventType, LocalStore,
    McqOption, Question, StudentAnswer,
};
use chrono::{Duration, NaiveDate, Utc};

fn form(name: &str, email: &str) -> ApplicationForm {
    ApplicationForm {
        name: name.to_string(),
        email: email.to_string(),
        phone: "+44 7700 900123".to_string(),
        address: "12 Mill Lane".to_string(),
        qualification: "A-Levels".to_string(),
        program: "ACCA".to_string(),
        papers: vec!["FR".to_string(), "TX".to_string()],
    }
}

#[test]
fn approved_application_appears_exactly_once() {
    let store = LocalStore::in_memory().unwrap();
    let tab = store.open_tab();
    let mailer = LogMailer::new("admissions@academy.test");
    let admissions = Admissions::new(&tab, &mailer, mailer.from_address());

    let first = admissions.submit(form("Omar Farouk", "omar@example.com")).unwrap();
    let second = admissions.submit(form("Lina Park", "lina@example.com")).unwrap();
    assert_ne!(first.id, second.id);

    let student = admissions.approve(first.id).unwrap();

    let pending = admissions.list(ApplicationStatus::Pending);
    let approved = admissions.list(ApplicationStatus::Approved);
    assert!(pending.iter().all(|a| a.id != first.id));
    assert_eq!(approved.iter().filter(|a| a.id == first.id).count(), 1);
    assert_eq!(approved[0].status, ApplicationStatus::Approved);

    let outbox = mailer.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "omar@example.com");
    assert!(outbox[0].body.contains(student.student_id.as_str()));
}

fn revisions(tab: &academy_store::Tab) -> Vec<(&'static str, Option<i64>)> {
    keys::ALL
        .iter()
        .map(|k| (*k, tab.revision(k).unwrap()))
        .collect()
}

#[test]
fn moving_an_application_touches_only_its_two_lists() {
    let store = LocalStore::in_memory().unwrap();
    let tab = store.open_tab();
    seed::install_defaults(&tab).unwrap();

    let pending = |id: i64, name: &str| Application {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: String::new(),
        address: String::new(),
        qualification: "BSc".to_string(),
        program: "ACCA".to_string(),
        papers: vec!["AA".to_string()],
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
        decided_at: None,
    };
    tab.applications(ApplicationStatus::Pending)
        .save_all(&[pending(41, "Hamza"), pending(42, "Sana")])
        .unwrap();
    tab.applications(ApplicationStatus::Approved).save_all(&[]).unwrap();

    let before = revisions(&tab);
    let mailer = LogMailer::new("admissions@academy.test");
    let moved = Admissions::new(&tab, &mailer, "x@academy.test")
        .move_application(42, ApplicationStatus::Pending, ApplicationStatus::Approved)
        .unwrap();
    assert_eq!(moved.status, ApplicationStatus::Approved);
    let after = revisions(&tab);

    let changed: Vec<&str> = before
        .iter()
        .zip(&after)
        .filter(|(b, a)| b.1 != a.1)
        .map(|(b, _)| b.0)
        .collect();
    assert_eq!(
        changed,
        vec![keys::PENDING_APPLICATIONS, keys::APPROVED_APPLICATIONS]
    );

    let approved = tab.applications(ApplicationStatus::Approved).list();
    assert_eq!(approved.iter().filter(|a| a.id == 42).count(), 1);
    let still_pending = tab.applications(ApplicationStatus::Pending).list();
    assert_eq!(still_pending.iter().map(|a| a.id).collect::<Vec<_>>(), vec![41]);
    assert!(mailer.outbox().is_empty());
}

#[test]
fn decisions_are_final() {
    let store = LocalStore::in_memory().unwrap();
    let tab = store.open_tab();
    let mailer = LogMailer::new("admissions@academy.test");
    let admissions = Admissions::new(&tab, &mailer, mailer.from_address());

    let application = admissions.submit(form("Omar Farouk", "omar@example.com")).unwrap();
    admissions.reject(application.id).unwrap();

    let err = admissions.approve(application.id).unwrap_err();
    assert!(matches!(
        err,
        PortalError::ApplicationNotPending {
            status: ApplicationStatus::Rejected,
            ..
        }
    ));
    assert!(mailer.outbox().is_empty());
    assert_eq!(admissions.list(ApplicationStatus::Rejected).len(), 1);
}

#[test]
fn approvals_in_two_tabs_allocate_distinct_codes() {
    let store = LocalStore::in_memory().unwrap();
    let (a, b) = (store.open_tab(), store.open_tab());
    let mailer = LogMailer::new("admissions@academy.test");

    let first = Admissions::new(&a, &mailer, "x@academy.test")
        .submit(form("Omar Farouk", "omar@example.com"))
        .unwrap();
    let second = Admissions::new(&b, &mailer, "x@academy.test")
        .submit(form("Lina Park", "lina@example.com"))
        .unwrap();

    let s1 = Admissions::new(&a, &mailer, "x@academy.test").approve(first.id).unwrap();
    let s2 = Admissions::new(&b, &mailer, "x@academy.test").approve(second.id).unwrap();
    assert_ne!(s1.student_id, s2.student_id);
    assert_ne!(s1.id, s2.id);

    let students = a.students().list();
    assert!(students.iter().any(|s| s.student_id == s1.student_id));
    assert!(students.iter().any(|s| s.student_id == s2.student_id));
}

#[tokio::test]
async fn other_tabs_hear_about_approvals() {
    let store = LocalStore::in_memory().unwrap();
    let (admin, student_tab) = (store.open_tab(), store.open_tab());
    let mut sub = student_tab.subscribe(&[keys::STUDENTS]);
    let mut own = admin.subscribe(&[]);

    let mailer = LogMailer::new("admissions@academy.test");
    let admissions = Admissions::new(&admin, &mailer, "x@academy.test");
    let application = admissions.submit(form("Lina Park", "lina@example.com")).unwrap();
    admissions.approve(application.id).unwrap();

    let event = tokio::time::timeout(std::time::Duration::from_secs(1), sub.recv())
        .await
        .expect("no change event")
        .unwrap();
    assert_eq!(event.key, keys::STUDENTS);
    assert_eq!(event.origin, admin.context());
    assert!(own.try_recv().unwrap().is_none());
}

#[test]
fn persisted_calendar_event_shadows_derived_one() {
    let store = LocalStore::in_memory().unwrap();
    let tab = store.open_tab();
    let assessments = Assessments::new(&tab);

    let mut test = assessments.create_test("Consolidation drill", "FR", "F001").unwrap();
    test.questions.push(Question::Theoretical {
        id: "q1".into(),
        text: "Explain goodwill".into(),
        points: 10.0,
    });
    test.duration_minutes = Some(60);
    assessments.save_test(test.clone()).unwrap();
    assessments.publish(&test.id).unwrap();
    assessments
        .schedule(&test.id, Some(Utc::now() + Duration::days(2)))
        .unwrap();

    let derived_id = EventId::Text(format!("test-{}", test.id));
    let view = CalendarView::new(&tab);
    let events = view.events();
    assert_eq!(events.iter().filter(|e| e.id == derived_id).count(), 1);

    let override_event = CalendarEvent {
        id: derived_id.clone(),
        date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        title: "Consolidation drill (moved online)".into(),
        event_type: EventType::Exam,
        start_time: None,
        end_time: None,
        paper: Some("FR".into()),
        instructor: Some("F001".into()),
        join_link: Some("https://meet.example.com/fr".into()),
    };
    tab.calendar_events().upsert(override_event.clone()).unwrap();

    let events = view.events();
    let matching: Vec<_> = events.iter().filter(|e| e.id == derived_id).collect();
    assert_eq!(matching, vec![&override_event]);

    let derived = derive_exam_events(&tab.mock_tests().list());
    let merged = merge_events(vec![override_event.clone()], derived);
    assert_eq!(merged.len(), 1);
}

#[test]
fn graded_attempt_lands_in_student_record() {
    let store = LocalStore::in_memory().unwrap();
    let (faculty, student) = (store.open_tab(), store.open_tab());
    let authoring = Assessments::new(&faculty);

    let mut test = authoring.create_test("Tax basics", "TX", "F002").unwrap();
    test.questions = vec![
        Question::Mcq {
            id: "q1".into(),
            text: "Standard VAT rate?".into(),
            options: vec![
                McqOption { id: "a".into(), text: "5%".into(), is_correct: false },
                McqOption { id: "b".into(), text: "20%".into(), is_correct: true },
            ],
            points: 4.0,
        },
        Question::Theoretical {
            id: "q2".into(),
            text: "Explain badges of trade".into(),
            points: 6.0,
        },
    ];
    authoring.save_test(test.clone()).unwrap();
    authoring.publish(&test.id).unwrap();

    let code = "S00002".parse().unwrap();
    let submission = Assessments::new(&student)
        .submit_attempt(
            &code,
            &test.id,
            vec![
                StudentAnswer {
                    question_id: "q1".into(),
                    selected_option_id: Some("b".into()),
                    ..Default::default()
                },
                StudentAnswer {
                    question_id: "q2".into(),
                    text_answer: Some("Intention to profit, frequency...".into()),
                    ..Default::default()
                },
            ],
        )
        .unwrap();
    assert!(!submission.is_graded);
    assert_eq!(submission.total_points, 4.0);

    authoring.grade_answer(&submission.id, "q2", 3.0, None).unwrap();

    let record = student.students().find_by_code(&code).unwrap();
    let grade = record.grades["TX"]
        .iter()
        .find(|g| g.test_id.as_deref() == Some(test.id.as_str()))
        .unwrap();
    assert_eq!(grade.score, 70.0);
    assert!(student.submissions().for_student(&code)[0].is_graded);
}
