//! Calendar events: the persisted `calendarEvents` list plus one exam
//! event per scheduled mock test.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use academy_shared::constants::{keys, DERIVED_TEST_EVENT_PREFIX};
use academy_store::{CalendarEvent, EventId, EventType, MockTest, Tab, TestStatus};
use chrono::Duration;

/// One `exam` event per published mock test with a scheduled start.
pub fn derive_exam_events(tests: &[MockTest]) -> Vec<CalendarEvent> {
    tests
        .iter()
        .filter(|t| t.status == TestStatus::Published)
        .filter_map(|test| {
            let start = test.scheduled_start_time?;
            // An end past midnight would precede the start on the event's date.
            let end = test
                .duration_minutes
                .map(|m| start + Duration::minutes(i64::from(m)))
                .filter(|end| end.date_naive() == start.date_naive())
                .map(|end| end.time());
            Some(CalendarEvent {
                id: EventId::Text(format!("{DERIVED_TEST_EVENT_PREFIX}{}", test.id)),
                date: start.date_naive(),
                title: format!("Mock test: {}", test.title),
                event_type: EventType::Exam,
                start_time: Some(start.time()),
                end_time: end,
                paper: Some(test.paper.clone()),
                instructor: None,
                join_link: None,
            })
        })
        .collect()
}

/// Union of both lists by id. A persisted event shadows a derived one with
/// the same id. Sorted by date, then start time.
pub fn merge_events(
    persisted: Vec<CalendarEvent>,
    derived: Vec<CalendarEvent>,
) -> Vec<CalendarEvent> {
    let mut seen: HashSet<EventId> = persisted.iter().map(|e| e.id.clone()).collect();
    let mut merged = persisted;
    for event in derived {
        if seen.insert(event.id.clone()) {
            merged.push(event);
        }
    }
    merged.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
    merged
}

/// Calendar for one tab. Derived exam events are cached and rebuilt only
/// when the `mockTests` entry has been rewritten since the last build.
pub struct CalendarView<'a> {
    tab: &'a Tab,
    cache: RefCell<Option<(Option<i64>, Vec<CalendarEvent>)>>,
    derivations: Cell<usize>,
}

impl<'a> CalendarView<'a> {
    pub fn new(tab: &'a Tab) -> Self {
        Self {
            tab,
            cache: RefCell::new(None),
            derivations: Cell::new(0),
        }
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        merge_events(self.tab.calendar_events().list(), self.derived())
    }

    pub fn derived(&self) -> Vec<CalendarEvent> {
        let revision = match self.tab.revision(keys::MOCK_TESTS) {
            Ok(revision) => revision,
            Err(e) => {
                tracing::warn!(error = %e, "could not read mock test revision, rebuilding");
                return self.rebuild(None);
            }
        };

        if let Some((cached, events)) = self.cache.borrow().as_ref() {
            if *cached == revision {
                return events.clone();
            }
        }
        self.rebuild(revision)
    }

    /// Number of times the derived events were rebuilt.
    pub fn derivations(&self) -> usize {
        self.derivations.get()
    }

    pub fn invalidate(&self) {
        self.cache.replace(None);
    }

    fn rebuild(&self, revision: Option<i64>) -> Vec<CalendarEvent> {
        let events = derive_exam_events(&self.tab.mock_tests().list());
        self.derivations.set(self.derivations.get() + 1);
        tracing::debug!(count = events.len(), ?revision, "derived exam events rebuilt");
        self.cache.replace(Some((revision, events.clone())));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_store::{LocalStore, Record};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn test_at(id: &str, status: TestStatus, hour: Option<u32>) -> MockTest {
        MockTest {
            id: id.to_string(),
            title: format!("Test {id}"),
            paper: "TX".to_string(),
            faculty_id: "F002".to_string(),
            status,
            questions: Vec::new(),
            scheduled_start_time: hour.map(|h| Utc.with_ymd_and_hms(2026, 3, 9, h, 0, 0).unwrap()),
            duration_minutes: Some(90),
            is_locked: false,
        }
    }

    #[test]
    fn only_scheduled_published_tests_become_events() {
        let tests = vec![
            test_at("a", TestStatus::Published, Some(10)),
            test_at("b", TestStatus::Draft, Some(10)),
            test_at("c", TestStatus::Published, None),
        ];
        let events = derive_exam_events(&tests);
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.id, EventId::Text("test-a".into()));
        assert_eq!(event.event_type, EventType::Exam);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(event.start_time, NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(event.end_time, NaiveTime::from_hms_opt(11, 30, 0));
    }

    #[test]
    fn overnight_test_has_no_end_time() {
        let late = test_at("late", TestStatus::Published, Some(23));
        let events = derive_exam_events(&[late]);
        assert_eq!(events[0].start_time, NaiveTime::from_hms_opt(23, 0, 0));
        assert_eq!(events[0].end_time, None);
        assert!(events[0].validate().is_ok());
    }

    #[test]
    fn view_rebuilds_only_after_tests_change() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let view = CalendarView::new(&tab);

        assert!(view.derived().is_empty());
        assert!(view.derived().is_empty());
        assert_eq!(view.derivations(), 1);

        tab.mock_tests()
            .upsert(test_at("a", TestStatus::Published, Some(9)))
            .unwrap();
        assert_eq!(view.derived().len(), 1);
        assert_eq!(view.derivations(), 2);

        view.events();
        assert_eq!(view.derivations(), 2);

        view.invalidate();
        view.derived();
        assert_eq!(view.derivations(), 3);
    }
}
