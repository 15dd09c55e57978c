/// Application name
pub const APP_NAME: &str = "Academy";

/// Prefix of every student code (`S` followed by five digits)
pub const STUDENT_CODE_PREFIX: char = 'S';

/// Number of digits following the student code prefix
pub const STUDENT_CODE_DIGITS: usize = 5;

/// Default total storage quota per origin, in bytes of stored values (5 MiB)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Default capacity of the change notification channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Prefix of synthetic calendar event ids derived from mock tests
pub const DERIVED_TEST_EVENT_PREFIX: &str = "test-";

/// Reply shown when the chat assistant backend fails
pub const ASSISTANT_APOLOGY: &str =
    "Sorry, I'm having trouble answering right now. Please try again later.";

/// Persistent storage keys shared by every portal and page.
pub mod keys {
    pub const STUDENTS: &str = "students";
    pub const FACULTY: &str = "faculty";
    pub const COURSES: &str = "courses";
    pub const PENDING_APPLICATIONS: &str = "pendingApplications";
    pub const APPROVED_APPLICATIONS: &str = "approvedApplications";
    pub const REJECTED_APPLICATIONS: &str = "rejectedApplications";
    pub const MOCK_TESTS: &str = "mockTests";
    pub const STUDENT_SUBMISSIONS: &str = "studentSubmissions";
    pub const CALENDAR_EVENTS: &str = "calendarEvents";
    pub const BLOGS: &str = "blogs";
    pub const GALLERY: &str = "gallery";
    pub const VLOGS: &str = "vlogs";
    pub const TESTIMONIALS: &str = "testimonials";
    pub const FAQ_DATA: &str = "faqData";
    pub const CONTACT_DETAILS: &str = "contactDetails";
    pub const WELCOME_EMAIL_TEMPLATE: &str = "welcomeEmailTemplate";
    pub const BANNERS: &str = "banners";
    pub const HIGH_ACHIEVERS: &str = "highAchievers";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const POPUPS: &str = "popupNotifications";

    /// Every persistent key, in a stable order.
    pub const ALL: &[&str] = &[
        STUDENTS,
        FACULTY,
        COURSES,
        PENDING_APPLICATIONS,
        APPROVED_APPLICATIONS,
        REJECTED_APPLICATIONS,
        MOCK_TESTS,
        STUDENT_SUBMISSIONS,
        CALENDAR_EVENTS,
        BLOGS,
        GALLERY,
        VLOGS,
        TESTIMONIALS,
        FAQ_DATA,
        CONTACT_DETAILS,
        WELCOME_EMAIL_TEMPLATE,
        BANNERS,
        HIGH_ACHIEVERS,
        ANNOUNCEMENTS,
        POPUPS,
    ];
}

/// Session-scoped keys. These live in a tab's session storage and are never
/// persisted or broadcast.
pub mod session_keys {
    pub const SEEN_POPUP_IDS: &str = "seenPopupIds";
    pub const CURRENT_USER: &str = "currentUser";
}

/// Counter names used for id allocation.
pub mod counters {
    pub const STUDENT_CODE: &str = "studentCode";
    pub const STUDENT_RECORD: &str = "studentRecord";
    pub const APPLICATION_RECORD: &str = "applicationRecord";
    pub const REVISION: &str = "kvRevision";
}
