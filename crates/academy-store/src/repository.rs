//! Typed access to one record collection.
//!
//! A [`Repository`] binds a record type to its storage key and bundled seed
//! data. Reads fall back to the seed only while the key is absent; a stored
//! empty collection stays empty. Every mutation is one read-modify-write
//! inside a single transaction, so concurrent tabs of the same store cannot
//! lose each other's updates.

use std::sync::Arc;

use academy_shared::constants::keys;
use academy_shared::{StudentCode, ValidationError};

use crate::error::{Result, StoreError};
use crate::models::*;
use crate::schema::{self, Record};
use crate::seed;
use crate::store::Tab;

pub struct Repository<T: Record> {
    tab: Tab,
    key: String,
    seed: Arc<Vec<T>>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            tab: self.tab.clone(),
            key: self.key.clone(),
            seed: Arc::clone(&self.seed),
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(tab: &Tab, key: &str) -> Self {
        Self {
            tab: tab.clone(),
            key: key.to_string(),
            seed: Arc::new(Vec::new()),
        }
    }

    pub fn with_seed(mut self, seed: Vec<T>) -> Self {
        self.seed = Arc::new(seed);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seed(&self) -> &[T] {
        &self.seed
    }

    /// All records, or the seed when nothing is stored. Read errors are logged
    /// and also yield the seed.
    pub fn list(&self) -> Vec<T> {
        self.try_list().unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "failed to list records, using defaults");
            self.seed.to_vec()
        })
    }

    pub fn try_list(&self) -> Result<Vec<T>> {
        let Some(entry) = self.tab.entry(&self.key)? else {
            return Ok(self.seed.to_vec());
        };
        match schema::decode_collection::<T>(&self.key, &entry.value, entry.schema_version) {
            Ok(decoded) => Ok(decoded.records),
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "stored collection is corrupt, using defaults"
                );
                Ok(self.seed.to_vec())
            }
        }
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.list().into_iter().find(|r| &r.id() == id)
    }

    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.list().into_iter().filter(|r| pred(r)).collect()
    }

    /// Whether a value is stored under the key (as opposed to seed fallback).
    pub fn is_stored(&self) -> bool {
        self.tab.entry(&self.key).map(|e| e.is_some()).unwrap_or(false)
    }

    /// Replace the whole collection.
    pub fn save_all(&self, records: &[T]) -> Result<()> {
        self.tab.transaction(|txn| txn.store(&self.key, records))
    }

    /// Replace the record with the same id in place, or append it.
    pub fn upsert(&self, record: T) -> Result<()> {
        self.tab.transaction(|txn| {
            let mut all = txn.load(&self.key, &self.seed)?;
            let id = record.id();
            match all.iter_mut().find(|r| r.id() == id) {
                Some(existing) => *existing = record,
                None => all.push(record),
            }
            txn.store(&self.key, &all)
        })
    }

    /// Apply `f` to the record with `id`. Returns the updated record, or
    /// `None` (and writes nothing) when no record has that id.
    pub fn update(&self, id: &T::Id, f: impl FnOnce(&mut T)) -> Result<Option<T>> {
        self.tab.transaction(|txn| {
            let mut all = txn.load(&self.key, &self.seed)?;
            let Some(record) = all.iter_mut().find(|r| &r.id() == id) else {
                return Ok(None);
            };
            f(record);
            if &record.id() != id {
                return Err(StoreError::Validation(ValidationError::IdMismatch {
                    id: record.id().to_string(),
                    expected: id.to_string(),
                }));
            }
            let updated = record.clone();
            txn.store(&self.key, &all)?;
            Ok(Some(updated))
        })
    }

    pub fn remove(&self, id: &T::Id) -> Result<Option<T>> {
        self.tab.transaction(|txn| {
            let mut all = txn.load(&self.key, &self.seed)?;
            let Some(pos) = all.iter().position(|r| &r.id() == id) else {
                return Ok(None);
            };
            let removed = all.remove(pos);
            txn.store(&self.key, &all)?;
            Ok(Some(removed))
        })
    }
}

impl Repository<Student> {
    pub fn find_by_code(&self, code: &StudentCode) -> Option<Student> {
        self.list().into_iter().find(|s| &s.student_id == code)
    }
}

impl Repository<MockTest> {
    pub fn published(&self) -> Vec<MockTest> {
        self.filter(|t| t.status == TestStatus::Published)
    }
}

impl Repository<StudentSubmission> {
    pub fn for_student(&self, code: &StudentCode) -> Vec<StudentSubmission> {
        self.filter(|s| &s.student_id == code)
    }

    pub fn for_test(&self, test_id: &str) -> Vec<StudentSubmission> {
        self.filter(|s| s.test_id == test_id)
    }
}

impl Tab {
    pub fn students(&self) -> Repository<Student> {
        Repository::new(self, keys::STUDENTS).with_seed(seed::students())
    }

    pub fn faculty(&self) -> Repository<FacultyMember> {
        Repository::new(self, keys::FACULTY).with_seed(seed::faculty())
    }

    pub fn courses(&self) -> Repository<Course> {
        Repository::new(self, keys::COURSES).with_seed(seed::courses())
    }

    pub fn applications(&self, status: ApplicationStatus) -> Repository<Application> {
        Repository::new(self, application_key(status))
    }

    pub fn mock_tests(&self) -> Repository<MockTest> {
        Repository::new(self, keys::MOCK_TESTS)
    }

    pub fn submissions(&self) -> Repository<StudentSubmission> {
        Repository::new(self, keys::STUDENT_SUBMISSIONS)
    }

    pub fn calendar_events(&self) -> Repository<CalendarEvent> {
        Repository::new(self, keys::CALENDAR_EVENTS)
    }

    pub fn blogs(&self) -> Repository<BlogPost> {
        Repository::new(self, keys::BLOGS)
    }

    pub fn gallery(&self) -> Repository<GalleryImage> {
        Repository::new(self, keys::GALLERY)
    }

    pub fn vlogs(&self) -> Repository<Vlog> {
        Repository::new(self, keys::VLOGS)
    }

    pub fn testimonials(&self) -> Repository<Testimonial> {
        Repository::new(self, keys::TESTIMONIALS).with_seed(seed::testimonials())
    }

    pub fn faqs(&self) -> Repository<FaqItem> {
        Repository::new(self, keys::FAQ_DATA).with_seed(seed::faqs())
    }

    pub fn hero_slides(&self) -> Repository<HeroSlide> {
        Repository::new(self, keys::BANNERS).with_seed(seed::hero_slides())
    }

    pub fn high_achievers(&self) -> Repository<HighAchiever> {
        Repository::new(self, keys::HIGH_ACHIEVERS)
    }

    pub fn announcements(&self) -> Repository<Announcement> {
        Repository::new(self, keys::ANNOUNCEMENTS)
    }

    pub fn popups(&self) -> Repository<PopupNotification> {
        Repository::new(self, keys::POPUPS)
    }

    pub fn contact_details(&self) -> ContactDetails {
        self.get_items(keys::CONTACT_DETAILS, seed::contact_details())
    }

    pub fn save_contact_details(&self, details: &ContactDetails) -> Result<()> {
        self.try_save_items(keys::CONTACT_DETAILS, details)
    }
}

/// Storage key holding applications in `status`.
pub fn application_key(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => keys::PENDING_APPLICATIONS,
        ApplicationStatus::Approved => keys::APPROVED_APPLICATIONS,
        ApplicationStatus::Rejected => keys::REJECTED_APPLICATIONS,
    }
}
