//! Bundled default datasets.
//!
//! Pages read these whenever their key has never been written. Seeds are kept
//! as JSON in the stored shape, so they go through the same decoding and
//! validation as stored collections.

use academy_shared::constants::keys;
use serde::de::DeserializeOwned;

use crate::error::{Result, StoreError};
use crate::models::*;
use crate::schema::{self, Record};
use crate::store::{Tab, Txn};

/// Default welcome email, used until an admin stores a custom template.
pub const WELCOME_EMAIL_TEMPLATE: &str = "Dear {{name}},

Welcome to the Academy! Your application for {{program}} has been approved.

You can sign in to the student portal with:
  Student ID: {{studentId}}
  Password:   {{password}}

Your enrolled papers: {{papers}}

We look forward to seeing you in class.
The Academy Admissions Team";

const STUDENTS: &str = r#"[
  {
    "id": 1,
    "name": "Ayesha Khan",
    "studentId": "S00001",
    "password": "welcome123",
    "email": "ayesha.khan@example.com",
    "phone": "+92 300 1234567",
    "papers": ["FR", "AA"],
    "grades": {
      "FR": [{"score": 72, "date": "2024-03-10", "examType": "Mock Test"}],
      "AA": [{"score": 65, "date": "2024-03-17", "examType": "Mock Test"}]
    },
    "attendance": {"FR": 92, "AA": 88},
    "paymentHistory": [
      {"id": "INV-1001", "description": "FR tuition", "amount": 450, "date": "2024-01-05", "status": "Paid"}
    ],
    "enrolledOn": "2024-01-02"
  },
  {
    "id": 2,
    "name": "Bilal Ahmed",
    "studentId": "S00002",
    "password": "welcome123",
    "email": "bilal.ahmed@example.com",
    "papers": ["TX"],
    "attendance": {"TX": 76},
    "enrolledOn": "2024-01-09"
  }
]"#;

const FACULTY: &str = r#"[
  {
    "id": "F001",
    "name": "Sara Malik",
    "email": "sara.malik@example.com",
    "password": "faculty123",
    "title": "Senior Lecturer, Financial Reporting",
    "papers": ["FR", "SBR"],
    "bio": "ACCA member with twelve years of teaching experience."
  },
  {
    "id": "F002",
    "name": "Omar Siddiqui",
    "email": "omar.siddiqui@example.com",
    "password": "faculty123",
    "title": "Lecturer, Audit & Taxation",
    "papers": ["AA", "TX"]
  }
]"#;

const COURSES: &str = r#"[
  {
    "id": "financial-reporting",
    "title": "Financial Reporting",
    "code": "FR",
    "level": "Applied Skills",
    "description": "Preparation and interpretation of single-entity and group financial statements.",
    "duration": "16 weeks",
    "syllabus": [
      {"topic": "Conceptual framework", "details": "Qualitative characteristics and elements of financial statements."},
      {"topic": "Group accounts", "details": "Consolidated statements of financial position and profit or loss."}
    ],
    "facultyIds": ["F001"],
    "studentIds": [1]
  },
  {
    "id": "audit-and-assurance",
    "title": "Audit and Assurance",
    "code": "AA",
    "level": "Applied Skills",
    "description": "The audit process from acceptance to reporting.",
    "duration": "16 weeks",
    "facultyIds": ["F002"],
    "studentIds": [1]
  },
  {
    "id": "taxation",
    "title": "Taxation",
    "code": "TX",
    "level": "Applied Skills",
    "duration": "14 weeks",
    "facultyIds": ["F002"],
    "studentIds": [2]
  },
  {
    "id": "strategic-business-reporting",
    "title": "Strategic Business Reporting",
    "code": "SBR",
    "level": "Strategic Professional",
    "duration": "18 weeks",
    "facultyIds": ["F001"]
  }
]"#;

const TESTIMONIALS: &str = r#"[
  {"id": 1, "name": "Hina Rauf", "text": "The mock exams felt exactly like the real thing.", "role": "FR student", "rating": 5},
  {"id": 2, "name": "Usman Tariq", "text": "Clear explanations and quick feedback on every paper.", "role": "AA student", "rating": 4}
]"#;

const FAQS: &str = r#"[
  {"id": 1, "question": "How do I apply?", "answer": "Fill in the admissions form and select the papers you want to sit."},
  {"id": 2, "question": "Are classes recorded?", "answer": "Yes, every live class is available in the student portal afterwards."},
  {"id": 3, "question": "How are mock tests graded?", "answer": "Multiple-choice answers are marked instantly; written answers are graded by your tutor."}
]"#;

const HERO_SLIDES: &str = r#"[
  {"id": 1, "title": "Pass your ACCA papers with confidence", "subtitle": "Expert tutors, weekly mock tests", "imageUrl": "/images/hero-1.jpg", "ctaText": "Apply now", "ctaLink": "/admissions"},
  {"id": 2, "title": "New intake starting soon", "imageUrl": "/images/hero-2.jpg", "ctaText": "View courses", "ctaLink": "/courses"}
]"#;

fn parse_seed<T: Record>(name: &str, raw: &str) -> Vec<T> {
    match schema::decode_collection::<T>(name, raw, T::SCHEMA_VERSION) {
        Ok(decoded) => decoded.records,
        Err(e) => {
            tracing::error!(seed = name, error = %e, "bundled seed data does not decode");
            Vec::new()
        }
    }
}

fn parse_object<T: DeserializeOwned + Default>(name: &str, raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::error!(seed = name, error = %e, "bundled seed data does not decode");
        T::default()
    })
}

pub fn students() -> Vec<Student> {
    parse_seed("students", STUDENTS)
}

pub fn faculty() -> Vec<FacultyMember> {
    parse_seed("faculty", FACULTY)
}

pub fn courses() -> Vec<Course> {
    parse_seed("courses", COURSES)
}

pub fn testimonials() -> Vec<Testimonial> {
    parse_seed("testimonials", TESTIMONIALS)
}

pub fn faqs() -> Vec<FaqItem> {
    parse_seed("faqData", FAQS)
}

pub fn hero_slides() -> Vec<HeroSlide> {
    parse_seed("banners", HERO_SLIDES)
}

pub fn contact_details() -> ContactDetails {
    parse_object(
        "contactDetails",
        r#"{
            "address": "12 Main Boulevard, Gulberg, Lahore",
            "phone": "+92 42 111 222 333",
            "email": "info@academy.example.com",
            "officeHours": "Mon-Sat 9:00-18:00"
        }"#,
    )
}

fn seed_missing<T: Record>(
    txn: &mut Txn<'_>,
    key: &'static str,
    records: Vec<T>,
    written: &mut Vec<&'static str>,
) -> Result<()> {
    if txn.read(key)?.is_none() {
        txn.store(key, &records)?;
        written.push(key);
    }
    Ok(())
}

/// Write every bundled dataset whose key is absent. Returns the keys written.
pub fn install_defaults(tab: &Tab) -> Result<Vec<&'static str>> {
    let written = tab.transaction(|txn| {
        let mut written = Vec::new();
        seed_missing(txn, keys::STUDENTS, students(), &mut written)?;
        seed_missing(txn, keys::FACULTY, faculty(), &mut written)?;
        seed_missing(txn, keys::COURSES, courses(), &mut written)?;
        seed_missing(txn, keys::TESTIMONIALS, testimonials(), &mut written)?;
        seed_missing(txn, keys::FAQ_DATA, faqs(), &mut written)?;
        seed_missing(txn, keys::BANNERS, hero_slides(), &mut written)?;
        if txn.read(keys::CONTACT_DETAILS)?.is_none() {
            txn.store_value(keys::CONTACT_DETAILS, &contact_details())?;
            written.push(keys::CONTACT_DETAILS);
        }
        if txn.read(keys::WELCOME_EMAIL_TEMPLATE)?.is_none() {
            txn.put_raw(keys::WELCOME_EMAIL_TEMPLATE, WELCOME_EMAIL_TEMPLATE.to_string(), 0)?;
            written.push(keys::WELCOME_EMAIL_TEMPLATE);
        }
        Ok::<_, StoreError>(written)
    })?;
    tracing::info!(count = written.len(), "default datasets installed");
    Ok(written)
}
