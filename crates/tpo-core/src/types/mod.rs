//! # Core Type Definitions
//!
//! This module contains all document types for the TPO placement engine:
//! - Collection identifiers (`UserId`, `PlacementId`, `PostId`, `NoticeId`, `QuestionId`)
//! - User documents (`User`, `Profile`, `StudentProfile`, `CompanyProfile`)
//! - Placement documents (`Placement`, `Phase`, `PhaseResult`, `Eligibility`)
//! - Board documents (`Post`, `Notice`, `Question`)
//! - Error types (`TpoError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (grades are fixed-point hundredths, no floats)
//! - Implement `Ord` where used as `BTreeMap` keys for deterministic ordering
//! - Never read the clock; timestamps are supplied by the caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// COLLECTION IDENTIFIERS
// =============================================================================

/// Unique identifier for a user document (student or company).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Unique identifier for a placement drive document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlacementId(pub u64);

/// Unique identifier for a post document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostId(pub u64);

/// Unique identifier for a notice document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoticeId(pub u64);

/// Unique identifier for a question document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub u64);

// =============================================================================
// GRADES
// =============================================================================

/// A grade on the 10.00 SGPA scale, stored as fixed-point hundredths.
///
/// `GradeHundredths(875)` is an SGPA of 8.75. Fixed-point keeps grade
/// comparison exact and the engine free of floating-point arithmetic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct GradeHundredths(pub u32);

impl GradeHundredths {
    /// Create a grade from raw hundredths (875 = 8.75 SGPA).
    #[must_use]
    pub const fn new(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Get the raw hundredths value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

// =============================================================================
// ROLES & ENUMS
// =============================================================================

/// The role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Company,
}

impl Role {
    /// The wire representation of the role (matches the serde rename).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Company => "company",
        }
    }
}

/// Recorded gender of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Outcome of a student in a placement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Cleared,
    Rejected,
    Absent,
}

// =============================================================================
// USER DOCUMENTS
// =============================================================================

/// A single administrative rejection of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub rejected_date: DateTime<Utc>,
    pub reason: String,
}

/// Contact person a company registers for the drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcernedPerson {
    pub name: String,
    pub position: String,
    pub email: String,
    pub contact: String,
}

/// Profile data carried by a student account.
///
/// Students register with just an email and fill this in afterwards, so
/// every field has a sensible empty default and documents may omit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StudentProfile {
    pub full_name: String,
    pub class: String,
    pub department: String,
    pub roll_number: String,
    pub gender: Option<Gender>,
    /// Per-term SGPA history; the eligibility matcher averages over this.
    pub sem_marks: Vec<GradeHundredths>,
    /// Whether the student currently carries an uncleared backlog.
    pub live_backlog: bool,
    pub other_qualifications: Vec<String>,
    pub projects: Vec<String>,
    pub extra_activities: Vec<String>,
}

/// Profile data carried by a company account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    pub website: String,
    pub address: String,
    pub concerned_person: ConcernedPerson,
}

/// Role-specific half of a user document.
///
/// The account role is derived from the variant; there is no separate stored
/// role field to drift out of sync. Externally tagged on purpose: the store
/// encoding is not self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Student(StudentProfile),
    Company(CompanyProfile),
}

/// A user document: one student or company account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Account email. For companies this is the concerned person's email at
    /// registration time.
    pub email: String,
    /// Keyed digest of the password. Absent for accounts seeded without one.
    pub password_hash: Option<String>,
    pub profile_completed: bool,
    /// Set once by administrative approval; never cleared.
    pub approved_date: Option<DateTime<Utc>>,
    pub rejections: Vec<Rejection>,
    pub profile: Profile,
}

impl User {
    /// The account role, derived from the profile variant.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.profile {
            Profile::Student(_) => Role::Student,
            Profile::Company(_) => Role::Company,
        }
    }

    /// Whether an administrator has approved this account.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approved_date.is_some()
    }

    /// Display name: the student's full name or the company's name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match &self.profile {
            Profile::Student(s) => &s.full_name,
            Profile::Company(c) => &c.company_name,
        }
    }

    /// Whether the given email addresses this account — either the account
    /// email or, for companies, the concerned person's email.
    #[must_use]
    pub fn matches_email(&self, email: &str) -> bool {
        if self.email == email {
            return true;
        }
        match &self.profile {
            Profile::Company(c) => c.concerned_person.email == email,
            Profile::Student(_) => false,
        }
    }
}

// =============================================================================
// PLACEMENT DOCUMENTS
// =============================================================================

/// Threshold criteria a placement sets for which students may apply.
///
/// `None` in an optional field means the criterion is unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Minimum average SGPA across recorded terms.
    pub min_grade: GradeHundredths,
    /// Required live-backlog flag; `None` admits either.
    pub live_backlog: Option<bool>,
    /// Required gender; `None` admits any.
    pub gender: Option<Gender>,
}

/// One student's outcome in a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub student_id: UserId,
    pub status: ResultStatus,
}

/// A scheduled stage (written test, interview, ...) within a placement drive.
///
/// The three date fields drive the derived lifecycle: a company requests a
/// date, the office may suggest an alternative, and approval fixes the
/// scheduled date. See [`crate::schedule`] for the derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    pub description: String,
    pub requested_date: Option<DateTime<Utc>>,
    pub suggested_date: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub results: Vec<PhaseResult>,
}

impl Phase {
    /// Create a phase as a company requests it: title, description and the
    /// date the company asked for.
    #[must_use]
    pub fn requested(
        title: impl Into<String>,
        description: impl Into<String>,
        requested_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            requested_date: Some(requested_date),
            suggested_date: None,
            scheduled_date: None,
            completed: false,
            results: Vec::new(),
        }
    }
}

/// A placement drive document: one company's recruitment in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PlacementId,
    pub company_id: UserId,
    pub year: i32,
    pub domain: String,
    pub requirement: String,
    pub eligibility: Eligibility,
    pub positions: u32,
    /// Ordered list of phases; order is the order of creation.
    pub phases: Vec<Phase>,
    pub registered_students: Vec<UserId>,
}

impl Placement {
    /// Find a phase by title (first match; titles are the phase key).
    #[must_use]
    pub fn phase(&self, title: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.title == title)
    }

    /// Mutable variant of [`Placement::phase`].
    pub fn phase_mut(&mut self, title: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.title == title)
    }

    /// Register a student for this drive. Idempotent.
    pub fn register_student(&mut self, student: UserId) {
        if !self.registered_students.contains(&student) {
            self.registered_students.push(student);
        }
    }
}

// =============================================================================
// BOARD DOCUMENTS
// =============================================================================

/// A post on the placement board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An official notice from the placement office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A question on the Q&A board, optionally answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub user_id: UserId,
    pub text: String,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the TPO engine.
///
/// - No silent failures
/// - Use `Result<T, TpoError>` for fallible operations
/// - The engine never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum TpoError {
    /// A required request field is missing.
    #[error("No {0}!")]
    MissingField(&'static str),

    /// A request field is present but malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The requested user does not exist.
    #[error("No such user: {0:?}")]
    UserNotFound(UserId),

    /// No account matches the given email.
    #[error("No user with email {0}")]
    EmailNotFound(String),

    /// A user with the given email already exists.
    #[error("A user with the given email already exists")]
    DuplicateEmail,

    /// The account was already approved; approval is one-shot.
    #[error("User {0:?} is already approved")]
    AlreadyApproved(UserId),

    /// The operation requires the other role.
    #[error("Operation requires a {} account", expected.as_str())]
    RoleMismatch { expected: Role },

    /// The password did not match the stored digest.
    #[error("Invalid password")]
    InvalidCredentials,

    /// The requested placement does not exist.
    #[error("No such placement: {0:?}")]
    PlacementNotFound(PlacementId),

    /// No phase with the given title exists in the placement.
    #[error("No such phase: {0}")]
    PhaseNotFound(String),

    /// The phase already has a scheduled date.
    #[error("Phase {0} is already approved")]
    PhaseAlreadyScheduled(String),

    /// The phase has no requested date to approve.
    #[error("Phase {0} has no requested date")]
    NoRequestedDate(String),

    /// The requested question does not exist.
    #[error("No such question: {0:?}")]
    QuestionNotFound(QuestionId),

    /// The update matched a document but changed nothing.
    #[error("No document updated")]
    NothingModified,

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn student_user(id: u64) -> User {
        User {
            id: UserId(id),
            email: format!("s{id}@campus.edu"),
            password_hash: None,
            profile_completed: false,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Student(StudentProfile::default()),
        }
    }

    #[test]
    fn role_is_derived_from_profile() {
        let user = student_user(1);
        assert_eq!(user.role(), Role::Student);
        assert!(!user.is_approved());
    }

    #[test]
    fn company_matches_concerned_person_email() {
        let user = User {
            id: UserId(2),
            email: "hr@acme.example".to_string(),
            password_hash: None,
            profile_completed: true,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Company(CompanyProfile {
                company_name: "Acme".to_string(),
                website: "https://acme.example".to_string(),
                address: "1 Acme Way".to_string(),
                concerned_person: ConcernedPerson {
                    name: "Priya".to_string(),
                    position: "HR Lead".to_string(),
                    email: "priya@acme.example".to_string(),
                    contact: "9999999999".to_string(),
                },
            }),
        };

        assert!(user.matches_email("hr@acme.example"));
        assert!(user.matches_email("priya@acme.example"));
        assert!(!user.matches_email("other@acme.example"));
        assert_eq!(user.display_name(), "Acme");
    }

    #[test]
    fn student_never_matches_foreign_email() {
        let user = student_user(3);
        assert!(user.matches_email("s3@campus.edu"));
        assert!(!user.matches_email("s4@campus.edu"));
    }

    #[test]
    fn placement_registration_is_idempotent() {
        let mut placement = Placement {
            id: PlacementId(1),
            company_id: UserId(2),
            year: 2026,
            domain: "Backend".to_string(),
            requirement: "Systems programming".to_string(),
            eligibility: Eligibility {
                min_grade: GradeHundredths::new(700),
                live_backlog: None,
                gender: None,
            },
            positions: 4,
            phases: Vec::new(),
            registered_students: Vec::new(),
        };

        placement.register_student(UserId(9));
        placement.register_student(UserId(9));
        assert_eq!(placement.registered_students, vec![UserId(9)]);
    }

    #[test]
    fn phase_lookup_by_title() {
        let date = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).single();
        let mut placement = Placement {
            id: PlacementId(1),
            company_id: UserId(2),
            year: 2026,
            domain: "Backend".to_string(),
            requirement: String::new(),
            eligibility: Eligibility {
                min_grade: GradeHundredths::default(),
                live_backlog: None,
                gender: None,
            },
            positions: 1,
            phases: vec![Phase::requested(
                "Written Test",
                "Aptitude round",
                date.expect("valid date"),
            )],
            registered_students: Vec::new(),
        };

        assert!(placement.phase("Written Test").is_some());
        assert!(placement.phase("Interview").is_none());
        assert!(placement.phase_mut("Written Test").is_some());
    }

    #[test]
    fn missing_field_error_names_the_field() {
        let err = TpoError::MissingField("email");
        assert_eq!(err.to_string(), "No email!");
    }
}
