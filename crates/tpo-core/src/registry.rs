//! # Registry Facade
//!
//! The `Registry` combines a storage backend with every business operation:
//! user registration and approval, placement drives and phase scheduling,
//! the board, and the Q&A section.
//!
//! ## Storage Backends
//!
//! Registry supports two storage backends:
//! - `InMemory`: Uses `MemStore` (fast, volatile)
//! - `Persistent`: Uses `RedbStore` for disk-backed ACID storage
//!
//! ## Time
//!
//! The engine never reads the clock. Every operation whose outcome depends
//! on the current instant takes `now` explicitly, which keeps derivations
//! deterministic and testable.

use crate::eligibility::eligible;
use crate::store::{DocumentStore, MemStore, StoreCounts};
use crate::storage::RedbStore;
use crate::types::{
    CompanyProfile, Eligibility, Notice, NoticeId, Phase, Placement, PlacementId, Post, PostId,
    Profile, Question, QuestionId, Rejection, ResultStatus, Role, TpoError, User, UserId,
};
use crate::views::{
    CompanySummary, EligibleCompany, PendingPhase, PhaseResultRow, PlacementDetails,
    QuestionRow, RegisteredStudent, StudentSummary, UnapprovedPhase, UpcomingPhase,
};
use chrono::{DateTime, Utc};

/// Storage backend for a Registry.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemStore::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbStore (database handle) cannot be safely cloned.

/// The stateful facade over the document store.
#[derive(Debug, Default)]
pub struct Registry {
    backend: StorageBackend,
}

impl Registry {
    /// Create a new empty registry with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry over an existing in-memory store.
    #[must_use]
    pub fn with_mem_store(store: MemStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
        }
    }

    /// Create a registry with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<std::path::Path>) -> Result<Self, TpoError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
        })
    }

    /// Create a registry over an existing `RedbStore`.
    #[must_use]
    pub fn with_redb_store(store: RedbStore) -> Self {
        Self {
            backend: StorageBackend::Persistent(store),
        }
    }

    fn store(&self) -> &dyn DocumentStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn DocumentStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    // =========================================================================
    // USERS: REGISTRATION & LOOKUP
    // =========================================================================

    /// Register a student account. Students start with an incomplete profile
    /// and fill it in afterwards.
    pub fn register_student(
        &mut self,
        email: impl Into<String>,
        password_hash: Option<String>,
    ) -> Result<UserId, TpoError> {
        let email = email.into();
        if self.store().user_id_by_email(&email).is_some() {
            return Err(TpoError::DuplicateEmail);
        }
        self.store_mut().insert_user(User {
            id: UserId(0),
            email,
            password_hash,
            profile_completed: false,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Student(crate::types::StudentProfile::default()),
        })
    }

    /// Register a company account with its full profile.
    pub fn register_company(
        &mut self,
        email: impl Into<String>,
        password_hash: Option<String>,
        profile: CompanyProfile,
    ) -> Result<UserId, TpoError> {
        let email = email.into();
        if self.store().user_id_by_email(&email).is_some()
            || self
                .store()
                .user_id_by_email(&profile.concerned_person.email)
                .is_some()
        {
            return Err(TpoError::DuplicateEmail);
        }
        self.store_mut().insert_user(User {
            id: UserId(0),
            email,
            password_hash,
            profile_completed: true,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Company(profile),
        })
    }

    /// Fetch a user by id.
    pub fn user(&self, id: UserId) -> Result<User, TpoError> {
        self.store()
            .user(id)?
            .ok_or(TpoError::UserNotFound(id))
    }

    /// Fetch a user by account email or, for companies, the concerned
    /// person's email.
    pub fn user_by_email(&self, email: &str) -> Result<User, TpoError> {
        let id = self
            .store()
            .user_id_by_email(email)
            .ok_or_else(|| TpoError::EmailNotFound(email.to_string()))?;
        self.user(id)
    }

    /// All users, ascending by id.
    pub fn users(&self) -> Result<Vec<User>, TpoError> {
        self.store().users()
    }

    /// All student accounts.
    pub fn students(&self) -> Result<Vec<User>, TpoError> {
        Ok(self
            .store()
            .users()?
            .into_iter()
            .filter(|user| user.role() == Role::Student)
            .collect())
    }

    /// All company accounts.
    pub fn companies(&self) -> Result<Vec<User>, TpoError> {
        Ok(self
            .store()
            .users()?
            .into_iter()
            .filter(|user| user.role() == Role::Company)
            .collect())
    }

    // =========================================================================
    // USERS: APPROVAL WORKFLOW
    // =========================================================================

    /// Approve a user account. Approval is one-shot: approving an already
    /// approved account is an error. Returns the updated user.
    pub fn approve_user(&mut self, id: UserId, now: DateTime<Utc>) -> Result<User, TpoError> {
        let mut user = self.user(id)?;
        if user.is_approved() {
            return Err(TpoError::AlreadyApproved(id));
        }
        user.approved_date = Some(now);
        self.store_mut().put_user(&user)?;
        Ok(user)
    }

    /// Reject a user account with a reason. The profile is marked incomplete
    /// so the user can amend and resubmit; an approved account cannot be
    /// rejected. Returns the updated user.
    pub fn reject_user(
        &mut self,
        id: UserId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<User, TpoError> {
        let mut user = self.user(id)?;
        if user.is_approved() {
            return Err(TpoError::AlreadyApproved(id));
        }
        user.rejections.push(Rejection {
            rejected_date: now,
            reason: reason.into(),
        });
        user.profile_completed = false;
        self.store_mut().put_user(&user)?;
        Ok(user)
    }

    /// Replace a user's profile and mark it completed. The profile variant
    /// must match the account role.
    pub fn set_profile(&mut self, id: UserId, profile: Profile) -> Result<(), TpoError> {
        let mut user = self.user(id)?;
        match (&user.profile, &profile) {
            (Profile::Student(_), Profile::Student(_))
            | (Profile::Company(_), Profile::Company(_)) => {}
            _ => {
                return Err(TpoError::RoleMismatch {
                    expected: user.role(),
                });
            }
        }
        user.profile = profile;
        user.profile_completed = true;
        self.store_mut().put_user(&user)
    }

    /// Approved company accounts.
    pub fn approved_companies(&self) -> Result<Vec<CompanySummary>, TpoError> {
        Ok(self
            .companies()?
            .iter()
            .filter(|user| user.is_approved())
            .filter_map(CompanySummary::of)
            .collect())
    }

    /// Company accounts awaiting approval (profile completed, not approved).
    pub fn unapproved_companies(&self) -> Result<Vec<CompanySummary>, TpoError> {
        Ok(self
            .companies()?
            .iter()
            .filter(|user| !user.is_approved() && user.profile_completed)
            .filter_map(CompanySummary::of)
            .collect())
    }

    /// Approved student accounts.
    pub fn approved_students(&self) -> Result<Vec<StudentSummary>, TpoError> {
        Ok(self
            .students()?
            .iter()
            .filter(|user| user.is_approved())
            .filter_map(StudentSummary::of)
            .collect())
    }

    /// Student accounts awaiting approval (profile completed, not approved).
    pub fn unapproved_students(&self) -> Result<Vec<StudentSummary>, TpoError> {
        Ok(self
            .students()?
            .iter()
            .filter(|user| !user.is_approved() && user.profile_completed)
            .filter_map(StudentSummary::of)
            .collect())
    }

    // =========================================================================
    // USERS: ELIGIBILITY VIEWS
    // =========================================================================

    /// Placements of `year` whose eligibility the student satisfies.
    pub fn eligible_companies(
        &self,
        student_id: UserId,
        year: i32,
    ) -> Result<Vec<EligibleCompany>, TpoError> {
        self.companies_by_eligibility(student_id, year, true)
    }

    /// Placements of `year` whose eligibility the student does NOT satisfy.
    ///
    /// Computed as the negation of the same predicate used by
    /// [`Registry::eligible_companies`]; the two lists partition the year's
    /// placements.
    pub fn not_eligible_companies(
        &self,
        student_id: UserId,
        year: i32,
    ) -> Result<Vec<EligibleCompany>, TpoError> {
        self.companies_by_eligibility(student_id, year, false)
    }

    fn companies_by_eligibility(
        &self,
        student_id: UserId,
        year: i32,
        want_eligible: bool,
    ) -> Result<Vec<EligibleCompany>, TpoError> {
        let user = self.user(student_id)?;
        let Profile::Student(student) = &user.profile else {
            return Err(TpoError::RoleMismatch {
                expected: Role::Student,
            });
        };

        let mut rows = Vec::new();
        for placement in self.store().placements()? {
            if placement.year != year {
                continue;
            }
            if eligible(student, &placement.eligibility) != want_eligible {
                continue;
            }
            // Dangling company references drop out, like an unwound empty lookup.
            let Some(company) = self.store().user(placement.company_id)? else {
                continue;
            };
            let Profile::Company(profile) = &company.profile else {
                continue;
            };
            rows.push(EligibleCompany {
                placement_id: placement.id,
                company_id: company.id,
                company_name: profile.company_name.clone(),
                domain: placement.domain.clone(),
                requirement: placement.requirement.clone(),
                positions: placement.positions,
                eligibility: placement.eligibility,
            });
        }
        Ok(rows)
    }

    /// The company's placement for `year`, with every phase's display status
    /// resolved at `now`. `None` when the company has no drive that year.
    pub fn current_placement_details(
        &self,
        company_id: UserId,
        year: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<PlacementDetails>, TpoError> {
        Ok(self
            .store()
            .placements()?
            .iter()
            .find(|placement| placement.company_id == company_id && placement.year == year)
            .map(|placement| PlacementDetails::of(placement, now)))
    }

    // =========================================================================
    // PLACEMENTS: LIFECYCLE
    // =========================================================================

    /// Start a placement drive for a company.
    pub fn start_placement(
        &mut self,
        company_id: UserId,
        year: i32,
        domain: impl Into<String>,
        requirement: impl Into<String>,
        eligibility: Eligibility,
        positions: u32,
    ) -> Result<PlacementId, TpoError> {
        let company = self.user(company_id)?;
        if company.role() != Role::Company {
            return Err(TpoError::RoleMismatch {
                expected: Role::Company,
            });
        }
        self.store_mut().insert_placement(Placement {
            id: PlacementId(0),
            company_id,
            year,
            domain: domain.into(),
            requirement: requirement.into(),
            eligibility,
            positions,
            phases: Vec::new(),
            registered_students: Vec::new(),
        })
    }

    /// Fetch a placement by id.
    pub fn placement(&self, id: PlacementId) -> Result<Placement, TpoError> {
        self.store()
            .placement(id)?
            .ok_or(TpoError::PlacementNotFound(id))
    }

    /// Append a phase to a placement, carrying the date the company
    /// requested. Phase titles are the phase key and must be unique within
    /// the placement.
    pub fn create_phase(
        &mut self,
        placement_id: PlacementId,
        title: impl Into<String>,
        description: impl Into<String>,
        requested_date: DateTime<Utc>,
    ) -> Result<(), TpoError> {
        let title = title.into();
        let mut placement = self.placement(placement_id)?;
        if placement.phase(&title).is_some() {
            return Err(TpoError::InvalidField {
                field: "title",
                reason: format!("phase {title} already exists"),
            });
        }
        placement
            .phases
            .push(Phase::requested(title, description, requested_date));
        self.store_mut().put_placement(&placement)
    }

    /// Suggest an alternative date for a phase. Suggesting the date already
    /// on record modifies nothing and says so.
    pub fn suggest_phase_date(
        &mut self,
        placement_id: PlacementId,
        phase_title: &str,
        suggested_date: DateTime<Utc>,
    ) -> Result<(), TpoError> {
        let mut placement = self.placement(placement_id)?;
        let phase = placement
            .phase_mut(phase_title)
            .ok_or_else(|| TpoError::PhaseNotFound(phase_title.to_string()))?;
        if phase.suggested_date == Some(suggested_date) {
            return Err(TpoError::NothingModified);
        }
        phase.suggested_date = Some(suggested_date);
        self.store_mut().put_placement(&placement)
    }

    /// Approve the requested date for a phase: the requested date becomes the
    /// scheduled date. A phase with a scheduled date cannot be approved again.
    pub fn approve_phase(
        &mut self,
        placement_id: PlacementId,
        phase_title: &str,
    ) -> Result<(), TpoError> {
        let mut placement = self.placement(placement_id)?;
        let phase = placement
            .phase_mut(phase_title)
            .ok_or_else(|| TpoError::PhaseNotFound(phase_title.to_string()))?;
        if phase.scheduled_date.is_some() {
            return Err(TpoError::PhaseAlreadyScheduled(phase_title.to_string()));
        }
        let requested = phase
            .requested_date
            .ok_or_else(|| TpoError::NoRequestedDate(phase_title.to_string()))?;
        phase.scheduled_date = Some(requested);
        self.store_mut().put_placement(&placement)
    }

    /// Mark a phase complete. Completing a completed phase modifies nothing.
    pub fn complete_phase(
        &mut self,
        placement_id: PlacementId,
        phase_title: &str,
    ) -> Result<(), TpoError> {
        let mut placement = self.placement(placement_id)?;
        let phase = placement
            .phase_mut(phase_title)
            .ok_or_else(|| TpoError::PhaseNotFound(phase_title.to_string()))?;
        if phase.completed {
            return Err(TpoError::NothingModified);
        }
        phase.completed = true;
        self.store_mut().put_placement(&placement)
    }

    /// Record (or overwrite) a student's result in a phase.
    pub fn record_phase_result(
        &mut self,
        placement_id: PlacementId,
        phase_title: &str,
        student_id: UserId,
        status: ResultStatus,
    ) -> Result<(), TpoError> {
        // The student must exist before a result can reference them.
        let _ = self.user(student_id)?;
        let mut placement = self.placement(placement_id)?;
        let phase = placement
            .phase_mut(phase_title)
            .ok_or_else(|| TpoError::PhaseNotFound(phase_title.to_string()))?;
        match phase
            .results
            .iter_mut()
            .find(|result| result.student_id == student_id)
        {
            Some(result) => result.status = status,
            None => phase.results.push(crate::types::PhaseResult {
                student_id,
                status,
            }),
        }
        self.store_mut().put_placement(&placement)
    }

    /// Register a student for a placement drive. Idempotent.
    pub fn register_for_placement(
        &mut self,
        placement_id: PlacementId,
        student_id: UserId,
    ) -> Result<(), TpoError> {
        let student = self.user(student_id)?;
        if student.role() != Role::Student {
            return Err(TpoError::RoleMismatch {
                expected: Role::Student,
            });
        }
        let mut placement = self.placement(placement_id)?;
        placement.register_student(student_id);
        self.store_mut().put_placement(&placement)
    }

    // =========================================================================
    // PLACEMENTS: PHASE LIST VIEWS
    // =========================================================================

    /// Phases across all placements awaiting office action: date requested,
    /// nothing suggested or scheduled.
    pub fn unapproved_phases(&self) -> Result<Vec<UnapprovedPhase>, TpoError> {
        let mut rows = Vec::new();
        for placement in self.store().placements()? {
            let Some((company_name, email)) = self.company_contact(placement.company_id)? else {
                continue;
            };
            for phase in placement.phases.iter().filter(|phase| phase.is_unapproved()) {
                let Some(requested_date) = phase.requested_date else {
                    continue;
                };
                rows.push(UnapprovedPhase {
                    placement_id: placement.id,
                    company_name: company_name.clone(),
                    email: email.clone(),
                    requested_date,
                    phase: phase.title.clone(),
                    phase_description: phase.description.clone(),
                });
            }
        }
        Ok(rows)
    }

    /// Phases across all placements with a suggested date awaiting company
    /// approval.
    pub fn pending_phases(&self) -> Result<Vec<PendingPhase>, TpoError> {
        let mut rows = Vec::new();
        for placement in self.store().placements()? {
            let Some((company_name, email)) = self.company_contact(placement.company_id)? else {
                continue;
            };
            for phase in placement
                .phases
                .iter()
                .filter(|phase| phase.is_pending_approval())
            {
                let Some(suggested_date) = phase.suggested_date else {
                    continue;
                };
                rows.push(PendingPhase {
                    placement_id: placement.id,
                    company_name: company_name.clone(),
                    email: email.clone(),
                    requested_date: phase.requested_date,
                    suggested_date,
                    phase: phase.title.clone(),
                });
            }
        }
        Ok(rows)
    }

    /// Phases across all placements scheduled strictly after `now`.
    pub fn upcoming_phases(&self, now: DateTime<Utc>) -> Result<Vec<UpcomingPhase>, TpoError> {
        let mut rows = Vec::new();
        for placement in self.store().placements()? {
            let Some((company_name, email)) = self.company_contact(placement.company_id)? else {
                continue;
            };
            for phase in placement.phases.iter().filter(|phase| phase.is_upcoming(now)) {
                let Some(date) = phase.scheduled_date else {
                    continue;
                };
                rows.push(UpcomingPhase {
                    placement_id: placement.id,
                    company_name: company_name.clone(),
                    email: email.clone(),
                    date,
                    phase_title: phase.title.clone(),
                    phase_description: phase.description.clone(),
                    requirement: placement.requirement.clone(),
                });
            }
        }
        Ok(rows)
    }

    /// Company name and concerned-person email for phase rows.
    /// `None` when the reference does not resolve to a company.
    fn company_contact(&self, company_id: UserId) -> Result<Option<(String, String)>, TpoError> {
        let Some(user) = self.store().user(company_id)? else {
            return Ok(None);
        };
        match &user.profile {
            Profile::Company(company) => Ok(Some((
                company.company_name.clone(),
                company.concerned_person.email.clone(),
            ))),
            Profile::Student(_) => Ok(None),
        }
    }

    /// Result rows for one phase of one company's drive in `year`, joined
    /// with each student's profile. Empty when the drive or phase does not
    /// exist, the way an empty aggregation match yields no rows.
    pub fn phase_results(
        &self,
        company_id: UserId,
        phase_title: &str,
        year: i32,
    ) -> Result<Vec<PhaseResultRow>, TpoError> {
        let mut rows = Vec::new();
        let placements = self.store().placements()?;
        let Some(placement) = placements
            .iter()
            .find(|placement| placement.company_id == company_id && placement.year == year)
        else {
            return Ok(rows);
        };
        let Some(phase) = placement.phase(phase_title) else {
            return Ok(rows);
        };
        for result in &phase.results {
            let Some(user) = self.store().user(result.student_id)? else {
                continue;
            };
            let Profile::Student(student) = &user.profile else {
                continue;
            };
            rows.push(PhaseResultRow {
                name: student.full_name.clone(),
                class: student.class.clone(),
                department: student.department.clone(),
                roll_number: student.roll_number.clone(),
                status: result.status,
            });
        }
        Ok(rows)
    }

    /// Every placement's registered students, joined with student summaries.
    pub fn registered_students(&self) -> Result<Vec<RegisteredStudent>, TpoError> {
        let mut rows = Vec::new();
        for placement in self.store().placements()? {
            for student_id in &placement.registered_students {
                let Some(user) = self.store().user(*student_id)? else {
                    continue;
                };
                let Some(student) = StudentSummary::of(&user) else {
                    continue;
                };
                rows.push(RegisteredStudent {
                    placement_id: placement.id,
                    company_id: placement.company_id,
                    student,
                });
            }
        }
        Ok(rows)
    }

    // =========================================================================
    // BOARD: POSTS & NOTICES
    // =========================================================================

    /// All posts, ascending by id.
    pub fn posts(&self) -> Result<Vec<Post>, TpoError> {
        self.store().posts()
    }

    /// Publish a post.
    pub fn create_post(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<PostId, TpoError> {
        self.store_mut().insert_post(Post {
            id: PostId(0),
            title: title.into(),
            description: description.into(),
            created_at: now,
        })
    }

    /// All notices, ascending by id.
    pub fn notices(&self) -> Result<Vec<Notice>, TpoError> {
        self.store().notices()
    }

    /// Publish a notice.
    pub fn create_notice(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<NoticeId, TpoError> {
        self.store_mut().insert_notice(Notice {
            id: NoticeId(0),
            title: title.into(),
            description: description.into(),
            created_at: now,
        })
    }

    // =========================================================================
    // Q&A SECTION
    // =========================================================================

    /// Unanswered questions joined with the asking user's display name and
    /// role. Questions whose asker no longer resolves are dropped.
    pub fn open_questions(&self) -> Result<Vec<QuestionRow>, TpoError> {
        let mut rows = Vec::new();
        for question in self.store().questions()? {
            if question.answer.is_some() {
                continue;
            }
            let Some(user) = self.store().user(question.user_id)? else {
                continue;
            };
            rows.push(QuestionRow {
                id: question.id,
                user_id: question.user_id,
                user_name: user.display_name().to_string(),
                role: user.role(),
                text: question.text,
                created_at: question.created_at,
            });
        }
        Ok(rows)
    }

    /// Unanswered questions asked by users of the given role.
    pub fn questions_by_role(&self, role: Role) -> Result<Vec<QuestionRow>, TpoError> {
        Ok(self
            .open_questions()?
            .into_iter()
            .filter(|row| row.role == role)
            .collect())
    }

    /// All of one user's questions, answered or not.
    pub fn questions_by_user(&self, user_id: UserId) -> Result<Vec<Question>, TpoError> {
        Ok(self
            .store()
            .questions()?
            .into_iter()
            .filter(|question| question.user_id == user_id)
            .collect())
    }

    /// Ask a question. The asking user must exist.
    pub fn add_question(
        &mut self,
        user_id: UserId,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<QuestionId, TpoError> {
        let _ = self.user(user_id)?;
        self.store_mut().insert_question(Question {
            id: QuestionId(0),
            user_id,
            text: text.into(),
            answer: None,
            created_at: now,
        })
    }

    /// Answer (or re-answer) a question.
    pub fn answer_question(
        &mut self,
        id: QuestionId,
        answer: impl Into<String>,
    ) -> Result<(), TpoError> {
        let mut question = self
            .store()
            .question(id)?
            .ok_or(TpoError::QuestionNotFound(id))?;
        question.answer = Some(answer.into());
        self.store_mut().put_question(&question)
    }

    /// Delete a question.
    pub fn delete_question(&mut self, id: QuestionId) -> Result<(), TpoError> {
        if self.store_mut().remove_question(id)? {
            Ok(())
        } else {
            Err(TpoError::QuestionNotFound(id))
        }
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Per-collection document counts.
    pub fn counts(&self) -> Result<StoreCounts, TpoError> {
        self.store().counts()
    }
}

// =============================================================================
// TESTS
// =============================================================================
