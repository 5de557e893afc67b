//! # View Rows
//!
//! Projection types returned by the read-oriented [`crate::Registry`]
//! operations. Each row is the flattened join the original aggregation
//! produced: placements unwound per phase with company details attached,
//! result rows with the student profile attached, questions with the asking
//! user's display name.
//!
//! Rows referencing a document that no longer resolves are dropped, the way
//! an unwound empty lookup drops out of an aggregation.

use crate::schedule::PhaseStatus;
use crate::types::{
    ConcernedPerson, Eligibility, Phase, PhaseResult, Placement, PlacementId, Profile,
    ResultStatus, Role, User, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// USER SUMMARIES
// =============================================================================

/// Company account summary for approval dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: UserId,
    pub company_name: String,
    pub concerned_person: ConcernedPerson,
    pub email: String,
    pub approved_date: Option<DateTime<Utc>>,
}

impl CompanySummary {
    /// Project a user document into a company summary.
    /// Returns `None` for student accounts.
    #[must_use]
    pub fn of(user: &User) -> Option<Self> {
        match &user.profile {
            Profile::Company(company) => Some(Self {
                id: user.id,
                company_name: company.company_name.clone(),
                concerned_person: company.concerned_person.clone(),
                email: user.email.clone(),
                approved_date: user.approved_date,
            }),
            Profile::Student(_) => None,
        }
    }
}

/// Student account summary for approval dashboards and result rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: UserId,
    pub full_name: String,
    pub class: String,
    pub roll_number: String,
    pub department: String,
}

impl StudentSummary {
    /// Project a user document into a student summary.
    /// Returns `None` for company accounts.
    #[must_use]
    pub fn of(user: &User) -> Option<Self> {
        match &user.profile {
            Profile::Student(student) => Some(Self {
                id: user.id,
                full_name: student.full_name.clone(),
                class: student.class.clone(),
                roll_number: student.roll_number.clone(),
                department: student.department.clone(),
            }),
            Profile::Company(_) => None,
        }
    }
}

// =============================================================================
// PHASE LIST ROWS
// =============================================================================

/// A phase awaiting office action: date requested, nothing suggested or
/// scheduled yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnapprovedPhase {
    pub placement_id: PlacementId,
    pub company_name: String,
    pub email: String,
    pub requested_date: DateTime<Utc>,
    pub phase: String,
    pub phase_description: String,
}

/// A phase with a suggested date awaiting company approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPhase {
    pub placement_id: PlacementId,
    pub company_name: String,
    pub email: String,
    pub requested_date: Option<DateTime<Utc>>,
    pub suggested_date: DateTime<Utc>,
    pub phase: String,
}

/// A phase scheduled in the future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingPhase {
    pub placement_id: PlacementId,
    pub company_name: String,
    pub email: String,
    pub date: DateTime<Utc>,
    pub phase_title: String,
    pub phase_description: String,
    pub requirement: String,
}

// =============================================================================
// RESULT & REGISTRATION ROWS
// =============================================================================

/// One student's result in a phase, joined with the student profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResultRow {
    pub name: String,
    pub class: String,
    pub department: String,
    pub roll_number: String,
    pub status: ResultStatus,
}

/// One registered student of one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredStudent {
    pub placement_id: PlacementId,
    pub company_id: UserId,
    pub student: StudentSummary,
}

// =============================================================================
// ELIGIBILITY ROWS
// =============================================================================

/// A placement joined with its company, as shown on a student's
/// eligible / not-eligible company lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleCompany {
    pub placement_id: PlacementId,
    pub company_id: UserId,
    pub company_name: String,
    pub domain: String,
    pub requirement: String,
    pub positions: u32,
    pub eligibility: Eligibility,
}

// =============================================================================
// PLACEMENT DETAILS
// =============================================================================

/// A phase with its resolved display status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseView {
    pub title: String,
    pub description: String,
    pub requested_date: Option<DateTime<Utc>>,
    pub suggested_date: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: PhaseStatus,
    pub results: Vec<PhaseResult>,
}

impl PhaseView {
    /// Project a phase with its status resolved at `now`.
    #[must_use]
    pub fn of(phase: &Phase, now: DateTime<Utc>) -> Self {
        Self {
            title: phase.title.clone(),
            description: phase.description.clone(),
            requested_date: phase.requested_date,
            suggested_date: phase.suggested_date,
            scheduled_date: phase.scheduled_date,
            status: PhaseStatus::resolve(phase, now),
            results: phase.results.clone(),
        }
    }
}

/// A company's placement for one year, every phase's status resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDetails {
    pub placement_id: PlacementId,
    pub year: i32,
    pub domain: String,
    pub requirement: String,
    pub eligibility: Eligibility,
    pub positions: u32,
    pub registered_count: usize,
    pub phases: Vec<PhaseView>,
}

impl PlacementDetails {
    /// Project a placement with phase statuses resolved at `now`.
    #[must_use]
    pub fn of(placement: &Placement, now: DateTime<Utc>) -> Self {
        Self {
            placement_id: placement.id,
            year: placement.year,
            domain: placement.domain.clone(),
            requirement: placement.requirement.clone(),
            eligibility: placement.eligibility,
            positions: placement.positions,
            registered_count: placement.registered_students.len(),
            phases: placement
                .phases
                .iter()
                .map(|phase| PhaseView::of(phase, now))
                .collect(),
        }
    }
}

// =============================================================================
// Q&A ROWS
// =============================================================================

/// An open question joined with the asking user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: crate::types::QuestionId,
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
