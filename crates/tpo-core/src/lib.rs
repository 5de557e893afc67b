//! # tpo-core
//!
//! The deterministic placement engine for TPO - THE LOGIC.
//!
//! This crate implements the domain core of the campus placement backend:
//! user accounts and approval workflows, placement drives with scheduled
//! phases, the eligibility matcher, posts and notices, and the Q&A board,
//! all over a collection-per-entity document store.
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is the ONLY place where business rules live (the app layer is transport)
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never reads the clock: `now` is an explicit argument everywhere
//! - Uses no floating point: grades are fixed-point hundredths

// =============================================================================
// MODULES
// =============================================================================

pub mod eligibility;
pub mod primitives;
pub mod registry;
pub mod schedule;
pub mod store;
pub mod storage;
pub mod types;
pub mod views;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CompanyProfile, ConcernedPerson, Eligibility, Gender, GradeHundredths, Notice, NoticeId,
    Phase, PhaseResult, Placement, PlacementId, Post, PostId, Profile, Question, QuestionId,
    Rejection, ResultStatus, Role, StudentProfile, TpoError, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use eligibility::{average_grade, eligible, meets_grade};
pub use registry::{Registry, StorageBackend};
pub use schedule::PhaseStatus;
pub use storage::RedbStore;
pub use store::{DocumentStore, MemStore, StoreCounts};

// =============================================================================
// RE-EXPORTS: Views
// =============================================================================

pub use views::{
    CompanySummary, EligibleCompany, PendingPhase, PhaseResultRow, PhaseView, PlacementDetails,
    QuestionRow, RegisteredStudent, StudentSummary, UnapprovedPhase, UpcomingPhase,
};
