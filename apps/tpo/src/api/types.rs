//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Request bodies carry `Option` fields and validate explicitly, so a
//! missing required field reports its name (`"No email!"`) instead of a
//! generic deserialization error. Responses follow the success/error
//! envelope pattern.

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tpo_core::primitives::{
    MAX_EMAIL_LENGTH, MAX_GRADE_HUNDREDTHS, MAX_TERMS, MAX_TEXT_LENGTH, MAX_TITLE_LENGTH,
    MIN_PASSWORD_LENGTH,
};
use tpo_core::{
    CompanyProfile, Eligibility, GradeHundredths, PlacementDetails, PlacementId, Profile,
    Rejection, ResultStatus, Role, StoreCounts, TpoError, User, UserId,
};

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Require a field to be present, reporting its name when missing.
pub fn require<T>(value: Option<T>, field: &'static str) -> Result<T, TpoError> {
    value.ok_or(TpoError::MissingField(field))
}

/// Validate a short text field (names, titles, domains).
fn check_title(field: &'static str, value: &str) -> Result<(), TpoError> {
    if value.is_empty() {
        return Err(TpoError::MissingField(field));
    }
    if value.len() > MAX_TITLE_LENGTH {
        return Err(TpoError::InvalidField {
            field,
            reason: format!("length {} exceeds maximum {} bytes", value.len(), MAX_TITLE_LENGTH),
        });
    }
    Ok(())
}

/// Validate a long text field (descriptions, questions, answers).
fn check_text(field: &'static str, value: &str) -> Result<(), TpoError> {
    if value.len() > MAX_TEXT_LENGTH {
        return Err(TpoError::InvalidField {
            field,
            reason: format!("length {} exceeds maximum {} bytes", value.len(), MAX_TEXT_LENGTH),
        });
    }
    Ok(())
}

/// Validate an email address (shape and length only).
fn check_email(field: &'static str, value: &str) -> Result<(), TpoError> {
    if value.len() > MAX_EMAIL_LENGTH {
        return Err(TpoError::InvalidField {
            field,
            reason: format!("length {} exceeds maximum {} bytes", value.len(), MAX_EMAIL_LENGTH),
        });
    }
    if !value.contains('@') {
        return Err(TpoError::InvalidField {
            field,
            reason: "not an email address".to_string(),
        });
    }
    Ok(())
}

/// Parse a `YYYY-mm-dd` date field into midnight UTC.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, TpoError> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| TpoError::InvalidField {
        field,
        reason: e.to_string(),
    })?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or(TpoError::InvalidField {
        field,
        reason: "not a representable instant".to_string(),
    })?;
    Ok(midnight.and_utc())
}

/// Role-tagged profile as it appears on the wire.
///
/// JSON is self-describing, so the role tag can sit inline with the
/// role-specific fields; the engine's `Profile` stays externally tagged for
/// the store encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ProfileJson {
    Student(tpo_core::StudentProfile),
    Company(CompanyProfile),
}

impl From<ProfileJson> for Profile {
    fn from(profile: ProfileJson) -> Self {
        match profile {
            ProfileJson::Student(student) => Self::Student(student),
            ProfileJson::Company(company) => Self::Company(company),
        }
    }
}

impl From<Profile> for ProfileJson {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Student(student) => Self::Student(student),
            Profile::Company(company) => Self::Company(company),
        }
    }
}

/// Validate a profile payload before it reaches the registry.
pub fn validate_profile(profile: &Profile) -> Result<(), TpoError> {
    match profile {
        Profile::Student(student) => {
            check_title("full_name", &student.full_name)?;
            if student.sem_marks.len() > MAX_TERMS {
                return Err(TpoError::InvalidField {
                    field: "sem_marks",
                    reason: format!("more than {} recorded terms", MAX_TERMS),
                });
            }
            if student
                .sem_marks
                .iter()
                .any(|mark| mark.value() > MAX_GRADE_HUNDREDTHS)
            {
                return Err(TpoError::InvalidField {
                    field: "sem_marks",
                    reason: "grade above the 10.00 scale".to_string(),
                });
            }
            Ok(())
        }
        Profile::Company(company) => {
            check_title("company_name", &company.company_name)?;
            check_title("name", &company.concerned_person.name)?;
            check_email("email", &company.concerned_person.email)?;
            Ok(())
        }
    }
}

/// HTTP status for an engine error: store failures are server errors,
/// everything else is the caller's fault.
#[must_use]
pub fn error_status(err: &TpoError) -> StatusCode {
    match err {
        TpoError::IoError(_)
        | TpoError::SerializationError(_)
        | TpoError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

// =============================================================================
// HEALTH & STATUS RESPONSES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Collection counts response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub counts: Option<StoreCounts>,
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn success(counts: StoreCounts) -> Self {
        Self {
            success: true,
            counts: Some(counts),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            counts: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// GENERIC ENVELOPES
// =============================================================================

/// Response carrying the id of an inserted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertResponse {
    pub success: bool,
    pub id: Option<u64>,
    pub error: Option<String>,
}

impl InsertResponse {
    pub fn success(id: u64) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(msg.into()),
        }
    }
}

/// Bare acknowledgement for mutations that return no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

/// Response carrying a list of rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub rows: Vec<T>,
    pub error: Option<String>,
}

impl<T> ListResponse<T> {
    pub fn rows(rows: Vec<T>) -> Self {
        Self {
            success: true,
            rows,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// USER RESPONSES
// =============================================================================

/// A user document on the wire: everything except the password digest.
///
/// The profile is flattened, so the role tag and the role-specific fields
/// appear inline the way the documents are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJson {
    pub id: u64,
    pub email: String,
    pub profile_completed: bool,
    pub approved_date: Option<DateTime<Utc>>,
    pub rejections: Vec<Rejection>,
    #[serde(flatten)]
    pub profile: ProfileJson,
}

impl From<&User> for UserJson {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.clone(),
            profile_completed: user.profile_completed,
            approved_date: user.approved_date,
            rejections: user.rejections.clone(),
            profile: user.profile.clone().into(),
        }
    }
}

/// Response carrying a single user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: Option<UserJson>,
    pub error: Option<String>,
}

impl UserResponse {
    pub fn success(user: &User) -> Self {
        Self {
            success: true,
            user: Some(UserJson::from(user)),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(msg.into()),
        }
    }
}

/// Response carrying a freshly minted access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    pub access_token: Option<String>,
    pub error: Option<String>,
}

impl TokenResponse {
    pub fn success(token: String) -> Self {
        Self {
            success: true,
            access_token: Some(token),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            access_token: None,
            error: Some(msg.into()),
        }
    }
}

/// Response carrying a company's placement details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsResponse {
    pub success: bool,
    pub details: Option<PlacementDetails>,
    pub error: Option<String>,
}

impl DetailsResponse {
    pub fn success(details: Option<PlacementDetails>) -> Self {
        Self {
            success: true,
            details,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            details: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// USER REQUESTS
// =============================================================================

/// Student registration: email and password only; the profile comes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl StudentRegisterRequest {
    /// Validate and extract `(email, password)`.
    pub fn validate(self) -> Result<(String, String), TpoError> {
        let email = require(self.email, "email")?;
        check_email("email", &email)?;
        let password = require(self.password, "password")?;
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(TpoError::InvalidField {
                field: "password",
                reason: format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            });
        }
        Ok((email, password))
    }
}

/// Company registration: credentials plus the full company profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub contact: Option<String>,
}

/// Validated company registration.
#[derive(Debug, Clone)]
pub struct CompanyRegistration {
    pub email: String,
    pub password: String,
    pub profile: CompanyProfile,
}

impl CompanyRegisterRequest {
    /// Validate and extract the registration.
    pub fn validate(self) -> Result<CompanyRegistration, TpoError> {
        let email = require(self.email, "email")?;
        check_email("email", &email)?;
        let password = require(self.password, "password")?;
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(TpoError::InvalidField {
                field: "password",
                reason: format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            });
        }
        let company_name = require(self.company_name, "company name")?;
        check_title("company name", &company_name)?;
        let website = require(self.website, "website")?;
        let address = require(self.address, "address")?;
        check_text("address", &address)?;
        let name = require(self.name, "name")?;
        check_title("name", &name)?;
        let position = require(self.position, "position")?;
        let contact = require(self.contact, "contact")?;

        Ok(CompanyRegistration {
            profile: CompanyProfile {
                company_name,
                website,
                address,
                concerned_person: tpo_core::ConcernedPerson {
                    name,
                    position,
                    email: email.clone(),
                    contact,
                },
            },
            email,
            password,
        })
    }
}

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Validate and extract `(email, password)`.
    pub fn validate(self) -> Result<(String, String), TpoError> {
        let email = require(self.email, "email")?;
        let password = require(self.password, "password")?;
        Ok((email, password))
    }
}

/// Rejection request: the reason shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

impl RejectRequest {
    /// Validate and extract the reason.
    pub fn validate(self) -> Result<String, TpoError> {
        let reason = require(self.reason, "reason")?;
        check_text("reason", &reason)?;
        Ok(reason)
    }
}

// =============================================================================
// PLACEMENT REQUESTS
// =============================================================================

/// Eligibility criteria as they arrive on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRequest {
    /// Minimum average SGPA in hundredths (750 = 7.50).
    pub min_grade: Option<u32>,
    pub live_backlog: Option<bool>,
    pub gender: Option<tpo_core::Gender>,
}

impl EligibilityRequest {
    /// Validate and convert to the engine type.
    pub fn validate(self) -> Result<Eligibility, TpoError> {
        let min_grade = require(self.min_grade, "min_grade")?;
        if min_grade > MAX_GRADE_HUNDREDTHS {
            return Err(TpoError::InvalidField {
                field: "min_grade",
                reason: "grade above the 10.00 scale".to_string(),
            });
        }
        Ok(Eligibility {
            min_grade: GradeHundredths::new(min_grade),
            live_backlog: self.live_backlog,
            gender: self.gender,
        })
    }
}

/// Start-placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPlacementRequest {
    pub company_id: Option<u64>,
    /// Drive year; defaults to the current year.
    pub year: Option<i32>,
    pub domain: Option<String>,
    pub requirement: Option<String>,
    pub eligibility: Option<EligibilityRequest>,
    pub positions: Option<u32>,
}

/// Validated start-placement request.
#[derive(Debug, Clone)]
pub struct StartPlacement {
    pub company_id: UserId,
    pub year: i32,
    pub domain: String,
    pub requirement: String,
    pub eligibility: Eligibility,
    pub positions: u32,
}

impl StartPlacementRequest {
    /// Validate, filling in the default year.
    pub fn validate(self, default_year: i32) -> Result<StartPlacement, TpoError> {
        let company_id = require(self.company_id, "company id")?;
        let domain = require(self.domain, "domain")?;
        check_title("domain", &domain)?;
        let requirement = require(self.requirement, "requirement")?;
        check_text("requirement", &requirement)?;
        let eligibility = require(self.eligibility, "eligibility")?.validate()?;
        let positions = require(self.positions, "positions")?;
        Ok(StartPlacement {
            company_id: UserId(company_id),
            year: self.year.unwrap_or(default_year),
            domain,
            requirement,
            eligibility,
            positions,
        })
    }
}

/// Create-phase request; the date is the company's requested date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePhaseRequest {
    pub placement_id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Requested date as `YYYY-mm-dd`.
    pub date: Option<String>,
}

impl CreatePhaseRequest {
    /// Validate and extract `(placement, title, description, requested date)`.
    pub fn validate(
        self,
    ) -> Result<(PlacementId, String, String, DateTime<Utc>), TpoError> {
        let placement_id = require(self.placement_id, "placement id")?;
        let title = require(self.title, "title")?;
        check_title("title", &title)?;
        let description = require(self.description, "description")?;
        check_text("description", &description)?;
        let date = require(self.date, "date")?;
        let requested = parse_date("date", &date)?;
        Ok((PlacementId(placement_id), title, description, requested))
    }
}

/// Suggest-date request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestDateRequest {
    pub placement_id: Option<u64>,
    pub phase_title: Option<String>,
    /// Suggested date as `YYYY-mm-dd`.
    pub suggested_date: Option<String>,
}

impl SuggestDateRequest {
    /// Validate and extract `(placement, phase title, suggested date)`.
    pub fn validate(self) -> Result<(PlacementId, String, DateTime<Utc>), TpoError> {
        let placement_id = require(self.placement_id, "placement id")?;
        let phase_title = require(self.phase_title, "phase title")?;
        let date = require(self.suggested_date, "suggested date")?;
        let suggested = parse_date("suggested date", &date)?;
        Ok((PlacementId(placement_id), phase_title, suggested))
    }
}

/// Reference to one phase of one placement (approve / complete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRefRequest {
    pub placement_id: Option<u64>,
    pub phase_title: Option<String>,
}

impl PhaseRefRequest {
    /// Validate and extract `(placement, phase title)`.
    pub fn validate(self) -> Result<(PlacementId, String), TpoError> {
        let placement_id = require(self.placement_id, "placement id")?;
        let phase_title = require(self.phase_title, "phase title")?;
        Ok((PlacementId(placement_id), phase_title))
    }
}

/// Record a student's result in a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResultRequest {
    pub placement_id: Option<u64>,
    pub phase_title: Option<String>,
    pub student_id: Option<u64>,
    pub status: Option<ResultStatus>,
}

impl RecordResultRequest {
    /// Validate and extract `(placement, phase title, student, status)`.
    pub fn validate(
        self,
    ) -> Result<(PlacementId, String, UserId, ResultStatus), TpoError> {
        let placement_id = require(self.placement_id, "placement id")?;
        let phase_title = require(self.phase_title, "phase title")?;
        let student_id = require(self.student_id, "student id")?;
        let status = require(self.status, "status")?;
        Ok((
            PlacementId(placement_id),
            phase_title,
            UserId(student_id),
            status,
        ))
    }
}

/// Register a student for a placement drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRegisterRequest {
    pub student_id: Option<u64>,
}

impl PlacementRegisterRequest {
    /// Validate and extract the student id.
    pub fn validate(self) -> Result<UserId, TpoError> {
        Ok(UserId(require(self.student_id, "student id")?))
    }
}

// =============================================================================
// BOARD & Q&A REQUESTS
// =============================================================================

/// New post or notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl NewPostRequest {
    /// Validate and extract `(title, description)`.
    pub fn validate(self) -> Result<(String, String), TpoError> {
        let title = require(self.title, "title")?;
        check_title("title", &title)?;
        let description = require(self.description, "description")?;
        check_text("description", &description)?;
        Ok((title, description))
    }
}

/// Ask a question on the Q&A board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddQuestionRequest {
    pub user_id: Option<u64>,
    pub question: Option<String>,
}

impl AddQuestionRequest {
    /// Validate and extract `(user, question)`.
    pub fn validate(self) -> Result<(UserId, String), TpoError> {
        let user_id = require(self.user_id, "user id")?;
        let question = require(self.question, "question")?;
        check_text("question", &question)?;
        Ok((UserId(user_id), question))
    }
}

/// Answer a question on the Q&A board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question_id: Option<u64>,
    pub answer: Option<String>,
}

impl AnswerRequest {
    /// Validate and extract `(question, answer)`.
    pub fn validate(self) -> Result<(tpo_core::QuestionId, String), TpoError> {
        let question_id = require(self.question_id, "question id")?;
        let answer = require(self.answer, "answer")?;
        check_text("answer", &answer)?;
        Ok((tpo_core::QuestionId(question_id), answer))
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// Optional row cap on list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    /// Truncate `rows` to the requested limit, if any.
    #[must_use]
    pub fn apply<T>(&self, mut rows: Vec<T>) -> Vec<T> {
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// Query for phase result rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultQuery {
    pub company_id: Option<u64>,
    pub phase_title: Option<String>,
    /// Drive year; defaults to the current year.
    pub year: Option<i32>,
}

/// Optional drive-year override.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// Role filter for the Q&A board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleQuery {
    pub role: Option<Role>,
}

// =============================================================================
// TESTS
// =============================================================================
