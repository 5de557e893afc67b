//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every mutation handler validates its request explicitly (so missing
//! fields report their name), calls the registry, and wraps the outcome in
//! the matching response envelope. Store failures map to 500, everything
//! else to 400.

use super::{
    AppState, auth,
    auth::Claims,
    types::{
        AckResponse, AddQuestionRequest, AnswerRequest, CompanyRegisterRequest,
        CreatePhaseRequest, DetailsResponse, HealthResponse, InsertResponse, LimitQuery,
        ListResponse, LoginRequest, NewPostRequest, PhaseRefRequest, PlacementRegisterRequest,
        ProfileJson, RecordResultRequest, RejectRequest, ResultQuery, RoleQuery,
        StartPlacementRequest, StatusResponse, StudentRegisterRequest, SuggestDateRequest,
        TokenResponse, UserJson, UserResponse, YearQuery, error_status, require,
        validate_profile,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, Utc};
use tpo_core::{Profile, TpoError, User, UserId};

/// The drive year used when a request does not name one.
fn current_year() -> i32 {
    Utc::now().year()
}

// =============================================================================
// HEALTH & STATUS HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Collection counts.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.counts() {
        Ok(counts) => (StatusCode::OK, Json(StatusResponse::success(counts))),
        Err(e) => (error_status(&e), Json(StatusResponse::error(e.to_string()))),
    }
}

// =============================================================================
// USER HANDLERS: LISTS & LOOKUP
// =============================================================================

fn users_response(result: Result<Vec<User>, TpoError>) -> (StatusCode, Json<ListResponse<UserJson>>) {
    match result {
        Ok(users) => (
            StatusCode::OK,
            Json(ListResponse::rows(users.iter().map(UserJson::from).collect())),
        ),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// List all users (passwords never leave the server).
pub async fn list_users_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    users_response(registry.users())
}

/// List all student accounts.
pub async fn list_students_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    users_response(registry.students())
}

/// List all company accounts.
pub async fn list_companies_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    users_response(registry.companies())
}

/// Get a single user by id.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.user(UserId(id)) {
        Ok(user) => (StatusCode::OK, Json(UserResponse::success(&user))),
        Err(e) => (error_status(&e), Json(UserResponse::error(e.to_string()))),
    }
}

// =============================================================================
// USER HANDLERS: APPROVAL WORKFLOW
// =============================================================================

/// Approve a user account. Returns the updated user.
pub async fn approve_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.approve_user(UserId(id), Utc::now()) {
        Ok(user) => (StatusCode::OK, Json(UserResponse::success(&user))),
        Err(e) => (error_status(&e), Json(UserResponse::error(e.to_string()))),
    }
}

/// Reject a user account with a reason. Returns the updated user.
pub async fn reject_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<RejectRequest>,
) -> impl IntoResponse {
    let reason = match request.validate() {
        Ok(reason) => reason,
        Err(e) => {
            return (error_status(&e), Json(UserResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.reject_user(UserId(id), reason, Utc::now()) {
        Ok(user) => (StatusCode::OK, Json(UserResponse::success(&user))),
        Err(e) => (error_status(&e), Json(UserResponse::error(e.to_string()))),
    }
}

/// Create or replace a user's profile.
pub async fn set_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ProfileJson>,
) -> impl IntoResponse {
    let profile: Profile = request.into();
    if let Err(e) = validate_profile(&profile) {
        return (error_status(&e), Json(AckResponse::error(e.to_string())));
    }
    let mut registry = state.registry.write().await;
    match registry.set_profile(UserId(id), profile) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// List approved companies.
pub async fn approved_companies_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.approved_companies() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// List companies awaiting approval.
pub async fn unapproved_companies_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.unapproved_companies() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(limit.apply(rows)))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// List approved students.
pub async fn approved_students_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.approved_students() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// List students awaiting approval.
pub async fn unapproved_students_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.unapproved_students() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(limit.apply(rows)))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

// =============================================================================
// USER HANDLERS: REGISTRATION & LOGIN
// =============================================================================

/// Mint a token response for a freshly registered or logged-in user.
fn token_for(user: &User) -> (StatusCode, Json<TokenResponse>) {
    let secret = auth::get_secret_from_env().unwrap_or_default();
    let claims = Claims::for_user(user, Utc::now());
    match auth::mint_token(&secret, &claims) {
        Ok(token) => (StatusCode::OK, Json(TokenResponse::success(token))),
        Err(e) => (error_status(&e), Json(TokenResponse::error(e.to_string()))),
    }
}

/// Register a student account and issue a token.
pub async fn register_student_handler(
    State(state): State<AppState>,
    Json(request): Json<StudentRegisterRequest>,
) -> impl IntoResponse {
    let (email, password) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };
    let secret = auth::get_secret_from_env().unwrap_or_default();
    let digest = auth::hash_password(&secret, &email, &password);

    let mut registry = state.registry.write().await;
    let id = match registry.register_student(email, Some(digest)) {
        Ok(id) => id,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };
    match registry.user(id) {
        Ok(user) => token_for(&user),
        Err(e) => (error_status(&e), Json(TokenResponse::error(e.to_string()))),
    }
}

/// Register a company account with its profile and issue a token.
pub async fn register_company_handler(
    State(state): State<AppState>,
    Json(request): Json<CompanyRegisterRequest>,
) -> impl IntoResponse {
    let registration = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };
    let secret = auth::get_secret_from_env().unwrap_or_default();
    let digest = auth::hash_password(&secret, &registration.email, &registration.password);

    let mut registry = state.registry.write().await;
    let id = match registry.register_company(
        registration.email,
        Some(digest),
        registration.profile,
    ) {
        Ok(id) => id,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };
    match registry.user(id) {
        Ok(user) => token_for(&user),
        Err(e) => (error_status(&e), Json(TokenResponse::error(e.to_string()))),
    }
}

/// Log in with email and password; issues a token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    let (email, password) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };

    let registry = state.registry.read().await;
    let user = match registry.user_by_email(&email) {
        Ok(user) => user,
        Err(e) => {
            return (error_status(&e), Json(TokenResponse::error(e.to_string())));
        }
    };

    let secret = auth::get_secret_from_env().unwrap_or_default();
    let password_ok = user
        .password_hash
        .as_deref()
        .is_some_and(|digest| auth::verify_password(&secret, &user.email, &password, digest));
    if !password_ok {
        let e = TpoError::InvalidCredentials;
        return (error_status(&e), Json(TokenResponse::error(e.to_string())));
    }

    token_for(&user)
}

// =============================================================================
// USER HANDLERS: ELIGIBILITY VIEWS
// =============================================================================

/// Placements of the year the student is eligible for.
pub async fn eligible_companies_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(year): Query<YearQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.eligible_companies(UserId(id), year.year.unwrap_or_else(current_year)) {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Placements of the year the student is NOT eligible for.
pub async fn not_eligible_companies_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(year): Query<YearQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.not_eligible_companies(UserId(id), year.year.unwrap_or_else(current_year)) {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// The company's drive for the year with resolved phase statuses.
pub async fn current_placement_details_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(year): Query<YearQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.current_placement_details(
        UserId(id),
        year.year.unwrap_or_else(current_year),
        Utc::now(),
    ) {
        Ok(details) => (StatusCode::OK, Json(DetailsResponse::success(details))),
        Err(e) => (error_status(&e), Json(DetailsResponse::error(e.to_string()))),
    }
}

// =============================================================================
// PLACEMENT HANDLERS: LIFECYCLE
// =============================================================================

/// Start a placement drive.
pub async fn start_placement_handler(
    State(state): State<AppState>,
    Json(request): Json<StartPlacementRequest>,
) -> impl IntoResponse {
    let placement = match request.validate(current_year()) {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(InsertResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.start_placement(
        placement.company_id,
        placement.year,
        placement.domain,
        placement.requirement,
        placement.eligibility,
        placement.positions,
    ) {
        Ok(id) => (StatusCode::OK, Json(InsertResponse::success(id.0))),
        Err(e) => (error_status(&e), Json(InsertResponse::error(e.to_string()))),
    }
}

/// Create a phase with the company's requested date.
pub async fn create_phase_handler(
    State(state): State<AppState>,
    Json(request): Json<CreatePhaseRequest>,
) -> impl IntoResponse {
    let (placement_id, title, description, requested) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.create_phase(placement_id, title, description, requested) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Suggest an alternative date for a phase.
pub async fn suggest_date_handler(
    State(state): State<AppState>,
    Json(request): Json<SuggestDateRequest>,
) -> impl IntoResponse {
    let (placement_id, phase_title, suggested) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.suggest_phase_date(placement_id, &phase_title, suggested) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Approve a phase: the requested date becomes the scheduled date.
pub async fn approve_phase_handler(
    State(state): State<AppState>,
    Json(request): Json<PhaseRefRequest>,
) -> impl IntoResponse {
    let (placement_id, phase_title) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.approve_phase(placement_id, &phase_title) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Mark a phase complete.
pub async fn complete_phase_handler(
    State(state): State<AppState>,
    Json(request): Json<PhaseRefRequest>,
) -> impl IntoResponse {
    let (placement_id, phase_title) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.complete_phase(placement_id, &phase_title) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Record a student's result in a phase.
pub async fn record_result_handler(
    State(state): State<AppState>,
    Json(request): Json<RecordResultRequest>,
) -> impl IntoResponse {
    let (placement_id, phase_title, student_id, status) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.record_phase_result(placement_id, &phase_title, student_id, status) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Register a student for a placement drive.
pub async fn register_for_placement_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PlacementRegisterRequest>,
) -> impl IntoResponse {
    let student_id = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.register_for_placement(tpo_core::PlacementId(id), student_id) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

// =============================================================================
// PLACEMENT HANDLERS: PHASE LIST VIEWS
// =============================================================================

/// Phases awaiting office action.
pub async fn unapproved_phases_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.unapproved_phases() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(limit.apply(rows)))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Phases with a suggested date awaiting company approval.
pub async fn pending_phases_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.pending_phases() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(limit.apply(rows)))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Phases scheduled in the future.
pub async fn upcoming_phases_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.upcoming_phases(Utc::now()) {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(limit.apply(rows)))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Result rows for one phase of one company's drive.
pub async fn phase_result_handler(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
) -> impl IntoResponse {
    let company_id = match require(query.company_id, "company id") {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(ListResponse::error(e.to_string())));
        }
    };
    let phase_title = match require(query.phase_title, "phase title") {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(ListResponse::error(e.to_string())));
        }
    };
    let registry = state.registry.read().await;
    match registry.phase_results(
        UserId(company_id),
        &phase_title,
        query.year.unwrap_or_else(current_year),
    ) {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Every placement's registered students.
pub async fn registered_students_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.registered_students() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

// =============================================================================
// BOARD HANDLERS: POSTS & NOTICES
// =============================================================================

/// List all posts.
pub async fn list_posts_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.posts() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Publish a post.
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(request): Json<NewPostRequest>,
) -> impl IntoResponse {
    let (title, description) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(InsertResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.create_post(title, description, Utc::now()) {
        Ok(id) => (StatusCode::OK, Json(InsertResponse::success(id.0))),
        Err(e) => (error_status(&e), Json(InsertResponse::error(e.to_string()))),
    }
}

/// List all notices.
pub async fn list_notices_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.notices() {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Publish a notice.
pub async fn create_notice_handler(
    State(state): State<AppState>,
    Json(request): Json<NewPostRequest>,
) -> impl IntoResponse {
    let (title, description) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(InsertResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.create_notice(title, description, Utc::now()) {
        Ok(id) => (StatusCode::OK, Json(InsertResponse::success(id.0))),
        Err(e) => (error_status(&e), Json(InsertResponse::error(e.to_string()))),
    }
}

// =============================================================================
// Q&A HANDLERS
// =============================================================================

/// List open questions, optionally filtered by the asker's role.
pub async fn list_questions_handler(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let result = match query.role {
        Some(role) => registry.questions_by_role(role),
        None => registry.open_questions(),
    };
    match result {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// All of one user's questions, answered or not.
pub async fn questions_by_user_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.questions_by_user(UserId(id)) {
        Ok(rows) => (StatusCode::OK, Json(ListResponse::rows(rows))),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Ask a question.
pub async fn add_question_handler(
    State(state): State<AppState>,
    Json(request): Json<AddQuestionRequest>,
) -> impl IntoResponse {
    let (user_id, question) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(InsertResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.add_question(user_id, question, Utc::now()) {
        Ok(id) => (StatusCode::OK, Json(InsertResponse::success(id.0))),
        Err(e) => (error_status(&e), Json(InsertResponse::error(e.to_string()))),
    }
}

/// Answer a question.
pub async fn answer_question_handler(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> impl IntoResponse {
    let (question_id, answer) = match request.validate() {
        Ok(v) => v,
        Err(e) => {
            return (error_status(&e), Json(AckResponse::error(e.to_string())));
        }
    };
    let mut registry = state.registry.write().await;
    match registry.answer_question(question_id, answer) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}

/// Delete a question.
pub async fn delete_question_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.delete_question(tpo_core::QuestionId(id)) {
        Ok(()) => (StatusCode::OK, Json(AckResponse::ok())),
        Err(e) => (error_status(&e), Json(AckResponse::error(e.to_string()))),
    }
}
