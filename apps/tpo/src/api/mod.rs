//! # TPO HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints (under `/api/v1`)
//!
//! - `user` - accounts: lists, registration, login, approval, profiles,
//!   eligibility views
//! - `placement` - drives: start, phases (create/suggest/approve/complete),
//!   phase list views, results, registrations
//! - `post` / `notice` - the board
//! - `qna` - the Q&A section
//! - `GET /health`, `GET /status` - liveness and collection counts
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `TPO_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `TPO_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `TPO_SECRET`: If set, requires bearer-token authentication

pub mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::get_secret_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `tpo::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    health_handler, list_questions_handler, list_users_handler, login_handler, status_handler,
};
#[allow(unused_imports)]
pub use types::{
    AckResponse, AddQuestionRequest, AnswerRequest, CompanyRegisterRequest, CreatePhaseRequest,
    DetailsResponse, EligibilityRequest, HealthResponse, InsertResponse, ListResponse,
    LoginRequest, NewPostRequest, PhaseRefRequest, PlacementRegisterRequest, ProfileJson,
    RecordResultRequest, RejectRequest, StartPlacementRequest, StatusResponse,
    StudentRegisterRequest, SuggestDateRequest, TokenResponse, UserJson, UserResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tpo_core::{Registry, TpoError};

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the registry.
#[derive(Clone)]
pub struct AppState {
    /// The registry over the document store.
    pub registry: Arc<RwLock<Registry>>,
}

impl AppState {
    /// Create new app state with a registry.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `TPO_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("TPO_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (TPO_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in TPO_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No TPO_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates bearer tokens (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Check if authentication is enabled
    let has_auth = get_secret_from_env().is_some();
    if has_auth {
        tracing::info!("Bearer-token authentication enabled");
    } else {
        tracing::warn!(
            "⚠️  Bearer-token authentication DISABLED - all endpoints are publicly accessible! \
             Set TPO_SECRET environment variable to enable authentication."
        );
    }

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        // Users
        .route("/api/v1/user", get(handlers::list_users_handler))
        .route("/api/v1/user/student", get(handlers::list_students_handler))
        .route("/api/v1/user/company", get(handlers::list_companies_handler))
        .route("/api/v1/user/login", post(handlers::login_handler))
        .route(
            "/api/v1/user/student/register",
            post(handlers::register_student_handler),
        )
        .route(
            "/api/v1/user/company/register",
            post(handlers::register_company_handler),
        )
        .route(
            "/api/v1/user/student/approved",
            get(handlers::approved_students_handler),
        )
        .route(
            "/api/v1/user/student/unapproved",
            get(handlers::unapproved_students_handler),
        )
        .route(
            "/api/v1/user/company/approved",
            get(handlers::approved_companies_handler),
        )
        .route(
            "/api/v1/user/company/unapproved",
            get(handlers::unapproved_companies_handler),
        )
        .route(
            "/api/v1/user/student/{id}/eligible_companies",
            get(handlers::eligible_companies_handler),
        )
        .route(
            "/api/v1/user/student/{id}/not_eligible_companies",
            get(handlers::not_eligible_companies_handler),
        )
        .route(
            "/api/v1/user/company/{id}/current_placement_details",
            get(handlers::current_placement_details_handler),
        )
        .route("/api/v1/user/{id}", get(handlers::get_user_handler))
        .route("/api/v1/user/{id}/approve", put(handlers::approve_user_handler))
        .route("/api/v1/user/{id}/reject", put(handlers::reject_user_handler))
        .route("/api/v1/user/{id}/profile", put(handlers::set_profile_handler))
        // Placements
        .route(
            "/api/v1/placement/start",
            post(handlers::start_placement_handler),
        )
        .route(
            "/api/v1/placement/phase/create",
            post(handlers::create_phase_handler),
        )
        .route(
            "/api/v1/placement/phase/suggest_date",
            put(handlers::suggest_date_handler),
        )
        .route(
            "/api/v1/placement/phase/approve",
            put(handlers::approve_phase_handler),
        )
        .route(
            "/api/v1/placement/phase/complete",
            put(handlers::complete_phase_handler),
        )
        .route(
            "/api/v1/placement/phase/unapproved",
            get(handlers::unapproved_phases_handler),
        )
        .route(
            "/api/v1/placement/phase/pending",
            get(handlers::pending_phases_handler),
        )
        .route(
            "/api/v1/placement/phase/upcoming",
            get(handlers::upcoming_phases_handler),
        )
        .route(
            "/api/v1/placement/phase/result",
            get(handlers::phase_result_handler).post(handlers::record_result_handler),
        )
        .route(
            "/api/v1/placement/registered_students",
            get(handlers::registered_students_handler),
        )
        .route(
            "/api/v1/placement/{id}/register",
            post(handlers::register_for_placement_handler),
        )
        // Board
        .route(
            "/api/v1/post",
            get(handlers::list_posts_handler).post(handlers::create_post_handler),
        )
        .route(
            "/api/v1/notice",
            get(handlers::list_notices_handler).post(handlers::create_notice_handler),
        )
        // Q&A
        .route("/api/v1/qna", get(handlers::list_questions_handler))
        .route(
            "/api/v1/qna/user/{id}",
            get(handlers::questions_by_user_handler),
        )
        .route("/api/v1/qna/add", post(handlers::add_question_handler))
        .route("/api/v1/qna/answer", put(handlers::answer_question_handler))
        .route("/api/v1/qna/{id}", delete(handlers::delete_question_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::bearer_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, registry: Registry) -> Result<(), TpoError> {
    let state = AppState::new(registry);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TpoError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("TPO HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| TpoError::IoError(format!("Server error: {}", e)))
}
