//! Integration tests for the TPO HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum_test::TestServer;
use serde_json::json;
use std::sync::Mutex;
use tpo::api::{
    AckResponse, AppState, DetailsResponse, HealthResponse, InsertResponse, ListResponse,
    StatusResponse, TokenResponse, UserJson, UserResponse, create_router,
};
use tpo_core::Registry;

/// Mutex to serialize tests since the router reads env vars at creation.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("TPO_SECRET") };
    }
}

/// Create a test server with a fresh in-memory registry.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("TPO_SECRET") };
    let state = AppState::new(Registry::new());
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Register a student account; returns the issued token.
async fn register_student(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/v1/user/student/register")
        .json(&json!({ "email": email, "password": "correct horse battery" }))
        .await;
    response.assert_status_ok();
    let token: TokenResponse = response.json();
    assert!(token.success, "registration failed: {:?}", token.error);
    token.access_token.unwrap()
}

/// Register a company account with a full profile.
async fn register_company(server: &TestServer, name: &str, email: &str) {
    let response = server
        .post("/api/v1/user/company/register")
        .json(&json!({
            "email": email,
            "password": "hiring-until-dawn",
            "company_name": name,
            "website": format!("https://{name}.example"),
            "address": "1 Campus Road",
            "name": "Priya",
            "position": "HR Lead",
            "contact": "9999999999",
        }))
        .await;
    response.assert_status_ok();
    let token: TokenResponse = response.json();
    assert!(token.success, "registration failed: {:?}", token.error);
}

/// Complete a student profile with the given marks (hundredths).
async fn fill_student_profile(server: &TestServer, id: u64, marks: &[u32]) {
    let response = server
        .put(&format!("/api/v1/user/{id}/profile"))
        .json(&json!({
            "role": "student",
            "full_name": "Asha Rao",
            "class": "BE A",
            "department": "CS",
            "roll_number": "42",
            "gender": "female",
            "sem_marks": marks,
            "live_backlog": false,
            "other_qualifications": [],
            "projects": [],
            "extra_activities": [],
        }))
        .await;
    response.assert_status_ok();
    let ack: AckResponse = response.json();
    assert!(ack.success, "profile update failed: {:?}", ack.error);
}

/// Find a user id by email via the list endpoint.
async fn user_id_by_email(server: &TestServer, email: &str) -> u64 {
    let response = server.get("/api/v1/user").await;
    response.assert_status_ok();
    let list: ListResponse<UserJson> = response.json();
    list.rows
        .iter()
        .find(|user| user.email == email)
        .map(|user| user.id)
        .expect("registered user is listed")
}

// =============================================================================
// HEALTH & STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_counts_track_registrations() {
    let (server, _guard) = create_test_server();

    let response = server.get("/status").await;
    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.counts.unwrap().users, 0);

    register_student(&server, "asha@campus.edu").await;

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.counts.unwrap().users, 1);
}

// =============================================================================
// REGISTRATION & LOGIN TESTS
// =============================================================================

#[tokio::test]
async fn test_student_registration_issues_a_token() {
    let (server, _guard) = create_test_server();
    let token = register_student(&server, "asha@campus.edu").await;
    assert!(token.contains('.'), "token should be payload.mac");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;

    let response = server
        .post("/api/v1/user/student/register")
        .json(&json!({ "email": "asha@campus.edu", "password": "another password" }))
        .await;
    response.assert_status_bad_request();
    let token: TokenResponse = response.json();
    assert!(!token.success);
}

#[tokio::test]
async fn test_missing_field_reports_its_name() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/v1/user/student/register")
        .json(&json!({ "password": "correct horse battery" }))
        .await;
    response.assert_status_bad_request();
    let token: TokenResponse = response.json();
    assert_eq!(token.error.as_deref(), Some("No email!"));
}

#[tokio::test]
async fn test_login_round_trip() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;

    let response = server
        .post("/api/v1/user/login")
        .json(&json!({ "email": "asha@campus.edu", "password": "correct horse battery" }))
        .await;
    response.assert_status_ok();
    let token: TokenResponse = response.json();
    assert!(token.success);

    let response = server
        .post("/api/v1/user/login")
        .json(&json!({ "email": "asha@campus.edu", "password": "wrong password" }))
        .await;
    response.assert_status_bad_request();
    let token: TokenResponse = response.json();
    assert_eq!(token.error.as_deref(), Some("Invalid password"));
}

// =============================================================================
// APPROVAL WORKFLOW TESTS
// =============================================================================

#[tokio::test]
async fn test_approval_is_one_shot_over_http() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;
    let id = user_id_by_email(&server, "asha@campus.edu").await;
    fill_student_profile(&server, id, &[800, 820]).await;

    // Completed profile shows up on the unapproved list.
    let unapproved: ListResponse<serde_json::Value> =
        server.get("/api/v1/user/student/unapproved").await.json();
    assert_eq!(unapproved.rows.len(), 1);

    let response = server.put(&format!("/api/v1/user/{id}/approve")).await;
    response.assert_status_ok();
    let user: UserResponse = response.json();
    assert!(user.user.unwrap().approved_date.is_some());

    let response = server.put(&format!("/api/v1/user/{id}/approve")).await;
    response.assert_status_bad_request();

    // Approved now, so the unapproved list is empty.
    let unapproved: ListResponse<serde_json::Value> =
        server.get("/api/v1/user/student/unapproved").await.json();
    assert!(unapproved.rows.is_empty());
}

#[tokio::test]
async fn test_rejection_requires_a_reason() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;
    let id = user_id_by_email(&server, "asha@campus.edu").await;

    let response = server
        .put(&format!("/api/v1/user/{id}/reject"))
        .json(&json!({}))
        .await;
    response.assert_status_bad_request();
    let ack: UserResponse = response.json();
    assert_eq!(ack.error.as_deref(), Some("No reason!"));

    let response = server
        .put(&format!("/api/v1/user/{id}/reject"))
        .json(&json!({ "reason": "marks sheet missing" }))
        .await;
    response.assert_status_ok();
    let user: UserResponse = response.json();
    let user = user.user.unwrap();
    assert!(!user.profile_completed);
    assert_eq!(user.rejections.len(), 1);
}

// =============================================================================
// PLACEMENT & PHASE LIFECYCLE TESTS
// =============================================================================

/// Drive a phase through request → suggest → approve over HTTP.
#[tokio::test]
async fn test_phase_lifecycle_over_http() {
    let (server, _guard) = create_test_server();
    register_company(&server, "acme", "hr@acme.example").await;
    let company_id = user_id_by_email(&server, "hr@acme.example").await;

    let response = server
        .post("/api/v1/placement/start")
        .json(&json!({
            "company_id": company_id,
            "year": 2026,
            "domain": "Backend",
            "requirement": "Systems programming",
            "eligibility": { "min_grade": 750, "live_backlog": false },
            "positions": 4,
        }))
        .await;
    response.assert_status_ok();
    let placement: InsertResponse = response.json();
    let placement_id = placement.id.unwrap();

    let response = server
        .post("/api/v1/placement/phase/create")
        .json(&json!({
            "placement_id": placement_id,
            "title": "Written Test",
            "description": "Aptitude round",
            "date": "2999-03-10",
        }))
        .await;
    response.assert_status_ok();

    // Requested only: visible as unapproved.
    let unapproved: ListResponse<serde_json::Value> = server
        .get("/api/v1/placement/phase/unapproved")
        .await
        .json();
    assert_eq!(unapproved.rows.len(), 1);
    assert_eq!(unapproved.rows[0]["phase"], "Written Test");
    assert_eq!(unapproved.rows[0]["company_name"], "acme");

    // Office suggests an alternative: moves to pending.
    let response = server
        .put("/api/v1/placement/phase/suggest_date")
        .json(&json!({
            "placement_id": placement_id,
            "phase_title": "Written Test",
            "suggested_date": "2999-03-12",
        }))
        .await;
    response.assert_status_ok();
    let pending: ListResponse<serde_json::Value> =
        server.get("/api/v1/placement/phase/pending").await.json();
    assert_eq!(pending.rows.len(), 1);

    // Approval schedules the requested date: upcoming.
    let response = server
        .put("/api/v1/placement/phase/approve")
        .json(&json!({ "placement_id": placement_id, "phase_title": "Written Test" }))
        .await;
    response.assert_status_ok();
    let upcoming: ListResponse<serde_json::Value> =
        server.get("/api/v1/placement/phase/upcoming").await.json();
    assert_eq!(upcoming.rows.len(), 1);
    assert_eq!(upcoming.rows[0]["phase_title"], "Written Test");

    // A second approval is refused.
    let response = server
        .put("/api/v1/placement/phase/approve")
        .json(&json!({ "placement_id": placement_id, "phase_title": "Written Test" }))
        .await;
    response.assert_status_bad_request();

    // Details resolve the phase as upcoming.
    let response = server
        .get(&format!(
            "/api/v1/user/company/{company_id}/current_placement_details"
        ))
        .add_query_param("year", 2026)
        .await;
    response.assert_status_ok();
    let details: DetailsResponse = response.json();
    let details = details.details.unwrap();
    assert_eq!(details.phases.len(), 1);
    assert_eq!(
        serde_json::to_value(details.phases[0].status).unwrap(),
        json!("upcoming")
    );
}

#[tokio::test]
async fn test_phase_results_join_student_rows() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;
    let student_id = user_id_by_email(&server, "asha@campus.edu").await;
    fill_student_profile(&server, student_id, &[800, 820]).await;
    register_company(&server, "acme", "hr@acme.example").await;
    let company_id = user_id_by_email(&server, "hr@acme.example").await;

    let placement: InsertResponse = server
        .post("/api/v1/placement/start")
        .json(&json!({
            "company_id": company_id,
            "year": 2026,
            "domain": "Backend",
            "requirement": "Systems programming",
            "eligibility": { "min_grade": 0 },
            "positions": 4,
        }))
        .await
        .json();
    let placement_id = placement.id.unwrap();

    server
        .post("/api/v1/placement/phase/create")
        .json(&json!({
            "placement_id": placement_id,
            "title": "Written Test",
            "description": "Aptitude round",
            "date": "2999-03-10",
        }))
        .await
        .assert_status_ok();

    // Register the student and record a result.
    server
        .post(&format!("/api/v1/placement/{placement_id}/register"))
        .json(&json!({ "student_id": student_id }))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/placement/phase/result")
        .json(&json!({
            "placement_id": placement_id,
            "phase_title": "Written Test",
            "student_id": student_id,
            "status": "cleared",
        }))
        .await
        .assert_status_ok();

    let registered: ListResponse<serde_json::Value> = server
        .get("/api/v1/placement/registered_students")
        .await
        .json();
    assert_eq!(registered.rows.len(), 1);
    assert_eq!(registered.rows[0]["student"]["full_name"], "Asha Rao");

    let results = server
        .get("/api/v1/placement/phase/result")
        .add_query_param("company_id", company_id)
        .add_query_param("phase_title", "Written Test")
        .add_query_param("year", 2026)
        .await;
    results.assert_status_ok();
    let rows: ListResponse<serde_json::Value> = results.json();
    assert_eq!(rows.rows.len(), 1);
    assert_eq!(rows.rows[0]["name"], "Asha Rao");
    assert_eq!(rows.rows[0]["status"], "cleared");
}

#[tokio::test]
async fn test_eligibility_lists_partition_placements() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;
    let student_id = user_id_by_email(&server, "asha@campus.edu").await;
    fill_student_profile(&server, student_id, &[800, 820]).await;
    register_company(&server, "acme", "hr@acme.example").await;
    let company_id = user_id_by_email(&server, "hr@acme.example").await;

    for (domain, min_grade) in [("Backend", 750), ("Research", 900)] {
        server
            .post("/api/v1/placement/start")
            .json(&json!({
                "company_id": company_id,
                "year": 2026,
                "domain": domain,
                "requirement": "TBD",
                "eligibility": { "min_grade": min_grade },
                "positions": 2,
            }))
            .await
            .assert_status_ok();
    }

    let eligible: ListResponse<serde_json::Value> = server
        .get(&format!(
            "/api/v1/user/student/{student_id}/eligible_companies"
        ))
        .add_query_param("year", 2026)
        .await
        .json();
    let not_eligible: ListResponse<serde_json::Value> = server
        .get(&format!(
            "/api/v1/user/student/{student_id}/not_eligible_companies"
        ))
        .add_query_param("year", 2026)
        .await
        .json();

    assert_eq!(eligible.rows.len(), 1);
    assert_eq!(eligible.rows[0]["domain"], "Backend");
    assert_eq!(not_eligible.rows.len(), 1);
    assert_eq!(not_eligible.rows[0]["domain"], "Research");
}

// =============================================================================
// BOARD & Q&A TESTS
// =============================================================================

#[tokio::test]
async fn test_posts_and_notices_round_trip() {
    let (server, _guard) = create_test_server();

    server
        .post("/api/v1/post")
        .json(&json!({ "title": "Results out", "description": "Check the portal" }))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/notice")
        .json(&json!({ "title": "Dress code", "description": "Formals for interviews" }))
        .await
        .assert_status_ok();

    let posts: ListResponse<serde_json::Value> = server.get("/api/v1/post").await.json();
    assert_eq!(posts.rows.len(), 1);
    assert_eq!(posts.rows[0]["title"], "Results out");

    let notices: ListResponse<serde_json::Value> = server.get("/api/v1/notice").await.json();
    assert_eq!(notices.rows.len(), 1);
}

#[tokio::test]
async fn test_question_lifecycle_over_http() {
    let (server, _guard) = create_test_server();
    register_student(&server, "asha@campus.edu").await;
    let student_id = user_id_by_email(&server, "asha@campus.edu").await;
    fill_student_profile(&server, student_id, &[800]).await;

    let response = server
        .post("/api/v1/qna/add")
        .json(&json!({ "user_id": student_id, "question": "When does the drive open?" }))
        .await;
    response.assert_status_ok();
    let question: InsertResponse = response.json();
    let question_id = question.id.unwrap();

    let open: ListResponse<serde_json::Value> = server.get("/api/v1/qna").await.json();
    assert_eq!(open.rows.len(), 1);
    assert_eq!(open.rows[0]["user_name"], "Asha Rao");

    // Role filter: no company has asked anything.
    let by_role: ListResponse<serde_json::Value> = server
        .get("/api/v1/qna")
        .add_query_param("role", "company")
        .await
        .json();
    assert!(by_role.rows.is_empty());

    server
        .put("/api/v1/qna/answer")
        .json(&json!({ "question_id": question_id, "answer": "Monday." }))
        .await
        .assert_status_ok();
    let open: ListResponse<serde_json::Value> = server.get("/api/v1/qna").await.json();
    assert!(open.rows.is_empty());

    let mine: ListResponse<serde_json::Value> = server
        .get(&format!("/api/v1/qna/user/{student_id}"))
        .await
        .json();
    assert_eq!(mine.rows.len(), 1);
    assert_eq!(mine.rows[0]["answer"], "Monday.");

    server
        .delete(&format!("/api/v1/qna/{question_id}"))
        .await
        .assert_status_ok();
    server
        .delete(&format!("/api/v1/qna/{question_id}"))
        .await
        .assert_status_bad_request();
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_bearer_auth_guards_private_endpoints() {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("TPO_SECRET", "integration-test-secret") };
    let _guard = TestGuard { _guard: guard };

    let state = AppState::new(Registry::new());
    let server = TestServer::new(create_router(state)).unwrap();

    // Health stays public.
    server.get("/health").await.assert_status_ok();

    // Private endpoints refuse anonymous requests.
    server.get("/api/v1/user").await.assert_status_unauthorized();

    // Registration is public and issues a token that opens the door.
    let token = register_student(&server, "asha@campus.edu").await;
    server
        .get("/api/v1/user")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    // A tampered token is refused.
    server
        .get("/api/v1/user")
        .authorization_bearer("bogus.token")
        .await
        .assert_status_unauthorized();
}
