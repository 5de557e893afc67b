//! # Authentication Module
//!
//! Bearer-token authentication for the TPO HTTP API.
//!
//! ## Configuration
//!
//! Authentication is configured via environment variable:
//! - `TPO_SECRET`: server secret. If set, all requests (except `/health`,
//!   login and registration) require a valid bearer token.
//!
//! ## Tokens
//!
//! Tokens are minted at login/registration as
//! `base64url(claims JSON) . base64url(mac)` where the MAC is a keyed
//! BLAKE3 hash of the claims bytes under a key derived from the server
//! secret. Verification recomputes the MAC and compares in constant time,
//! then checks the expiry claim.
//!
//! ## Usage
//!
//! Send the token in the Authorization header:
//! ```text
//! Authorization: Bearer <token>
//! ```

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tpo_core::{Role, TpoError, User};

/// Key-derivation context for access-token MACs.
const TOKEN_CONTEXT: &str = "tpo v1 access token";

/// Key-derivation context for password digests.
const PASSWORD_CONTEXT: &str = "tpo v1 password digest";

/// Token lifetime: thirty days.
const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Paths that never require a token: health checks, login, registration.
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/api/v1/user/login",
    "/api/v1/user/student/register",
    "/api/v1/user/company/register",
];

// =============================================================================
// SERVER SECRET
// =============================================================================

/// Get the server secret from the environment.
///
/// Returns `Some(secret)` if `TPO_SECRET` is set and non-empty,
/// `None` otherwise (disabling authentication).
pub fn get_secret_from_env() -> Option<String> {
    std::env::var("TPO_SECRET").ok().filter(|s| !s.is_empty())
}

// =============================================================================
// CLAIMS & TOKENS
// =============================================================================

/// Identity claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_approved: bool,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

impl Claims {
    /// Build the claims for a user, expiring thirty days from `now`.
    #[must_use]
    pub fn for_user(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            sub: user.id.0,
            name: user.display_name().to_string(),
            email: user.email.clone(),
            role: user.role(),
            is_approved: user.is_approved(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
        }
    }
}

/// Mint a signed bearer token for the given claims.
pub fn mint_token(secret: &str, claims: &Claims) -> Result<String, TpoError> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| TpoError::SerializationError(e.to_string()))?;
    let key = blake3::derive_key(TOKEN_CONTEXT, secret.as_bytes());
    let mac = blake3::keyed_hash(&key, &payload);
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&payload),
        URL_SAFE_NO_PAD.encode(mac.as_bytes())
    ))
}

/// Verify a bearer token: recompute the MAC in constant time, then check
/// the expiry claim against `now`.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Result<Claims, TpoError> {
    let invalid = || TpoError::InvalidField {
        field: "token",
        reason: "malformed or tampered token".to_string(),
    };

    let (payload_b64, mac_b64) = token.split_once('.').ok_or_else(invalid)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| invalid())?;
    let mac = URL_SAFE_NO_PAD.decode(mac_b64).map_err(|_| invalid())?;

    let key = blake3::derive_key(TOKEN_CONTEXT, secret.as_bytes());
    let expected = blake3::keyed_hash(&key, &payload);
    let mac_ok: bool = expected.as_bytes().ct_eq(mac.as_slice()).into();
    if !mac_ok {
        return Err(invalid());
    }

    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| invalid())?;
    if claims.exp < now.timestamp() {
        return Err(TpoError::InvalidField {
            field: "token",
            reason: "token expired".to_string(),
        });
    }
    Ok(claims)
}

// =============================================================================
// PASSWORD DIGESTS
// =============================================================================

/// Digest a password under the server secret, salted with the account email.
///
/// The same keyed-BLAKE3 construction as the token MAC, under its own
/// derivation context. The email salt keeps identical passwords from
/// producing identical digests.
#[must_use]
pub fn hash_password(secret: &str, email: &str, password: &str) -> String {
    let key = blake3::derive_key(PASSWORD_CONTEXT, secret.as_bytes());
    let mut hasher = blake3::Hasher::new_keyed(&key);
    hasher.update(email.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Constant-time check of a password against a stored digest.
#[must_use]
pub fn verify_password(secret: &str, email: &str, password: &str, digest: &str) -> bool {
    let computed = hash_password(secret, email, password);
    computed.as_bytes().ct_eq(digest.as_bytes()).into()
}

// =============================================================================
// BEARER TOKEN MIDDLEWARE
// =============================================================================

/// Bearer-token authentication middleware.
///
/// If `TPO_SECRET` is set:
/// - health, login and registration endpoints are always allowed
/// - all other endpoints require `Authorization: Bearer <token>` with a
///   valid, unexpired token; the verified claims are stored in the request
///   extensions for handlers
///
/// If `TPO_SECRET` is not set, all requests are allowed.
pub async fn bearer_auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    // If no secret configured, allow all requests
    let Some(secret) = get_secret_from_env() else {
        return Ok(next.run(request).await);
    };

    // Always allow the public endpoints (health checks, login, registration)
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    // Extract the token from the Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            // Support both "Bearer <token>" and raw "<token>" formats
            let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            match verify_token(&secret, token, Utc::now()) {
                Ok(claims) => {
                    request.extensions_mut().insert(claims);
                    Ok(next.run(request).await)
                }
                Err(e) => {
                    tracing::warn!(
                        event = "auth_failure",
                        reason = "invalid_token",
                        "Authentication failed: {}",
                        e
                    );
                    Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
                }
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
