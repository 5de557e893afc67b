//! # Engine Constants
//!
//! Hardcoded limits and scales for the TPO engine.
//!
//! These are compiled into the binary and immutable at runtime. Input
//! validation at the API boundary enforces the length limits before any data
//! reaches the store.

/// Number of fixed-point steps per grade point (hundredths).
///
/// A [`crate::GradeHundredths`] of 875 is an SGPA of 8.75 on the 10.00 scale.
pub const GRADE_SCALE: u32 = 100;

/// Maximum representable grade: 10.00 SGPA in hundredths.
///
/// Marks above this are rejected at the API boundary.
pub const MAX_GRADE_HUNDREDTHS: u32 = 10 * GRADE_SCALE;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for short text fields (names, titles, domains).
///
/// This prevents memory exhaustion from malicious or malformed input.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum length for long text fields (descriptions, requirements,
/// questions, answers, rejection reasons).
pub const MAX_TEXT_LENGTH: usize = 65_536;

/// Maximum number of recorded terms in a student's grade history.
pub const MAX_TERMS: usize = 12;
