//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::api::{EligibilityRequest, ProfileJson};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tpo_core::{Profile, Registry, TpoError, UserId};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for seeding (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_SEED_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &PathBuf, max_size: u64) -> Result<(), TpoError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| TpoError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(TpoError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate file path for security.
///
/// This function:
/// 1. Canonicalizes the path to resolve symlinks and ".."
/// 2. Ensures the path exists
/// 3. Ensures the path is a file (not a directory)
fn validate_file_path(path: &Path) -> Result<PathBuf, TpoError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path
        .canonicalize()
        .map_err(|e| TpoError::IoError(format!("Invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(TpoError::IoError(format!(
            "Path '{}' is not a file",
            path.display()
        )));
    }
    Ok(canonical)
}

// =============================================================================
// REGISTRY CONSTRUCTION
// =============================================================================

/// Open a registry over the selected backend.
fn open_registry(database: &Path, backend: &str) -> Result<Registry, TpoError> {
    match backend {
        "memory" => Ok(Registry::new()),
        "redb" => Registry::with_redb(database),
        other => Err(TpoError::InvalidField {
            field: "backend",
            reason: format!("unknown backend '{other}' (expected 'redb' or 'memory')"),
        }),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    database: &Path,
    backend: &str,
    host: &str,
    port: u16,
) -> Result<(), TpoError> {
    let registry = open_registry(database, backend)?;
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, registry).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show collection counts.
pub fn cmd_status(database: &Path, backend: &str, json_mode: bool) -> Result<(), TpoError> {
    let registry = open_registry(database, backend)?;
    let counts = registry.counts()?;

    if json_mode {
        let json = serde_json::to_string_pretty(&counts)
            .map_err(|e| TpoError::SerializationError(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("Database:   {}", database.display());
        println!("Users:      {}", counts.users);
        println!("Placements: {}", counts.placements);
        println!("Posts:      {}", counts.posts);
        println!("Notices:    {}", counts.notices);
        println!("Questions:  {}", counts.questions);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(database: &Path, backend: &str, force: bool) -> Result<(), TpoError> {
    if backend == "memory" {
        println!("Memory backend needs no initialization");
        return Ok(());
    }

    if database.exists() {
        if !force {
            return Err(TpoError::IoError(format!(
                "Database '{}' already exists (use --force to overwrite)",
                database.display()
            )));
        }
        std::fs::remove_file(database)
            .map_err(|e| TpoError::IoError(format!("Cannot remove existing database: {}", e)))?;
    }

    let _ = Registry::with_redb(database)?;
    println!("Initialized empty database at {}", database.display());
    Ok(())
}

// =============================================================================
// SEED COMMAND
// =============================================================================

/// One user in a seed fixture.
#[derive(Debug, Deserialize)]
struct SeedUser {
    email: String,
    #[serde(flatten)]
    profile: ProfileJson,
    #[serde(default)]
    approved: bool,
}

/// One placement in a seed fixture, referencing its company by email.
#[derive(Debug, Deserialize)]
struct SeedPlacement {
    company_email: String,
    year: Option<i32>,
    domain: String,
    requirement: String,
    eligibility: EligibilityRequest,
    positions: u32,
}

/// A seed fixture: users first, then placements referencing them.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    placements: Vec<SeedPlacement>,
}

/// Bulk-load users and placements from a JSON fixture.
///
/// Seeded accounts carry no password; they are for development and demo
/// databases, not production credentials.
pub fn cmd_seed(
    database: &Path,
    backend: &str,
    json_mode: bool,
    file: &Path,
) -> Result<(), TpoError> {
    let canonical = validate_file_path(file)?;
    validate_file_size(&canonical, MAX_SEED_FILE_SIZE)?;

    let content = std::fs::read_to_string(&canonical)
        .map_err(|e| TpoError::IoError(format!("Cannot read seed file: {}", e)))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .map_err(|e| TpoError::DeserializationError(e.to_string()))?;

    let mut registry = open_registry(database, backend)?;
    let now = Utc::now();

    let mut users = 0usize;
    for entry in seed.users {
        let id = match Profile::from(entry.profile) {
            Profile::Student(student) => {
                let id = registry.register_student(entry.email, None)?;
                registry.set_profile(id, Profile::Student(student))?;
                id
            }
            Profile::Company(company) => {
                registry.register_company(entry.email, None, company)?
            }
        };
        if entry.approved {
            registry.approve_user(id, now)?;
        }
        users += 1;
    }

    let mut placements = 0usize;
    for entry in seed.placements {
        let company = registry.user_by_email(&entry.company_email)?;
        registry.start_placement(
            company.id,
            entry.year.unwrap_or_else(|| now.year()),
            entry.domain,
            entry.requirement,
            entry.eligibility.validate()?,
            entry.positions,
        )?;
        placements += 1;
    }

    if json_mode {
        println!(
            "{}",
            serde_json::json!({ "users": users, "placements": placements })
        );
    } else {
        println!("Seeded {} users and {} placements", users, placements);
    }
    Ok(())
}

// =============================================================================
// APPROVE COMMAND
// =============================================================================

/// Approve a user account from the command line.
pub fn cmd_approve(
    database: &Path,
    backend: &str,
    json_mode: bool,
    user: u64,
) -> Result<(), TpoError> {
    let mut registry = open_registry(database, backend)?;
    let approved = registry.approve_user(UserId(user), Utc::now())?;

    if json_mode {
        println!(
            "{}",
            serde_json::json!({
                "id": approved.id.0,
                "name": approved.display_name(),
                "approved": approved.is_approved(),
            })
        );
    } else {
        println!("Approved {} ({})", approved.display_name(), approved.email);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(matches!(
            open_registry(Path::new("x.db"), "postgres"),
            Err(TpoError::InvalidField { field: "backend", .. })
        ));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("tpo.db");

        cmd_init(&db, "redb", false).expect("first init");
        assert!(cmd_init(&db, "redb", false).is_err());
        cmd_init(&db, "redb", true).expect("forced init");
    }

    #[test]
    fn seed_fixture_loads_users_and_placements() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("tpo.db");
        let fixture = dir.path().join("seed.json");
        let content = serde_json::json!({
            "users": [
                {
                    "email": "asha@campus.edu",
                    "role": "student",
                    "full_name": "Asha Rao",
                    "class": "BE A",
                    "department": "CS",
                    "roll_number": "42",
                    "sem_marks": [800, 820],
                    "approved": true,
                },
                {
                    "email": "hr@acme.example",
                    "role": "company",
                    "company_name": "Acme",
                    "website": "https://acme.example",
                    "address": "1 Campus Road",
                    "concerned_person": {
                        "name": "Priya",
                        "position": "HR Lead",
                        "email": "priya@acme.example",
                        "contact": "9999999999",
                    },
                },
            ],
            "placements": [
                {
                    "company_email": "hr@acme.example",
                    "year": 2026,
                    "domain": "Backend",
                    "requirement": "Systems programming",
                    "eligibility": { "min_grade": 750 },
                    "positions": 4,
                },
            ],
        });
        std::fs::write(&fixture, content.to_string()).expect("write fixture");

        cmd_seed(&db, "redb", true, &fixture).expect("seed");

        let registry = Registry::with_redb(&db).expect("reopen");
        let counts = registry.counts().expect("counts");
        assert_eq!(counts.users, 2);
        assert_eq!(counts.placements, 1);
        assert!(
            registry
                .user_by_email("asha@campus.edu")
                .expect("seeded student")
                .is_approved()
        );
        assert!(
            !registry
                .user_by_email("priya@acme.example")
                .expect("seeded company")
                .is_approved()
        );
    }
}
