//! # Persistent Storage
//!
//! Disk-backed document store built on redb.

mod redb_store;

pub use redb_store::RedbStore;
