//! # redb-backed Document Store
//!
//! A disk-backed document store using the redb embedded database,
//! providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! One table per collection, keyed by the document id, with
//! postcard-serialized document bytes as values. The email index is kept in
//! its own table and mirrored in an in-memory cache loaded at open.

use crate::store::{DocumentStore, StoreCounts, index_emails};
use crate::types::{
    Notice, NoticeId, Placement, PlacementId, Post, PostId, Question, QuestionId, TpoError, User,
    UserId,
};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Table for users: UserId(u64) -> serialized User bytes
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Table for placements: PlacementId(u64) -> serialized Placement bytes
const PLACEMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("placements");

/// Table for posts: PostId(u64) -> serialized Post bytes
const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");

/// Table for notices: NoticeId(u64) -> serialized Notice bytes
const NOTICES: TableDefinition<u64, &[u8]> = TableDefinition::new("notices");

/// Table for questions: QuestionId(u64) -> serialized Question bytes
const QUESTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("questions");

/// Table for the email index: email -> UserId(u64)
const EMAIL_INDEX: TableDefinition<&str, u64> = TableDefinition::new("email_index");

/// Table for metadata: key string -> value u64 (next-id counters)
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Metadata keys for the per-collection id counters.
const NEXT_USER_ID: &str = "next_user_id";
const NEXT_PLACEMENT_ID: &str = "next_placement_id";
const NEXT_POST_ID: &str = "next_post_id";
const NEXT_NOTICE_ID: &str = "next_notice_id";
const NEXT_QUESTION_ID: &str = "next_question_id";

/// A disk-backed document store using redb.
///
/// Maintains an in-memory email index for fast login lookups; the on-disk
/// index table is the source of truth and reloads the cache at open.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// In-memory mirror of the email index table.
    email_cache: BTreeMap<String, UserId>,
    next_user_id: u64,
    next_placement_id: u64,
    next_post_id: u64,
    next_notice_id: u64,
    next_question_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("email_cache_size", &self.email_cache.len())
            .field("next_user_id", &self.next_user_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a document database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TpoError> {
        let db = Database::create(path.as_ref()).map_err(|e| TpoError::IoError(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(USERS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(PLACEMENTS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(POSTS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(NOTICES)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(QUESTIONS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(EMAIL_INDEX)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| TpoError::IoError(e.to_string()))?;
        }

        // Load metadata counters
        let read_txn = db
            .begin_read()
            .map_err(|e| TpoError::IoError(e.to_string()))?;

        let meta = read_txn
            .open_table(METADATA)
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let load = |key: &str| -> Result<u64, TpoError> {
            Ok(meta
                .get(key)
                .map_err(|e| TpoError::IoError(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(0))
        };
        let next_user_id = load(NEXT_USER_ID)?;
        let next_placement_id = load(NEXT_PLACEMENT_ID)?;
        let next_post_id = load(NEXT_POST_ID)?;
        let next_notice_id = load(NEXT_NOTICE_ID)?;
        let next_question_id = load(NEXT_QUESTION_ID)?;

        // Load email cache
        let email_cache = {
            let table = read_txn
                .open_table(EMAIL_INDEX)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let mut cache = BTreeMap::new();
            for entry in table
                .iter()
                .map_err(|e| TpoError::IoError(e.to_string()))?
            {
                let (key, value) = entry.map_err(|e| TpoError::IoError(e.to_string()))?;
                cache.insert(key.value().to_string(), UserId(value.value()));
            }
            cache
        };

        Ok(Self {
            db,
            email_cache,
            next_user_id,
            next_placement_id,
            next_post_id,
            next_notice_id,
            next_question_id,
        })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), TpoError> {
        self.db
            .compact()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Serialize a document for storage.
    fn to_bytes<T: Serialize>(doc: &T) -> Result<Vec<u8>, TpoError> {
        postcard::to_allocvec(doc).map_err(|e| TpoError::SerializationError(e.to_string()))
    }

    /// Point lookup of a serialized document.
    fn read_doc<T: DeserializeOwned>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        id: u64,
    ) -> Result<Option<T>, TpoError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(table)
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        match table.get(id).map_err(|e| TpoError::IoError(e.to_string()))? {
            Some(bytes) => {
                let doc = postcard::from_bytes(bytes.value())
                    .map_err(|e| TpoError::DeserializationError(e.to_string()))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Full scan of a collection in ascending id order.
    fn scan_docs<T: DeserializeOwned>(
        &self,
        table: TableDefinition<u64, &[u8]>,
    ) -> Result<Vec<T>, TpoError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(table)
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let mut docs = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| TpoError::IoError(e.to_string()))?
        {
            let (_, bytes) = entry.map_err(|e| TpoError::IoError(e.to_string()))?;
            docs.push(
                postcard::from_bytes(bytes.value())
                    .map_err(|e| TpoError::DeserializationError(e.to_string()))?,
            );
        }
        Ok(docs)
    }

    /// Insert a serialized document and bump its id counter in one
    /// ACID transaction.
    fn insert_doc(
        &self,
        table: TableDefinition<u64, &[u8]>,
        counter_key: &str,
        id: u64,
        bytes: &[u8],
    ) -> Result<(), TpoError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        {
            let mut docs = write_txn
                .open_table(table)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            docs.insert(id, bytes)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let mut meta = write_txn
                .open_table(METADATA)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            meta.insert(counter_key, id.saturating_add(1))
                .map_err(|e| TpoError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Overwrite an existing document. Fails with `on_missing` if absent.
    fn put_doc(
        &self,
        table: TableDefinition<u64, &[u8]>,
        id: u64,
        bytes: &[u8],
        on_missing: TpoError,
    ) -> Result<(), TpoError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        {
            let mut docs = write_txn
                .open_table(table)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            if docs
                .get(id)
                .map_err(|e| TpoError::IoError(e.to_string()))?
                .is_none()
            {
                return Err(on_missing);
            }
            docs.insert(id, bytes)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        Ok(())
    }
}

impl DocumentStore for RedbStore {
    fn insert_user(&mut self, mut user: User) -> Result<UserId, TpoError> {
        let id = UserId(self.next_user_id);
        user.id = id;
        let bytes = Self::to_bytes(&user)?;
        let emails = index_emails(&user);

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        {
            let mut users = write_txn
                .open_table(USERS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            users
                .insert(id.0, bytes.as_slice())
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let mut index = write_txn
                .open_table(EMAIL_INDEX)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            for email in &emails {
                index
                    .insert(email.as_str(), id.0)
                    .map_err(|e| TpoError::IoError(e.to_string()))?;
            }
            let mut meta = write_txn
                .open_table(METADATA)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            meta.insert(NEXT_USER_ID, id.0.saturating_add(1))
                .map_err(|e| TpoError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| TpoError::IoError(e.to_string()))?;

        // Mirror into the caches only after the transaction is durable.
        self.next_user_id = id.0.saturating_add(1);
        for email in emails {
            self.email_cache.insert(email, id);
        }
        Ok(id)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, TpoError> {
        self.read_doc(USERS, id.0)
    }

    fn put_user(&mut self, user: &User) -> Result<(), TpoError> {
        let bytes = Self::to_bytes(user)?;
        let new_emails = index_emails(user);
        let stale: Vec<String> = self
            .email_cache
            .iter()
            .filter(|(email, id)| **id == user.id && !new_emails.contains(email))
            .map(|(email, _)| email.clone())
            .collect();

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        {
            let mut users = write_txn
                .open_table(USERS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            if users
                .get(user.id.0)
                .map_err(|e| TpoError::IoError(e.to_string()))?
                .is_none()
            {
                return Err(TpoError::UserNotFound(user.id));
            }
            users
                .insert(user.id.0, bytes.as_slice())
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            let mut index = write_txn
                .open_table(EMAIL_INDEX)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            for email in &stale {
                index
                    .remove(email.as_str())
                    .map_err(|e| TpoError::IoError(e.to_string()))?;
            }
            for email in &new_emails {
                index
                    .insert(email.as_str(), user.id.0)
                    .map_err(|e| TpoError::IoError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| TpoError::IoError(e.to_string()))?;

        for email in stale {
            self.email_cache.remove(&email);
        }
        for email in new_emails {
            self.email_cache.insert(email, user.id);
        }
        Ok(())
    }

    fn users(&self) -> Result<Vec<User>, TpoError> {
        self.scan_docs(USERS)
    }

    fn user_id_by_email(&self, email: &str) -> Option<UserId> {
        self.email_cache.get(email).copied()
    }

    fn insert_placement(&mut self, mut placement: Placement) -> Result<PlacementId, TpoError> {
        let id = PlacementId(self.next_placement_id);
        placement.id = id;
        let bytes = Self::to_bytes(&placement)?;
        self.insert_doc(PLACEMENTS, NEXT_PLACEMENT_ID, id.0, &bytes)?;
        self.next_placement_id = id.0.saturating_add(1);
        Ok(id)
    }

    fn placement(&self, id: PlacementId) -> Result<Option<Placement>, TpoError> {
        self.read_doc(PLACEMENTS, id.0)
    }

    fn put_placement(&mut self, placement: &Placement) -> Result<(), TpoError> {
        let bytes = Self::to_bytes(placement)?;
        self.put_doc(
            PLACEMENTS,
            placement.id.0,
            &bytes,
            TpoError::PlacementNotFound(placement.id),
        )
    }

    fn placements(&self) -> Result<Vec<Placement>, TpoError> {
        self.scan_docs(PLACEMENTS)
    }

    fn insert_post(&mut self, mut post: Post) -> Result<PostId, TpoError> {
        let id = PostId(self.next_post_id);
        post.id = id;
        let bytes = Self::to_bytes(&post)?;
        self.insert_doc(POSTS, NEXT_POST_ID, id.0, &bytes)?;
        self.next_post_id = id.0.saturating_add(1);
        Ok(id)
    }

    fn posts(&self) -> Result<Vec<Post>, TpoError> {
        self.scan_docs(POSTS)
    }

    fn insert_notice(&mut self, mut notice: Notice) -> Result<NoticeId, TpoError> {
        let id = NoticeId(self.next_notice_id);
        notice.id = id;
        let bytes = Self::to_bytes(&notice)?;
        self.insert_doc(NOTICES, NEXT_NOTICE_ID, id.0, &bytes)?;
        self.next_notice_id = id.0.saturating_add(1);
        Ok(id)
    }

    fn notices(&self) -> Result<Vec<Notice>, TpoError> {
        self.scan_docs(NOTICES)
    }

    fn insert_question(&mut self, mut question: Question) -> Result<QuestionId, TpoError> {
        let id = QuestionId(self.next_question_id);
        question.id = id;
        let bytes = Self::to_bytes(&question)?;
        self.insert_doc(QUESTIONS, NEXT_QUESTION_ID, id.0, &bytes)?;
        self.next_question_id = id.0.saturating_add(1);
        Ok(id)
    }

    fn question(&self, id: QuestionId) -> Result<Option<Question>, TpoError> {
        self.read_doc(QUESTIONS, id.0)
    }

    fn put_question(&mut self, question: &Question) -> Result<(), TpoError> {
        let bytes = Self::to_bytes(question)?;
        self.put_doc(
            QUESTIONS,
            question.id.0,
            &bytes,
            TpoError::QuestionNotFound(question.id),
        )
    }

    fn remove_question(&mut self, id: QuestionId) -> Result<bool, TpoError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let removed = {
            let mut questions = write_txn
                .open_table(QUESTIONS)
                .map_err(|e| TpoError::IoError(e.to_string()))?;
            questions
                .remove(id.0)
                .map_err(|e| TpoError::IoError(e.to_string()))?
                .is_some()
        };
        write_txn
            .commit()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        Ok(removed)
    }

    fn questions(&self) -> Result<Vec<Question>, TpoError> {
        self.scan_docs(QUESTIONS)
    }

    fn counts(&self) -> Result<StoreCounts, TpoError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| TpoError::IoError(e.to_string()))?;
        let len = |table: TableDefinition<u64, &[u8]>| -> Result<usize, TpoError> {
            Ok(read_txn
                .open_table(table)
                .map_err(|e| TpoError::IoError(e.to_string()))?
                .len()
                .map_err(|e| TpoError::IoError(e.to_string()))? as usize)
        };
        Ok(StoreCounts {
            users: len(USERS)?,
            placements: len(PLACEMENTS)?,
            posts: len(POSTS)?,
            notices: len(NOTICES)?,
            questions: len(QUESTIONS)?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
