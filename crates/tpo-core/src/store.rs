//! # Document Store
//!
//! Collection-per-entity document storage for the TPO engine.
//!
//! This module defines the `DocumentStore` trait and the in-memory backend.
//! All data structures use `BTreeMap` for deterministic ordering; full scans
//! return documents in ascending id order on every backend.

use crate::types::{
    Notice, NoticeId, Placement, PlacementId, Post, PostId, Profile, Question, QuestionId,
    TpoError, User, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// DOCUMENTSTORE TRAIT
// =============================================================================

/// The DocumentStore trait defines the collection operations.
///
/// Inserts assign the document id; `put_*` overwrites an existing document
/// in place. All fallible operations return `Result<T, TpoError>` to support
/// both in-memory and persistent backends uniformly.
pub trait DocumentStore {
    /// Insert a user, assigning and returning its id.
    fn insert_user(&mut self, user: User) -> Result<UserId, TpoError>;

    /// Point lookup of a user document.
    fn user(&self, id: UserId) -> Result<Option<User>, TpoError>;

    /// Overwrite an existing user document and refresh its email index.
    fn put_user(&mut self, user: &User) -> Result<(), TpoError>;

    /// Full scan of the users collection, ascending by id.
    fn users(&self) -> Result<Vec<User>, TpoError>;

    /// Email index lookup. Matches the account email or, for companies, the
    /// concerned person's email. Infallible (served from an in-memory index).
    fn user_id_by_email(&self, email: &str) -> Option<UserId>;

    /// Insert a placement, assigning and returning its id.
    fn insert_placement(&mut self, placement: Placement) -> Result<PlacementId, TpoError>;

    /// Point lookup of a placement document.
    fn placement(&self, id: PlacementId) -> Result<Option<Placement>, TpoError>;

    /// Overwrite an existing placement document.
    fn put_placement(&mut self, placement: &Placement) -> Result<(), TpoError>;

    /// Full scan of the placements collection, ascending by id.
    fn placements(&self) -> Result<Vec<Placement>, TpoError>;

    /// Insert a post, assigning and returning its id.
    fn insert_post(&mut self, post: Post) -> Result<PostId, TpoError>;

    /// Full scan of the posts collection, ascending by id.
    fn posts(&self) -> Result<Vec<Post>, TpoError>;

    /// Insert a notice, assigning and returning its id.
    fn insert_notice(&mut self, notice: Notice) -> Result<NoticeId, TpoError>;

    /// Full scan of the notices collection, ascending by id.
    fn notices(&self) -> Result<Vec<Notice>, TpoError>;

    /// Insert a question, assigning and returning its id.
    fn insert_question(&mut self, question: Question) -> Result<QuestionId, TpoError>;

    /// Point lookup of a question document.
    fn question(&self, id: QuestionId) -> Result<Option<Question>, TpoError>;

    /// Overwrite an existing question document.
    fn put_question(&mut self, question: &Question) -> Result<(), TpoError>;

    /// Delete a question. Returns whether a document was removed.
    fn remove_question(&mut self, id: QuestionId) -> Result<bool, TpoError>;

    /// Full scan of the questions collection, ascending by id.
    fn questions(&self) -> Result<Vec<Question>, TpoError>;

    /// Per-collection document counts.
    fn counts(&self) -> Result<StoreCounts, TpoError>;
}

/// Document counts per collection (status surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreCounts {
    pub users: usize,
    pub placements: usize,
    pub posts: usize,
    pub notices: usize,
    pub questions: usize,
}

/// Emails under which a user document is indexed.
///
/// Companies are reachable by both the account email and the concerned
/// person's email (login accepts either).
pub(crate) fn index_emails(user: &User) -> Vec<String> {
    let mut emails = vec![user.email.clone()];
    if let Profile::Company(company) = &user.profile {
        if company.concerned_person.email != user.email {
            emails.push(company.concerned_person.email.clone());
        }
    }
    emails
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

/// Volatile `BTreeMap`-backed store. Fast, deterministic, lost on drop.
#[derive(Debug, Default)]
pub struct MemStore {
    users: BTreeMap<u64, User>,
    placements: BTreeMap<u64, Placement>,
    posts: BTreeMap<u64, Post>,
    notices: BTreeMap<u64, Notice>,
    questions: BTreeMap<u64, Question>,
    email_index: BTreeMap<String, UserId>,
    next_user_id: u64,
    next_placement_id: u64,
    next_post_id: u64,
    next_notice_id: u64,
    next_question_id: u64,
}

impl MemStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reindex_user(&mut self, user: &User) {
        self.email_index.retain(|_, id| *id != user.id);
        for email in index_emails(user) {
            self.email_index.insert(email, user.id);
        }
    }
}

impl DocumentStore for MemStore {
    fn insert_user(&mut self, mut user: User) -> Result<UserId, TpoError> {
        let id = UserId(self.next_user_id);
        self.next_user_id = self.next_user_id.saturating_add(1);
        user.id = id;
        for email in index_emails(&user) {
            self.email_index.insert(email, id);
        }
        self.users.insert(id.0, user);
        Ok(id)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, TpoError> {
        Ok(self.users.get(&id.0).cloned())
    }

    fn put_user(&mut self, user: &User) -> Result<(), TpoError> {
        if !self.users.contains_key(&user.id.0) {
            return Err(TpoError::UserNotFound(user.id));
        }
        self.reindex_user(user);
        self.users.insert(user.id.0, user.clone());
        Ok(())
    }

    fn users(&self) -> Result<Vec<User>, TpoError> {
        Ok(self.users.values().cloned().collect())
    }

    fn user_id_by_email(&self, email: &str) -> Option<UserId> {
        self.email_index.get(email).copied()
    }

    fn insert_placement(&mut self, mut placement: Placement) -> Result<PlacementId, TpoError> {
        let id = PlacementId(self.next_placement_id);
        self.next_placement_id = self.next_placement_id.saturating_add(1);
        placement.id = id;
        self.placements.insert(id.0, placement);
        Ok(id)
    }

    fn placement(&self, id: PlacementId) -> Result<Option<Placement>, TpoError> {
        Ok(self.placements.get(&id.0).cloned())
    }

    fn put_placement(&mut self, placement: &Placement) -> Result<(), TpoError> {
        if !self.placements.contains_key(&placement.id.0) {
            return Err(TpoError::PlacementNotFound(placement.id));
        }
        self.placements.insert(placement.id.0, placement.clone());
        Ok(())
    }

    fn placements(&self) -> Result<Vec<Placement>, TpoError> {
        Ok(self.placements.values().cloned().collect())
    }

    fn insert_post(&mut self, mut post: Post) -> Result<PostId, TpoError> {
        let id = PostId(self.next_post_id);
        self.next_post_id = self.next_post_id.saturating_add(1);
        post.id = id;
        self.posts.insert(id.0, post);
        Ok(id)
    }

    fn posts(&self) -> Result<Vec<Post>, TpoError> {
        Ok(self.posts.values().cloned().collect())
    }

    fn insert_notice(&mut self, mut notice: Notice) -> Result<NoticeId, TpoError> {
        let id = NoticeId(self.next_notice_id);
        self.next_notice_id = self.next_notice_id.saturating_add(1);
        notice.id = id;
        self.notices.insert(id.0, notice);
        Ok(id)
    }

    fn notices(&self) -> Result<Vec<Notice>, TpoError> {
        Ok(self.notices.values().cloned().collect())
    }

    fn insert_question(&mut self, mut question: Question) -> Result<QuestionId, TpoError> {
        let id = QuestionId(self.next_question_id);
        self.next_question_id = self.next_question_id.saturating_add(1);
        question.id = id;
        self.questions.insert(id.0, question);
        Ok(id)
    }

    fn question(&self, id: QuestionId) -> Result<Option<Question>, TpoError> {
        Ok(self.questions.get(&id.0).cloned())
    }

    fn put_question(&mut self, question: &Question) -> Result<(), TpoError> {
        if !self.questions.contains_key(&question.id.0) {
            return Err(TpoError::QuestionNotFound(question.id));
        }
        self.questions.insert(question.id.0, question.clone());
        Ok(())
    }

    fn remove_question(&mut self, id: QuestionId) -> Result<bool, TpoError> {
        Ok(self.questions.remove(&id.0).is_some())
    }

    fn questions(&self) -> Result<Vec<Question>, TpoError> {
        Ok(self.questions.values().cloned().collect())
    }

    fn counts(&self) -> Result<StoreCounts, TpoError> {
        Ok(StoreCounts {
            users: self.users.len(),
            placements: self.placements.len(),
            posts: self.posts.len(),
            notices: self.notices.len(),
            questions: self.questions.len(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompanyProfile, ConcernedPerson, StudentProfile};

    fn student(email: &str) -> User {
        User {
            id: UserId(0),
            email: email.to_string(),
            password_hash: None,
            profile_completed: false,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Student(StudentProfile::default()),
        }
    }

    fn company(email: &str, person_email: &str) -> User {
        User {
            id: UserId(0),
            email: email.to_string(),
            password_hash: None,
            profile_completed: true,
            approved_date: None,
            rejections: Vec::new(),
            profile: Profile::Company(CompanyProfile {
                company_name: "Acme".to_string(),
                website: String::new(),
                address: String::new(),
                concerned_person: ConcernedPerson {
                    name: "Priya".to_string(),
                    position: "HR".to_string(),
                    email: person_email.to_string(),
                    contact: String::new(),
                },
            }),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut store = MemStore::new();
        let a = store.insert_user(student("a@campus.edu")).expect("insert");
        let b = store.insert_user(student("b@campus.edu")).expect("insert");
        assert_eq!(a, UserId(0));
        assert_eq!(b, UserId(1));
        assert_eq!(store.counts().expect("counts").users, 2);
    }

    #[test]
    fn email_index_covers_concerned_person() {
        let mut store = MemStore::new();
        let id = store
            .insert_user(company("hr@acme.example", "priya@acme.example"))
            .expect("insert");
        assert_eq!(store.user_id_by_email("hr@acme.example"), Some(id));
        assert_eq!(store.user_id_by_email("priya@acme.example"), Some(id));
        assert_eq!(store.user_id_by_email("nobody@acme.example"), None);
    }

    #[test]
    fn put_user_refreshes_the_email_index() {
        let mut store = MemStore::new();
        let id = store
            .insert_user(company("hr@acme.example", "priya@acme.example"))
            .expect("insert");

        let mut updated = store.user(id).expect("get").expect("present");
        if let Profile::Company(c) = &mut updated.profile {
            c.concerned_person.email = "arjun@acme.example".to_string();
        }
        store.put_user(&updated).expect("put");

        assert_eq!(store.user_id_by_email("arjun@acme.example"), Some(id));
        assert_eq!(store.user_id_by_email("priya@acme.example"), None);
    }

    #[test]
    fn put_unknown_user_is_an_error() {
        let mut store = MemStore::new();
        let mut ghost = student("ghost@campus.edu");
        ghost.id = UserId(42);
        assert!(matches!(
            store.put_user(&ghost),
            Err(TpoError::UserNotFound(UserId(42)))
        ));
    }

    #[test]
    fn remove_question_reports_presence() {
        let mut store = MemStore::new();
        let owner = store.insert_user(student("a@campus.edu")).expect("insert");
        let qid = store
            .insert_question(Question {
                id: QuestionId(0),
                user_id: owner,
                text: "When does the drive open?".to_string(),
                answer: None,
                created_at: chrono::DateTime::UNIX_EPOCH,
            })
            .expect("insert");

        assert!(store.remove_question(qid).expect("remove"));
        assert!(!store.remove_question(qid).expect("remove again"));
    }
}
