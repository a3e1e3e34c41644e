//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/remove/get/list APIs for notes.
//! - Emit metadata-only log events for note mutations.
//!
//! # Invariants
//! - Note names are unique per owner; duplicates surface as `DuplicateName`.
//! - Removing a missing note surfaces `NotFound` and changes nothing.

use crate::model::content_set::{ContentSet, SetId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoResult;
use crate::service::log_write;
use std::time::Instant;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note and returns its id.
    pub fn create_note(&self, owner: &str, name: &str, body: &str) -> RepoResult<SetId> {
        let started_at = Instant::now();
        let result = self.repo.create_note(owner, name, body);
        log_write("note_create", started_at, &result);
        result
    }

    /// Removes the note addressed by `(owner, name)`.
    pub fn remove_note(&self, owner: &str, name: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.remove_note(owner, name);
        log_write("note_remove", started_at, &result);
        result
    }

    pub fn get_note(&self, owner: &str, name: &str) -> RepoResult<ContentSet> {
        self.repo.get_note(owner, name)
    }

    /// Lists all notes of `owner` in creation order.
    pub fn list_notes(&self, owner: &str) -> RepoResult<Vec<ContentSet>> {
        self.repo.list_notes(owner)
    }

    /// Loads notes by id; unknown ids are skipped.
    pub fn get_notes_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>> {
        self.repo.get_notes_by_ids(ids)
    }
}
