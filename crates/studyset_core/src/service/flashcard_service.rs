//! Flashcard set use-case service.
//!
//! # Responsibility
//! - Provide set create/remove and card add/remove APIs.
//! - Emit metadata-only log events for flashcard mutations.
//!
//! # Invariants
//! - `remove_card` returns exactly the removed card.
//! - Manual cards are stored as entered; generated cards are validated
//!   upstream by the generation contract.

use crate::model::card::{Card, CardDraft, CardId};
use crate::model::content_set::{ContentSet, SetId};
use crate::repo::flashcard_repo::FlashcardRepository;
use crate::repo::RepoResult;
use crate::service::log_write;
use std::time::Instant;

/// Flashcard service facade over repository implementations.
pub struct FlashcardService<R: FlashcardRepository> {
    repo: R,
}

impl<R: FlashcardRepository> FlashcardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a set seeded with `cards` and returns its id.
    pub fn create_set(&self, owner: &str, name: &str, cards: &[CardDraft]) -> RepoResult<SetId> {
        let started_at = Instant::now();
        let result = self.repo.create_set(owner, name, cards);
        log_write("flashcard_set_create", started_at, &result);
        result
    }

    /// Removes a set and all of its cards.
    pub fn remove_set(&self, owner: &str, name: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.remove_set(owner, name);
        log_write("flashcard_set_remove", started_at, &result);
        result
    }

    pub fn add_card(
        &self,
        owner: &str,
        name: &str,
        question: &str,
        answer: &str,
    ) -> RepoResult<CardId> {
        let started_at = Instant::now();
        let result = self.repo.add_card(owner, name, question, answer);
        log_write("card_add", started_at, &result);
        result
    }

    pub fn remove_card(&self, owner: &str, name: &str, card_id: CardId) -> RepoResult<Card> {
        let started_at = Instant::now();
        let result = self.repo.remove_card(owner, name, card_id);
        log_write("card_remove", started_at, &result);
        result
    }

    pub fn get_set(&self, owner: &str, name: &str) -> RepoResult<ContentSet> {
        self.repo.get_set(owner, name)
    }

    pub fn list_sets(&self, owner: &str) -> RepoResult<Vec<ContentSet>> {
        self.repo.list_sets(owner)
    }

    pub fn get_sets_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>> {
        self.repo.get_sets_by_ids(ids)
    }
}
