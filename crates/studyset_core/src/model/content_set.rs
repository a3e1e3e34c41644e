//! Content set domain model.
//!
//! # Responsibility
//! - Define the owner-scoped named container shared by notes and flashcard sets.
//! - Validate set identity fields before persistence.
//!
//! # Invariants
//! - `name` is non-empty after trimming.
//! - `payload` variant always matches the set's `ContentKind`.

use crate::model::card::Card;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a content set.
pub type SetId = Uuid;

/// Which family of content sets a record belongs to.
///
/// Name uniqueness and search indexes are both scoped per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Free-text note.
    Note,
    /// Ordered collection of question/answer cards.
    FlashcardSet,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::FlashcardSet => "flashcard_set",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content carried by a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Note { body: String },
    Cards { cards: Vec<Card> },
}

/// Owner-scoped named content set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSet {
    pub id: SetId,
    /// Opaque owner id, already verified by the caller.
    pub owner: String,
    pub name: String,
    pub payload: Payload,
}

impl ContentSet {
    pub fn kind(&self) -> ContentKind {
        match self.payload {
            Payload::Note { .. } => ContentKind::Note,
            Payload::Cards { .. } => ContentKind::FlashcardSet,
        }
    }

    /// Note body, or `None` for flashcard sets.
    pub fn body(&self) -> Option<&str> {
        match &self.payload {
            Payload::Note { body } => Some(body.as_str()),
            Payload::Cards { .. } => None,
        }
    }

    /// Cards in insertion order; empty for notes.
    pub fn cards(&self) -> &[Card] {
        match &self.payload {
            Payload::Cards { cards } => cards.as_slice(),
            Payload::Note { .. } => &[],
        }
    }
}

/// Identity-field validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValidationError {
    EmptyName,
}

impl Display for SetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "content set name must not be blank"),
        }
    }
}

impl Error for SetValidationError {}

/// Validates a set name before the set is created.
///
/// Owners are opaque and trusted, so only the name is checked.
pub fn validate_name(name: &str) -> Result<(), SetValidationError> {
    if name.trim().is_empty() {
        return Err(SetValidationError::EmptyName);
    }
    Ok(())
}
