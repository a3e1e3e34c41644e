//! Flashcard model.
//!
//! # Responsibility
//! - Define persisted cards and id-less card drafts.
//! - Own the content limits that generated cards must satisfy.
//!
//! # Invariants
//! - A persisted `Card` keeps its `id` for its whole lifetime.
//! - Cards are created and removed, never edited in place.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one card inside a flashcard set.
pub type CardId = Uuid;

/// Maximum length of a question or answer, counted in characters.
pub const MAX_CARD_FIELD_CHARS: usize = 2000;

/// Maximum number of cards accepted from one generation response.
pub const MAX_GENERATED_CARDS: usize = 25;

/// Persisted flashcard embedded in a flashcard set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub question: String,
    pub answer: String,
}

impl Card {
    /// Materializes a draft with a freshly generated id.
    pub fn from_draft(draft: &CardDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: draft.question.clone(),
            answer: draft.answer.clone(),
        }
    }
}

/// Question/answer pair that has not been assigned a card id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub question: String,
    pub answer: String,
}

impl CardDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Checks the content rules enforced on generated cards.
    ///
    /// Manual card entry skips this check.
    pub fn validate(&self) -> Result<(), CardFieldError> {
        check_card_field(CardField::Question, &self.question)?;
        check_card_field(CardField::Answer, &self.answer)
    }
}

/// Which side of a card a field error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Question,
    Answer,
}

impl CardField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

/// Content rule violation for one card field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFieldError {
    /// Field is empty after trimming.
    Empty(CardField),
    /// Trimmed field is longer than [`MAX_CARD_FIELD_CHARS`].
    TooLong { field: CardField, chars: usize },
}

impl Display for CardFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "card {} must not be empty", field.as_str()),
            Self::TooLong { field, chars } => write!(
                f,
                "card {} has {chars} characters, maximum is {MAX_CARD_FIELD_CHARS}",
                field.as_str()
            ),
        }
    }
}

impl Error for CardFieldError {}

/// Checks one question or answer: non-empty after trimming and at most
/// [`MAX_CARD_FIELD_CHARS`] characters once trimmed.
pub fn check_card_field(field: CardField, value: &str) -> Result<(), CardFieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CardFieldError::Empty(field));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_CARD_FIELD_CHARS {
        return Err(CardFieldError::TooLong { field, chars });
    }
    Ok(())
}
