//! Note-to-flashcard generation use-case service.
//!
//! # Responsibility
//! - Look up the owner's note, call the generation client and apply the
//!   response contract.
//! - Optionally persist the generated cards as a new flashcard set.
//!
//! # Invariants
//! - The store lock is released before the blocking client call.
//! - A blank note body yields zero cards without calling the client.
//! - The first failing step decides the error; there is no partial success.

use crate::generation::client::{ClientError, GenerationClient};
use crate::generation::contract::{parse_and_validate, ContractError, GeneratedCards};
use crate::generation::prompt::{build_prompt_for_domain, DEFAULT_STUDY_DOMAIN};
use crate::model::content_set::SetId;
use crate::repo::flashcard_repo::{FlashcardRepository, SqliteFlashcardRepository};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::RepoError;
use crate::store::Store;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Error kinds visible to callers of the generation use-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    NotFound,
    DuplicateName,
    Parse,
    Schema,
    LimitExceeded,
    EmptyField,
    FieldTooLong,
    Service,
    Storage,
}

/// Generation use-case error.
#[derive(Debug)]
pub enum GenerationError {
    /// No note with `(owner, name)` exists.
    NoteNotFound { owner: String, name: String },
    /// Generation service failed; not retried.
    Service(ClientError),
    /// Service output violated the response contract.
    Contract(ContractError),
    /// Store failure other than a missing note.
    Repo(RepoError),
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::NoteNotFound { .. } => GenerationErrorKind::NotFound,
            Self::Service(_) => GenerationErrorKind::Service,
            Self::Contract(ContractError::Parse(_)) => GenerationErrorKind::Parse,
            Self::Contract(ContractError::Schema(_)) => GenerationErrorKind::Schema,
            Self::Contract(ContractError::LimitExceeded { .. }) => {
                GenerationErrorKind::LimitExceeded
            }
            Self::Contract(ContractError::EmptyField { .. }) => GenerationErrorKind::EmptyField,
            Self::Contract(ContractError::FieldTooLong { .. }) => {
                GenerationErrorKind::FieldTooLong
            }
            Self::Repo(RepoError::DuplicateName { .. }) => GenerationErrorKind::DuplicateName,
            Self::Repo(_) => GenerationErrorKind::Storage,
        }
    }

    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoteNotFound { .. } => "not_found",
            Self::Service(_) => "service_error",
            Self::Contract(err) => err.code(),
            Self::Repo(err) => err.code(),
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound { owner, name } => {
                write!(f, "no note with name '{name}' found for user '{owner}'")
            }
            Self::Service(err) => write!(f, "flashcard generation failed: {err}"),
            Self::Contract(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoteNotFound { .. } => None,
            Self::Service(err) => Some(err),
            Self::Contract(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ClientError> for GenerationError {
    fn from(value: ClientError) -> Self {
        Self::Service(value)
    }
}

impl From<ContractError> for GenerationError {
    fn from(value: ContractError) -> Self {
        Self::Contract(value)
    }
}

impl From<RepoError> for GenerationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { owner, name, .. } => Self::NoteNotFound { owner, name },
            other => Self::Repo(other),
        }
    }
}

/// Generation facade over one store instance and one client.
pub struct GenerationService<'s, C: GenerationClient> {
    store: &'s Store,
    client: C,
    domain: String,
}

impl<'s, C: GenerationClient> GenerationService<'s, C> {
    pub fn new(store: &'s Store, client: C) -> Self {
        Self {
            store,
            client,
            domain: DEFAULT_STUDY_DOMAIN.to_string(),
        }
    }

    /// Overrides the study domain named in the prompt.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Generates validated flashcards from the note `(owner, name)`.
    ///
    /// # Errors
    /// - `NoteNotFound` when the note does not exist.
    /// - `Service` when the client call fails.
    /// - `Contract` when the response violates the card contract.
    pub fn generate_flashcards(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<GeneratedCards, GenerationError> {
        let started_at = Instant::now();
        let result = self.run(owner, name);
        match &result {
            Ok(generated) => info!(
                "event=generate_flashcards module=generation status=ok cards={} duration_ms={}",
                generated.cards.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=generate_flashcards module=generation status=error duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }

    /// Generates flashcards from a note and stores them as a new set.
    ///
    /// Nothing is written when generation fails. An existing set named
    /// `set_name` surfaces as `Repo(DuplicateName)`.
    pub fn generate_into_set(
        &self,
        owner: &str,
        note_name: &str,
        set_name: &str,
    ) -> Result<SetId, GenerationError> {
        let generated = self.generate_flashcards(owner, note_name)?;
        let conn = self.store.connection();
        let set_id = SqliteFlashcardRepository::new(&conn)
            .create_set(owner, set_name, &generated.cards)
            .map_err(GenerationError::Repo)?;
        Ok(set_id)
    }

    fn run(&self, owner: &str, name: &str) -> Result<GeneratedCards, GenerationError> {
        let note = {
            let conn = self.store.connection();
            SqliteNoteRepository::new(&conn).get_note(owner, name)?
        };
        let body = note.body().unwrap_or_default();

        if body.trim().is_empty() {
            return Ok(GeneratedCards::default());
        }

        let prompt = build_prompt_for_domain(&self.domain, body);
        let raw = self.client.generate(&prompt)?;
        Ok(parse_and_validate(&raw)?)
    }
}
