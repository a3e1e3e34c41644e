//! Repository layer for owner-scoped content sets.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per content kind.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - `(owner, name)` uniqueness is reported as `DuplicateName`, whether it is
//!   caught by the pre-check or by the UNIQUE constraint.
//! - Every mutation touches exactly one set and commits atomically.
//! - Read paths reject invalid persisted ids instead of masking them.

use crate::db::{is_unique_violation, DbError};
use crate::model::card::CardId;
use crate::model::content_set::{ContentKind, SetId, SetValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod flashcard_repo;
pub mod note_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for content set persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Validation(SetValidationError),
    Db(DbError),
    /// A set with the same `(owner, name)` already exists for this kind.
    DuplicateName {
        kind: ContentKind,
        owner: String,
        name: String,
    },
    /// No set with `(owner, name)` exists for this kind.
    NotFound {
        kind: ContentKind,
        owner: String,
        name: String,
    },
    /// The set exists but holds no card with this id.
    CardNotFound { name: String, card_id: CardId },
    InvalidData(String),
}

impl RepoError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Db(err) => err.code(),
            Self::DuplicateName { .. } => "duplicate_name",
            Self::NotFound { .. } | Self::CardNotFound { .. } => "not_found",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    /// Returns whether this error means the addressed set or card is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CardNotFound { .. })
    }

    pub(crate) fn duplicate(kind: ContentKind, owner: &str, name: &str) -> Self {
        Self::DuplicateName {
            kind,
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn not_found(kind: ContentKind, owner: &str, name: &str) -> Self {
        Self::NotFound {
            kind,
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateName { kind, owner, name } => {
                write!(f, "{kind} named '{name}' already exists for user {owner}")
            }
            Self::NotFound { kind, owner, name } => {
                write!(f, "{kind} named '{name}' not found for user {owner}")
            }
            Self::CardNotFound { name, card_id } => {
                write!(f, "card with id '{card_id}' not found in flashcard set '{name}'")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted content data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SetValidationError> for RepoError {
    fn from(value: SetValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps an insert failure, turning UNIQUE violations into `DuplicateName`.
pub(crate) fn map_insert_error(
    err: rusqlite::Error,
    kind: ContentKind,
    owner: &str,
    name: &str,
) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::duplicate(kind, owner, name);
    }
    err.into()
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

/// Deduplicates requested ids while keeping first-seen order.
pub(crate) fn unique_ids(ids: &[SetId]) -> Vec<SetId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
