//! SQLite storage bootstrap and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the content store.
//! - Apply schema migrations in deterministic order.
//! - Map each content kind to its base and full-text tables.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No content is read or written before migrations succeed.
//! - Full-text tables are not part of migrations; they are built lazily by
//!   `search::index::SearchIndex`.

use crate::model::content_set::ContentKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "db_error",
            Self::UnsupportedSchemaVersion { .. } => "db_unsupported_schema",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Table names backing one content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentTables {
    /// Base table holding `(owner, name)` rows.
    pub base: &'static str,
    /// FTS5 table indexing `base.name`.
    pub fts: &'static str,
}

pub(crate) fn tables_for(kind: ContentKind) -> ContentTables {
    match kind {
        ContentKind::Note => ContentTables {
            base: "notes",
            fts: "notes_fts",
        },
        ContentKind::FlashcardSet => ContentTables {
            base: "flashcard_sets",
            fts: "flashcard_sets_fts",
        },
    }
}

/// Returns whether `err` is a SQLite UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
