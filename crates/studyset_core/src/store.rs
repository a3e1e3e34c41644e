//! Store instance: one database connection plus its lazily built search indexes.
//!
//! # Responsibility
//! - Own the SQLite connection shared by repositories and services.
//! - Own one `SearchIndex` per content kind for this instance.
//!
//! # Invariants
//! - `Store` is `Send + Sync`; the connection is serialized by a mutex.
//! - Index builds run at most once per successful attempt per instance.
//! - Never call `ensure_index_ready` while holding the guard returned by
//!   `connection`; the build acquires the same lock.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::content_set::ContentKind;
use crate::search::fts::SearchResult;
use crate::search::index::{build_index, SearchIndex};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Content store instance.
pub struct Store {
    conn: Mutex<Connection>,
    note_index: SearchIndex,
    flashcard_index: SearchIndex,
}

impl Store {
    /// Opens (and migrates) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens (and migrates) a private in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            note_index: SearchIndex::new(ContentKind::Note),
            flashcard_index: SearchIndex::new(ContentKind::FlashcardSet),
        }
    }

    /// Locks the connection for the duration of the returned guard.
    ///
    /// A panic while the lock was held does not make the store unusable;
    /// SQLite rolls back any transaction the panicking caller left open.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn search_index(&self, kind: ContentKind) -> &SearchIndex {
        match kind {
            ContentKind::Note => &self.note_index,
            ContentKind::FlashcardSet => &self.flashcard_index,
        }
    }

    /// Builds the search index for `kind` on first use.
    ///
    /// Concurrent first callers share one build; see [`SearchIndex::ensure_ready`].
    pub fn ensure_index_ready(&self, kind: ContentKind) -> SearchResult<()> {
        self.search_index(kind).ensure_ready(|| {
            let conn = self.connection();
            build_index(&conn, kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Store;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn store_can_be_shared_across_threads() {
        assert_send_sync::<Store>();
    }
}
