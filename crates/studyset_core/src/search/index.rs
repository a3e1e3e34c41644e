//! Lazily built FTS5 index with single-flight initialization.
//!
//! # Responsibility
//! - Create the FTS5 table and sync triggers for one content kind.
//! - Guarantee that concurrent first callers share one build attempt.
//!
//! # Invariants
//! - At most one build runs per attempt; every caller attached to that
//!   attempt observes its outcome.
//! - A failed attempt is dropped so a later call starts a fresh one.
//! - After a successful build, triggers keep the index in step with every
//!   committed insert, rename and delete on the base table.

use crate::db::{tables_for, ContentTables};
use crate::model::content_set::ContentKind;
use crate::search::fts::{SearchError, SearchResult};
use log::{error, info};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

type BuildAttempt = Arc<OnceCell<Result<(), String>>>;

/// Per-store search index handle for one content kind.
pub struct SearchIndex {
    kind: ContentKind,
    attempt: Mutex<Option<BuildAttempt>>,
}

impl SearchIndex {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            attempt: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Returns whether a build attempt has completed successfully.
    pub fn is_ready(&self) -> bool {
        let slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(slot.as_ref().and_then(|cell| cell.get()), Some(Ok(())))
    }

    /// Builds the index on first use.
    ///
    /// `build` runs at most once per attempt, no matter how many threads
    /// call concurrently. The attempt slot is released before `build` runs,
    /// so callers wait on the attempt itself rather than on the slot.
    ///
    /// # Errors
    /// - `SearchError::IndexBuild` for the triggering caller and every caller
    ///   that attached to the same failed attempt.
    pub fn ensure_ready<F>(&self, build: F) -> SearchResult<()>
    where
        F: FnOnce() -> SearchResult<()>,
    {
        let attempt = {
            let mut slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slot.get_or_insert_with(|| Arc::new(OnceCell::new())))
        };

        let outcome = attempt.get_or_init(|| build().map_err(|err| err.to_string()));
        match outcome {
            Ok(()) => Ok(()),
            Err(message) => {
                let mut slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);
                if slot
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &attempt))
                {
                    *slot = None;
                }
                Err(SearchError::IndexBuild {
                    kind: self.kind,
                    message: message.clone(),
                })
            }
        }
    }
}

/// Creates the FTS5 table and triggers for `kind` and indexes all committed rows.
///
/// Safe to run against a database that already carries the index from an
/// earlier store instance; the contents are rebuilt from the base table.
pub fn build_index(conn: &Connection, kind: ContentKind) -> SearchResult<()> {
    let started_at = Instant::now();
    let tables = tables_for(kind);
    info!("event=search_index_build module=search status=start kind={kind}");

    let result = rebuild_in_transaction(conn, tables);

    match &result {
        Ok(()) => info!(
            "event=search_index_build module=search status=ok kind={kind} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=search_index_build module=search status=error kind={kind} duration_ms={} error_code=index_build_failed error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn rebuild_in_transaction(conn: &Connection, tables: ContentTables) -> SearchResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(&index_ddl(tables))?;
    tx.execute(
        &format!("INSERT INTO {fts} ({fts}) VALUES ('rebuild');", fts = tables.fts),
        [],
    )?;
    tx.commit()?;
    Ok(())
}

fn index_ddl(tables: ContentTables) -> String {
    let ContentTables { base, fts } = tables;
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {fts} USING fts5(
            name,
            content = '{base}',
            content_rowid = 'seq',
            tokenize = 'porter unicode61'
        );

        CREATE TRIGGER IF NOT EXISTS {fts}_ai AFTER INSERT ON {base} BEGIN
            INSERT INTO {fts} (rowid, name) VALUES (new.seq, new.name);
        END;

        CREATE TRIGGER IF NOT EXISTS {fts}_ad AFTER DELETE ON {base} BEGIN
            INSERT INTO {fts} ({fts}, rowid, name) VALUES ('delete', old.seq, old.name);
        END;

        CREATE TRIGGER IF NOT EXISTS {fts}_au AFTER UPDATE OF name ON {base} BEGIN
            INSERT INTO {fts} ({fts}, rowid, name) VALUES ('delete', old.seq, old.name);
            INSERT INTO {fts} (rowid, name) VALUES (new.seq, new.name);
        END;"
    )
}

#[cfg(test)]
mod tests {
    use super::SearchIndex;
    use crate::model::content_set::ContentKind;
    use crate::search::fts::SearchError;
    use std::cell::Cell;

    #[test]
    fn second_call_is_a_no_op() {
        let index = SearchIndex::new(ContentKind::Note);
        let builds = Cell::new(0);
        for _ in 0..3 {
            index
                .ensure_ready(|| {
                    builds.set(builds.get() + 1);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(builds.get(), 1);
        assert!(index.is_ready());
    }

    #[test]
    fn failed_build_is_retried_by_next_call() {
        let index = SearchIndex::new(ContentKind::FlashcardSet);
        let err = index
            .ensure_ready(|| Err(SearchError::InvalidData("disk full".to_string())))
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexBuild { .. }));
        assert!(!index.is_ready());

        index.ensure_ready(|| Ok(())).unwrap();
        assert!(index.is_ready());
    }
}
