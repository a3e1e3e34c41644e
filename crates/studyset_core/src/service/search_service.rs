//! Ranked search use-case service.

use crate::model::content_set::ContentKind;
use crate::search::fts::{query_index, SearchHit, SearchResult};
use crate::store::Store;
use log::{info, warn};
use std::time::Instant;

/// Search facade over one store instance.
pub struct SearchService<'s> {
    store: &'s Store,
}

impl<'s> SearchService<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Searches set names of `kind`, building the index on first use.
    ///
    /// Returns an empty list for a blank `term`. Index build failures are
    /// returned to every caller waiting on that build.
    pub fn search(&self, kind: ContentKind, term: &str) -> SearchResult<Vec<SearchHit>> {
        let started_at = Instant::now();
        let result = self.store.ensure_index_ready(kind).and_then(|()| {
            let conn = self.store.connection();
            query_index(&conn, kind, term)
        });

        match &result {
            Ok(hits) => info!(
                "event=search module=search status=ok kind={kind} term_chars={} hits={} duration_ms={}",
                term.chars().count(),
                hits.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=search module=search status=error kind={kind} duration_ms={} error_code={}",
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }

    pub fn search_notes(&self, term: &str) -> SearchResult<Vec<SearchHit>> {
        self.search(ContentKind::Note, term)
    }

    pub fn search_flashcard_sets(&self, term: &str) -> SearchResult<Vec<SearchHit>> {
        self.search(ContentKind::FlashcardSet, term)
    }
}
