//! Full-text search over content set names.
//!
//! # Responsibility
//! - Build one FTS5 index per content kind, lazily and exactly once per store.
//! - Translate user search terms into FTS5 expressions and rank hits.
//!
//! # Invariants
//! - A blank term returns no hits, never "match all".
//! - Hits are ordered by score descending, then set id ascending.

pub mod fts;
pub mod index;
