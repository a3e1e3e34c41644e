//! Domain model for owner-scoped content sets.
//!
//! # Responsibility
//! - Define the shared shape of notes and flashcard sets.
//! - Hold field-level validation rules used by write and generation paths.
//!
//! # Invariants
//! - `(owner, name)` identifies at most one set per `ContentKind`.
//! - Card ids are unique within their set and never reused.

pub mod card;
pub mod content_set;
