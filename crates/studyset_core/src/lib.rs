//! Core domain logic for studyset.
//! Owner-scoped notes and flashcard sets, ranked name search, and
//! note-to-flashcard generation behind a strict response contract.

pub mod db;
pub mod generation;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;

pub use db::{DbError, DbResult};
pub use generation::client::{ClientError, GeminiClient, GeminiConfig, GenerationClient};
pub use generation::contract::{parse_and_validate, ContractError, GeneratedCards};
pub use generation::prompt::{build_prompt, build_prompt_for_domain};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::card::{Card, CardDraft, CardId};
pub use model::content_set::{ContentKind, ContentSet, Payload, SetId};
pub use repo::flashcard_repo::{FlashcardRepository, SqliteFlashcardRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::{RepoError, RepoResult};
pub use search::fts::{SearchError, SearchHit, SearchResult};
pub use search::index::SearchIndex;
pub use service::flashcard_service::FlashcardService;
pub use service::generation_service::{GenerationError, GenerationErrorKind, GenerationService};
pub use service::note_service::NoteService;
pub use service::search_service::SearchService;
pub use store::Store;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
