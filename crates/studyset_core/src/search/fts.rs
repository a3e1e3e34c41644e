//! SQLite FTS5-based ranked search over set names.
//!
//! # Responsibility
//! - Translate free-form search terms into safe FTS5 match expressions.
//! - Return typed hits carrying the full content set and a relevance score.
//!
//! # Invariants
//! - User text never reaches FTS5 unescaped; every token is a quoted string.
//! - Scores are `-bm25`, clamped to be non-negative.
//! - Result ordering is deterministic: score descending, then set id ascending.

use crate::db::{tables_for, DbError};
use crate::model::content_set::{ContentKind, ContentSet};
use crate::repo::flashcard_repo::parse_set_row;
use crate::repo::note_repo::parse_note_row;
use crate::repo::RepoError;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

static QUERY_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)"?|([^\s"]+)"#).expect("valid query token regex"));

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for index builds, queries and hit decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Translated expression was rejected by FTS5.
    InvalidQuery {
        query: String,
        message: String,
    },
    /// Index build failed for this attempt; a later call retries.
    IndexBuild {
        kind: ContentKind,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl SearchError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => "invalid_query",
            Self::IndexBuild { .. } => "index_build_failed",
            Self::Db(err) => err.code(),
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::IndexBuild { kind, message } => {
                write!(f, "failed to build {kind} search index: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Single ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Full projection of the matched set, cards included for flashcard sets.
    pub set: ContentSet,
    /// Non-negative relevance; higher is better.
    pub score: f64,
}

/// Structured form of a user search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTerm {
    /// Quoted phrases; all of them must match.
    pub phrases: Vec<String>,
    /// Loose words; any of them may match.
    pub words: Vec<String>,
    /// `-word` exclusions.
    pub excluded: Vec<String>,
}

impl ParsedTerm {
    /// Splits a raw term into phrases, words and exclusions.
    ///
    /// An unterminated quote runs to the end of the term. Tokens without any
    /// letter or digit are dropped because the tokenizer would discard them.
    pub fn parse(term: &str) -> Self {
        let mut parsed = Self::default();
        for caps in QUERY_TOKEN_RE.captures_iter(term) {
            if let Some(phrase) = caps.get(1) {
                let phrase = phrase.as_str().trim();
                if has_indexable_text(phrase) {
                    parsed.phrases.push(phrase.to_string());
                }
            } else if let Some(word) = caps.get(2) {
                let word = word.as_str();
                match word.strip_prefix('-') {
                    Some(rest) if has_indexable_text(rest) => {
                        parsed.excluded.push(rest.to_string())
                    }
                    Some(_) => {}
                    None if has_indexable_text(word) => parsed.words.push(word.to_string()),
                    None => {}
                }
            }
        }
        parsed
    }

    /// Builds the FTS5 match expression, or `None` when nothing can match.
    pub fn to_match_expression(&self) -> Option<String> {
        let positive = if self.phrases.is_empty() {
            self.words
                .iter()
                .map(|word| quote_fts_string(word))
                .collect::<Vec<_>>()
                .join(" OR ")
        } else {
            self.phrases
                .iter()
                .map(|phrase| quote_fts_string(phrase))
                .collect::<Vec<_>>()
                .join(" AND ")
        };

        if positive.is_empty() {
            return None;
        }

        let mut expr = format!("({positive})");
        for word in &self.excluded {
            expr = format!("({expr} NOT {})", quote_fts_string(word));
        }
        Some(expr)
    }
}

/// Runs a ranked name search for one content kind.
///
/// The caller must have built the index for `kind` first. Returns an empty
/// list for blank terms and for terms with no indexable words.
pub fn query_index(conn: &Connection, kind: ContentKind, term: &str) -> SearchResult<Vec<SearchHit>> {
    if term.trim().is_empty() {
        return Ok(Vec::new());
    }
    let Some(match_expr) = ParsedTerm::parse(term).to_match_expression() else {
        return Ok(Vec::new());
    };

    let tables = tables_for(kind);
    let columns = match kind {
        ContentKind::Note => "b.id AS id, b.owner AS owner, b.name AS name, b.body AS body",
        ContentKind::FlashcardSet => "b.id AS id, b.owner AS owner, b.name AS name",
    };
    let sql = format!(
        "SELECT {columns}, bm25({fts}) AS rank
         FROM {fts}
         JOIN {base} b ON b.seq = {fts}.rowid
         WHERE {fts} MATCH ?1
         ORDER BY rank ASC, b.id ASC;",
        fts = tables.fts,
        base = tables.base,
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query([match_expr.as_str()])
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(conn, kind, row)?);
    }

    // Clamping can merge distinct ranks; equal public scores fall back to id order.
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.set.id.to_string().cmp(&b.set.id.to_string()))
    });
    Ok(hits)
}

fn parse_search_hit(conn: &Connection, kind: ContentKind, row: &Row<'_>) -> SearchResult<SearchHit> {
    let rank: f64 = row.get("rank")?;
    let set = match kind {
        ContentKind::Note => parse_note_row(row)?,
        ContentKind::FlashcardSet => parse_set_row(conn, row)?,
    };
    Ok(SearchHit {
        set,
        score: score_from_rank(rank),
    })
}

fn score_from_rank(rank: f64) -> f64 {
    let score = -rank;
    if score > 0.0 {
        score
    } else {
        0.0
    }
}

fn has_indexable_text(value: &str) -> bool {
    value.chars().any(char::is_alphanumeric)
}

fn quote_fts_string(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
