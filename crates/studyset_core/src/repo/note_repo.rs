//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/remove/get/list APIs for free-text notes.
//! - Keep note SQL inside the persistence boundary.
//!
//! # Invariants
//! - `(owner, name)` is unique; the second create returns `DuplicateName`
//!   and leaves the table unchanged.
//! - Owner listings are ordered by `created_at ASC, seq ASC`.

use crate::model::content_set::{validate_name, ContentKind, ContentSet, Payload, SetId};
use crate::repo::{map_insert_error, parse_uuid, unique_ids, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT id, owner, name, body FROM notes";

/// Repository interface for note sets.
pub trait NoteRepository {
    /// Creates one note and returns its fresh id.
    fn create_note(&self, owner: &str, name: &str, body: &str) -> RepoResult<SetId>;
    /// Deletes the note addressed by `(owner, name)`.
    fn remove_note(&self, owner: &str, name: &str) -> RepoResult<()>;
    fn get_note(&self, owner: &str, name: &str) -> RepoResult<ContentSet>;
    fn list_notes(&self, owner: &str) -> RepoResult<Vec<ContentSet>>;
    /// Loads notes by id, silently skipping ids that do not exist.
    fn get_notes_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, owner: &str, name: &str, body: &str) -> RepoResult<SetId> {
        validate_name(name)?;

        if note_exists(self.conn, owner, name)? {
            return Err(RepoError::duplicate(ContentKind::Note, owner, name));
        }

        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO notes (id, owner, name, body) VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), owner, name, body],
            )
            .map_err(|err| map_insert_error(err, ContentKind::Note, owner, name))?;

        Ok(id)
    }

    fn remove_note(&self, owner: &str, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE owner = ?1 AND name = ?2;",
            params![owner, name],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ContentKind::Note, owner, name));
        }

        Ok(())
    }

    fn get_note(&self, owner: &str, name: &str) -> RepoResult<ContentSet> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE owner = ?1 AND name = ?2;"))?;
        let mut rows = stmt.query(params![owner, name])?;
        match rows.next()? {
            Some(row) => parse_note_row(row),
            None => Err(RepoError::not_found(ContentKind::Note, owner, name)),
        }
    }

    fn list_notes(&self, owner: &str) -> RepoResult<Vec<ContentSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE owner = ?1 ORDER BY created_at ASC, seq ASC;"
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_notes_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut notes = Vec::new();
        for id in unique_ids(ids) {
            let mut rows = stmt.query([id.to_string()])?;
            if let Some(row) = rows.next()? {
                notes.push(parse_note_row(row)?);
            }
        }
        Ok(notes)
    }
}

/// Decodes a row carrying `id, owner, name, body` columns.
pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<ContentSet> {
    let id_text: String = row.get("id")?;
    Ok(ContentSet {
        id: parse_uuid(&id_text, "notes.id")?,
        owner: row.get("owner")?,
        name: row.get("name")?,
        payload: Payload::Note {
            body: row.get("body")?,
        },
    })
}

fn note_exists(conn: &Connection, owner: &str, name: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM notes WHERE owner = ?1 AND name = ?2;",
            params![owner, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}
