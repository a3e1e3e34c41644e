//! Flashcard set repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/remove/get/list APIs for flashcard sets.
//! - Own card insertion and removal inside one set.
//!
//! # Invariants
//! - Cards are ordered by `position`, assigned as `max(position) + 1` at insert.
//! - Removing a set removes its cards through `ON DELETE CASCADE`.
//! - `add_card` stores question/answer verbatim; content rules apply to the
//!   generation path only.

use crate::model::card::{Card, CardDraft, CardId};
use crate::model::content_set::{validate_name, ContentKind, ContentSet, Payload, SetId};
use crate::repo::{map_insert_error, parse_uuid, unique_ids, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const SET_SELECT_SQL: &str = "SELECT id, owner, name FROM flashcard_sets";

/// Repository interface for flashcard sets.
pub trait FlashcardRepository {
    /// Creates a set with initial cards; each draft receives a fresh card id.
    fn create_set(&self, owner: &str, name: &str, cards: &[CardDraft]) -> RepoResult<SetId>;
    /// Deletes a set together with all of its cards.
    fn remove_set(&self, owner: &str, name: &str) -> RepoResult<()>;
    /// Appends one card and returns its fresh id.
    fn add_card(&self, owner: &str, name: &str, question: &str, answer: &str)
        -> RepoResult<CardId>;
    /// Removes one card and returns the removed value.
    fn remove_card(&self, owner: &str, name: &str, card_id: CardId) -> RepoResult<Card>;
    fn get_set(&self, owner: &str, name: &str) -> RepoResult<ContentSet>;
    fn list_sets(&self, owner: &str) -> RepoResult<Vec<ContentSet>>;
    /// Loads sets by id, silently skipping ids that do not exist.
    fn get_sets_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>>;
}

/// SQLite-backed flashcard set repository.
pub struct SqliteFlashcardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFlashcardRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl FlashcardRepository for SqliteFlashcardRepository<'_> {
    fn create_set(&self, owner: &str, name: &str, cards: &[CardDraft]) -> RepoResult<SetId> {
        validate_name(name)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if set_id_in(&tx, owner, name)?.is_some() {
            return Err(RepoError::duplicate(ContentKind::FlashcardSet, owner, name));
        }

        let id = Uuid::new_v4();
        let id_text = id.to_string();
        tx.execute(
            "INSERT INTO flashcard_sets (id, owner, name) VALUES (?1, ?2, ?3);",
            params![id_text.as_str(), owner, name],
        )
        .map_err(|err| map_insert_error(err, ContentKind::FlashcardSet, owner, name))?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO cards (id, set_id, question, answer, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, draft) in cards.iter().enumerate() {
                let card = Card::from_draft(draft);
                insert.execute(params![
                    card.id.to_string(),
                    id_text.as_str(),
                    card.question,
                    card.answer,
                    position as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(id)
    }

    fn remove_set(&self, owner: &str, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM flashcard_sets WHERE owner = ?1 AND name = ?2;",
            params![owner, name],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ContentKind::FlashcardSet, owner, name));
        }

        Ok(())
    }

    fn add_card(
        &self,
        owner: &str,
        name: &str,
        question: &str,
        answer: &str,
    ) -> RepoResult<CardId> {
        let card_id = Uuid::new_v4();
        // Single statement: the set lookup and the append commit together.
        let changed = self.conn.execute(
            "INSERT INTO cards (id, set_id, question, answer, position)
             SELECT
                ?3,
                s.id,
                ?4,
                ?5,
                COALESCE((SELECT MAX(c.position) + 1 FROM cards c WHERE c.set_id = s.id), 0)
             FROM flashcard_sets s
             WHERE s.owner = ?1 AND s.name = ?2;",
            params![owner, name, card_id.to_string(), question, answer],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(ContentKind::FlashcardSet, owner, name));
        }

        Ok(card_id)
    }

    fn remove_card(&self, owner: &str, name: &str, card_id: CardId) -> RepoResult<Card> {
        let removed = self
            .conn
            .query_row(
                "DELETE FROM cards
                 WHERE id = ?3
                   AND set_id = (SELECT id FROM flashcard_sets WHERE owner = ?1 AND name = ?2)
                 RETURNING id, question, answer;",
                params![owner, name, card_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match removed {
            Some((id_text, question, answer)) => Ok(Card {
                id: parse_uuid(&id_text, "cards.id")?,
                question,
                answer,
            }),
            None if set_id_in(self.conn, owner, name)?.is_none() => Err(RepoError::not_found(
                ContentKind::FlashcardSet,
                owner,
                name,
            )),
            None => Err(RepoError::CardNotFound {
                name: name.to_string(),
                card_id,
            }),
        }
    }

    fn get_set(&self, owner: &str, name: &str) -> RepoResult<ContentSet> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SET_SELECT_SQL} WHERE owner = ?1 AND name = ?2;"))?;
        let mut rows = stmt.query(params![owner, name])?;
        match rows.next()? {
            Some(row) => parse_set_row(self.conn, row),
            None => Err(RepoError::not_found(ContentKind::FlashcardSet, owner, name)),
        }
    }

    fn list_sets(&self, owner: &str) -> RepoResult<Vec<ContentSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SET_SELECT_SQL} WHERE owner = ?1 ORDER BY created_at ASC, seq ASC;"
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next()? {
            sets.push(parse_set_row(self.conn, row)?);
        }
        Ok(sets)
    }

    fn get_sets_by_ids(&self, ids: &[SetId]) -> RepoResult<Vec<ContentSet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut sets = Vec::new();
        for id in unique_ids(ids) {
            let mut rows = stmt.query([id.to_string()])?;
            if let Some(row) = rows.next()? {
                sets.push(parse_set_row(self.conn, row)?);
            }
        }
        Ok(sets)
    }
}

/// Decodes a row carrying `id, owner, name` columns and loads its cards.
pub(crate) fn parse_set_row(conn: &Connection, row: &Row<'_>) -> RepoResult<ContentSet> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "flashcard_sets.id")?;
    Ok(ContentSet {
        id,
        owner: row.get("owner")?,
        name: row.get("name")?,
        payload: Payload::Cards {
            cards: load_cards(conn, &id_text)?,
        },
    })
}

fn load_cards(conn: &Connection, set_id: &str) -> RepoResult<Vec<Card>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, question, answer
         FROM cards
         WHERE set_id = ?1
         ORDER BY position ASC, rowid ASC;",
    )?;
    let mut rows = stmt.query([set_id])?;
    let mut cards = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        cards.push(Card {
            id: parse_uuid(&id_text, "cards.id")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
        });
    }
    Ok(cards)
}

fn set_id_in(conn: &Connection, owner: &str, name: &str) -> RepoResult<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM flashcard_sets WHERE owner = ?1 AND name = ?2;",
            params![owner, name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(id)
}
