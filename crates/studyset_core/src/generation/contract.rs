//! Validation contract for generation responses.
//!
//! # Responsibility
//! - Extract the first balanced JSON object from untrusted model text.
//! - Validate shape, count and field content before building card drafts.
//!
//! # Invariants
//! - Checks run in a fixed order: parse, schema, count, field content.
//! - The first failing check decides the error; nothing is partially admitted.
//! - Returned drafts keep the model's text verbatim and satisfy
//!   `CardDraft::validate`.

use crate::model::card::{
    check_card_field, CardDraft, CardField, CardFieldError, MAX_CARD_FIELD_CHARS,
    MAX_GENERATED_CARDS,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validated generation output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedCards {
    pub cards: Vec<CardDraft>,
}

/// Contract violation in a generation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// No balanced JSON object, or the object is not valid JSON.
    Parse(String),
    /// Object shape or field types differ from the card schema.
    Schema(String),
    /// More cards than [`MAX_GENERATED_CARDS`].
    LimitExceeded { count: usize },
    /// Card field empty after trimming. `index` is zero-based.
    EmptyField { index: usize, field: CardField },
    /// Trimmed card field longer than [`MAX_CARD_FIELD_CHARS`].
    FieldTooLong {
        index: usize,
        field: CardField,
        chars: usize,
    },
}

impl ContractError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::Schema(_) => "schema_error",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::EmptyField { .. } => "empty_field",
            Self::FieldTooLong { .. } => "field_too_long",
        }
    }
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "failed to parse generation response: {message}"),
            Self::Schema(message) => write!(f, "invalid generation response shape: {message}"),
            Self::LimitExceeded { count } => write!(
                f,
                "generation returned {count} cards, exceeds limit of {MAX_GENERATED_CARDS}"
            ),
            Self::EmptyField { index, field } => write!(
                f,
                "card {} has an empty {}",
                index + 1,
                field.as_str()
            ),
            Self::FieldTooLong {
                index,
                field,
                chars,
            } => write!(
                f,
                "card {} {} has {chars} characters, maximum is {MAX_CARD_FIELD_CHARS}",
                index + 1,
                field.as_str()
            ),
        }
    }
}

impl Error for ContractError {}

/// Parses and validates raw model output into card drafts.
///
/// The model-supplied `id` is type-checked and then discarded; set-scoped ids
/// are assigned when cards are persisted.
pub fn parse_and_validate(raw_text: &str) -> Result<GeneratedCards, ContractError> {
    let block = first_balanced_object(raw_text)
        .ok_or_else(|| ContractError::Parse("no JSON object found in response".to_string()))?;
    let root: Value = serde_json::from_str(block)
        .map_err(|err| ContractError::Parse(err.to_string()))?;

    let items = root
        .get("cards")
        .and_then(Value::as_array)
        .ok_or_else(|| ContractError::Schema("missing `cards` array".to_string()))?;

    let mut fields = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        fields.push(card_fields(index, item)?);
    }

    if fields.len() > MAX_GENERATED_CARDS {
        return Err(ContractError::LimitExceeded {
            count: fields.len(),
        });
    }

    let mut cards = Vec::with_capacity(fields.len());
    for (index, (question, answer)) in fields.into_iter().enumerate() {
        cards.push(CardDraft::new(
            checked_field(index, CardField::Question, question)?,
            checked_field(index, CardField::Answer, answer)?,
        ));
    }

    Ok(GeneratedCards { cards })
}

fn card_fields(index: usize, item: &Value) -> Result<(&str, &str), ContractError> {
    let object: &Map<String, Value> = item
        .as_object()
        .ok_or_else(|| ContractError::Schema(format!("card {} is not an object", index + 1)))?;

    let id_ok = object
        .get("id")
        .is_some_and(|id| id.is_i64() || id.is_u64());
    if !id_ok {
        return Err(ContractError::Schema(format!(
            "card {} `id` must be an integer",
            index + 1
        )));
    }

    let question = string_field(index, object, "question")?;
    let answer = string_field(index, object, "answer")?;
    Ok((question, answer))
}

fn string_field<'v>(
    index: usize,
    object: &'v Map<String, Value>,
    key: &str,
) -> Result<&'v str, ContractError> {
    object.get(key).and_then(Value::as_str).ok_or_else(|| {
        ContractError::Schema(format!("card {} `{key}` must be a string", index + 1))
    })
}

fn checked_field<'v>(
    index: usize,
    field: CardField,
    value: &'v str,
) -> Result<&'v str, ContractError> {
    check_card_field(field, value).map_err(|err| match err {
        CardFieldError::Empty(field) => ContractError::EmptyField { index, field },
        CardFieldError::TooLong { field, chars } => ContractError::FieldTooLong {
            index,
            field,
            chars,
        },
    })?;
    Ok(value)
}

/// Returns the first `{...}` block whose braces balance.
///
/// Braces inside JSON string literals, including escaped quotes, do not count.
/// An opening brace that is never closed is skipped and the scan resumes at
/// the next one. Returns `None` when no block balances.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    text.match_indices('{')
        .find_map(|(start, _)| balanced_len(&text[start..]).map(|len| &text[start..start + len]))
}

/// Byte length of the balanced block opening at `text[0]`, if it closes.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}
