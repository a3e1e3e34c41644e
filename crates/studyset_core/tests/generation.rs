use serde_json::json;
use std::cell::{Cell, RefCell};
use studyset_core::{
    ClientError, FlashcardRepository, GenerationClient, GenerationErrorKind, GenerationService,
    NoteRepository, RepoError, SqliteFlashcardRepository, SqliteNoteRepository, Store,
};

/// Returns a canned response and records every prompt it receives.
struct ScriptedClient {
    response: Result<String, String>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedClient {
    fn replying(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl GenerationClient for ScriptedClient {
    fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(ClientError::Provider {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

/// Records whether it was called; for paths that must not reach the service.
struct UnreachableClient {
    called: Cell<bool>,
}

impl GenerationClient for UnreachableClient {
    fn generate(&self, _prompt: &str) -> Result<String, ClientError> {
        self.called.set(true);
        Err(ClientError::EmptyResponse)
    }
}

fn store_with_note(name: &str, body: &str) -> Store {
    let store = Store::open_in_memory().unwrap();
    {
        let conn = store.connection();
        SqliteNoteRepository::new(&conn)
            .create_note("u1", name, body)
            .unwrap();
    }
    store
}

fn cards_response(count: usize) -> String {
    let cards: Vec<_> = (1..=count)
        .map(|id| json!({"id": id, "question": format!("Question {id}?"), "answer": format!("Answer {id}")}))
        .collect();
    json!({ "cards": cards }).to_string()
}

#[test]
fn empty_note_body_yields_zero_cards_without_calling_service() {
    let store = store_with_note("Blank", "  \n ");
    let client = UnreachableClient {
        called: Cell::new(false),
    };
    let service = GenerationService::new(&store, &client);

    let generated = service.generate_flashcards("u1", "Blank").unwrap();

    assert!(generated.cards.is_empty());
    assert!(!client.called.get());
}

#[test]
fn valid_response_is_returned_verbatim_in_order() {
    let store = store_with_note("Parsha", "Noach built an ark of gopher wood.");
    let raw = format!(
        "Here you go:\n{}\nThanks!",
        json!({"cards": [
            {"id": 1, "question": "  What did Noach build? ", "answer": "An ark\n"},
            {"id": 2, "question": "Of what wood?", "answer": "Gopher wood"}
        ]})
    );
    let client = ScriptedClient::replying(raw);
    let service = GenerationService::new(&store, &client);

    let generated = service.generate_flashcards("u1", "Parsha").unwrap();

    assert_eq!(generated.cards.len(), 2);
    assert_eq!(generated.cards[0].question, "  What did Noach build? ");
    assert_eq!(generated.cards[0].answer, "An ark\n");
    assert_eq!(generated.cards[1].answer, "Gopher wood");
    assert_eq!(client.calls(), 1);
}

#[test]
fn prompt_embeds_note_body_and_domain() {
    let store = store_with_note("Parsha", "Avraham welcomed guests.");
    let client = ScriptedClient::replying(r#"{"cards": []}"#);
    let service = GenerationService::new(&store, &client).with_domain("Talmud study");

    service.generate_flashcards("u1", "Parsha").unwrap();

    let prompts = client.prompts.borrow();
    assert!(prompts[0].contains("Avraham welcomed guests."));
    assert!(prompts[0].contains("Talmud study"));
}

#[test]
fn twenty_six_cards_exceed_the_limit() {
    let store = store_with_note("Long", "many facts");
    let client = ScriptedClient::replying(cards_response(26));

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Long")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::LimitExceeded);
    assert_eq!(err.code(), "limit_exceeded");
}

#[test]
fn twenty_five_cards_are_accepted() {
    let store = store_with_note("Long", "many facts");
    let client = ScriptedClient::replying(cards_response(25));

    let generated = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Long")
        .unwrap();

    assert_eq!(generated.cards.len(), 25);
}

#[test]
fn whitespace_answer_is_an_empty_field() {
    let store = store_with_note("Parsha", "text");
    let raw = json!({"cards": [{"id": 1, "question": "Q?", "answer": "   "}]}).to_string();
    let client = ScriptedClient::replying(raw);

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::EmptyField);
}

#[test]
fn overlong_question_is_rejected() {
    let store = store_with_note("Parsha", "text");
    let raw = json!({"cards": [{"id": 1, "question": "x".repeat(2001), "answer": "A"}]}).to_string();
    let client = ScriptedClient::replying(raw);

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::FieldTooLong);
}

#[test]
fn stray_brace_before_the_object_is_skipped() {
    let store = store_with_note("Parsha", "text");
    let raw = format!(
        "Sets use the {{ symbol.\n{}",
        json!({"cards": [{"id": 1, "question": "Q?", "answer": "A"}]})
    );
    let client = ScriptedClient::replying(raw);

    let generated = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap();

    assert_eq!(generated.cards.len(), 1);
    assert_eq!(generated.cards[0].question, "Q?");
}

#[test]
fn unparsable_text_is_a_parse_error() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::replying("I cannot help with that.");

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::Parse);
}

#[test]
fn wrong_field_types_are_a_schema_error() {
    let store = store_with_note("Parsha", "text");
    let raw = json!({"cards": [{"id": "1", "question": "Q?", "answer": "A"}]}).to_string();
    let client = ScriptedClient::replying(raw);

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::Schema);
}

#[test]
fn service_failure_is_reported_without_retry() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::failing("overloaded");

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::Service);
    assert_eq!(err.code(), "service_error");
    assert_eq!(client.calls(), 1);
}

#[test]
fn missing_note_is_not_found_and_service_is_not_called() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::replying(cards_response(1));

    let err = GenerationService::new(&store, &client)
        .generate_flashcards("u2", "Parsha")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::NotFound);
    assert_eq!(client.calls(), 0);
}

#[test]
fn generated_cards_satisfy_manual_card_rules() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::replying(cards_response(5));

    let generated = GenerationService::new(&store, &client)
        .generate_flashcards("u1", "Parsha")
        .unwrap();

    for card in &generated.cards {
        card.validate().unwrap();
    }
}

#[test]
fn generate_into_set_persists_cards() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::replying(cards_response(3));
    let service = GenerationService::new(&store, &client);

    let set_id = service
        .generate_into_set("u1", "Parsha", "Parsha Cards")
        .unwrap();

    let conn = store.connection();
    let set = SqliteFlashcardRepository::new(&conn)
        .get_set("u1", "Parsha Cards")
        .unwrap();
    assert_eq!(set.id, set_id);
    let questions: Vec<&str> = set.cards().iter().map(|c| c.question.as_str()).collect();
    assert_eq!(questions, vec!["Question 1?", "Question 2?", "Question 3?"]);
}

#[test]
fn generate_into_existing_set_name_is_a_duplicate() {
    let store = store_with_note("Parsha", "text");
    {
        let conn = store.connection();
        SqliteFlashcardRepository::new(&conn)
            .create_set("u1", "Parsha Cards", &[])
            .unwrap();
    }
    let client = ScriptedClient::replying(cards_response(2));

    let err = GenerationService::new(&store, &client)
        .generate_into_set("u1", "Parsha", "Parsha Cards")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::DuplicateName);
    let conn = store.connection();
    let set = SqliteFlashcardRepository::new(&conn)
        .get_set("u1", "Parsha Cards")
        .unwrap();
    assert!(set.cards().is_empty());
}

#[test]
fn failed_generation_writes_nothing() {
    let store = store_with_note("Parsha", "text");
    let client = ScriptedClient::replying("not json");

    let err = GenerationService::new(&store, &client)
        .generate_into_set("u1", "Parsha", "Parsha Cards")
        .unwrap_err();

    assert_eq!(err.kind(), GenerationErrorKind::Parse);
    let conn = store.connection();
    let missing = SqliteFlashcardRepository::new(&conn)
        .get_set("u1", "Parsha Cards")
        .unwrap_err();
    assert!(matches!(missing, RepoError::NotFound { .. }));
    assert_eq!(
        SqliteNoteRepository::new(&conn).list_notes("u1").unwrap().len(),
        1
    );
}
