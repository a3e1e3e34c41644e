use studyset_core::{
    CardDraft, ContentKind, FlashcardRepository, NoteRepository, SearchHit, SearchService,
    SqliteFlashcardRepository, SqliteNoteRepository, Store,
};

fn store_with_sets(names: &[&str]) -> Store {
    let store = Store::open_in_memory().unwrap();
    {
        let conn = store.connection();
        let repo = SqliteFlashcardRepository::new(&conn);
        for name in names {
            repo.create_set("u1", name, &[CardDraft::new("q", "a")])
                .unwrap();
        }
    }
    store
}

fn names(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.set.name.as_str()).collect()
}

fn assert_sorted(hits: &[SearchHit]) {
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        if pair[0].score == pair[1].score {
            assert!(pair[0].set.id < pair[1].set.id);
        }
    }
}

#[test]
fn empty_term_returns_empty_list() {
    let store = store_with_sets(&["Math Concepts for Beginners"]);
    let service = SearchService::new(&store);

    assert!(service.search_flashcard_sets("").unwrap().is_empty());
    assert!(service.search_flashcard_sets("   ").unwrap().is_empty());
    assert!(service.search_notes("").unwrap().is_empty());
}

#[test]
fn word_search_matches_whole_tokens_only() {
    let store = store_with_sets(&[
        "Math Concepts for Beginners",
        "Advanced Math Problems",
        "History of Ancient Greece",
        "Mathematics Fundamentals",
    ]);

    let hits = SearchService::new(&store)
        .search_flashcard_sets("Math")
        .unwrap();

    let mut found = names(&hits);
    found.sort_unstable();
    assert_eq!(
        found,
        vec!["Advanced Math Problems", "Math Concepts for Beginners"]
    );
    assert!(hits.iter().all(|hit| hit.score >= 0.0));
    assert_sorted(&hits);
}

#[test]
fn quoted_phrase_is_stricter_than_words() {
    let store = store_with_sets(&[
        "Introduction to Computer Science",
        "Computer Programming Basics",
    ]);
    let service = SearchService::new(&store);

    let phrase_hits = service
        .search_flashcard_sets("\"Computer Science\"")
        .unwrap();
    assert_eq!(names(&phrase_hits), vec!["Introduction to Computer Science"]);

    let word_hits = service.search_flashcard_sets("Computer Science").unwrap();
    assert_eq!(word_hits.len(), 2);
    assert_eq!(word_hits[0].set.name, "Introduction to Computer Science");
}

#[test]
fn stemmed_search_matches_inflected_name() {
    let store = store_with_sets(&["Effective Software Development", "Cooking"]);

    let hits = SearchService::new(&store)
        .search_flashcard_sets("develop")
        .unwrap();

    assert_eq!(names(&hits), vec!["Effective Software Development"]);
}

#[test]
fn exclusions_filter_matches() {
    let store = store_with_sets(&["Advanced Math Problems", "Math Concepts for Beginners"]);
    let service = SearchService::new(&store);

    let hits = service.search_flashcard_sets("math -advanced").unwrap();
    assert_eq!(names(&hits), vec!["Math Concepts for Beginners"]);

    assert!(service.search_flashcard_sets("-math").unwrap().is_empty());
}

#[test]
fn punctuation_only_term_returns_empty_list() {
    let store = store_with_sets(&["Math"]);

    let hits = SearchService::new(&store)
        .search_flashcard_sets("*** ( \"")
        .unwrap();

    assert!(hits.is_empty());
}

#[test]
fn flashcard_hits_carry_cards() {
    let store = store_with_sets(&["Biology Basics"]);

    let hits = SearchService::new(&store)
        .search_flashcard_sets("biology")
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].set.kind(), ContentKind::FlashcardSet);
    assert_eq!(hits[0].set.owner, "u1");
    assert_eq!(hits[0].set.cards().len(), 1);
    assert_eq!(hits[0].set.cards()[0].question, "q");
}

#[test]
fn note_hits_carry_body() {
    let store = Store::open_in_memory().unwrap();
    {
        let conn = store.connection();
        SqliteNoteRepository::new(&conn)
            .create_note("u1", "Parsha Notes", "Bereshit summary")
            .unwrap();
    }

    let hits = SearchService::new(&store).search_notes("parsha").unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].set.body(), Some("Bereshit summary"));
    assert!(SearchService::new(&store)
        .search_flashcard_sets("parsha")
        .unwrap()
        .is_empty());
}

#[test]
fn index_reflects_writes_after_first_build() {
    let store = store_with_sets(&["Algebra"]);
    let service = SearchService::new(&store);
    assert_eq!(service.search_flashcard_sets("geometry").unwrap().len(), 0);
    assert!(store.search_index(ContentKind::FlashcardSet).is_ready());

    {
        let conn = store.connection();
        let repo = SqliteFlashcardRepository::new(&conn);
        repo.create_set("u2", "Geometry Proofs", &[]).unwrap();
        repo.remove_set("u1", "Algebra").unwrap();
    }

    assert_eq!(
        names(&service.search_flashcard_sets("geometry").unwrap()),
        vec!["Geometry Proofs"]
    );
    assert!(service.search_flashcard_sets("algebra").unwrap().is_empty());
}

#[test]
fn adding_cards_does_not_disturb_the_index() {
    let store = store_with_sets(&["Chemistry"]);
    let service = SearchService::new(&store);
    assert_eq!(service.search_flashcard_sets("chemistry").unwrap().len(), 1);

    {
        let conn = store.connection();
        SqliteFlashcardRepository::new(&conn)
            .add_card("u1", "Chemistry", "H2O?", "Water")
            .unwrap();
    }

    let hits = service.search_flashcard_sets("chemistry").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].set.cards().len(), 2);
}

#[test]
fn equal_scores_are_ordered_by_id() {
    let store = Store::open_in_memory().unwrap();
    {
        let conn = store.connection();
        let repo = SqliteNoteRepository::new(&conn);
        for owner in ["u1", "u2", "u3", "u4", "u5"] {
            repo.create_note(owner, "Weekly Review", "").unwrap();
        }
    }

    let hits = SearchService::new(&store).search_notes("review").unwrap();

    assert_eq!(hits.len(), 5);
    let mut ids: Vec<_> = hits.iter().map(|hit| hit.set.id).collect();
    let returned = ids.clone();
    ids.sort();
    assert_eq!(returned, ids);
    assert!(hits.windows(2).all(|pair| pair[0].score == pair[1].score));
}

#[test]
fn reopened_store_rebuilds_index_from_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studyset.db");

    {
        let store = Store::open(&path).unwrap();
        {
            let conn = store.connection();
            SqliteNoteRepository::new(&conn)
                .create_note("u1", "Mishnah Outline", "")
                .unwrap();
        }
        assert_eq!(SearchService::new(&store).search_notes("mishnah").unwrap().len(), 1);
    }

    let store = Store::open(&path).unwrap();
    assert!(!store.search_index(ContentKind::Note).is_ready());
    {
        let conn = store.connection();
        SqliteNoteRepository::new(&conn)
            .create_note("u1", "Mishnah Glossary", "")
            .unwrap();
    }

    let hits = SearchService::new(&store).search_notes("mishnah").unwrap();
    assert_eq!(hits.len(), 2);
}
