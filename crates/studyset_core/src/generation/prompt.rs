//! Prompt template for flashcard generation.

use crate::model::card::MAX_GENERATED_CARDS;

/// Study domain used when the caller does not configure one.
pub const DEFAULT_STUDY_DOMAIN: &str = "Torah study";

/// Answer text the model is told to use when the notes leave it unclear.
pub const AMBIGUOUS_ANSWER: &str = "Ambiguous / not stated";

/// Builds the generation prompt for `note_body` in the default study domain.
pub fn build_prompt(note_body: &str) -> String {
    build_prompt_for_domain(DEFAULT_STUDY_DOMAIN, note_body)
}

/// Builds the generation prompt for `note_body` in `domain`.
///
/// Output is a pure function of its inputs.
pub fn build_prompt_for_domain(domain: &str, note_body: &str) -> String {
    let max = MAX_GENERATED_CARDS;
    format!(
        r#"You are a focused flashcard generator for {domain}.
Input: a block of notes about a {domain} topic.
Output: valid JSON only. No commentary, no markdown, no extra text.

CRITICAL REQUIREMENTS:
1. Generate concise question/answer flashcards covering the key rulings, definitions, reasons, stories, contrasts, disagreements and ideas in the notes.
2. Produce up to {max} cards depending on input length. If the notes are short, do not make up information to create more cards.
3. If the notes are empty, return zero cards.
4. If the notes give insufficient information, do not use outside knowledge to create cards.
5. Each card must have: "id" (integer starting at 1), "question" (string), "answer" (string).
6. The top-level JSON object must contain exactly one key: "cards" (array).
7. Do not include tags, timestamps, language markers, titles or any other metadata.
8. If an item in the notes is missing a clear answer, set the answer to "{AMBIGUOUS_ANSWER}".
9. Do not invent sources or facts that are not present in the notes.
10. If the notes do not relate to {domain}, return zero cards.
11. Return the JSON object only. Do not write anything before or after it.

Output format example:
{{
    "cards": [
        {{ "id": 1, "question": "<question text>", "answer": "<answer text>" }}
    ]
}}

Now process the notes between the markers below and return ONLY the JSON object.

<<<NOTES
{note_body}
NOTES>>>"#
    )
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, build_prompt_for_domain, DEFAULT_STUDY_DOMAIN};

    #[test]
    fn prompt_is_deterministic_and_embeds_notes() {
        let body = "Shabbat candles are lit 18 minutes before sunset.";
        let first = build_prompt(body);
        assert_eq!(first, build_prompt(body));
        assert!(first.contains(body));
        assert!(first.contains(DEFAULT_STUDY_DOMAIN));
    }

    #[test]
    fn prompt_states_the_output_contract() {
        let prompt = build_prompt("");
        assert!(prompt.contains("up to 25 cards"));
        assert!(prompt.contains("exactly one key: \"cards\""));
        assert!(prompt.contains("integer starting at 1"));
        assert!(prompt.contains("return zero cards"));
        assert!(prompt.contains("Do not invent"));
    }

    #[test]
    fn domain_is_configurable() {
        let prompt = build_prompt_for_domain("organic chemistry", "benzene rings");
        assert!(prompt.contains("flashcard generator for organic chemistry"));
        assert!(!prompt.contains(DEFAULT_STUDY_DOMAIN));
    }
}
