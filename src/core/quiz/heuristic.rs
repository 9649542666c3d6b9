//! Local Heuristic Quiz Generator
//!
//! Builds question/answer pairs from plain text without any remote call.
//! This is the universal fallback when remote analysis is unavailable,
//! disabled, or fails.

use tracing::debug;

use super::{QuizDocument, QuizItem};
use crate::core::{CoreError, CoreResult};

/// Tunables for the heuristic generator
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Bounded prefix of the input text considered for generation.
    /// Content beyond this is ignored, a deliberate precision/cost trade-off.
    pub max_chars: usize,
    /// Segments shorter than this are discarded as noise
    pub min_sentence_len: usize,
    /// Lower bound on the effective question count
    pub min_questions: usize,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            max_chars: 12_000,
            min_sentence_len: 20,
            min_questions: 3,
        }
    }
}

/// Leading pronouns that trigger the "Who ..." transform
const LEADING_PRONOUNS: &[&str] = &["i", "you", "he", "she", "it", "we", "they"];

/// Copular/auxiliary verbs that trigger the "What ..." transform
const AUXILIARY_VERBS: &[&str] = &["is", "are", "was", "were", "has", "have", "had"];

/// Generates a quiz document from plain text.
///
/// Sentences are segmented on terminal punctuation followed by whitespace,
/// noise-filtered, and picked at an even stride so questions spread across
/// the whole text rather than front-loading. Each answer carries one
/// sentence of context on either side of the picked sentence.
///
/// Fails with `CoreError::InsufficientContent` when no qualifying sentence
/// remains after filtering.
pub fn generate(text: &str, n: usize, config: &HeuristicConfig) -> CoreResult<QuizDocument> {
    let prefix = bounded_prefix(text, config.max_chars);
    let sentences = segment_sentences(prefix, config.min_sentence_len);

    if sentences.is_empty() {
        return Err(CoreError::InsufficientContent(
            "no qualifying sentences after segmentation".to_string(),
        ));
    }

    let count = sentences.len();
    let effective_n = n.min(count / 2).max(config.min_questions);
    let step = (count / (effective_n + 1)).max(1);

    debug!(
        sentences = count,
        requested = n,
        effective = effective_n,
        step,
        "heuristic generation plan"
    );

    let mut doc = QuizDocument::new();
    let mut idx = step;
    while idx < count && doc.len() < effective_n {
        let question = to_interrogative(&sentences[idx]);
        let answer = context_answer(&sentences, idx);
        doc.push(QuizItem::new(question, answer));
        idx += step;
    }

    if doc.is_empty() {
        // Possible when the stride lands past the end of a very short text
        return Err(CoreError::InsufficientContent(
            "too few sentences to place any question".to_string(),
        ));
    }

    Ok(doc)
}

/// Truncates to at most `max_chars` characters on a char boundary
fn bounded_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Segments text into sentences on `.`, `!`, `?` followed by whitespace,
/// discarding segments shorter than `min_len` characters.
fn segment_sentences(text: &str, min_len: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if at_boundary {
                push_sentence(&mut sentences, &mut current, min_len);
            }
        }
    }
    push_sentence(&mut sentences, &mut current, min_len);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String, min_len: usize) {
    let trimmed = current.trim();
    if trimmed.chars().count() >= min_len {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Transforms a declarative sentence into an interrogative one.
///
/// A leading personal pronoun is replaced by "Who" in subject position while
/// the verb stays in place; dropping the verb as well would leave an
/// ungrammatical stub ("Who across the old bridge?").
fn to_interrogative(sentence: &str) -> String {
    let body = sentence.trim_end_matches(['.', '!', '?']).trim_end();

    let mut words = body.split_whitespace();
    let first = words.next().unwrap_or_default();

    if LEADING_PRONOUNS.contains(&first.to_ascii_lowercase().as_str()) {
        // The interrogative pronoun takes over the subject position
        let rest: Vec<&str> = words.collect();
        return format!("Who {}?", rest.join(" "));
    }

    let has_auxiliary = body
        .split_whitespace()
        .any(|w| AUXILIARY_VERBS.contains(&w.to_ascii_lowercase().as_str()));
    if has_auxiliary {
        return format!("What {}?", lowercase_first(body));
    }

    format!("What can you say about: {}?", body)
}

/// Answer text: the sentence before, the picked sentence, and the sentence
/// after, clamped at segment boundaries.
fn context_answer(sentences: &[String], idx: usize) -> String {
    let start = idx.saturating_sub(1);
    let end = (idx + 1).min(sentences.len() - 1);
    sentences[start..=end].join(" ")
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(sentence_count: usize) -> String {
        (0..sentence_count)
            .map(|i| format!("The topic number {} is covered in careful detail here.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_generate_bounds() {
        let text = sample_text(10);
        let doc = generate(&text, 5, &HeuristicConfig::default()).unwrap();

        assert!(doc.len() >= 3 && doc.len() <= 5, "got {}", doc.len());
        for item in &doc.items {
            assert!(!item.question.is_empty());
            assert!(item.question.ends_with('?'));
            assert!(!item.question.ends_with("??"));
            assert!(!item.answer.is_empty());
        }
    }

    #[test]
    fn test_generate_respects_requested_count() {
        let text = sample_text(30);
        let doc = generate(&text, 4, &HeuristicConfig::default()).unwrap();
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_generate_clamps_to_half_sentence_count() {
        // 8 sentences, request 100: effective count is max(3, 8/2) = 4
        let text = sample_text(8);
        let doc = generate(&text, 100, &HeuristicConfig::default()).unwrap();
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_generate_insufficient_content() {
        let err = generate("", 5, &HeuristicConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientContent(_)));

        // All segments below the noise threshold
        let err = generate("Hi. No. Yes. Ok.", 5, &HeuristicConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientContent(_)));
    }

    #[test]
    fn test_generate_truncates_prefix() {
        // Sentences beyond the prefix cap never produce questions
        let config = HeuristicConfig {
            max_chars: 120,
            ..Default::default()
        };
        let text = sample_text(50);
        let doc = generate(&text, 10, &config).unwrap();
        // 120 chars covers only two sentences
        assert!(doc.len() <= 3);
    }

    #[test]
    fn test_segment_sentences_filters_noise() {
        let sentences = segment_sentences(
            "Short. This sentence is definitely long enough to keep! Tiny? \
             Another sufficiently long qualifying sentence here.",
            20,
        );
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("This sentence"));
    }

    #[test]
    fn test_segment_requires_whitespace_after_terminal() {
        // Dots inside tokens (e.g. version numbers) do not split
        let sentences = segment_sentences("The build uses version 2.5.1 of the toolchain.", 20);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_to_interrogative_pronoun_form() {
        assert_eq!(
            to_interrogative("He walked across the old bridge."),
            "Who walked across the old bridge?"
        );
        assert_eq!(
            to_interrogative("They finished the project early!"),
            "Who finished the project early?"
        );
    }

    #[test]
    fn test_to_interrogative_auxiliary_form() {
        assert_eq!(
            to_interrogative("The sky is a deep shade of blue."),
            "What the sky is a deep shade of blue?"
        );
    }

    #[test]
    fn test_to_interrogative_wrapped_form() {
        assert_eq!(
            to_interrogative("Mountains rise sharply near the coast."),
            "What can you say about: Mountains rise sharply near the coast?"
        );
    }

    #[test]
    fn test_context_answer_clamps_at_boundaries() {
        let sentences: Vec<String> = ["First sentence here.", "Second one.", "Third closes."]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            context_answer(&sentences, 0),
            "First sentence here. Second one."
        );
        assert_eq!(
            context_answer(&sentences, 1),
            "First sentence here. Second one. Third closes."
        );
        assert_eq!(context_answer(&sentences, 2), "Second one. Third closes.");
    }

    #[test]
    fn test_answers_follow_source_order() {
        let text = sample_text(20);
        let doc = generate(&text, 5, &HeuristicConfig::default()).unwrap();

        // Extract the embedded topic number from each answer's picked sentence
        let positions: Vec<usize> = doc
            .items
            .iter()
            .map(|item| {
                item.question
                    .split_whitespace()
                    .find_map(|w| w.parse::<usize>().ok())
                    .unwrap()
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }
}
