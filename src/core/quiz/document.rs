//! Quiz Document Model
//!
//! Ordered question/answer pairs, the pipeline's final product.
//! Insertion-only; ordering matches chronological position in the source
//! content where derivable.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

/// A single question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub answer: String,
}

impl QuizItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Ordered sequence of quiz items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub items: Vec<QuizItem>,
}

impl QuizDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: QuizItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parses remote generation output into a `QuizDocument`.
///
/// The remote prompt requests one `Q:` line followed by one `A:` line per
/// question. Leading list numbering ("1.", "2)") before the `Q:` marker is
/// tolerated. A response with no parseable pair is a generation failure;
/// a zero-item document is never a valid result.
pub fn parse_remote_quiz(text: &str) -> CoreResult<QuizDocument> {
    let mut doc = QuizDocument::new();
    let mut pending_question: Option<String> = None;

    for line in text.lines() {
        let line = strip_list_prefix(line.trim());
        if line.is_empty() {
            continue;
        }

        if let Some(q) = marker_value(line, &["Q:", "Question:"]) {
            // An unanswered question is dropped when the next one starts
            pending_question = Some(q.to_string());
        } else if let Some(a) = marker_value(line, &["A:", "Answer:"]) {
            if let Some(question) = pending_question.take() {
                doc.push(QuizItem::new(question, a.to_string()));
            }
        } else if let Some(question) = pending_question.as_mut() {
            // Continuation line of a multi-line question
            question.push(' ');
            question.push_str(line);
        }
    }

    if doc.is_empty() {
        return Err(CoreError::RemoteGeneration(
            "response contained no parseable question/answer pairs".to_string(),
        ));
    }

    Ok(doc)
}

/// Strips leading list numbering such as "1." or "2)" from a line
fn strip_list_prefix(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len() {
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim_start();
        }
    }
    line
}

/// Returns the text after the first matching marker, if any
fn marker_value<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    for marker in markers {
        // Checked slice: the line may start with a multi-byte character
        if let Some(prefix) = line.get(..marker.len()) {
            if prefix.eq_ignore_ascii_case(marker) {
                return Some(line[marker.len()..].trim());
            }
        }
    }
    None
}
