//! Quiz Generation Module
//!
//! The `QuizDocument` data model plus the local heuristic generator that
//! builds question/answer pairs from plain text without any remote call.

mod document;
mod heuristic;

pub use document::{parse_remote_quiz, QuizDocument, QuizItem};
pub use heuristic::{generate, HeuristicConfig};
