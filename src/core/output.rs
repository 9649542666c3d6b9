//! Quiz Document Writer
//!
//! Persists the run's final product as one plain-text file per run,
//! `{id}_quiz.txt` in the output directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::quiz::QuizDocument;
use crate::core::{CoreError, CoreResult};

/// Deterministic output path for a content id
pub fn quiz_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}_quiz.txt", id))
}

/// Writes the document to `{id}_quiz.txt`, one heading line and one answer
/// line per item, in document order. An empty document is refused; zero-item
/// saves are a generation failure upstream, never a valid output.
pub async fn write_quiz(doc: &QuizDocument, dir: &Path, id: &str) -> CoreResult<PathBuf> {
    if doc.is_empty() {
        return Err(CoreError::InsufficientContent(
            "refusing to write an empty quiz document".to_string(),
        ));
    }

    let mut body = String::new();
    for (i, item) in doc.items.iter().enumerate() {
        body.push_str(&format!("Question {}: {}\n", i + 1, item.question));
        body.push_str(&format!("Answer: {}\n\n", item.answer));
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = quiz_path(dir, id);
    tokio::fs::write(&path, body.as_bytes()).await?;

    info!(path = %path.display(), items = doc.len(), "quiz document written");
    Ok(path)
}
