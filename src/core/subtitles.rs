//! Subtitle Normalization
//!
//! Converts timestamped cue formats (SRT/VTT) into plain transcript text:
//! cue index lines, timestamp-range lines, blank lines, and inline markup
//! tags are stripped; the remaining text lines are joined with newlines,
//! prefixed by a title line.

/// Separator between the start and end timestamp of a cue
const CUE_ARROW: &str = "-->";

/// Normalizes raw subtitle content into transcript text.
///
/// Works for both SRT and WebVTT input; format headers (`WEBVTT`, `NOTE`,
/// `Kind:`, `Language:`) are treated like cue metadata and dropped.
pub fn normalize_cues(raw: &str, title: &str) -> String {
    let mut out = String::new();
    out.push_str(title.trim());
    out.push('\n');

    let mut last_line: Option<String> = None;
    for line in raw.lines() {
        let line = line.trim();
        if !is_cue_text(line) {
            continue;
        }

        let text = strip_inline_tags(line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        // Auto-generated cues often repeat the previous line verbatim
        if last_line.as_deref() == Some(text) {
            continue;
        }

        out.push_str(text);
        out.push('\n');
        last_line = Some(text.to_string());
    }

    out.trim_end().to_string()
}

/// True when a line carries cue text rather than cue structure
fn is_cue_text(line: &str) -> bool {
    if line.is_empty() || line.contains(CUE_ARROW) {
        return false;
    }
    // Cue index lines are bare sequence numbers
    if line.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // VTT header and metadata lines
    if line.starts_with("WEBVTT")
        || line.starts_with("NOTE")
        || line.starts_with("Kind:")
        || line.starts_with("Language:")
    {
        return false;
    }
    true
}

/// Strips inline `<...>` markup tags (speaker voices, styling, karaoke
/// timestamps) from a cue text line
fn strip_inline_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}
