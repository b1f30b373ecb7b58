//! Resolves which statement to run for a cursor position, a selection,
//! or the whole document.
//!
//! All three shapes signal "nothing to run" with `None`, which callers
//! must treat as a user-facing notice rather than an error.

use crate::scanner::{self, StatementSegment};

/// A non-empty selection runs verbatim, trimmed.
pub fn resolve_selection(selection: &str) -> Option<String> {
    let trimmed = selection.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// "Run all": the whole document, trimmed.
pub fn resolve_whole_document(source: &str) -> Option<String> {
    resolve_selection(source)
}

/// The statement containing the cursor (a char offset into `source`).
///
/// The segment runs from one past the nearest boundary before the cursor
/// to the nearest boundary at or after it, so a cursor sitting on a `;`
/// resolves to the statement that `;` terminates while a cursor just past
/// it resolves to the next one. A cursor in trailing whitespace after the
/// last `;` falls back to the preceding statement.
pub fn statement_at_cursor(source: &str, offset: usize) -> Option<StatementSegment> {
    let boundaries = scanner::boundaries(source);
    let len = source.chars().count();
    let offset = offset.min(len);

    let start = boundaries
        .iter()
        .copied()
        .filter(|b| *b < offset)
        .max()
        .map(|b| b + 1)
        .unwrap_or(0);
    let end = boundaries
        .iter()
        .copied()
        .find(|b| *b >= offset)
        .unwrap_or(len);

    if let Some(segment) = segment_between(source, start, end) {
        return Some(segment);
    }

    // Empty region; fall back one segment toward the start of the text.
    if start == 0 {
        return None;
    }
    let prev_end = start - 1;
    let prev_start = boundaries
        .iter()
        .copied()
        .filter(|b| *b < prev_end)
        .max()
        .map(|b| b + 1)
        .unwrap_or(0);
    segment_between(source, prev_start, prev_end)
}

/// Every non-empty statement in the document with its source range,
/// for per-statement run affordances.
pub fn statements(source: &str) -> Vec<StatementSegment> {
    scanner::scan(source)
}

fn segment_between(source: &str, start: usize, end: usize) -> Option<StatementSegment> {
    let slice: String = source.chars().skip(start).take(end.saturating_sub(start)).collect();
    let leading = slice.chars().take_while(|c| c.is_whitespace()).count();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(StatementSegment {
        text: trimmed.to_string(),
        start: start + leading,
        end: start + leading + trimmed.chars().count(),
    })
}
