use regex::Regex;

use crate::highlight::build_highlight_regex;
use crate::note::Note;

/// Case-insensitive substring test against title and content. An empty query
/// matches every note.
pub fn matches(note: &Note, query: &str) -> bool {
    match build_highlight_regex(query) {
        Some(regex) => matches_regex(note, &regex),
        None => query.is_empty(),
    }
}

/// Notes matching `query`, in their original order. Case folding is the same
/// as the highlighter's, so every content match yields an excerpt.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    if query.is_empty() {
        return notes.iter().collect();
    }
    let Some(regex) = build_highlight_regex(query) else {
        tracing::warn!(query_len = query.len(), "search query could not be compiled");
        return Vec::new();
    };
    notes
        .iter()
        .filter(|note| matches_regex(note, &regex))
        .collect()
}

fn matches_regex(note: &Note, regex: &Regex) -> bool {
    regex.is_match(&note.title) || regex.is_match(&note.content)
}
