use regex::{Regex, RegexBuilder};

pub const MATCH_OPEN: char = '[';
pub const MATCH_CLOSE: char = ']';

pub fn build_highlight_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// A single-line window of `text` around the first match, with the match
/// bracketed and elided edges marked.
pub fn excerpt(text: &str, regex: &Regex, radius: usize) -> Option<String> {
    let found = regex.find(text)?;
    let start = text[..found.start()]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let start = if radius == 0 { found.start() } else { start };
    let end = text[found.end()..]
        .char_indices()
        .nth(radius)
        .map(|(idx, _)| found.end() + idx)
        .unwrap_or(text.len());

    let mut out = String::new();
    if start > 0 {
        out.push('…');
    }
    out.push_str(&text[start..found.start()]);
    out.push(MATCH_OPEN);
    out.push_str(found.as_str());
    out.push(MATCH_CLOSE);
    out.push_str(&text[found.end()..end]);
    if end < text.len() {
        out.push('…');
    }
    Some(out.replace(['\n', '\r'], " "))
}
