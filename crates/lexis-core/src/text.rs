//! Text helpers applied around pipeline calls.
//!
//! Lengths here are counted in characters (Unicode scalar values), which is
//! what clients see, not bytes.

/// Suffix appended to a truncated summary.
pub const ELLIPSIS: &str = "...";

/// Returns true when `text` is empty or only whitespace.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Length of `text` in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Caps `summary` at `max_chars` characters plus [`ELLIPSIS`].
///
/// A cap of `None` or `0` leaves the summary untouched, as does a summary
/// that already fits.
pub fn truncate_summary(summary: String, max_chars: Option<usize>) -> String {
    let Some(max_chars) = max_chars.filter(|&n| n > 0) else {
        return summary;
    };

    match summary.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = summary[..cut].to_string();
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => summary,
    }
}

/// Groups sentences into chunks of at most `max_chars` characters.
///
/// Sentences are split on `". "`. A single sentence longer than the limit
/// becomes a chunk of its own. Empty input yields no chunks.
pub fn chunk_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split_inclusive(". ").map(str::trim) {
        if sentence.is_empty() {
            continue;
        }
        if !current.is_empty() && char_len(&current) + 1 + char_len(sentence) > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
