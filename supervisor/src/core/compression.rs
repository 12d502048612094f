//! Word-bounded compression for prompt and context payloads.

/// Appended when text was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// Keep at most `max_words` words of `text`.
///
/// Text that already fits is returned untouched (whitespace included);
/// otherwise the kept words are re-joined with single spaces and followed by
/// [`TRUNCATION_MARKER`].
pub fn compress_text(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        return text.to_string();
    }
    let mut out = kept.join(" ");
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Pack the first `max_items` results into a numbered block, each bounded to
/// `max_words_each` words.
pub fn compress_results<S: AsRef<str>>(
    results: &[S],
    max_items: usize,
    max_words_each: usize,
) -> String {
    results
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(idx, item)| {
            format!(
                "[Result {}] {}",
                idx + 1,
                compress_text(item.as_ref(), max_words_each)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
