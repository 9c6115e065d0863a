//! Bounded single-line rendering for store error messages.

/// Fold whitespace runs (including newlines) to one space and cut at
/// `max_chars`, marking the cut with `...`.
pub fn single_line(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (taken, word) in text.split_whitespace().enumerate() {
        if taken > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    match out.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            out.truncate(cut);
            out.push_str("...");
            out
        }
        None => out,
    }
}

/// First `max_items` messages as single lines joined by ` | `, with a
/// `(+N more)` tail for the rest.
pub fn join_bounded<I, S>(messages: I, max_items: usize, max_chars: usize) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut shown = Vec::with_capacity(max_items);
    let mut hidden = 0usize;
    for message in messages {
        if shown.len() < max_items {
            shown.push(single_line(message.as_ref(), max_chars));
        } else {
            hidden += 1;
        }
    }
    let joined = shown.join(" | ");
    if hidden > 0 {
        format!("{joined} (+{hidden} more)")
    } else {
        joined
    }
}
