//! Maps free-form agent text onto one of the sample's options.

use std::sync::LazyLock;

use regex::Regex;

static ANSWER_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(final answer|answer is|answer\s*:)")
        .expect("ANSWER_MARKER_RE regex should compile")
});

static PAREN_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([A-Za-z])\)").expect("PAREN_LABEL_RE regex should compile")
});

static BARE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z])\b").expect("BARE_LABEL_RE regex should compile"));

/// Letter label for option `index` (`0 -> 'A'`).
pub fn option_label(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}

fn label_index(label: char, option_count: usize) -> Option<usize> {
    let upper = label.to_ascii_uppercase();
    if !upper.is_ascii_uppercase() {
        return None;
    }
    let idx = (upper as u8 - b'A') as usize;
    (idx < option_count).then_some(idx)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Earliest position of `needle` in `haystack` with word boundaries on both sides.
fn find_bounded(haystack: &str, needle: &str, case_sensitive: bool) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let (hay, pat) = if case_sensitive {
        (haystack.to_string(), needle.to_string())
    } else {
        (haystack.to_lowercase(), needle.to_lowercase())
    };
    // Positions index the folded string; callers only compare them.
    let mut start = 0;
    while let Some(rel) = hay[start..].find(&pat) {
        let pos = start + rel;
        let end = pos + pat.len();
        let before_ok = hay[..pos].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = hay[end..].chars().next().map_or(true, |c| !is_word_char(c));
        let needle_starts_word = pat.chars().next().is_some_and(is_word_char);
        let needle_ends_word = pat.chars().next_back().is_some_and(is_word_char);
        if (before_ok || !needle_starts_word) && (after_ok || !needle_ends_word) {
            return Some(pos);
        }
        start = pos + pat.chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn parenthesized_labels(text: &str) -> Vec<(usize, char)> {
    PAREN_LABEL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            let c = m.as_str().chars().next()?;
            Some((m.start(), c))
        })
        .collect()
}

fn match_in_tail(tail: &str, options: &[String]) -> Option<String> {
    // 1. "(B)" style label
    if let Some(idx) = parenthesized_labels(tail)
        .into_iter()
        .find_map(|(_, c)| label_index(c, options.len()))
    {
        return Some(options[idx].clone());
    }

    // 2. Option content; earliest wins, longer options break ties.
    let mut best: Option<(usize, usize, usize)> = None;
    for (idx, option) in options.iter().enumerate() {
        let option = option.trim();
        let case_sensitive = option.chars().count() == 1;
        if let Some(pos) = find_bounded(tail, option, case_sensitive) {
            let candidate = (pos, usize::MAX - option.len(), idx);
            if best.map_or(true, |b| candidate < b) {
                best = Some(candidate);
            }
        }
    }
    if let Some((_, _, idx)) = best {
        return Some(options[idx].clone());
    }

    // 3. Bare letter label
    BARE_LABEL_RE
        .captures_iter(tail)
        .filter_map(|caps| caps.get(1)?.as_str().chars().next())
        .find_map(|c| label_index(c, options.len()))
        .map(|idx| options[idx].clone())
}

/// Extract the chosen option from `text`, or `None` if no option is clearly stated.
///
/// Pure: the same inputs always yield the same output.
pub fn extract_answer(text: &str, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    if let Some(last) = ANSWER_MARKER_RE.find_iter(text).last() {
        let rest = &text[last.end()..];
        let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '*');
        let tail = rest.lines().next().unwrap_or("");
        if let Some(answer) = match_in_tail(tail, options) {
            return Some(answer);
        }
    }

    parenthesized_labels(text)
        .into_iter()
        .rev()
        .find_map(|(_, c)| label_index(c, options.len()))
        .map(|idx| options[idx].clone())
}
