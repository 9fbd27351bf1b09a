//! Text cleanup for display and speech

use std::sync::LazyLock;

use regex::Regex;

static MARKUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_\-\[\]()]").expect("valid regex"));

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markdown punctuation (`* _ - [ ] ( )`) and collapse whitespace
#[must_use]
pub fn clean_text(text: &str) -> String {
    let stripped = MARKUP_REGEX.replace_all(text, "");
    WHITESPACE_REGEX
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Split text into chunks of at most `max_chars` characters at word boundaries
///
/// Words longer than `max_chars` are hard-split. Whitespace between words is
/// normalized to single spaces.
#[must_use]
pub fn speech_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
