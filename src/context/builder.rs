//! Transcript rendering and prompt assembly

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use super::{Message, Role};

/// Capitalized word run, e.g. "Paris" or "New York"
///
/// This is a heuristic, not entity recognition: sentence-initial words
/// ("Tell", "Should") match, and lowercase or all-caps names ("paris", "NASA")
/// do not.
static SUBJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)*\b").expect("valid regex")
});

/// Last capitalized phrase in `text`, if any
#[must_use]
pub fn last_subject(text: &str) -> Option<&str> {
    SUBJECT_REGEX.find_iter(text).last().map(|m| m.as_str())
}

/// Render the transcript as `Role: content` lines
///
/// When any user message contains a capitalized phrase, a trailing
/// `(Context: The last discussed subject is X.)` line names the last one
/// found, taken from the latest user message that has one.
#[must_use]
pub fn build_context(messages: &[Message]) -> String {
    let mut context = String::new();
    let mut subject: Option<&str> = None;

    for message in messages {
        let _ = writeln!(context, "{}: {}", message.role.label(), message.content);

        if message.role == Role::User
            && let Some(found) = last_subject(&message.content)
        {
            subject = Some(found);
        }
    }

    if let Some(subject) = subject {
        let _ = writeln!(
            context,
            "(Context: The last discussed subject is {subject}.)"
        );
    }

    context
}

/// Full prompt sent to the generative service for one turn
///
/// An active allergen warning is placed between the transcript and a
/// restated user line so the model sees it right before the question.
#[must_use]
pub fn build_prompt(context: &str, warning: Option<&str>, user_input: &str) -> String {
    match warning {
        Some(warning) => format!("{context}{warning}\nUser: {user_input}"),
        None => format!("{context}{user_input}"),
    }
}
