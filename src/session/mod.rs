//! Per-login session state and the turn orchestrator

mod assistant;

pub use assistant::{Assistant, FALLBACK_REPLY, IMAGE_DESCRIPTION_PROMPT, Translation, Turn};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::accounts::Account;
use crate::attachments::ImageUpload;
use crate::context::{Message, Transcript};
use crate::language::Language;

/// Everything one logged-in user accumulates between login and logout
///
/// Sessions are created by [`Assistant::login`] and passed by reference
/// through every handler; nothing is shared between sessions.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    account: Account,
    transcript: Transcript,
    upload: Option<ImageUpload>,
    warning: Option<String>,
    language: Language,
    started_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(account: Account, language: Language) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            account,
            transcript: Transcript::new(),
            upload: None,
            warning: None,
            language,
            started_at: Utc::now(),
        };
        tracing::info!(
            session_id = %session.id,
            username = session.account.username(),
            "session started"
        );
        session
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Allergies of the logged-in child profile (empty for mothers)
    #[must_use]
    pub fn allergies(&self) -> &[String] {
        self.account.allergies()
    }

    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Image currently attached to chat prompts
    #[must_use]
    pub const fn upload(&self) -> Option<&ImageUpload> {
        self.upload.as_ref()
    }

    /// Allergen warning from the latest scan that found something
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Choose the language for speech and translation
    pub fn set_language(&mut self, language: Language) {
        tracing::debug!(session_id = %self.id, language = language.code(), "language selected");
        self.language = language;
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Log out, discarding all session state
    pub fn end(self) {
        let minutes = (Utc::now() - self.started_at).num_minutes();
        tracing::info!(
            session_id = %self.id,
            username = self.account.username(),
            messages = self.transcript.len(),
            minutes,
            "session ended"
        );
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub(crate) fn set_upload(&mut self, upload: ImageUpload) {
        self.upload = Some(upload);
    }

    pub(crate) fn set_warning(&mut self, warning: String) {
        self.warning = Some(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mother() -> Account {
        Account::Mother {
            username: "mother1".to_string(),
            password: "passmother1".to_string(),
        }
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new(mother(), Language::Tamil);
        assert!(session.transcript().is_empty());
        assert!(session.upload().is_none());
        assert!(session.warning().is_none());
        assert!(session.allergies().is_empty());
        assert_eq!(session.language(), Language::Tamil);
    }

    #[test]
    fn sessions_have_distinct_ids() {
        let a = Session::new(mother(), Language::English);
        let b = Session::new(mother(), Language::English);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn language_can_change() {
        let mut session = Session::new(mother(), Language::English);
        session.set_language(Language::Hindi);
        assert_eq!(session.language(), Language::Hindi);
        session.end();
    }

    #[test]
    fn warning_is_replaced() {
        let mut session = Session::new(mother(), Language::English);
        session.set_warning("first".to_string());
        session.set_warning("second".to_string());
        assert_eq!(session.warning(), Some("second"));
    }
}
