//! External services behind narrow capability traits
//!
//! The assistant only talks to the outside world through
//! [`GenerativeService`], [`TranslationService`] and [`SpeechService`].
//! HTTP clients for Gemini, Google Translate and Google/`OpenAI` TTS live
//! here, and [`Resilient`] adds timeouts and bounded retries to any of them.

pub mod gemini;
pub mod translate;
pub mod tts;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use translate::GoogleTranslateClient;
pub use tts::TextToSpeech;

use crate::attachments::ImageUpload;
use crate::language::Language;
use crate::retry::{self, RetryPolicy, with_retry};
use crate::{Error, Result};

/// Browser user agent for the public Google endpoints
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Generates text from a prompt, optionally grounded on an image
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Generate a reply
    ///
    /// Returns `Ok(None)` when the model produced no candidates.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    async fn generate(&self, prompt: &str, image: Option<&ImageUpload>) -> Result<Option<String>>;
}

/// Translates text from an auto-detected source language
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate `text` into `target`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or no translation is returned
    async fn translate(&self, text: &str, target: Language) -> Result<String>;
}

/// Turns text into spoken audio
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` in `language`, returning MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;
}

/// Adds a per-attempt timeout and bounded retries to a service
pub struct Resilient<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> Resilient<S> {
    /// Wrap `inner` with `policy`
    #[must_use]
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped service
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: GenerativeService> GenerativeService for Resilient<S> {
    async fn generate(&self, prompt: &str, image: Option<&ImageUpload>) -> Result<Option<String>> {
        with_retry(&self.policy, "generate", || self.inner.generate(prompt, image)).await
    }
}

#[async_trait]
impl<S: TranslationService> TranslationService for Resilient<S> {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        with_retry(&self.policy, "translate", || self.inner.translate(text, target)).await
    }
}

#[async_trait]
impl<S: SpeechService> SpeechService for Resilient<S> {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        with_retry(&self.policy, "synthesize", || {
            self.inner.synthesize(text, language)
        })
        .await
    }
}

/// Map a failed HTTP response to an error
///
/// Rate limits and server errors become `Error::Unavailable` so they are
/// retried; everything else goes through `permanent`.
async fn status_error(
    service: &str,
    response: reqwest::Response,
    permanent: fn(String) -> Error,
) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("{service} error {status}: {body}");

    if retry::is_recoverable(status.as_u16(), &body) {
        Error::Unavailable(message)
    } else {
        permanent(message)
    }
}
