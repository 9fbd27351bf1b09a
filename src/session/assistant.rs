//! Turn orchestration: context, generation, safety checks, speech

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use super::Session;
use crate::accounts::{AccountDirectory, IdentityProvider};
use crate::allergens::{AllergenCatalog, allergen_warning};
use crate::attachments::ImageUpload;
use crate::config::Config;
use crate::context::{Message, build_context, build_prompt};
use crate::language::Language;
use crate::safety::post_process_with;
use crate::services::{
    GeminiClient, GenerativeService, GoogleTranslateClient, Resilient, SpeechService,
    TextToSpeech, TranslationService,
};
use crate::text::clean_text;
use crate::{Error, Result};

/// Reply used when the model returns nothing
pub const FALLBACK_REPLY: &str = "I couldn't generate a response.";

/// Prompt used to describe an uploaded image before allergen screening
pub const IMAGE_DESCRIPTION_PROMPT: &str = "Describe the contents of this image in detail.";

/// Result of one chat turn
#[derive(Debug, Clone)]
pub struct Turn {
    /// Reply as stored in the transcript (after the safety override)
    pub reply: String,
    /// Reply with markup removed, as shown and spoken
    pub display_text: String,
    /// Spoken reply (MP3), when speech is enabled and succeeded
    pub audio: Option<Vec<u8>>,
}

/// Translation of the latest assistant reply
#[derive(Debug, Clone)]
pub struct Translation {
    pub text: String,
    pub language: Language,
    /// Spoken translation (MP3), when speech is enabled and succeeded
    pub audio: Option<Vec<u8>>,
}

/// Wires the pure chat logic to the external services
pub struct Assistant {
    generator: Arc<dyn GenerativeService>,
    translator: Arc<dyn TranslationService>,
    speech: Option<Arc<dyn SpeechService>>,
    identity: Arc<dyn IdentityProvider>,
    catalog: AllergenCatalog,
    default_language: Language,
}

impl Assistant {
    /// Create an assistant without speech, using the builtin catalog
    #[must_use]
    pub fn new(
        generator: Arc<dyn GenerativeService>,
        translator: Arc<dyn TranslationService>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            generator,
            translator,
            speech: None,
            identity,
            catalog: AllergenCatalog::builtin().clone(),
            default_language: Language::default(),
        }
    }

    /// Enable spoken replies
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechService>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Screen against a different allergen catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: AllergenCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Language new sessions start with
    #[must_use]
    pub const fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Build an assistant with the HTTP clients described by `config`
    ///
    /// Every client is wrapped in [`Resilient`] with the configured retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns error if the Google API key is missing, a speech provider
    /// lacks its key, or the profiles file cannot be loaded
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .generative
            .api_key
            .as_ref()
            .map(|k| SecretString::from(k.expose_secret().to_string()))
            .ok_or_else(|| Error::Config("GOOGLE_API_KEY is not set".to_string()))?;

        let gemini = GeminiClient::new(api_key)?
            .with_model(config.generative.model.clone())
            .with_temperature(config.generative.temperature)
            .with_base_url(config.generative.base_url.clone());

        let translator =
            GoogleTranslateClient::new().with_base_url(config.translation.base_url.clone());

        let catalog = AllergenCatalog::builtin().clone();
        let identity = match &config.profiles_path {
            Some(path) => AccountDirectory::load(path, &catalog)?,
            None => AccountDirectory::builtin()?,
        };

        let policy = config.retry.clone();
        let mut assistant = Self::new(
            Arc::new(Resilient::new(gemini, policy.clone())),
            Arc::new(Resilient::new(translator, policy.clone())),
            Arc::new(identity),
        )
        .with_catalog(catalog)
        .with_default_language(config.language);

        if config.speech.enabled {
            let tts = TextToSpeech::from_config(&config.speech)?;
            tracing::info!(provider = tts.provider_name(), "speech enabled");
            assistant = assistant.with_speech(Arc::new(Resilient::new(tts, policy)));
        } else {
            tracing::info!("speech disabled");
        }

        tracing::info!(
            model = %config.generative.model,
            language = config.language.code(),
            "assistant ready"
        );
        Ok(assistant)
    }

    /// Check credentials and open a session
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` for an unknown username/password pair
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let account = self.identity.authenticate(username, password)?;
        Ok(Session::new(account, self.default_language))
    }

    /// Attach an image to the session and screen it for allergens
    ///
    /// For child profiles with allergies the image is described by the
    /// generative service and the description is checked against the
    /// catalog. A detected warning replaces the session warning; a clean
    /// scan leaves an earlier warning in place. The image stays attached to
    /// later chat prompts even if screening fails.
    ///
    /// # Errors
    ///
    /// Returns error if the description request fails
    pub async fn upload_image(
        &self,
        session: &mut Session,
        upload: ImageUpload,
    ) -> Result<Option<String>> {
        let scan = if session.account().is_child() && !session.allergies().is_empty() {
            self.scan(session, &upload).await
        } else {
            Ok(None)
        };

        session.set_upload(upload);
        let warning = scan?;

        if let Some(warning) = &warning {
            session.set_warning(warning.clone());
        }
        Ok(warning)
    }

    async fn scan(&self, session: &Session, upload: &ImageUpload) -> Result<Option<String>> {
        let description = self
            .generator
            .generate(IMAGE_DESCRIPTION_PROMPT, Some(upload))
            .await?
            .unwrap_or_default();

        let detected = self.catalog.detect(&description, session.allergies());
        tracing::info!(
            session_id = %session.id(),
            detected = ?detected,
            "image screened for allergens"
        );
        Ok(allergen_warning(&detected))
    }

    /// Run one chat turn
    ///
    /// The user message is recorded before generation, so it stays in the
    /// transcript even if the generative call fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyMessage` for blank input, or the generative
    /// service error after retries are exhausted
    pub async fn chat(&self, session: &mut Session, input: &str) -> Result<Turn> {
        if input.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        session.push(Message::user(input));

        let context = build_context(session.transcript().messages());
        let prompt = build_prompt(&context, session.warning(), input);

        tracing::debug!(
            session_id = %session.id(),
            turns = session.transcript().len(),
            with_image = session.upload().is_some(),
            warning = session.warning().is_some(),
            "generating reply"
        );

        let generated = self.generator.generate(&prompt, session.upload()).await?;
        let reply = generated
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        let reply = post_process_with(&self.catalog, input, &reply, session.allergies());

        session.push(Message::assistant(reply.clone()));

        let display_text = clean_text(&reply);
        let audio = self.speak(&display_text, session.language()).await;

        Ok(Turn {
            reply,
            display_text,
            audio,
        })
    }

    /// Translate the latest assistant reply into the session language
    ///
    /// Returns `Ok(None)` when the transcript does not end with a reply.
    ///
    /// # Errors
    ///
    /// Returns the translation service error
    pub async fn translate_last(&self, session: &Session) -> Result<Option<Translation>> {
        let Some(last) = session.transcript().last_assistant_reply() else {
            return Ok(None);
        };

        let language = session.language();
        let text = self.translator.translate(&last.content, language).await?;
        let audio = self.speak(&text, language).await;

        Ok(Some(Translation {
            text,
            language,
            audio,
        }))
    }

    /// Synthesize speech; failures are logged and yield no audio
    async fn speak(&self, text: &str, language: Language) -> Option<Vec<u8>> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text, language).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(error = %e, language = language.code(), "speech synthesis failed");
                None
            }
        }
    }
}
