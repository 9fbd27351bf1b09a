//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{SpeechService, USER_AGENT, status_error};
use crate::config::{SpeechConfig, SpeechProvider};
use crate::language::Language;
use crate::text::{clean_text, speech_chunks};
use crate::{Error, Result};

pub const GOOGLE_BASE_URL: &str = "https://translate.google.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Longest text the Google endpoint speaks in one request
const GOOGLE_CHUNK_CHARS: usize = 200;

/// TTS provider backend
#[derive(Debug)]
enum TtsProvider {
    Google,
    OpenAI {
        api_key: SecretString,
        voice: String,
        speed: f32,
        model: String,
    },
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS instance using the Google Translate voice
    ///
    /// Speaks every supported language and needs no API key.
    #[must_use]
    pub fn new_google() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GOOGLE_BASE_URL.to_string(),
            provider: TtsProvider::Google,
        }
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: SecretString, voice: String, speed: f32) -> Result<Self> {
        Self::new_openai_with_model(api_key, voice, speed, "tts-1".to_string())
    }

    /// Create a new TTS instance using `OpenAI` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai_with_model(
        api_key: SecretString,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            provider: TtsProvider::OpenAI {
                api_key,
                voice,
                speed,
                model,
            },
        })
    }

    /// Create the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the `OpenAI` provider is selected without a key
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let tts = match config.provider {
            SpeechProvider::Google => Self::new_google(),
            SpeechProvider::OpenAI => {
                let key = config
                    .openai_api_key
                    .as_ref()
                    .map(|k| SecretString::from(k.expose_secret().to_string()))
                    .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;
                Self::new_openai_with_model(
                    key,
                    config.voice.clone(),
                    config.speed,
                    config.model.clone(),
                )?
            }
        };

        Ok(match &config.base_url {
            Some(url) => tts.with_base_url(url.clone()),
            None => tts,
        })
    }

    /// Point at a different API host
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Provider name for logging
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        match self.provider {
            TtsProvider::Google => "google",
            TtsProvider::OpenAI { .. } => "openai",
        }
    }

    /// Synthesize using the Google Translate voice
    ///
    /// Long text is split at word boundaries and the MP3 segments are
    /// concatenated into one stream.
    async fn synthesize_google(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let mut audio = Vec::new();

        for chunk in speech_chunks(text, GOOGLE_CHUNK_CHARS) {
            let url = format!(
                "{}/translate_tts?ie=UTF-8&client=tw-ob&tl={}&q={}",
                self.base_url,
                language.code(),
                urlencoding::encode(&chunk)
            );

            let response = self
                .client
                .get(&url)
                .header("User-Agent", USER_AGENT)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(status_error("Google TTS", response, Error::Tts).await);
            }

            audio.extend_from_slice(&response.bytes().await?);
        }

        Ok(audio)
    }

    /// Synthesize using `OpenAI` TTS
    ///
    /// The model detects the language from the text itself.
    async fn synthesize_openai(
        &self,
        text: &str,
        api_key: &SecretString,
        voice: &str,
        speed: f32,
        model: &str,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model,
            input: text,
            voice,
            speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("OpenAI TTS", response, Error::Tts).await);
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechService for TextToSpeech {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let text = clean_text(text);
        if text.is_empty() {
            return Err(Error::Tts("no text to speak".to_string()));
        }

        tracing::debug!(
            provider = self.provider_name(),
            language = language.code(),
            chars = text.chars().count(),
            "synthesizing speech"
        );

        match &self.provider {
            TtsProvider::Google => self.synthesize_google(&text, language).await,
            TtsProvider::OpenAI {
                api_key,
                voice,
                speed,
                model,
            } => {
                self.synthesize_openai(&text, api_key, voice, *speed, model)
                    .await
            }
        }
    }
}
