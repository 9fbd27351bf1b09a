//! Configuration management for MotherSync
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! environment variables.

pub mod file;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use self::file::ConfigFile;
use crate::language::Language;
use crate::retry::RetryPolicy;
use crate::services::{gemini, translate};
use crate::{Error, Result};

/// MotherSync configuration
#[derive(Debug)]
pub struct Config {
    /// Generative content service
    pub generative: GenerativeConfig,

    /// Translation service
    pub translation: TranslationConfig,

    /// Spoken replies
    pub speech: SpeechConfig,

    /// Timeouts and retries shared by all external calls
    pub retry: RetryPolicy,

    /// Account profiles file; the bundled profiles are used when unset
    pub profiles_path: Option<PathBuf>,

    /// Language new sessions start with
    pub language: Language,
}

/// Gemini configuration
#[derive(Debug)]
pub struct GenerativeConfig {
    /// Google API key (from `GOOGLE_API_KEY`)
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub base_url: String,
}

/// Text-to-speech configuration
#[derive(Debug)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub provider: SpeechProvider,

    /// API host override; each provider has its own default
    pub base_url: Option<String>,

    /// `OpenAI` API key (only used by the `OpenAI` provider)
    pub openai_api_key: Option<SecretString>,

    /// `OpenAI` voice identifier
    pub voice: String,

    /// `OpenAI` speed multiplier (0.25 to 4.0)
    pub speed: f32,

    /// `OpenAI` TTS model
    pub model: String,
}

/// Speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechProvider {
    /// Google Translate voice, speaks every supported language
    #[default]
    Google,
    OpenAI,
}

impl FromStr for SpeechProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Config(format!("unknown speech provider: {other}"))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generative: GenerativeConfig {
                api_key: None,
                model: gemini::DEFAULT_MODEL.to_string(),
                temperature: gemini::DEFAULT_TEMPERATURE,
                base_url: gemini::DEFAULT_BASE_URL.to_string(),
            },
            translation: TranslationConfig {
                base_url: translate::DEFAULT_BASE_URL.to_string(),
            },
            speech: SpeechConfig {
                enabled: true,
                provider: SpeechProvider::Google,
                base_url: None,
                openai_api_key: None,
                voice: "alloy".to_string(),
                speed: 1.0,
                model: "tts-1".to_string(),
            },
            retry: RetryPolicy::default(),
            profiles_path: None,
            language: Language::default(),
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// With `path` set the file must exist and parse; otherwise the
    /// standard location is tried and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unreadable, or a value
    /// from either source is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(path) => file::load_explicit(path)?,
            None => file::load_config_file(),
        };
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment values (env > toml > default)
    ///
    /// `env` looks up a variable by name.
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be parsed
    pub fn resolve<F>(fc: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let generative = GenerativeConfig {
            api_key: env("GOOGLE_API_KEY")
                .or(fc.generative.api_key)
                .map(SecretString::from),
            model: env("MOTHERSYNC_MODEL")
                .or(fc.generative.model)
                .unwrap_or(defaults.generative.model),
            temperature: parse_env(&env, "MOTHERSYNC_TEMPERATURE")?
                .or(fc.generative.temperature)
                .unwrap_or(defaults.generative.temperature),
            base_url: env("MOTHERSYNC_GEMINI_URL")
                .or(fc.generative.base_url)
                .unwrap_or(defaults.generative.base_url),
        };

        if !(0.0..=2.0).contains(&generative.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0 and 2, got {}",
                generative.temperature
            )));
        }

        let translation = TranslationConfig {
            base_url: env("MOTHERSYNC_TRANSLATE_URL")
                .or(fc.translation.base_url)
                .unwrap_or(defaults.translation.base_url),
        };

        let provider = match env("MOTHERSYNC_TTS_PROVIDER").or(fc.speech.provider) {
            Some(name) => name.parse()?,
            None => defaults.speech.provider,
        };
        let disabled = env("MOTHERSYNC_DISABLE_SPEECH")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        let speech = SpeechConfig {
            enabled: !disabled && fc.speech.enabled.unwrap_or(defaults.speech.enabled),
            provider,
            base_url: env("MOTHERSYNC_TTS_URL").or(fc.speech.base_url),
            openai_api_key: env("OPENAI_API_KEY")
                .or(fc.speech.openai_api_key)
                .map(SecretString::from),
            voice: env("MOTHERSYNC_TTS_VOICE")
                .or(fc.speech.voice)
                .unwrap_or(defaults.speech.voice),
            speed: fc.speech.speed.unwrap_or(defaults.speech.speed),
            model: fc.speech.model.unwrap_or(defaults.speech.model),
        };

        if disabled {
            tracing::info!("speech explicitly disabled via MOTHERSYNC_DISABLE_SPEECH");
        }

        let retry = RetryPolicy {
            max_retries: parse_env(&env, "MOTHERSYNC_MAX_RETRIES")?
                .or(fc.retry.max_retries)
                .unwrap_or(defaults.retry.max_retries),
            base_delay: fc
                .retry
                .base_delay_ms
                .map_or(defaults.retry.base_delay, Duration::from_millis),
            max_delay: fc
                .retry
                .max_delay_ms
                .map_or(defaults.retry.max_delay, Duration::from_millis),
            timeout: parse_env(&env, "MOTHERSYNC_TIMEOUT_SECS")?
                .or(fc.retry.timeout_secs)
                .map_or(defaults.retry.timeout, Duration::from_secs),
        };

        if retry.timeout.is_zero() {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }

        let profiles_path = env("MOTHERSYNC_PROFILES")
            .map(PathBuf::from)
            .or(fc.profiles);

        let language = match env("MOTHERSYNC_LANGUAGE").or(fc.language) {
            Some(name) => name.parse()?,
            None => defaults.language,
        };

        Ok(Self {
            generative,
            translation,
            speech,
            retry,
            profiles_path,
            language,
        })
    }
}

/// Parse an optional environment value, naming the variable on failure
fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {key}={raw}: {e}")))
        })
        .transpose()
}
