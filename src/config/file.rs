//! TOML configuration file loading
//!
//! Supports `~/.config/mothersync/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Language new sessions start with (name or code)
    pub language: Option<String>,

    /// Path to the account profiles file
    pub profiles: Option<PathBuf>,

    /// Generative content service
    #[serde(default)]
    pub generative: GenerativeFileConfig,

    /// Translation service
    #[serde(default)]
    pub translation: TranslationFileConfig,

    /// Text-to-speech
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Timeouts and retries for external calls
    #[serde(default)]
    pub retry: RetryFileConfig,
}

/// Generative content service configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerativeFileConfig {
    pub api_key: Option<String>,
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationFileConfig {
    pub base_url: Option<String>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechFileConfig {
    pub enabled: Option<bool>,
    /// "google" or "openai"
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub openai_api_key: Option<String>,
    /// `OpenAI` voice identifier (e.g. "alloy")
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryFileConfig {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the content is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load a config file the user pointed at explicitly
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_explicit(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    let config = parse_config_file(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/mothersync/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("mothersync").join("config.toml"))
}
