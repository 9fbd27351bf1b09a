//! Google Translate client (mobile web endpoint)

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{TranslationService, USER_AGENT, status_error};
use crate::language::Language;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// Longest input the endpoint accepts, in characters
pub const MAX_TEXT_CHARS: usize = 5000;

/// Translates via the public `translate.google.com/m` page
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for GoogleTranslateClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslateClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different host
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, text: &str, target: Language) -> String {
        format!(
            "{}/m?sl=auto&tl={}&q={}",
            self.base_url,
            target.code(),
            urlencoding::encode(text)
        )
    }
}

#[async_trait]
impl TranslationService for GoogleTranslateClient {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chars = text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(Error::Translation(format!(
                "text has {chars} characters, limit is {MAX_TEXT_CHARS}"
            )));
        }

        tracing::debug!(language = target.code(), chars, "requesting translation");

        let response = self
            .client
            .get(self.url(text, target))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error("Google Translate", response, Error::Translation).await);
        }

        let html = response.text().await?;
        extract_translation(&html)
            .ok_or_else(|| Error::Translation("no translation found in response".to_string()))
    }
}

/// Pull the translated text out of the result page
fn extract_translation(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.result-container").ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
