//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mothersync::services::{GenerativeService, SpeechService, TranslationService};
use mothersync::{AccountDirectory, Assistant, Error, ImageUpload, Language, Result};

/// One recorded generative call
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub prompt: String,
    pub with_image: bool,
}

/// Generative service returning queued replies
///
/// When the queue is empty it answers `Some("ok")`.
#[derive(Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<Option<String>>>>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, text: &str) {
        self.push(Ok(Some(text.to_string())));
    }

    pub fn push(&self, reply: Result<Option<String>>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeService for FakeGenerator {
    async fn generate(&self, prompt: &str, image: Option<&ImageUpload>) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(GenerateCall {
            prompt: prompt.to_string(),
            with_image: image.is_some(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some("ok".to_string())))
    }
}

/// Translator that tags text with the target language code
pub struct FakeTranslator;

#[async_trait]
impl TranslationService for FakeTranslator {
    async fn translate(&self, text: &str, language: Language) -> Result<String> {
        Ok(format!("[{}] {text}", language.code()))
    }
}

/// Speech service returning the text bytes, or failing when `broken`
#[derive(Default)]
pub struct FakeSpeech {
    broken: bool,
    spoken: Mutex<Vec<(String, Language)>>,
}

impl FakeSpeech {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<(String, Language)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechService for FakeSpeech {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        if self.broken {
            return Err(Error::Unavailable("speech backend down".to_string()));
        }
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), language));
        Ok(text.as_bytes().to_vec())
    }
}

/// Assistant over the builtin profiles with fake services and no speech
pub fn assistant(generator: Arc<FakeGenerator>) -> Assistant {
    Assistant::new(
        generator,
        Arc::new(FakeTranslator),
        Arc::new(AccountDirectory::builtin().expect("builtin profiles")),
    )
}

/// A small valid PNG upload
pub fn png_upload() -> ImageUpload {
    let image = image::DynamicImage::new_rgb8(4, 3);
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode png");
    ImageUpload::from_bytes(bytes.into_inner(), Some("label.png".to_string()))
        .expect("valid png")
}
