//! MotherSync - conversational assistant for new mothers
//!
//! This library provides the core functionality for MotherSync:
//! - Allergen screening of product images against a child's allergy profile
//! - Conversation context with last-subject tracking
//! - Safety overrides on generated replies
//! - Translation and spoken replies in English and Indian languages
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     CLI (chat)                       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Assistant                          │
//! │  Accounts │ Context │ Allergens │ Safety │ Text     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │           Services (retry + timeout)                 │
//! │     Gemini  │  Google Translate  │  TTS             │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod accounts;
pub mod allergens;
pub mod attachments;
pub mod config;
pub mod context;
pub mod error;
pub mod language;
pub mod retry;
pub mod safety;
pub mod services;
pub mod session;
pub mod text;

pub use accounts::{Account, AccountDirectory, IdentityProvider};
pub use allergens::{AllergenCatalog, AllergenEntry, allergen_warning, detect};
pub use attachments::ImageUpload;
pub use config::Config;
pub use context::{Message, Role, Transcript, build_context, build_prompt, last_subject};
pub use error::{Error, Result};
pub use language::Language;
pub use retry::RetryPolicy;
pub use safety::{post_process, post_process_with};
pub use services::{
    GeminiClient, GenerativeService, GoogleTranslateClient, Resilient, SpeechService,
    TextToSpeech, TranslationService,
};
pub use session::{Assistant, Session, Translation, Turn};
pub use text::clean_text;
