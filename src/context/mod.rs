//! Conversation context for the generative model
//!
//! Combines:
//! - The session transcript (every turn, oldest first)
//! - A best-effort "last discussed subject" annotation
//! - The active allergen warning, when an image scan produced one

mod builder;
mod message;

pub use builder::{build_context, build_prompt, last_subject};
pub use message::{Message, Role, Transcript};
