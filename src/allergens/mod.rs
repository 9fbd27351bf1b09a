//! Allergen screening
//!
//! A static catalog maps each supported allergen to the phrases that betray
//! it in free text. The detector scans descriptions (image analyses, model
//! replies) against the allergies of a child profile.

mod catalog;
mod detector;

pub use catalog::{AllergenCatalog, AllergenEntry};
pub use detector::{allergen_warning, detect};
