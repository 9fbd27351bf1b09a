//! Safety override for replies about giving a product to a child

use crate::allergens::AllergenCatalog;

/// Phrase (lowercase) that marks a question about feeding the child
pub const CHILD_SAFETY_QUESTION: &str = "can i give this to my child";

/// Reply that replaces the model's answer when the product is unsafe
pub const DANGER_ALERT: &str = "🚫 **Danger Alert:** This product contains allergens your child is sensitive to. Do not give it to your child! Side effects may include: stomach pain, diarrhea, vomiting, or allergic reactions.";

/// Decide whether a generated reply must be replaced by [`DANGER_ALERT`]
///
/// The override fires only when the user asked the child-safety question,
/// the active profile has allergies, and the reply mentions one of them.
/// Mentions are judged with the same catalog matching as image scans, so a
/// reply saying "contains milk" flags a lactose allergy.
#[must_use]
pub fn post_process<S: AsRef<str>>(
    user_input: &str,
    response_text: &str,
    active_allergies: &[S],
) -> String {
    post_process_with(
        AllergenCatalog::builtin(),
        user_input,
        response_text,
        active_allergies,
    )
}

/// [`post_process`] against an explicit catalog
#[must_use]
pub fn post_process_with<S: AsRef<str>>(
    catalog: &AllergenCatalog,
    user_input: &str,
    response_text: &str,
    active_allergies: &[S],
) -> String {
    if active_allergies.is_empty() || !asks_child_safety(user_input) {
        return response_text.to_string();
    }

    let flagged = catalog.detect(response_text, active_allergies);
    if flagged.is_empty() {
        return response_text.to_string();
    }

    tracing::info!(allergens = ?flagged, "reply mentions child allergens, overriding with danger alert");
    DANGER_ALERT.to_string()
}

/// Whether the input contains the child-safety question
#[must_use]
pub fn asks_child_safety(user_input: &str) -> bool {
    user_input.to_lowercase().contains(CHILD_SAFETY_QUESTION)
}
