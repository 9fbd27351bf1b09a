//! Allergen detection over free text

use super::AllergenCatalog;

impl AllergenCatalog {
    /// Allergens from `allergies` that `description` mentions
    ///
    /// Results follow the order of `allergies` with duplicates removed.
    /// Names missing from the catalog are skipped. Scanning an allergen stops
    /// at its first matching phrase.
    #[must_use]
    pub fn detect<S: AsRef<str>>(&self, description: &str, allergies: &[S]) -> Vec<String> {
        if allergies.is_empty() {
            return Vec::new();
        }

        let lowered = description.to_lowercase();
        let mut detected: Vec<String> = Vec::new();

        for allergy in allergies {
            let name = allergy.as_ref();
            if detected.iter().any(|d| d == name) {
                continue;
            }
            let Some(entry) = self.get(name) else {
                tracing::trace!(allergen = name, "allergen not in catalog, skipping");
                continue;
            };
            if entry.matches_lowered(&lowered) {
                detected.push(name.to_string());
            }
        }

        detected
    }
}

/// Detect allergens using the builtin catalog
#[must_use]
pub fn detect<S: AsRef<str>>(description: &str, allergies: &[S]) -> Vec<String> {
    AllergenCatalog::builtin().detect(description, allergies)
}

/// Warning shown after an image scan finds allergens
#[must_use]
pub fn allergen_warning(detected: &[String]) -> Option<String> {
    if detected.is_empty() {
        return None;
    }

    Some(format!(
        "⚠️ **Warning:** This product may contain allergens your child is sensitive to: {}.",
        detected.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_allergy_order() {
        let found = detect("This contains milk and peanuts", &["lactose", "peanuts"]);
        assert_eq!(found, vec!["lactose", "peanuts"]);

        let found = detect("This contains milk and peanuts", &["peanuts", "lactose"]);
        assert_eq!(found, vec!["peanuts", "lactose"]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(detect("Plain rice", &["gluten"]).is_empty());
    }

    #[test]
    fn empty_allergies_is_empty() {
        let none: [&str; 0] = [];
        assert!(detect("milk bread eggs", &none).is_empty());
    }

    #[test]
    fn unknown_allergy_is_skipped() {
        let found = detect("kiwi and walnut salad", &["kiwi", "tree nuts"]);
        assert_eq!(found, vec!["tree nuts"]);
    }

    #[test]
    fn duplicates_are_removed() {
        let found = detect("Cheese toast", &["lactose", "lactose", "gluten"]);
        assert_eq!(found, vec!["lactose"]);
    }

    #[test]
    fn multiple_allergens_from_one_phrase() {
        // "soy milk" fires both soy and lactose
        let found = detect("A glass of soy milk", &["soy", "lactose"]);
        assert_eq!(found, vec!["soy", "lactose"]);
    }

    #[test]
    fn results_are_subset_of_allergies_and_catalog() {
        let allergies = ["eggs", "unicorn", "sesame", "fish"];
        let found = detect("Tahini, egg custard and tuna", &allergies);
        for name in &found {
            assert!(allergies.contains(&name.as_str()));
            assert!(AllergenCatalog::builtin().contains(name));
        }
        assert_eq!(found, vec!["eggs", "sesame", "fish"]);
    }

    #[test]
    fn allergen_name_matches_inside_longer_words() {
        // No fish trigger appears, but the name "fish" is inside "shellfish"
        assert_eq!(detect("A shellfish platter", &["fish"]), vec!["fish"]);
        assert_eq!(
            AllergenCatalog::builtin().mentions("fish", "A shellfish platter"),
            Some(true)
        );
        assert!(detect("A shellfish platter", &["mustard"]).is_empty());
    }

    #[test]
    fn custom_catalog_detection() {
        let catalog = AllergenCatalog::new([("kiwi", ["kiwifruit"])]);
        assert_eq!(catalog.detect("Dried KIWIFRUIT", &["kiwi"]), vec!["kiwi"]);
        assert!(catalog.detect("Dried kiwifruit", &["lactose"]).is_empty());
    }

    #[test]
    fn warning_text() {
        assert_eq!(allergen_warning(&[]), None);
        assert_eq!(
            allergen_warning(&["lactose".to_string(), "peanuts".to_string()]).unwrap(),
            "⚠️ **Warning:** This product may contain allergens your child is sensitive to: lactose, peanuts."
        );
    }
}
