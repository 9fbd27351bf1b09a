//! Builtin allergen table

use std::sync::LazyLock;

/// Allergens known to the assistant and their trigger phrases
const BUILTIN: &[(&str, &[&str])] = &[
    (
        "lactose",
        &[
            "milk", "cheese", "yogurt", "dairy", "butter", "cream", "whey", "casein", "lactose",
            "curd",
        ],
    ),
    (
        "peanuts",
        &[
            "peanut",
            "peanuts",
            "peanut butter",
            "groundnut",
            "arachis oil",
            "monkey nut",
        ],
    ),
    (
        "gluten",
        &[
            "wheat", "barley", "rye", "bread", "pasta", "cereal", "flour", "couscous", "semolina",
            "bulgur",
        ],
    ),
    (
        "eggs",
        &[
            "egg",
            "eggs",
            "mayonnaise",
            "custard",
            "albumin",
            "ovalbumin",
            "lecithin",
            "meringue",
            "binder",
            "coagulant",
        ],
    ),
    (
        "shellfish",
        &[
            "shrimp", "crab", "lobster", "prawn", "shellfish", "crayfish", "scallop", "oyster",
            "clam", "mussel",
        ],
    ),
    (
        "soy",
        &[
            "soy",
            "soya",
            "soybean",
            "tofu",
            "tempeh",
            "edamame",
            "soy milk",
            "soy sauce",
            "soy protein",
            "textured vegetable protein",
        ],
    ),
    (
        "tree nuts",
        &[
            "almond",
            "cashew",
            "walnut",
            "pecan",
            "pistachio",
            "hazelnut",
            "macadamia",
            "brazil nut",
            "chestnut",
            "pine nut",
        ],
    ),
    (
        "sesame",
        &[
            "sesame",
            "sesame seed",
            "tahini",
            "sesame oil",
            "benne seed",
            "gingelly",
            "simsim",
        ],
    ),
    (
        "fish",
        &[
            "salmon", "tuna", "cod", "halibut", "sardine", "anchovy", "trout", "mackerel",
            "herring", "tilapia",
        ],
    ),
    (
        "mustard",
        &[
            "mustard",
            "mustard seed",
            "mustard oil",
            "mustard greens",
            "mustard powder",
            "dijon mustard",
        ],
    ),
];

static BUILTIN_CATALOG: LazyLock<AllergenCatalog> = LazyLock::new(|| {
    AllergenCatalog::new(
        BUILTIN
            .iter()
            .map(|(name, triggers)| (*name, triggers.iter().copied())),
    )
});

/// One allergen and the lowercase phrases that indicate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllergenEntry {
    name: String,
    triggers: Vec<String>,
}

impl AllergenEntry {
    /// Allergen name as used in child profiles
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trigger phrases, lowercase
    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Whether `lowered` (already lowercase) mentions this allergen
    ///
    /// The allergen name counts as a trigger of its own, so "gluten" in a
    /// reply flags gluten even though the table lists only grains. It is a
    /// substring test like the triggers: "shellfish" contains "fish".
    pub(crate) fn matches_lowered(&self, lowered: &str) -> bool {
        lowered.contains(self.name.as_str()) || self.first_trigger_in(lowered).is_some()
    }

    /// First trigger phrase contained in `lowered`, scanning in table order
    fn first_trigger_in(&self, lowered: &str) -> Option<&str> {
        self.triggers
            .iter()
            .map(String::as_str)
            .find(|t| lowered.contains(t))
    }
}

/// Immutable mapping from allergen name to trigger phrases
#[derive(Debug, Clone, Default)]
pub struct AllergenCatalog {
    entries: Vec<AllergenEntry>,
}

impl AllergenCatalog {
    /// Build a catalog from `(name, triggers)` pairs
    ///
    /// Names and triggers are stored lowercase; a repeated name replaces the
    /// earlier entry.
    pub fn new<N, I, T>(entries: impl IntoIterator<Item = (N, I)>) -> Self
    where
        N: AsRef<str>,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut catalog = Self::default();
        for (name, triggers) in entries {
            let entry = AllergenEntry {
                name: name.as_ref().trim().to_lowercase(),
                triggers: triggers
                    .into_iter()
                    .map(|t| t.as_ref().trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            };
            if let Some(existing) = catalog.entries.iter_mut().find(|e| e.name == entry.name) {
                *existing = entry;
            } else {
                catalog.entries.push(entry);
            }
        }
        catalog
    }

    /// The process-wide builtin catalog
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN_CATALOG
    }

    /// Look up an allergen by exact name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AllergenEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Whether `name` is a known allergen
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Trigger phrases for `name`, if known
    #[must_use]
    pub fn triggers(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(AllergenEntry::triggers)
    }

    /// Known allergen names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(AllergenEntry::name)
    }

    /// Number of allergens
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no allergens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `text` mentions allergen `name`
    ///
    /// Returns `None` for names not in the catalog. Matching is a
    /// case-insensitive substring test, so short triggers also fire inside
    /// longer words ("crab" in "crabgrass", "cod" in "code"). The allergen
    /// name is matched the same way, so "shellfish" also mentions fish.
    #[must_use]
    pub fn mentions(&self, name: &str, text: &str) -> Option<bool> {
        let entry = self.get(name)?;
        Some(entry.matches_lowered(&text.to_lowercase()))
    }
}
