//! Fixed credential tables loaded from TOML

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{Account, IdentityProvider};
use crate::allergens::AllergenCatalog;
use crate::{Error, Result};

/// Accounts bundled with the binary
const DEFAULT_PROFILES: &str = include_str!("../../profiles/default.toml");

/// Profiles file schema
#[derive(Debug, Default, Deserialize)]
pub struct ProfilesFile {
    #[serde(default)]
    pub mothers: Vec<MotherEntry>,

    #[serde(default)]
    pub children: Vec<ChildEntry>,
}

/// `[[mothers]]` entry
#[derive(Debug, Deserialize)]
pub struct MotherEntry {
    pub username: String,
    pub password: String,
}

/// `[[children]]` entry
#[derive(Debug, Deserialize)]
pub struct ChildEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
}

/// In-memory account table
///
/// Mothers are checked before children, matching the order of the login
/// tables.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    accounts: Vec<Account>,
}

impl AccountDirectory {
    /// Build a directory, validating every account
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for empty or duplicate usernames and for
    /// child allergies missing from `catalog`
    pub fn new(accounts: Vec<Account>, catalog: &AllergenCatalog) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(accounts.len());

        for account in accounts {
            let account = normalize(account);
            let username = account.username();

            if username.is_empty() {
                return Err(Error::Config("account with empty username".to_string()));
            }
            if !seen.insert(username.to_string()) {
                return Err(Error::Config(format!("duplicate username: {username}")));
            }
            if let Some(unknown) = account.allergies().iter().find(|a| !catalog.contains(a)) {
                return Err(Error::Config(format!(
                    "account {username} lists unknown allergen: {unknown}"
                )));
            }

            validated.push(account);
        }

        Ok(Self {
            accounts: validated,
        })
    }

    /// Parse a profiles TOML document
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or fails validation
    pub fn from_toml_str(content: &str, catalog: &AllergenCatalog) -> Result<Self> {
        let file: ProfilesFile = toml::from_str(content)?;

        let mothers = file.mothers.into_iter().map(|m| Account::Mother {
            username: m.username,
            password: m.password,
        });
        let children = file.children.into_iter().map(|c| Account::Child {
            username: c.username,
            password: c.password,
            allergies: c.allergies,
            medical_history: c.medical_history,
        });

        Self::new(mothers.chain(children).collect(), catalog)
    }

    /// Load a profiles file from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated
    pub fn load(path: &Path, catalog: &AllergenCatalog) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_toml_str(&content, catalog)?;
        tracing::info!(path = %path.display(), accounts = directory.len(), "loaded profiles");
        Ok(directory)
    }

    /// The bundled accounts
    ///
    /// # Errors
    ///
    /// Returns error only if the bundled table is inconsistent with the
    /// builtin allergen catalog
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(DEFAULT_PROFILES, AllergenCatalog::builtin())
    }

    /// Find an account by username
    #[must_use]
    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username() == username)
    }

    /// All accounts, mothers first
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl IdentityProvider for AccountDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        match self.get(username) {
            Some(account) if account.verify(username, password) => {
                tracing::info!(username, child = account.is_child(), "login succeeded");
                Ok(account.clone())
            }
            _ => {
                tracing::warn!(username, "login failed");
                Err(Error::Auth("invalid username or password".to_string()))
            }
        }
    }
}

/// Trim usernames, lowercase allergies and drop repeated allergies
fn normalize(account: Account) -> Account {
    match account {
        Account::Mother { username, password } => Account::Mother {
            username: username.trim().to_string(),
            password,
        },
        Account::Child {
            username,
            password,
            allergies,
            medical_history,
        } => {
            let mut unique: Vec<String> = Vec::with_capacity(allergies.len());
            for allergy in allergies {
                let allergy = allergy.trim().to_lowercase();
                if !unique.contains(&allergy) {
                    unique.push(allergy);
                }
            }
            Account::Child {
                username: username.trim().to_string(),
                password,
                allergies: unique,
                medical_history,
            }
        }
    }
}
