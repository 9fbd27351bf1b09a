//! Accounts and login
//!
//! Two kinds of account exist: mothers, and child profiles that carry the
//! allergy list used for screening. Credentials come from an
//! [`IdentityProvider`]; the bundled [`AccountDirectory`] reads a fixed TOML
//! table.

mod directory;

pub use directory::{AccountDirectory, ProfilesFile};

use crate::Result;

/// A user who can log in
#[derive(Clone, PartialEq, Eq)]
pub enum Account {
    /// Mother account
    Mother { username: String, password: String },
    /// Child profile with allergy and medical metadata
    Child {
        username: String,
        password: String,
        allergies: Vec<String>,
        medical_history: Vec<String>,
    },
}

impl Account {
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Mother { username, .. } | Self::Child { username, .. } => username,
        }
    }

    /// Allergies of a child profile; empty for mothers
    #[must_use]
    pub fn allergies(&self) -> &[String] {
        match self {
            Self::Mother { .. } => &[],
            Self::Child { allergies, .. } => allergies,
        }
    }

    /// Medical history of a child profile; empty for mothers
    #[must_use]
    pub fn medical_history(&self) -> &[String] {
        match self {
            Self::Mother { .. } => &[],
            Self::Child {
                medical_history, ..
            } => medical_history,
        }
    }

    #[must_use]
    pub const fn is_child(&self) -> bool {
        matches!(self, Self::Child { .. })
    }

    fn password(&self) -> &str {
        match self {
            Self::Mother { password, .. } | Self::Child { password, .. } => password,
        }
    }

    /// Cleartext credential check
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.username() == username && self.password() == password
    }
}

// Keeps passwords out of logs
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mother { username, .. } => f
                .debug_struct("Mother")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Child {
                username,
                allergies,
                medical_history,
                ..
            } => f
                .debug_struct("Child")
                .field("username", username)
                .field("allergies", allergies)
                .field("medical_history", medical_history)
                .finish_non_exhaustive(),
        }
    }
}

/// Source of accounts for login
pub trait IdentityProvider: Send + Sync {
    /// Resolve credentials to an account
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` when the username/password pair is unknown
    fn authenticate(&self, username: &str, password: &str) -> Result<Account>;
}
