//! Session key store.
//!
//! # Security
//! - Keys are supplied by the caller (or read from environment variables)
//!   and held in memory only; the store cannot be serialized
//! - Only public keys are ever logged

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::keys::{PrivateKey, PublicKey};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable names read by [`KeyStore::from_env`], one per role.
pub const OWNER_WIF_ENV_VAR: &str = "HIVE_OWNER_WIF";
pub const ACTIVE_WIF_ENV_VAR: &str = "HIVE_ACTIVE_WIF";
pub const POSTING_WIF_ENV_VAR: &str = "HIVE_POSTING_WIF";
pub const MEMO_WIF_ENV_VAR: &str = "HIVE_MEMO_WIF";

/// Authority role, ordered by broadcast power (`Memo < Posting < Active < Owner`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Memo,
    Posting,
    Active,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Active, Role::Posting, Role::Memo];

    /// True when a key of this role may sign for `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Active => "active",
            Role::Posting => "posting",
            Role::Memo => "memo",
        }
    }

    fn env_var(&self) -> &'static str {
        match self {
            Role::Owner => OWNER_WIF_ENV_VAR,
            Role::Active => ACTIVE_WIF_ENV_VAR,
            Role::Posting => POSTING_WIF_ENV_VAR,
            Role::Memo => MEMO_WIF_ENV_VAR,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "active" => Ok(Role::Active),
            "posting" => Ok(Role::Posting),
            "memo" => Ok(Role::Memo),
            other => Err(BlockchainError::InvalidKey(format!("unknown role '{}'", other))),
        }
    }
}

/// A private key bound to the role it signs for.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    role: Role,
    key: PrivateKey,
    public_key: PublicKey,
}

impl KeyEntry {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }
}

/// Keys for one signing session, indexed by role.
///
/// Entries are append-only. Several entries may share a role (multi-sig).
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    entries: Vec<KeyEntry>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a WIF-encoded key for `role`. Malformed keys are rejected immediately.
    pub fn add_wif(&mut self, role: Role, wif: &str) -> BlockchainResult<PublicKey> {
        if wif.trim().is_empty() {
            return Err(BlockchainError::InvalidKey(format!("empty {} key", role)));
        }
        let key = PrivateKey::from_wif(wif)?;
        Ok(self.add_key(role, key))
    }

    /// Add an already parsed key. Adding the same key twice for a role is a no-op.
    pub fn add_key(&mut self, role: Role, key: PrivateKey) -> PublicKey {
        let public_key = key.public_key();
        let exists = self
            .entries
            .iter()
            .any(|e| e.role == role && e.public_key == public_key);

        if !exists {
            tracing::info!(role = %role, public_key = %public_key, "Key added to store");
            self.entries.push(KeyEntry {
                role,
                key,
                public_key,
            });
        }
        public_key
    }

    /// Builder-style variant of [`KeyStore::add_wif`].
    pub fn with_wif(mut self, role: Role, wif: &str) -> BlockchainResult<Self> {
        self.add_wif(role, wif)?;
        Ok(self)
    }

    /// Load keys from `HIVE_{OWNER,ACTIVE,POSTING,MEMO}_WIF`. Unset variables are skipped.
    pub fn from_env() -> BlockchainResult<Self> {
        let mut store = Self::new();
        for role in Role::ALL {
            if let Ok(wif) = std::env::var(role.env_var()) {
                store.add_wif(role, &wif).map_err(|e| {
                    BlockchainError::InvalidKey(format!("{}: {}", role.env_var(), e))
                })?;
            }
        }
        Ok(store)
    }

    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Roles present in the store, highest first.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.entries.iter().map(|e| e.role).collect();
        roles.sort_by(|a, b| b.cmp(a));
        roles.dedup();
        roles
    }

    /// Keys for the weakest role that still satisfies `required`.
    ///
    /// Signing with the least powerful sufficient role keeps owner and active
    /// keys out of posting-level transactions.
    pub fn signing_keys(&self, required: Role) -> Vec<&KeyEntry> {
        let role = self
            .entries
            .iter()
            .map(|e| e.role)
            .filter(|r| r.satisfies(required))
            .min();

        match role {
            Some(role) => self.entries.iter().filter(|e| e.role == role).collect(),
            None => Vec::new(),
        }
    }

    /// Highest role registered for a public key, if the key is known.
    pub fn role_of(&self, public_key: &PublicKey) -> Option<Role> {
        self.entries
            .iter()
            .filter(|e| &e.public_key == public_key)
            .map(|e| e.role)
            .max()
    }

    pub fn can_sign(&self, required: Role) -> bool {
        self.entries.iter().any(|e| e.role.satisfies(required))
    }
}
