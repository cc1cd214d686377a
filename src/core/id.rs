//! Identifiers for accounts and listed collaborators.
//!
//! Accounts are 20-byte opaque identities; the wallet infrastructure that
//! produces them is out of scope, so the only derivation offered here is a
//! deterministic hash of a label. Tokens, bonds, and pools are interned by
//! small ids handed out when they are listed on a [`crate::market::Market`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of an account identifier in bytes
pub const ACCOUNT_ID_LENGTH: usize = 20;

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque caller identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    /// Create from raw bytes
    pub const fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive deterministically from a label (SHA-256, truncated)
    pub fn named(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        bytes.copy_from_slice(&digest[..ACCOUNT_ID_LENGTH]);
        Self(bytes)
    }

    /// Get the raw bytes
    pub const fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// Render as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != ACCOUNT_ID_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "expected {} bytes, got {}",
                ACCOUNT_ID_LENGTH,
                bytes.len()
            )));
        }
        let mut arr = [0u8; ACCOUNT_ID_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(AccountId(arr))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNED IDS
// ═══════════════════════════════════════════════════════════════════════════════

macro_rules! interned_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Create from a raw index
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the raw index
            pub const fn index(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

interned_id!(
    /// Identifier of a listed fungible token
    TokenId,
    "token"
);

interned_id!(
    /// Identifier of a listed fixed-term bond (hToken)
    BondId,
    "bond"
);

interned_id!(
    /// Identifier of a listed AMM pool
    PoolId,
    "pool"
);
