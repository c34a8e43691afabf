//! Deterministic one-way mapping from an externally-visible identity
//! (email) to the stable opaque key used to partition PII stores.
//!
//! The key derivation is pure (no I/O, no randomness), which is what lets
//! the routing directory, the regional PII stores, and the aggregator all
//! agree on "which user" without ever sharing the raw email.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable opaque identifier for a user, derived from their email.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UserKey(String);

impl UserKey {
    /// Returns the key as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserKey> for String {
    fn from(key: UserKey) -> Self {
        key.0
    }
}

/// Computes the user key for an email address.
///
/// The email is trimmed and lower-cased before hashing, so any two inputs
/// that are equal up to case and surrounding whitespace yield the same
/// key. The key is the SHA-256 digest rendered as 64 uppercase hex
/// characters, matching the key format already present in deployed
/// regional stores.
#[must_use]
pub fn compute_user_key(email: &str) -> UserKey {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());

    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        key.push_str(&format!("{byte:02X}"));
    }

    UserKey(key)
}
