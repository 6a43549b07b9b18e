//! Pluggable key resolution

use crate::error::Result;
use crate::jwks::JwkSet;
use std::sync::Arc;

/// What a key is needed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Unwrap a JWE content encryption key (private key, `use` = `enc`)
    Decrypt,
    /// Verify a JWS signature (public key, `use` = `sig`)
    Verify,
}

impl KeyRole {
    /// The JWK `use` value matching this role
    pub const fn key_use(&self) -> &'static str {
        match self {
            KeyRole::Decrypt => "enc",
            KeyRole::Verify => "sig",
        }
    }
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyRole::Decrypt => write!(f, "decryption"),
            KeyRole::Verify => write!(f, "verification"),
        }
    }
}

/// Criteria passed to a [`KeySource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCriteria<'a> {
    pub role: KeyRole,
    pub key_id: Option<&'a str>,
}

/// Supplies key sets to the processor
///
/// Implementations may be backed by a static document or by a remote,
/// cached key set. `resolve` is called once per object that needs a key and
/// must not block on network I/O; a source that cannot answer returns
/// [`Error::KeySourceUnavailable`](crate::Error::KeySourceUnavailable).
/// The returned set may contain more keys than the criteria ask for; final
/// selection happens in the processor.
pub trait KeySource: Send + Sync {
    fn resolve(&self, criteria: &KeyCriteria<'_>) -> Result<JwkSet>;
}

impl KeySource for JwkSet {
    fn resolve(&self, _criteria: &KeyCriteria<'_>) -> Result<JwkSet> {
        Ok(self.clone())
    }
}

impl<S: KeySource + ?Sized> KeySource for Arc<S> {
    fn resolve(&self, criteria: &KeyCriteria<'_>) -> Result<JwkSet> {
        (**self).resolve(criteria)
    }
}
