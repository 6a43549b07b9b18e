//! A small processor for signed and nested (encrypted-then-signed) JWTs.

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod clock;
pub(crate) mod compact;
pub(crate) mod discovery;
pub(crate) mod header;
pub(crate) mod jwe;
pub(crate) mod jws;
pub(crate) mod processor;
pub(crate) mod url;
pub(crate) mod utils;

// Public Interface
pub use algorithm::{
    AlgorithmPolicy, ContentEncryption, ContentEncryptionPolicy, JoseAlgorithm,
    KeyWrapAlgorithm, KeyWrapPolicy, SignatureAlgorithm, SignaturePolicy,
};
pub use claims::{ClaimSet, ClaimsValidation};
pub use clock::{Clock, FixedClock, SystemClock};
pub use compact::{CompactObject, EncryptedObject, PlainObject, SignedObject, parse};
pub use error::{Error, Result};
pub use header::{JoseHeader, TypeVerifier};
pub use jwks::JwkSet;
pub use jwks::jwk::Jwk;
pub use jwks::remote::{KeySetLocation, RemoteKeySource};
pub use jwks::selector::KidMatch;
pub use jwks::source::{KeyCriteria, KeyRole, KeySource};
pub use processor::JwtProcessor;

pub use miniserde::json::Value;

pub(crate) mod limits;
