//! Algorithm identifiers and allow-list policies
//!
//! Three independent families are recognised: JWS signature algorithms,
//! JWE key management (key wrap) algorithms and JWE content encryption
//! methods. Each family gets its own [`AlgorithmPolicy`], so the outer
//! encryption layer and the signature layer are allow-listed separately.
use crate::error::{Error, Result};

use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// A JOSE algorithm identifier from one family
pub trait JoseAlgorithm: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Parse the registered name, returning `None` for anything unsupported
    fn from_name(name: &str) -> Option<Self>;

    /// Registered name as it appears in headers
    fn name(&self) -> &'static str;

    /// JWK key type (`kty`) the algorithm operates on
    fn key_type(&self) -> &'static str;
}

// ============================================================================
// Signature algorithms
// ============================================================================

/// JWS signature algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RS256,
    RS384,
    RS512,
}

impl SignatureAlgorithm {
    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::RS256 => "RS256",
            SignatureAlgorithm::RS384 => "RS384",
            SignatureAlgorithm::RS512 => "RS512",
        }
    }

    fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            SignatureAlgorithm::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            SignatureAlgorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            SignatureAlgorithm::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }

    /// Verify a signature using the algorithm
    ///
    /// # Arguments
    /// * `signing_input` - The data that was signed (header.payload)
    /// * `signature` - The decoded signature bytes
    /// * `key_der` - The DER-encoded public key (SubjectPublicKeyInfo)
    pub(crate) fn verify_signature(
        &self,
        signing_input: &[u8],
        signature: &[u8],
        key_der: &[u8],
    ) -> Result<()> {
        let public_key = UnparsedPublicKey::new(self.verification_algorithm(), key_der);

        public_key
            .verify(signing_input, signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}

impl JoseAlgorithm for SignatureAlgorithm {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "RS256" => Some(SignatureAlgorithm::RS256),
            "RS384" => Some(SignatureAlgorithm::RS384),
            "RS512" => Some(SignatureAlgorithm::RS512),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn key_type(&self) -> &'static str {
        "RSA"
    }
}

// ============================================================================
// Key management algorithms
// ============================================================================

/// JWE key management algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWrapAlgorithm {
    /// RSAES-OAEP with SHA-1 and MGF1-SHA-1
    RsaOaep,
    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256
    RsaOaep256,
}

impl KeyWrapAlgorithm {
    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            KeyWrapAlgorithm::RsaOaep => "RSA-OAEP",
            KeyWrapAlgorithm::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

impl JoseAlgorithm for KeyWrapAlgorithm {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "RSA-OAEP" => Some(KeyWrapAlgorithm::RsaOaep),
            "RSA-OAEP-256" => Some(KeyWrapAlgorithm::RsaOaep256),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn key_type(&self) -> &'static str {
        "RSA"
    }
}

// ============================================================================
// Content encryption methods
// ============================================================================

/// JWE content encryption method (AES-CBC with HMAC, RFC 7518 section 5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncryption {
    A128CbcHs256,
    A256CbcHs512,
}

impl ContentEncryption {
    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            ContentEncryption::A128CbcHs256 => "A128CBC-HS256",
            ContentEncryption::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    /// Length of the content encryption key (MAC key followed by AES key)
    pub(crate) const fn key_len(&self) -> usize {
        match self {
            ContentEncryption::A128CbcHs256 => 32,
            ContentEncryption::A256CbcHs512 => 64,
        }
    }

    /// Length of the truncated authentication tag
    pub(crate) const fn tag_len(&self) -> usize {
        self.key_len() / 2
    }
}

impl JoseAlgorithm for ContentEncryption {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "A128CBC-HS256" => Some(ContentEncryption::A128CbcHs256),
            "A256CBC-HS512" => Some(ContentEncryption::A256CbcHs512),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }

    // Symmetric: the content key is never looked up in a key set
    fn key_type(&self) -> &'static str {
        "oct"
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {$(
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    )*};
}

impl_display!(SignatureAlgorithm, KeyWrapAlgorithm, ContentEncryption);

// ============================================================================
// Policies
// ============================================================================

/// Policy for allowed algorithms of one family
#[derive(Debug, Clone)]
pub struct AlgorithmPolicy<A> {
    allowed: Vec<A>,
}

/// Allow-list for JWS signature algorithms
pub type SignaturePolicy = AlgorithmPolicy<SignatureAlgorithm>;

/// Allow-list for JWE key management algorithms
pub type KeyWrapPolicy = AlgorithmPolicy<KeyWrapAlgorithm>;

/// Allow-list for JWE content encryption methods
pub type ContentEncryptionPolicy = AlgorithmPolicy<ContentEncryption>;

impl<A: JoseAlgorithm> AlgorithmPolicy<A> {
    /// Create a policy that allows only specific algorithms
    pub fn allow_only(algorithms: Vec<A>) -> Self {
        Self {
            allowed: algorithms,
        }
    }

    /// Resolve a header value against the policy
    ///
    /// Unknown names and known-but-disallowed names fail the same way, so
    /// nothing past this point ever sees an algorithm outside the list.
    pub(crate) fn resolve(&self, name: &str) -> Result<A> {
        match A::from_name(name) {
            Some(algorithm) if self.is_allowed(&algorithm) => Ok(algorithm),
            _ => Err(Error::AlgorithmNotAllowed {
                found: name.to_string(),
                allowed: self.allowed.iter().map(|a| a.name().to_string()).collect(),
            }),
        }
    }

    /// Check if an algorithm is allowed
    pub fn is_allowed(&self, algorithm: &A) -> bool {
        self.allowed.contains(algorithm)
    }
}

impl SignaturePolicy {
    /// Policy that allows only RS256
    pub fn rs256_only() -> Self {
        Self::allow_only(vec![SignatureAlgorithm::RS256])
    }

    /// Policy that allows all RSA algorithms (RS256, RS384, RS512)
    ///
    /// Equivalent to `Default::default()`.
    pub fn rsa_all() -> Self {
        Self::allow_only(vec![
            SignatureAlgorithm::RS256,
            SignatureAlgorithm::RS384,
            SignatureAlgorithm::RS512,
        ])
    }
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self::rsa_all()
    }
}

impl KeyWrapPolicy {
    /// Policy that allows only RSA-OAEP (SHA-1)
    pub fn rsa_oaep_only() -> Self {
        Self::allow_only(vec![KeyWrapAlgorithm::RsaOaep])
    }

    /// Policy that allows RSA-OAEP and RSA-OAEP-256
    pub fn rsa_oaep_all() -> Self {
        Self::allow_only(vec![KeyWrapAlgorithm::RsaOaep, KeyWrapAlgorithm::RsaOaep256])
    }
}

impl Default for KeyWrapPolicy {
    fn default() -> Self {
        Self::rsa_oaep_all()
    }
}

impl ContentEncryptionPolicy {
    /// Policy that allows A128CBC-HS256 and A256CBC-HS512
    pub fn aes_cbc_hmac_all() -> Self {
        Self::allow_only(vec![
            ContentEncryption::A128CbcHs256,
            ContentEncryption::A256CbcHs512,
        ])
    }
}

impl Default for ContentEncryptionPolicy {
    fn default() -> Self {
        Self::aes_cbc_hmac_all()
    }
}
