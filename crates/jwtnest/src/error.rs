//! Errors for jwtnest

use thiserror::Error;

/// JWTnest Errors
///
/// Every variant is terminal for the verification attempt that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Header field '{field}' too long: {length} bytes (maximum: {max} bytes)")]
    HeaderFieldTooLong {
        field: String,
        length: usize,
        max: usize,
    },

    #[error("Unsupported header parameter: {0}")]
    UnsupportedHeader(String),

    // ============================================================================
    // Type Gating Errors
    // ============================================================================
    #[error("Unexpected content type (cty): {found:?}")]
    UnexpectedContentType { found: Option<String> },

    #[error("Unexpected token type (typ): {found:?}")]
    UnexpectedTokenType { found: Option<String> },

    #[error("Unacceptable token type: {0}")]
    UnacceptableTokenType(String),

    #[error("Token must be encrypted")]
    EncryptionRequired,

    // ============================================================================
    // Algorithm Errors
    // ============================================================================
    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    // ============================================================================
    // Key Errors
    // ============================================================================
    #[error("No {role} key found (kid: {kid:?})")]
    KeyNotFound { role: String, kid: Option<String> },

    #[error("Invalid key material: {0}")]
    KeyInvalid(String),

    #[error("Key source unavailable: {0}")]
    KeySourceUnavailable(String),

    // ============================================================================
    // Cryptographic Errors
    // ============================================================================
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Clock skew too large: {value} seconds (maximum: {max} seconds)")]
    ClockSkewTooLarge { value: u64, max: u64 },

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("Required claim '{0}' is missing")]
    MissingClaim(String),

    #[error("Prohibited claim '{0}' is present")]
    ProhibitedClaimPresent(String),

    #[error("Claim '{0}' does not match the expected value")]
    ClaimMismatch(String),

    #[error("Claim '{0}' has an invalid type")]
    ClaimTypeInvalid(String),

    #[error("Token audience rejected: expected one of {expected:?}, found {found:?}")]
    AudienceRejected {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Token expired at {expired_at} (now: {now}, skew: {skew}s)")]
    TokenExpired {
        expired_at: i64,
        now: i64,
        skew: u64,
    },

    #[error("Token not valid until {not_before} (now: {now}, skew: {skew}s)")]
    TokenNotYetValid {
        not_before: i64,
        now: i64,
        skew: u64,
    },

    #[error("Integer overflow in timestamp arithmetic")]
    TimestampOverflow,

    // ============================================================================
    // Remote/JWKS Errors
    // ============================================================================
    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Remote URL too long: {length} characters (maximum: {max} characters)")]
    RemoteUrlTooLong { length: usize, max: usize },

    #[error("Remote response too large: {size} bytes (maximum: {max} bytes)")]
    RemoteResponseTooLarge { size: usize, max: usize },

    #[error("Remote JWK set too large: {key_count} keys (maximum: {max} keys)")]
    RemoteJwkSetTooLarge { key_count: usize, max: usize },
}

/// Result type alias for JWTnest operations
pub type Result<T> = std::result::Result<T, Error>;
