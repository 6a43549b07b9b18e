//! Size limit constants for input validation

/// Maximum length for a compact token string (64KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Maximum length for issuer URLs (2048 characters)
pub(crate) const MAX_ISSUER_URL_LENGTH: usize = 2048;

/// Maximum length for JWKS URIs (2048 characters)
pub(crate) const MAX_JWKS_URI_LENGTH: usize = 2048;

/// Maximum size for OIDC discovery response (64KB)
pub(crate) const MAX_DISCOVERY_RESPONSE_SIZE: usize = 64 * 1024;

/// Maximum size for JWKS response (512KB)
pub(crate) const MAX_JWKS_RESPONSE_SIZE: usize = 512 * 1024;

/// Maximum number of keys in a JWK set (100 keys)
pub(crate) const MAX_JWK_SET_SIZE: usize = 100;

// ============================================================================
// Decoded segment size limits
// ============================================================================

/// Maximum size for decoded header JSON (8KB)
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size for decoded JWS payload JSON (64KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum size for decoded signature bytes (1KB)
/// RSA signatures are 256-512 bytes for practical key sizes
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

/// Maximum size for the decoded JWE encrypted key (1KB)
/// Same bound as signatures: the wrapped key is one RSA block
pub(crate) const MAX_DECODED_ENCRYPTED_KEY_SIZE: usize = 1024;

/// Maximum size for the decoded JWE initialization vector
pub(crate) const MAX_DECODED_IV_SIZE: usize = 64;

/// Maximum size for the decoded JWE ciphertext (64KB)
pub(crate) const MAX_DECODED_CIPHERTEXT_SIZE: usize = 64 * 1024;

/// Maximum size for the decoded JWE authentication tag
pub(crate) const MAX_DECODED_TAG_SIZE: usize = 64;

// ============================================================================
// JWK field size limits
// ============================================================================

/// Maximum size for Base64URL-encoded RSA modulus (n) field (12KB)
/// 8192-byte modulus (65536 bits) encodes to ~10.9KB Base64URL
pub(crate) const MAX_JWK_N_SIZE: usize = 12 * 1024;

/// Maximum size for Base64URL-encoded RSA exponent (e) field (64 bytes)
pub(crate) const MAX_JWK_E_SIZE: usize = 64;

/// Maximum size for Base64URL-encoded RSA private members (d, p, q, dp, dq, qi)
pub(crate) const MAX_JWK_PRIVATE_SIZE: usize = 12 * 1024;

/// Maximum size for JWK key ID (kid) field (256 bytes)
pub(crate) const MAX_JWK_KID_SIZE: usize = 256;

/// Maximum size for JWK algorithm (alg) field (16 bytes)
pub(crate) const MAX_JWK_ALG_SIZE: usize = 16;

// ============================================================================
// Header field size limits
// ============================================================================

/// Maximum length for algorithm (alg) and encryption (enc) header fields (16 bytes)
pub(crate) const MAX_ALG_LENGTH: usize = 16;

/// Maximum length for key ID (kid) field in the header (256 bytes)
pub(crate) const MAX_KID_LENGTH: usize = 256;

/// Maximum length for media type (typ, cty) fields in the header (64 bytes)
pub(crate) const MAX_MEDIA_TYPE_LENGTH: usize = 64;

// ============================================================================
// Validation bounds
// ============================================================================

/// Maximum clock skew tolerance (300 seconds = 5 minutes)
/// Prevents clock skew from effectively disabling expiration checks
pub(crate) const MAX_CLOCK_SKEW_SECONDS: u64 = 300;
