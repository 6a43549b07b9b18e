//! JWK (JSON Web Key) struct and conversion

use crate::error::{Error, Result};
use crate::limits::{
    MAX_JWK_ALG_SIZE, MAX_JWK_E_SIZE, MAX_JWK_KID_SIZE, MAX_JWK_N_SIZE, MAX_JWK_PRIVATE_SIZE,
};
use crate::utils::base64url;
use crate::utils::der::{RsaPrivateComponents, rsa_pkcs8_from_components, rsa_spki_from_n_e};
use miniserde::Deserialize;

/// JSON Web Key (JWK) structure
///
/// Only RSA members are decoded. Private members are optional and, when
/// present, make the key usable for unwrapping content encryption keys.
#[derive(Clone, Default, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA")
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm hint; when set, the key is only used with this algorithm
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2): "sig" or "enc", absent for any purpose
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA public exponent (Base64URL-encoded)
    pub e: Option<String>,
    /// RSA private exponent
    pub d: Option<String>,
    /// First prime factor
    pub p: Option<String>,
    /// Second prime factor
    pub q: Option<String>,
    /// First factor CRT exponent
    pub dp: Option<String>,
    /// Second factor CRT exponent
    pub dq: Option<String>,
    /// First CRT coefficient
    pub qi: Option<String>,
}

// Private members stay out of logs
impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("use", &self.key_use)
            .field("private", &self.is_private())
            .finish_non_exhaustive()
    }
}

impl Jwk {
    /// Whether the key carries a private exponent
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Validate field sizes before any member is decoded
    pub(crate) fn validate_fields(&self) -> Result<()> {
        check_size("kid", self.kid.as_deref(), MAX_JWK_KID_SIZE)?;
        check_size("alg", self.alg.as_deref(), MAX_JWK_ALG_SIZE)?;
        check_size("n", self.n.as_deref(), MAX_JWK_N_SIZE)?;
        check_size("e", self.e.as_deref(), MAX_JWK_E_SIZE)?;
        for (name, value) in [
            ("d", &self.d),
            ("p", &self.p),
            ("q", &self.q),
            ("dp", &self.dp),
            ("dq", &self.dq),
            ("qi", &self.qi),
        ] {
            check_size(name, value.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        }
        Ok(())
    }

    /// Convert JWK to a DER-encoded SubjectPublicKeyInfo
    pub(crate) fn to_public_key_der(&self) -> Result<Vec<u8>> {
        self.validate_fields()?;
        self.require_rsa()?;

        let n = decode_member("n", self.n.as_deref(), MAX_JWK_N_SIZE)?;
        let e = decode_member("e", self.e.as_deref(), MAX_JWK_E_SIZE)?;

        rsa_spki_from_n_e(&n, &e)
    }

    /// Convert JWK to a DER-encoded PKCS#8 private key
    pub(crate) fn to_private_key_der(&self) -> Result<Vec<u8>> {
        self.validate_fields()?;
        self.require_rsa()?;

        let n = decode_member("n", self.n.as_deref(), MAX_JWK_N_SIZE)?;
        let e = decode_member("e", self.e.as_deref(), MAX_JWK_E_SIZE)?;
        let d = decode_member("d", self.d.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        let p = decode_member("p", self.p.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        let q = decode_member("q", self.q.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        let dp = decode_member("dp", self.dp.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        let dq = decode_member("dq", self.dq.as_deref(), MAX_JWK_PRIVATE_SIZE)?;
        let qi = decode_member("qi", self.qi.as_deref(), MAX_JWK_PRIVATE_SIZE)?;

        rsa_pkcs8_from_components(&RsaPrivateComponents {
            n: &n,
            e: &e,
            d: &d,
            p: &p,
            q: &q,
            dp: &dp,
            dq: &dq,
            qi: &qi,
        })
    }

    fn require_rsa(&self) -> Result<()> {
        match self.kty.as_deref() {
            Some("RSA") => Ok(()),
            Some(kty) => Err(Error::KeyInvalid(format!(
                "key type mismatch: expected RSA, found {kty}"
            ))),
            None => Err(Error::KeyInvalid("missing key type (kty)".into())),
        }
    }
}

fn check_size(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(value) if value.len() > max => Err(Error::KeyInvalid(format!(
            "field '{field}' too large: {} bytes (maximum: {max} bytes)",
            value.len()
        ))),
        _ => Ok(()),
    }
}

/// Decode a Base64URL member; 4 chars carry 3 bytes, so the decoded bound is 3/4 of the encoded one
fn decode_member(field: &str, value: Option<&str>, max_encoded: usize) -> Result<Vec<u8>> {
    let value = value.ok_or_else(|| Error::KeyInvalid(format!("rsa key missing {field}")))?;
    base64url::decode_bytes(value, max_encoded * 3 / 4)
        .map_err(|e| Error::KeyInvalid(format!("failed to decode {field}: {e}")))
}
