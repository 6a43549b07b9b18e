//! DER encoding utilities for converting JWK formats to DER structures
//!
//! Public keys become SubjectPublicKeyInfo (for signature verification),
//! private keys become PKCS#8 PrivateKeyInfo (for key unwrapping). Both are
//! the formats the aws-lc-rs backend parses.

use crate::error::{Error, Result};
use der::{
    Encode, Sequence,
    asn1::{BitString, OctetStringRef, UintRef},
};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

/// rsaEncryption (PKCS #1)
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Upper bound on the modulus: 8192 bytes (65536 bits), well beyond practical use
const MAX_RSA_MODULUS_SIZE: usize = 8192;

fn key_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::KeyInvalid(format!("{operation}: {details}"))
}

/// RSAPublicKey as defined in RFC 8017:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// RSAPrivateKey as defined in RFC 8017, two-prime form (version 0)
#[derive(Sequence)]
struct RsaPrivateKey<'a> {
    version: u8,
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
    private_exponent: UintRef<'a>,
    prime1: UintRef<'a>,
    prime2: UintRef<'a>,
    exponent1: UintRef<'a>,
    exponent2: UintRef<'a>,
    coefficient: UintRef<'a>,
}

/// PrivateKeyInfo as defined in RFC 5208 (no attributes)
#[derive(Sequence)]
struct PrivateKeyInfo<'a> {
    version: u8,
    algorithm: AlgorithmIdentifierOwned,
    private_key: OctetStringRef<'a>,
}

/// Raw big-endian RSA private key components, as carried by a JWK
pub(crate) struct RsaPrivateComponents<'a> {
    pub n: &'a [u8],
    pub e: &'a [u8],
    pub d: &'a [u8],
    pub p: &'a [u8],
    pub q: &'a [u8],
    pub dp: &'a [u8],
    pub dq: &'a [u8],
    pub qi: &'a [u8],
}

fn rsa_algorithm_identifier() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION_OID,
        parameters: Some(der::asn1::AnyRef::NULL.into()),
    }
}

fn check_modulus(n: &[u8]) -> Result<()> {
    if n.len() > MAX_RSA_MODULUS_SIZE {
        return Err(key_error(
            "RSA modulus too large",
            format!(
                "{} bytes (maximum: {} bytes)",
                n.len(),
                MAX_RSA_MODULUS_SIZE
            ),
        ));
    }
    Ok(())
}

fn uint<'a>(name: &str, bytes: &'a [u8]) -> Result<UintRef<'a>> {
    if bytes.is_empty() {
        return Err(key_error("rsa key component is empty", name));
    }
    UintRef::new(bytes).map_err(|e| key_error(&format!("failed to encode RSA {name}"), e))
}

/// Build DER-encoded RSA public key from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    check_modulus(n)?;

    let rsa_pubkey = RsaPublicKey {
        modulus: uint("modulus", n)?,
        public_exponent: uint("exponent", e)?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| key_error("failed to encode RSA public key", e))?;

    let subject_public_key = BitString::new(0, rsa_pubkey_der)
        .map_err(|e| key_error("failed to create bit string", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm: rsa_algorithm_identifier(),
        subject_public_key,
    };

    spki.to_der()
        .map_err(|e| key_error("failed to encode SPKI", e))
}

/// Build a DER-encoded PKCS#8 document from RSA private key components
pub(crate) fn rsa_pkcs8_from_components(key: &RsaPrivateComponents<'_>) -> Result<Vec<u8>> {
    check_modulus(key.n)?;

    let private_key = RsaPrivateKey {
        version: 0,
        modulus: uint("modulus", key.n)?,
        public_exponent: uint("exponent", key.e)?,
        private_exponent: uint("private exponent", key.d)?,
        prime1: uint("prime p", key.p)?,
        prime2: uint("prime q", key.q)?,
        exponent1: uint("exponent dp", key.dp)?,
        exponent2: uint("exponent dq", key.dq)?,
        coefficient: uint("coefficient qi", key.qi)?,
    };

    let private_key_der = private_key
        .to_der()
        .map_err(|e| key_error("failed to encode RSA private key", e))?;

    let info = PrivateKeyInfo {
        version: 0,
        algorithm: rsa_algorithm_identifier(),
        private_key: OctetStringRef::new(&private_key_der)
            .map_err(|e| key_error("failed to create octet string", e))?,
    };

    info.to_der()
        .map_err(|e| key_error("failed to encode PKCS#8", e))
}
