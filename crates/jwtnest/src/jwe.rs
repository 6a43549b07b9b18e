//! JWE decryption engine
//!
//! RSA-OAEP key unwrap followed by AES-CBC-HMAC content decryption
//! (RFC 7516, RFC 7518 sections 4.3 and 5.2). Every failure after key
//! selection collapses into [`Error::DecryptionFailed`], whatever the cause:
//! wrong key, bad OAEP padding, wrong content key length, tag mismatch or
//! bad PKCS#7 padding.

use crate::algorithm::{ContentEncryption, KeyWrapAlgorithm};
use crate::compact::EncryptedObject;
use crate::error::{Error, Result};
use crate::jwks::jwk::Jwk;

use aws_lc_rs::cipher::{
    AES_128, AES_256, DecryptionContext, PaddedBlockDecryptingKey, UnboundCipherKey,
};
use aws_lc_rs::hmac;
use aws_lc_rs::iv::FixedLength;
use aws_lc_rs::rsa::{
    OAEP_SHA1_MGF1SHA1, OAEP_SHA256_MGF1SHA256, OaepAlgorithm, OaepPrivateDecryptingKey,
    PrivateDecryptingKey,
};

const AES_BLOCK_LEN: usize = 16;

impl KeyWrapAlgorithm {
    fn oaep_algorithm(&self) -> &'static OaepAlgorithm {
        match self {
            KeyWrapAlgorithm::RsaOaep => &OAEP_SHA1_MGF1SHA1,
            KeyWrapAlgorithm::RsaOaep256 => &OAEP_SHA256_MGF1SHA256,
        }
    }
}

impl ContentEncryption {
    fn hmac_algorithm(&self) -> hmac::Algorithm {
        match self {
            ContentEncryption::A128CbcHs256 => hmac::HMAC_SHA256,
            ContentEncryption::A256CbcHs512 => hmac::HMAC_SHA512,
        }
    }

    fn cipher_algorithm(&self) -> &'static aws_lc_rs::cipher::Algorithm {
        match self {
            ContentEncryption::A128CbcHs256 => &AES_128,
            ContentEncryption::A256CbcHs512 => &AES_256,
        }
    }
}

/// Decrypt an encrypted object with the first candidate key that works
///
/// `candidates` come from key selection and are tried in order.
pub(crate) fn decrypt(
    object: &EncryptedObject,
    wrap: KeyWrapAlgorithm,
    enc: ContentEncryption,
    candidates: &[&Jwk],
) -> Result<Vec<u8>> {
    for jwk in candidates {
        let Ok(cek) = unwrap_key(jwk, wrap, &object.encrypted_key) else {
            continue;
        };
        if let Ok(plaintext) = decrypt_content(enc, &cek, object) {
            tracing::debug!(kid = jwk.kid.as_deref(), "decrypted content");
            return Ok(plaintext);
        }
    }

    Err(Error::DecryptionFailed)
}

/// Recover the content encryption key with an RSA private key
fn unwrap_key(jwk: &Jwk, wrap: KeyWrapAlgorithm, encrypted_key: &[u8]) -> Result<Vec<u8>> {
    let pkcs8 = jwk.to_private_key_der().map_err(|e| {
        tracing::warn!(kid = jwk.kid.as_deref(), error = %e, "skipping unusable decryption key");
        Error::DecryptionFailed
    })?;

    let private_key =
        PrivateDecryptingKey::from_pkcs8(&pkcs8).map_err(|_| Error::DecryptionFailed)?;
    let oaep_key =
        OaepPrivateDecryptingKey::new(private_key).map_err(|_| Error::DecryptionFailed)?;

    let mut output = vec![0u8; oaep_key.min_output_size()];
    let cek = oaep_key
        .decrypt(wrap.oaep_algorithm(), encrypted_key, &mut output, None)
        .map_err(|_| Error::DecryptionFailed)?;

    Ok(cek.to_vec())
}

/// Authenticate, then decrypt
///
/// Plaintext is only produced after the tag has been checked in constant time.
fn decrypt_content(enc: ContentEncryption, cek: &[u8], object: &EncryptedObject) -> Result<Vec<u8>> {
    if cek.len() != enc.key_len()
        || object.iv.len() != AES_BLOCK_LEN
        || object.tag.len() != enc.tag_len()
        || object.ciphertext.is_empty()
        || object.ciphertext.len() % AES_BLOCK_LEN != 0
    {
        return Err(Error::DecryptionFailed);
    }

    let (mac_key, enc_key) = cek.split_at(enc.key_len() / 2);

    let expected_tag = authentication_tag(enc, mac_key, object);
    if !constant_time_eq::constant_time_eq(&expected_tag[..enc.tag_len()], &object.tag) {
        return Err(Error::DecryptionFailed);
    }

    let iv: [u8; AES_BLOCK_LEN] = object
        .iv
        .as_slice()
        .try_into()
        .map_err(|_| Error::DecryptionFailed)?;
    let key = UnboundCipherKey::new(enc.cipher_algorithm(), enc_key)
        .map_err(|_| Error::DecryptionFailed)?;
    let key = PaddedBlockDecryptingKey::cbc_pkcs7(key).map_err(|_| Error::DecryptionFailed)?;

    let mut in_out = object.ciphertext.clone();
    let plaintext = key
        .decrypt(&mut in_out, DecryptionContext::Iv128(FixedLength::from(iv)))
        .map_err(|_| Error::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

/// HMAC over AAD || IV || ciphertext || AL, where AL is the AAD length in bits (64-bit big-endian)
fn authentication_tag(enc: ContentEncryption, mac_key: &[u8], object: &EncryptedObject) -> Vec<u8> {
    let aad = object.aad();
    let aad_bits = (aad.len() as u64).wrapping_mul(8);

    let key = hmac::Key::new(enc.hmac_algorithm(), mac_key);
    let mut context = hmac::Context::with_key(&key);
    context.update(aad);
    context.update(&object.iv);
    context.update(&object.ciphertext);
    context.update(&aad_bits.to_be_bytes());
    context.sign().as_ref().to_vec()
}
