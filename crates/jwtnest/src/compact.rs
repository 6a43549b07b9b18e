//! Compact serialization codec
//!
//! Splits a token on `.`, decodes every segment and classifies the result.
//! Nothing here judges algorithms, keys or claims.

use crate::error::{Error, Result};
use crate::header::JoseHeader;
use crate::limits::{
    MAX_DECODED_CIPHERTEXT_SIZE, MAX_DECODED_ENCRYPTED_KEY_SIZE, MAX_DECODED_HEADER_SIZE,
    MAX_DECODED_IV_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_DECODED_TAG_SIZE, MAX_TOKEN_LENGTH,
};
use crate::utils::base64url;

/// A parsed compact-serialized JOSE object
#[derive(Debug, Clone)]
pub enum CompactObject {
    /// Unsecured JWS (`alg` = `none`)
    Plain(PlainObject),
    /// JWS
    Signed(SignedObject),
    /// JWE
    Encrypted(EncryptedObject),
}

impl CompactObject {
    /// Short name of the variant, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            CompactObject::Plain(_) => "plain",
            CompactObject::Signed(_) => "signed",
            CompactObject::Encrypted(_) => "encrypted",
        }
    }

    /// Decoded header of the object
    pub fn header(&self) -> &JoseHeader {
        match self {
            CompactObject::Plain(object) => &object.header,
            CompactObject::Signed(object) => &object.header,
            CompactObject::Encrypted(object) => &object.header,
        }
    }
}

/// Unsecured object; never a source of trusted claims
#[derive(Debug, Clone)]
pub struct PlainObject {
    pub header: JoseHeader,
    pub payload: Vec<u8>,
}

/// Signed object with its original encoded segments
#[derive(Debug, Clone)]
pub struct SignedObject {
    pub header: JoseHeader,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    header_b64: String,
    payload_b64: String,
}

impl SignedObject {
    /// Bytes covered by the signature: the encoded header and payload as received
    pub fn signing_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.header_b64.len() + 1 + self.payload_b64.len());
        input.extend_from_slice(self.header_b64.as_bytes());
        input.push(b'.');
        input.extend_from_slice(self.payload_b64.as_bytes());
        input
    }
}

/// Encrypted object
#[derive(Debug, Clone)]
pub struct EncryptedObject {
    pub header: JoseHeader,
    pub encrypted_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    header_b64: String,
}

impl EncryptedObject {
    /// Additional authenticated data: the encoded protected header as received
    pub fn aad(&self) -> &[u8] {
        self.header_b64.as_bytes()
    }
}

/// Parse and classify a compact serialization
pub fn parse(token: &str) -> Result<CompactObject> {
    // Count segments before allocating
    let segment_count = token.bytes().filter(|b| *b == b'.').count() + 1;
    if segment_count != 3 && segment_count != 5 {
        return Err(Error::MalformedToken(format!(
            "expected 3 or 5 segments, found {segment_count}"
        )));
    }

    if token.len() > MAX_TOKEN_LENGTH {
        return Err(Error::TokenTooLarge {
            size: token.len(),
            max: MAX_TOKEN_LENGTH,
        });
    }

    let segments: Vec<&str> = token.split('.').collect();

    let header_b64 = segments[0];
    if header_b64.is_empty() {
        return Err(Error::MalformedToken("empty header segment".into()));
    }
    let header_json = base64url::decode_string(header_b64, MAX_DECODED_HEADER_SIZE)?;
    let header = JoseHeader::from_json(&header_json)?;

    match segments.as_slice() {
        [_, payload_b64, signature_b64] => {
            let payload = base64url::decode_bytes(payload_b64, MAX_DECODED_PAYLOAD_SIZE)?;
            let signature = base64url::decode_bytes(signature_b64, MAX_DECODED_SIGNATURE_SIZE)?;

            if header.algorithm == "none" {
                if !signature.is_empty() {
                    return Err(Error::MalformedToken(
                        "unsecured object carries a signature".into(),
                    ));
                }
                return Ok(CompactObject::Plain(PlainObject { header, payload }));
            }

            Ok(CompactObject::Signed(SignedObject {
                header,
                payload,
                signature,
                header_b64: header_b64.to_string(),
                payload_b64: payload_b64.to_string(),
            }))
        }
        [_, encrypted_key_b64, iv_b64, ciphertext_b64, tag_b64] => {
            if header.encryption.is_none() {
                return Err(Error::MalformedToken(
                    "encrypted object without 'enc' header".into(),
                ));
            }

            let encrypted_key =
                base64url::decode_bytes(encrypted_key_b64, MAX_DECODED_ENCRYPTED_KEY_SIZE)?;
            let iv = base64url::decode_bytes(iv_b64, MAX_DECODED_IV_SIZE)?;
            let ciphertext = base64url::decode_bytes(ciphertext_b64, MAX_DECODED_CIPHERTEXT_SIZE)?;
            let tag = base64url::decode_bytes(tag_b64, MAX_DECODED_TAG_SIZE)?;

            Ok(CompactObject::Encrypted(EncryptedObject {
                header,
                encrypted_key,
                iv,
                ciphertext,
                tag,
                header_b64: header_b64.to_string(),
            }))
        }
        _ => Err(Error::MalformedToken("unexpected segment count".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    fn b64(data: &str) -> String {
        URL_SAFE_NO_PAD.encode(data)
    }

    #[test]
    fn test_segment_count() {
        for token in ["", "a", "a.b", "a.b.c.d", "a.b.c.d.e.f", "....", "......"] {
            assert!(
                matches!(parse(token), Err(Error::MalformedToken(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_segment_count_checked_before_length() {
        let token = "a.".repeat(MAX_TOKEN_LENGTH);
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn test_segment_count_reported_for_dot_flood() {
        let token = ".".repeat(MAX_TOKEN_LENGTH * 4);
        let expected = format!("expected 3 or 5 segments, found {}", MAX_TOKEN_LENGTH * 4 + 1);
        assert!(matches!(parse(&token), Err(Error::MalformedToken(msg)) if msg == expected));
    }

    #[test]
    fn test_too_large() {
        let token = format!("{}.a.b", "a".repeat(MAX_TOKEN_LENGTH));
        assert!(matches!(parse(&token), Err(Error::TokenTooLarge { .. })));
    }

    #[test]
    fn test_classify_signed() {
        let token = format!(
            "{}.{}.{}",
            b64(r#"{"alg":"RS256","kid":"k1"}"#),
            b64(r#"{"sub":"s"}"#),
            b64("sig")
        );
        let object = parse(&token).unwrap();
        assert_eq!(object.kind(), "signed");
        assert_eq!(object.header().key_id.as_deref(), Some("k1"));

        let CompactObject::Signed(signed) = object else {
            panic!("expected signed object");
        };
        assert_eq!(signed.payload, br#"{"sub":"s"}"#);
        assert_eq!(signed.signature, b"sig");

        let (header_b64, rest) = token.split_once('.').unwrap();
        let payload_b64 = rest.split('.').next().unwrap();
        assert_eq!(
            signed.signing_input(),
            format!("{header_b64}.{payload_b64}").into_bytes()
        );
    }

    #[test]
    fn test_classify_plain() {
        let token = format!("{}.{}.", b64(r#"{"alg":"none"}"#), b64(r#"{"sub":"s"}"#));
        assert!(matches!(parse(&token), Ok(CompactObject::Plain(_))));

        let token = format!(
            "{}.{}.{}",
            b64(r#"{"alg":"none"}"#),
            b64(r#"{"sub":"s"}"#),
            b64("sig")
        );
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));
    }

    #[test]
    fn test_classify_encrypted() {
        let header = b64(r#"{"alg":"RSA-OAEP","enc":"A128CBC-HS256","cty":"JWT"}"#);
        let token = format!(
            "{header}.{}.{}.{}.{}",
            b64("key"),
            b64("iv"),
            b64("ciphertext"),
            b64("tag")
        );
        let CompactObject::Encrypted(encrypted) = parse(&token).unwrap() else {
            panic!("expected encrypted object");
        };
        assert_eq!(encrypted.encrypted_key, b"key");
        assert_eq!(encrypted.iv, b"iv");
        assert_eq!(encrypted.ciphertext, b"ciphertext");
        assert_eq!(encrypted.tag, b"tag");
        assert_eq!(encrypted.aad(), header.as_bytes());
    }

    #[test]
    fn test_encrypted_requires_enc() {
        let token = format!("{}.a.b.c.d", b64(r#"{"alg":"RSA-OAEP"}"#));
        assert!(matches!(
            parse(&token),
            Err(Error::MalformedToken(msg)) if msg.contains("enc")
        ));
    }

    #[test]
    fn test_invalid_segments() {
        // Header is not JSON
        let token = format!("{}.{}.{}", b64("not json"), b64("{}"), b64("s"));
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));

        // Header without alg
        let token = format!("{}.{}.{}", b64(r#"{"typ":"JWT"}"#), b64("{}"), b64("s"));
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));

        // Padding in a segment
        let token = format!("{}.{}.c2ln=", b64(r#"{"alg":"RS256"}"#), b64("{}"));
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));

        // Characters outside the URL-safe alphabet
        let token = format!("{}.e30.a+b/", b64(r#"{"alg":"RS256"}"#));
        assert!(matches!(parse(&token), Err(Error::MalformedToken(_))));

        // Empty header
        assert!(matches!(parse(".e30.c2ln"), Err(Error::MalformedToken(_))));
    }
}
