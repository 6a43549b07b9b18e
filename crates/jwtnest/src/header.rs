//! JOSE header and media type verification

use crate::error::{Error, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_KID_LENGTH, MAX_MEDIA_TYPE_LENGTH};
use crate::utils::bounds::validate_field_size;
use miniserde::Deserialize;

/// JOSE header shared by signed and encrypted objects
///
/// Only the parameters the processor acts on are decoded. Key-locating
/// parameters such as `jku`, `jwk` and `x5u` are deliberately ignored: keys
/// always come from the configured key sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JoseHeader {
    /// Signature or key management algorithm
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Content encryption method (encrypted objects only)
    #[serde(rename = "enc")]
    pub encryption: Option<String>,

    /// Key ID
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    /// Content type of the secured payload
    #[serde(rename = "cty")]
    pub content_type: Option<String>,

    /// Media type of the complete object
    #[serde(rename = "typ")]
    pub token_type: Option<String>,

    /// Critical extension parameters
    pub crit: Option<Vec<String>>,

    /// Compression algorithm
    pub zip: Option<String>,
}

impl JoseHeader {
    /// Parse a decoded header and bound its fields
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        let header: JoseHeader = miniserde::json::from_str(json)
            .map_err(|e| Error::MalformedToken(format!("Failed to parse header: {e}")))?;

        validate_field_size("alg", &header.algorithm, MAX_ALG_LENGTH)?;
        if let Some(enc) = &header.encryption {
            validate_field_size("enc", enc, MAX_ALG_LENGTH)?;
        }
        if let Some(kid) = &header.key_id {
            validate_field_size("kid", kid, MAX_KID_LENGTH)?;
        }
        if let Some(cty) = &header.content_type {
            validate_field_size("cty", cty, MAX_MEDIA_TYPE_LENGTH)?;
        }
        if let Some(typ) = &header.token_type {
            validate_field_size("typ", typ, MAX_MEDIA_TYPE_LENGTH)?;
        }

        Ok(header)
    }

    /// Reject extensions this processor does not implement
    pub(crate) fn reject_unsupported(&self) -> Result<()> {
        if let Some(crit) = &self.crit {
            return Err(Error::UnsupportedHeader(format!("crit {crit:?}")));
        }
        if let Some(zip) = &self.zip {
            return Err(Error::UnsupportedHeader(format!("zip {zip}")));
        }
        Ok(())
    }

    /// Check that `cty` announces a nested JWT
    pub(crate) fn require_nested_jwt(&self) -> Result<()> {
        match self.content_type.as_deref() {
            Some(cty) if media_type_eq(cty, "JWT") => Ok(()),
            other => Err(Error::UnexpectedContentType {
                found: other.map(ToString::to_string),
            }),
        }
    }
}

/// Compare media types per RFC 7515 section 4.1.9
///
/// Comparison is case-insensitive and the `application/` prefix may be omitted
/// when no other `/` appears.
fn media_type_eq(found: &str, expected: &str) -> bool {
    fn short(value: &str) -> &str {
        match value.split_once('/') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case("application") && !rest.contains('/') => {
                rest
            }
            _ => value,
        }
    }
    short(found).eq_ignore_ascii_case(short(expected))
}

/// Verifies the `typ` header of an object
#[derive(Debug, Clone)]
pub struct TypeVerifier {
    allow_absent: bool,
    allowed: Vec<String>,
}

impl TypeVerifier {
    /// Accept `JWT` (or `application/jwt`) and a missing `typ`
    pub fn jwt() -> Self {
        Self {
            allow_absent: true,
            allowed: vec!["JWT".into()],
        }
    }

    /// Accept only the listed types; a missing `typ` is rejected
    pub fn allow_only<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow_absent: false,
            allowed: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Also accept objects without a `typ` header
    pub fn allow_absent(mut self) -> Self {
        self.allow_absent = true;
        self
    }

    pub(crate) fn verify(&self, typ: Option<&str>) -> Result<()> {
        let accepted = match typ {
            None => self.allow_absent,
            Some(found) => self
                .allowed
                .iter()
                .any(|allowed| media_type_eq(found, allowed)),
        };

        if accepted {
            Ok(())
        } else {
            Err(Error::UnexpectedTokenType {
                found: typ.map(ToString::to_string),
            })
        }
    }
}

impl Default for TypeVerifier {
    fn default() -> Self {
        Self::jwt()
    }
}
