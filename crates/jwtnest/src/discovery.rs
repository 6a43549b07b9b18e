//! OIDC Discovery
//!
//! Resolves an issuer's `jwks_uri` from its
//! `/.well-known/openid-configuration` document
//! ([OpenID Connect Discovery 1.0](https://openid.net/specs/openid-connect-discovery-1_0.html)).

use crate::error::{Error, Result};
use crate::jwks::fetch_url;
use crate::limits::MAX_DISCOVERY_RESPONSE_SIZE;
use crate::url::{validate_issuer_url, validate_jwks_uri};
use miniserde::Deserialize;

/// The part of the provider metadata the key source needs
#[derive(Debug, Clone, Deserialize)]
struct ProviderMetadata {
    issuer: String,
    jwks_uri: String,
}

fn well_known_url(issuer: &str) -> String {
    format!("{issuer}/.well-known/openid-configuration")
}

/// Discover the JWKS URI of an issuer
///
/// The document must name the same issuer it was fetched for (Discovery
/// section 4.3). A missing or different `issuer` is an error.
pub(crate) async fn discover_jwks_uri(client: &reqwest::Client, issuer: &str) -> Result<String> {
    validate_issuer_url(issuer)?;

    let bytes = fetch_url(client, &well_known_url(issuer)).await?;
    if bytes.len() > MAX_DISCOVERY_RESPONSE_SIZE {
        return Err(Error::RemoteResponseTooLarge {
            size: bytes.len(),
            max: MAX_DISCOVERY_RESPONSE_SIZE,
        });
    }

    let body = std::str::from_utf8(&bytes)
        .map_err(|e| Error::RemoteError(format!("discovery: utf8 decode failed: {e}")))?;
    let metadata: ProviderMetadata = miniserde::json::from_str(body)
        .map_err(|_| Error::RemoteError("discovery: invalid discovery json".into()))?;

    if metadata.issuer != issuer {
        return Err(Error::RemoteError(format!(
            "discovery: issuer mismatch: expected {issuer}, found {}",
            metadata.issuer
        )));
    }

    validate_jwks_uri(&metadata.jwks_uri)?;
    Ok(metadata.jwks_uri)
}
