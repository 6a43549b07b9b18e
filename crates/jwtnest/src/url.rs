//! URL checks for remote key material
//!
//! Bounds the length of every URL we are asked to fetch and restricts it to
//! absolute http(s) URLs with a host.

use crate::error::{Error, Result};
use crate::limits::{MAX_ISSUER_URL_LENGTH, MAX_JWKS_URI_LENGTH};

/// Kinds of URL fetched by the remote key source
#[derive(Debug, Clone, Copy)]
enum RemoteUrl {
    Issuer,
    JwksUri,
}

impl RemoteUrl {
    const fn label(self) -> &'static str {
        match self {
            RemoteUrl::Issuer => "issuer URL",
            RemoteUrl::JwksUri => "JWKS URI",
        }
    }

    const fn max_length(self) -> usize {
        match self {
            RemoteUrl::Issuer => MAX_ISSUER_URL_LENGTH,
            RemoteUrl::JwksUri => MAX_JWKS_URI_LENGTH,
        }
    }

    fn check(self, value: &str) -> Result<url::Url> {
        let label = self.label();
        if value.trim().is_empty() {
            return Err(Error::RemoteError(format!("{label} cannot be empty")));
        }
        if value.len() > self.max_length() {
            return Err(Error::RemoteUrlTooLong {
                length: value.len(),
                max: self.max_length(),
            });
        }

        let parsed = url::Url::parse(value)
            .map_err(|e| Error::RemoteError(format!("invalid {label}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::RemoteError(format!(
                "{label} must use http or https scheme"
            )));
        }
        if parsed.host_str().is_none() {
            return Err(Error::RemoteError(format!("{label} must have a valid host")));
        }

        Ok(parsed)
    }
}

/// Validate an issuer identifier used for discovery
///
/// OIDC issuers are compared verbatim, so a trailing slash is rejected
/// instead of normalised away.
pub(crate) fn validate_issuer_url(issuer: &str) -> Result<()> {
    RemoteUrl::Issuer.check(issuer)?;
    if issuer.ends_with('/') {
        return Err(Error::RemoteError(
            "issuer URL must not end with trailing slash".into(),
        ));
    }
    Ok(())
}

/// Validate a JWKS URI before fetching it
pub(crate) fn validate_jwks_uri(uri: &str) -> Result<()> {
    RemoteUrl::JwksUri.check(uri).map(|_| ())
}
