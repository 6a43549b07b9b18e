//! JSON Web Key Set (JWKS) module
pub(crate) mod jwk;
pub(crate) mod remote;
pub(crate) mod selector;
pub(crate) mod source;

use crate::error::{Error, Result};
use crate::jwks::jwk::Jwk;
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE};
use crate::url::validate_jwks_uri;
use miniserde::Deserialize;

/// Fetch data from a URL using reqwest
pub(crate) async fn fetch_url(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::RemoteError(format!("network: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::RemoteError(format!(
            "http: status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::RemoteError(format!("network: {e}")))?
        .to_vec();

    Ok(bytes)
}

/// JSON Web Key Set (JWKS)
///
/// Key order is preserved; it decides which candidate is tried first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwkSet {
    /// The keys in the set
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Create a key set from keys
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Parse a JWKS document
    pub fn from_json(json: &str) -> Result<Self> {
        let set: JwkSet = miniserde::json::from_str(json)
            .map_err(|_| Error::KeyInvalid("invalid jwks json".into()))?;

        if set.keys.len() > MAX_JWK_SET_SIZE {
            return Err(Error::RemoteJwkSetTooLarge {
                key_count: set.keys.len(),
                max: MAX_JWK_SET_SIZE,
            });
        }

        Ok(set)
    }

    /// Keys in document order
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Look up a key by its `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// A copy of the set without the keys matching `predicate`
    pub fn without(&self, predicate: impl Fn(&Jwk) -> bool) -> Self {
        Self::new(self.keys.iter().filter(|k| !predicate(k)).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Fetch and parse a JWKS document from the given URI using the provided HTTP client
pub(crate) async fn fetch_jwks(client: &reqwest::Client, jwks_uri: &str) -> Result<JwkSet> {
    validate_jwks_uri(jwks_uri)?;

    let bytes = fetch_url(client, jwks_uri).await?;

    if bytes.len() > MAX_JWKS_RESPONSE_SIZE {
        return Err(Error::RemoteResponseTooLarge {
            size: bytes.len(),
            max: MAX_JWKS_RESPONSE_SIZE,
        });
    }

    let body = std::str::from_utf8(&bytes)
        .map_err(|e| Error::RemoteError(format!("jwks: utf8 decode failed: {e}")))?;

    JwkSet::from_json(body).map_err(|e| match e {
        Error::KeyInvalid(_) => Error::RemoteError("jwks: invalid jwks json".to_string()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_jwks() {
        let mut server = mockito::Server::new_async().await;
        let jwks_json = r#"{
            "keys": [
                {"kty":"RSA","kid":"k1","use":"sig","n":"abc","e":"AQAB"},
                {"kty":"RSA","kid":"k2","use":"enc","n":"def","e":"AQAB"}
            ]
        }"#;
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_body(jwks_json)
            .create();

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let set = fetch_jwks(&client, &uri).await.expect("jwks parse");
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys[0].kid.as_deref(), Some("k1"));
        assert_eq!(set.keys[1].key_use.as_deref(), Some("enc"));
    }

    #[tokio::test]
    async fn test_fetch_jwks_empty_uri() {
        let client = reqwest::Client::new();

        let result = fetch_jwks(&client, "").await;
        assert!(
            matches!(result, Err(Error::RemoteError(msg)) if msg.contains("JWKS URI cannot be empty"))
        );
    }

    #[tokio::test]
    async fn test_fetch_jwks_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_body(b"{ invalid json }")
            .create();

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri).await;
        assert!(
            matches!(result, Err(Error::RemoteError(msg)) if msg.contains("jwks: invalid jwks json"))
        );
    }

    #[tokio::test]
    async fn test_fetch_jwks_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/jwks.json").with_status(503).create();

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri).await;
        assert!(matches!(result, Err(Error::RemoteError(msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_fetch_jwks_oversized_response() {
        let mut server = mockito::Server::new_async().await;
        let oversized_response = "a".repeat(MAX_JWKS_RESPONSE_SIZE + 1);
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_body(oversized_response)
            .create();

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri).await;
        assert!(matches!(
            result,
            Err(Error::RemoteResponseTooLarge { size, max }) if size > max && max == MAX_JWKS_RESPONSE_SIZE
        ));
    }

    #[test]
    fn test_jwk_set_from_json() {
        let set = JwkSet::from_json(r#"{"keys":[{"kty":"RSA"}, {"kty":"RSA","kid":"b"}]}"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys()[0].kid, None);
        assert!(set.find("b").is_some());
        assert!(set.find("c").is_none());

        let without = set.without(|k| k.kid.as_deref() == Some("b"));
        assert_eq!(without.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_jwk_set_too_many_keys() {
        let keys = vec![r#"{"kty":"RSA"}"#; MAX_JWK_SET_SIZE + 1].join(",");
        let result = JwkSet::from_json(&format!(r#"{{"keys":[{keys}]}}"#));
        assert!(matches!(result, Err(Error::RemoteJwkSetTooLarge { .. })));
    }

    #[test]
    fn test_jwk_set_invalid() {
        assert!(matches!(
            JwkSet::from_json(r#"{"nokeys":[]}"#),
            Err(Error::KeyInvalid(_))
        ));
    }
}
