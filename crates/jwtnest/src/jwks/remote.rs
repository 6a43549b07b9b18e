//! Remote, cached key sets
//!
//! [`RemoteKeySource`] fetches a JWKS document over HTTP and keeps it in a
//! moka cache. Fetching is asynchronous and explicit ([`RemoteKeySource::refresh`]);
//! [`KeySource::resolve`] only ever reads the cached snapshot, so the
//! processor never waits on the network.
//!
//! The TTL marks a snapshot stale; it does not discard it. Until a refresh
//! succeeds, `resolve` keeps serving the last key set that was fetched.

use crate::discovery::discover_jwks_uri;
use crate::error::{Error, Result};
use crate::jwks::source::{KeyCriteria, KeySource};
use crate::jwks::{JwkSet, fetch_jwks};
use crate::url::{validate_issuer_url, validate_jwks_uri};
use crate::utils::bounds::is_valid_cache_key;
use moka::sync::Cache;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default lifetime of a fetched key set
const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(300);

/// Where the key set is published
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySetLocation {
    /// A JWKS document URL
    JwksUri(String),
    /// An OIDC issuer; the JWKS URL is found through discovery
    Issuer(String),
}

impl KeySetLocation {
    fn as_str(&self) -> &str {
        match self {
            KeySetLocation::JwksUri(uri) => uri,
            KeySetLocation::Issuer(issuer) => issuer,
        }
    }
}

/// Key source backed by a remote JWKS document
#[derive(Clone)]
pub struct RemoteKeySource {
    client: reqwest::Client,
    location: KeySetLocation,
    cache: Cache<KeySetLocation, JwkSet>,
    last_good: Arc<RwLock<Option<JwkSet>>>,
}

impl RemoteKeySource {
    /// Key source for a JWKS document URL
    pub fn new(client: reqwest::Client, jwks_uri: impl Into<String>) -> Result<Self> {
        let jwks_uri = jwks_uri.into();
        validate_jwks_uri(&jwks_uri)?;
        Ok(Self::with_location(client, KeySetLocation::JwksUri(jwks_uri)))
    }

    /// Key source for an OIDC issuer, resolved through discovery on refresh
    pub fn discover(client: reqwest::Client, issuer: impl Into<String>) -> Result<Self> {
        let issuer = issuer.into();
        validate_issuer_url(&issuer)?;
        Ok(Self::with_location(client, KeySetLocation::Issuer(issuer)))
    }

    fn with_location(client: reqwest::Client, location: KeySetLocation) -> Self {
        Self {
            client,
            location,
            cache: Self::build_cache(DEFAULT_TIME_TO_LIVE),
            last_good: Arc::default(),
        }
    }

    fn build_cache(time_to_live: Duration) -> Cache<KeySetLocation, JwkSet> {
        Cache::builder()
            .max_capacity(1)
            .time_to_live(time_to_live)
            .build()
    }

    /// Set how long a fetched key set stays fresh
    ///
    /// Drops anything already cached.
    pub fn time_to_live(mut self, time_to_live: Duration) -> Self {
        self.cache = Self::build_cache(time_to_live);
        self.last_good = Arc::default();
        self
    }

    /// Where the key set is fetched from
    pub fn location(&self) -> &KeySetLocation {
        &self.location
    }

    /// Fetch the key set and replace the cached snapshot
    ///
    /// Failures are reported as [`Error::KeySourceUnavailable`]. The previous
    /// snapshot stays in place and is still served by `resolve`, even once
    /// its time to live has passed.
    pub async fn refresh(&self) -> Result<JwkSet> {
        let fetched = self.fetch().await.map_err(|e| {
            tracing::warn!(location = self.location.as_str(), error = %e, "key set refresh failed");
            Error::KeySourceUnavailable(e.to_string())
        })?;

        if is_valid_cache_key(self.location.as_str()) {
            self.cache.insert(self.location.clone(), fetched.clone());
            if let Ok(mut last_good) = self.last_good.write() {
                *last_good = Some(fetched.clone());
            }
        }
        tracing::debug!(
            location = self.location.as_str(),
            keys = fetched.len(),
            "key set refreshed"
        );
        Ok(fetched)
    }

    /// Return the cached key set, fetching it first when absent or stale
    ///
    /// A failed fetch is returned as an error here even when `resolve` can
    /// still serve the stale set.
    pub async fn key_set(&self) -> Result<JwkSet> {
        match self.cache.get(&self.location) {
            Some(set) => Ok(set),
            None => self.refresh().await,
        }
    }

    async fn fetch(&self) -> Result<JwkSet> {
        let jwks_uri = match &self.location {
            KeySetLocation::JwksUri(uri) => uri.clone(),
            KeySetLocation::Issuer(issuer) => discover_jwks_uri(&self.client, issuer).await?,
        };
        fetch_jwks(&self.client, &jwks_uri).await
    }

    fn stale(&self) -> Option<JwkSet> {
        self.last_good.read().ok().and_then(|set| set.clone())
    }
}

impl KeySource for RemoteKeySource {
    fn resolve(&self, criteria: &KeyCriteria<'_>) -> Result<JwkSet> {
        if let Some(set) = self.cache.get(&self.location) {
            return Ok(set);
        }
        match self.stale() {
            Some(set) => {
                tracing::debug!(
                    location = self.location.as_str(),
                    role = %criteria.role,
                    "serving stale key set"
                );
                Ok(set)
            }
            None => Err(Error::KeySourceUnavailable(format!(
                "no {} keys cached for {}",
                criteria.role,
                self.location.as_str()
            ))),
        }
    }
}
