//! Shared fixtures for integration tests
//!
//! `tokens.json` holds a recorded set of tokens issued at `ISSUED_AT` by
//! `https://issuer.example/uas` for `client-id-123`. `jwks.json` holds the
//! matching key set: one private decryption key (`enc-1`) and one public
//! verification key (`sig-1`).

#![allow(dead_code)]

use jwtnest::{
    ClaimsValidation, FixedClock, JwkSet, JwtProcessor, KeyCriteria, KeySource, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ISSUER: &str = "https://issuer.example/uas";
pub const AUDIENCE: &str = "client-id-123";
pub const ISSUED_AT: i64 = 1681402772;
pub const EXPIRES_AT: i64 = 1681406371;

pub const JWKS: &str = include_str!("../fixtures/jwks.json");
const TOKENS: &str = include_str!("../fixtures/tokens.json");

fn tokens() -> serde_json::Value {
    serde_json::from_str(TOKENS).expect("tokens fixture")
}

/// A recorded token by name
pub fn token(name: &str) -> String {
    tokens()[name]
        .as_str()
        .unwrap_or_else(|| panic!("missing token fixture {name}"))
        .to_string()
}

/// The claims every recorded token carries
pub fn expected_claims() -> serde_json::Value {
    tokens()["claims"].clone()
}

pub fn key_set() -> JwkSet {
    JwkSet::from_json(JWKS).expect("jwks fixture")
}

/// Policy for the recorded ID tokens, with time pinned to issuance
pub fn id_token_policy() -> ClaimsValidation {
    ClaimsValidation::new()
        .issuer(ISSUER)
        .audience([AUDIENCE])
        .require(["sub", "iat", "exp"])
        .pin_issued_at(ISSUED_AT)
        .pin_expiration(EXPIRES_AT)
}

/// Processor over the fixture key set with the clock at `ISSUED_AT`
pub fn processor() -> JwtProcessor {
    JwtProcessor::new()
        .key_source(key_set())
        .validate(id_token_policy())
        .clock(FixedClock(ISSUED_AT))
        .build()
}

/// Replace one character in the middle of a segment
pub fn tamper_segment(token: &str, index: usize) -> String {
    let mut segments: Vec<String> = token.split('.').map(String::from).collect();
    let segment = &mut segments[index];
    let middle = segment.len() / 2;
    let replacement = if &segment[middle..=middle] == "A" { "B" } else { "A" };
    segment.replace_range(middle..=middle, replacement);
    segments.join(".")
}

/// Key source that counts how often it is asked for keys
#[derive(Clone)]
pub struct CountingSource {
    keys: JwkSet,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeySource for CountingSource {
    fn resolve(&self, _criteria: &KeyCriteria<'_>) -> Result<JwkSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.clone())
    }
}
