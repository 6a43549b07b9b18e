//! Claim set and claims validation
//!
//! A [`ClaimSet`] is the decoded payload of the innermost signed object.
//! [`ClaimsValidation`] checks it against the configured expectations in a
//! fixed order, so the first failing rule is always the one reported:
//!
//! 1. required claims (and every exact-match claim) are present
//! 2. prohibited claims are absent
//! 3. exact-match claims carry the expected value
//! 4. the audience intersects the accepted set
//! 5. `exp` and `nbf` hold for the injected `now`

use crate::error::{Error, Result};
use crate::limits::MAX_CLOCK_SKEW_SECONDS;
use crate::utils::bounds::apply_clock_skew;
use miniserde::json::{self, Number, Object, Value};

/// Decoded JWT claims
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    claims: Object,
}

impl ClaimSet {
    /// Parse a JSON object payload
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::MalformedToken("claims are not valid UTF-8".into()))?;

        match json::from_str::<Value>(text) {
            Ok(Value::Object(claims)) => Ok(Self { claims }),
            Ok(_) => Err(Error::MalformedToken("claims are not a JSON object".into())),
            Err(_) => Err(Error::MalformedToken("claims are not valid JSON".into())),
        }
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Issuer (iss)
    pub fn issuer(&self) -> Option<&str> {
        self.string("iss")
    }

    /// Subject (sub)
    pub fn subject(&self) -> Option<&str> {
        self.string("sub")
    }

    /// JWT ID (jti)
    pub fn jwt_id(&self) -> Option<&str> {
        self.string("jti")
    }

    /// Audience (aud), normalised to a list
    ///
    /// A single string becomes a one-element list; non-string array
    /// members are skipped.
    pub fn audience(&self) -> Vec<&str> {
        match self.claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    Value::String(aud) => Some(aud.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Expiration time (exp), if present and numeric
    pub fn expiration(&self) -> Option<i64> {
        self.timestamp("exp").ok().flatten()
    }

    /// Not before (nbf), if present and numeric
    pub fn not_before(&self) -> Option<i64> {
        self.timestamp("nbf").ok().flatten()
    }

    /// Issued at (iat), if present and numeric
    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp("iat").ok().flatten()
    }

    /// The claims as a JSON object
    pub fn as_object(&self) -> &Object {
        &self.claims
    }

    /// Serialize the claims back to JSON
    pub fn to_json(&self) -> String {
        json::to_string(&self.claims)
    }

    /// Deserialize the claims into an application type
    ///
    /// ```ignore
    /// #[derive(miniserde::Deserialize)]
    /// struct IdToken { sub: String, email: Option<String> }
    ///
    /// let token: IdToken = claims.deserialize()?;
    /// ```
    pub fn deserialize<T: miniserde::Deserialize>(&self) -> Result<T> {
        json::from_str(&self.to_json())
            .map_err(|_| Error::MalformedToken("claims do not match the requested type".into()))
    }

    fn string(&self, name: &str) -> Option<&str> {
        match self.claims.get(name) {
            Some(Value::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// NumericDate claim; fractional seconds are truncated
    pub(crate) fn timestamp(&self, name: &str) -> Result<Option<i64>> {
        let Some(value) = self.claims.get(name) else {
            return Ok(None);
        };

        match value {
            Value::Number(Number::I64(n)) => Ok(Some(*n)),
            Value::Number(Number::U64(n)) => {
                i64::try_from(*n).map(Some).map_err(|_| Error::TimestampOverflow)
            }
            Value::Number(Number::F64(n)) if n.is_finite() => {
                let seconds = n.trunc();
                if seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
                    return Err(Error::TimestampOverflow);
                }
                Ok(Some(seconds as i64))
            }
            _ => Err(Error::ClaimTypeInvalid(name.into())),
        }
    }
}

impl PartialEq for ClaimSet {
    fn eq(&self, other: &Self) -> bool {
        self.claims.len() == other.claims.len()
            && self.claims.iter().all(|(name, value)| {
                other
                    .claims
                    .get(name)
                    .is_some_and(|theirs| claim_values_equal(value, theirs))
            })
    }
}

/// Structural equality over JSON values
///
/// Integers compare by value regardless of representation; floats only
/// equal numbers of the same value.
pub(crate) fn claim_values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| claim_values_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(name, value)| {
                    b.get(name)
                        .is_some_and(|theirs| claim_values_equal(value, theirs))
                })
        }
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a, b) {
        (Number::U64(a), Number::U64(b)) => a == b,
        (Number::I64(a), Number::I64(b)) => a == b,
        (Number::U64(u), Number::I64(i)) | (Number::I64(i), Number::U64(u)) => {
            u64::try_from(*i).is_ok_and(|i| i == *u)
        }
        (Number::F64(a), Number::F64(b)) => a == b,
        (Number::F64(f), Number::U64(u)) | (Number::U64(u), Number::F64(f)) => *f == *u as f64,
        (Number::F64(f), Number::I64(i)) | (Number::I64(i), Number::F64(f)) => *f == *i as f64,
    }
}

/// Configuration for claims validation
#[derive(Debug, Clone, Default)]
pub struct ClaimsValidation {
    issuer: Option<String>,
    audience: Vec<String>,
    required: Vec<String>,
    prohibited: Vec<String>,
    exact: Vec<(String, Value)>,
    clock_skew_seconds: u64,
}

impl ClaimsValidation {
    /// Create a new validation config with defaults
    ///
    /// Defaults check nothing but `exp` and `nbf` (when present) with zero skew.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `iss` to equal `issuer` exactly
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Accept tokens whose `aud` contains any of `audience`
    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience.extend(audience.into_iter().map(Into::into));
        self
    }

    /// Require the named claims to be present
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Reject tokens carrying any of the named claims
    pub fn prohibit<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prohibited.extend(names.into_iter().map(Into::into));
        self
    }

    /// Require a claim to hold exactly `value`
    pub fn exact_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.exact.retain(|(existing, _)| *existing != name);
        self.exact.push((name, value));
        self
    }

    /// Pin `iat` to a known value (reproducible verification of recorded tokens)
    pub fn pin_issued_at(self, issued_at: i64) -> Self {
        self.exact_claim("iat", Value::Number(Number::I64(issued_at)))
    }

    /// Pin `exp` to a known value
    pub fn pin_expiration(self, expiration: i64) -> Self {
        self.exact_claim("exp", Value::Number(Number::I64(expiration)))
    }

    /// Set clock skew tolerance, applied to both `exp` and `nbf`
    ///
    /// # Security
    /// Clock skew is limited to prevent effectively disabling expiration checks.
    /// Maximum allowed value is 300 seconds (5 minutes).
    /// Values exceeding the limit will be rejected during validation.
    pub fn clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew_seconds = seconds;
        self
    }

    fn exact_expectations(&self) -> impl Iterator<Item = (&str, ExpectedValue<'_>)> {
        self.issuer
            .iter()
            .map(|iss| ("iss", ExpectedValue::Str(iss.as_str())))
            .chain(
                self.exact
                    .iter()
                    .map(|(name, value)| (name.as_str(), ExpectedValue::Json(value))),
            )
    }

    /// Validate claims against this configuration at time `now`
    ///
    /// [`JwtProcessor`](crate::JwtProcessor) calls this with its clock after
    /// the signature checks out. It can also be used on its own for claims
    /// that were verified elsewhere.
    pub fn verify(&self, claims: &ClaimSet, now: i64) -> Result<()> {
        if self.clock_skew_seconds > MAX_CLOCK_SKEW_SECONDS {
            return Err(Error::ClockSkewTooLarge {
                value: self.clock_skew_seconds,
                max: MAX_CLOCK_SKEW_SECONDS,
            });
        }

        let required = self
            .required
            .iter()
            .map(String::as_str)
            .chain(self.exact_expectations().map(|(name, _)| name));
        for name in required {
            if !claims.contains(name) {
                return Err(Error::MissingClaim(name.into()));
            }
        }

        if let Some(name) = self.prohibited.iter().find(|name| claims.contains(name)) {
            return Err(Error::ProhibitedClaimPresent(name.clone()));
        }

        for (name, expected) in self.exact_expectations() {
            let matches = claims
                .get(name)
                .is_some_and(|actual| expected.matches(actual));
            if !matches {
                return Err(Error::ClaimMismatch(name.into()));
            }
        }

        if !self.audience.is_empty() {
            let found = claims.audience();
            if !found
                .iter()
                .any(|aud| self.audience.iter().any(|expected| expected == aud))
            {
                return Err(Error::AudienceRejected {
                    expected: self.audience.clone(),
                    found: found.into_iter().map(String::from).collect(),
                });
            }
        }

        if let Some(exp) = claims.timestamp("exp")? {
            let exp_with_skew = apply_clock_skew(exp, self.clock_skew_seconds, true)?;
            if now >= exp_with_skew {
                return Err(Error::TokenExpired {
                    expired_at: exp,
                    now,
                    skew: self.clock_skew_seconds,
                });
            }
        }

        if let Some(nbf) = claims.timestamp("nbf")? {
            let nbf_with_skew = apply_clock_skew(nbf, self.clock_skew_seconds, false)?;
            if now < nbf_with_skew {
                return Err(Error::TokenNotYetValid {
                    not_before: nbf,
                    now,
                    skew: self.clock_skew_seconds,
                });
            }
        }

        Ok(())
    }
}

enum ExpectedValue<'a> {
    Str(&'a str),
    Json(&'a Value),
}

impl ExpectedValue<'_> {
    fn matches(&self, actual: &Value) -> bool {
        match self {
            ExpectedValue::Str(expected) => matches!(actual, Value::String(s) if s == expected),
            ExpectedValue::Json(expected) => claim_values_equal(expected, actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUED_AT: i64 = 1681402772;
    const EXPIRES_AT: i64 = 1681406371;

    fn id_token() -> ClaimSet {
        ClaimSet::from_json(
            br#"{
                "iss": "https://issuer.example/uas",
                "sub": "user-123",
                "aud": ["client-id-123", "other-client"],
                "iat": 1681402772,
                "exp": 1681406371,
                "nbf": 1681402772,
                "email": "user@issuer.example",
                "amr": ["pwd", "mfa"]
            }"#,
        )
        .unwrap()
    }

    fn claims(json: &str) -> ClaimSet {
        ClaimSet::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_accessors() {
        let claims = id_token();
        assert_eq!(claims.issuer(), Some("https://issuer.example/uas"));
        assert_eq!(claims.subject(), Some("user-123"));
        assert_eq!(claims.audience(), vec!["client-id-123", "other-client"]);
        assert_eq!(claims.issued_at(), Some(ISSUED_AT));
        assert_eq!(claims.expiration(), Some(EXPIRES_AT));
        assert_eq!(claims.jwt_id(), None);
        assert!(claims.contains("email"));
        assert!(matches!(claims.get("email"), Some(Value::String(s)) if s == "user@issuer.example"));
    }

    #[test]
    fn test_scalar_audience() {
        let claims = claims(r#"{"aud":"client-id-123"}"#);
        assert_eq!(claims.audience(), vec!["client-id-123"]);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        for payload in [&b"[1,2]"[..], b"\"claims\"", b"{oops", b"\xff\xfe"] {
            assert!(matches!(
                ClaimSet::from_json(payload),
                Err(Error::MalformedToken(_))
            ));
        }
    }

    #[test]
    fn test_to_json_round_trips_structurally() {
        let claims = id_token();
        let reparsed = ClaimSet::from_json(claims.to_json().as_bytes()).unwrap();
        assert_eq!(claims, reparsed);
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(miniserde::Deserialize)]
        struct IdToken {
            sub: String,
            email: Option<String>,
            amr: Vec<String>,
        }

        let token: IdToken = id_token().deserialize().unwrap();
        assert_eq!(token.sub, "user-123");
        assert_eq!(token.email.as_deref(), Some("user@issuer.example"));
        assert_eq!(token.amr, vec!["pwd", "mfa"]);
    }

    #[test]
    fn test_number_equality_across_representations() {
        assert!(claim_values_equal(
            &Value::Number(Number::U64(5)),
            &Value::Number(Number::I64(5))
        ));
        assert!(!claim_values_equal(
            &Value::Number(Number::I64(-1)),
            &Value::Number(Number::U64(u64::MAX))
        ));
        assert!(claim_values_equal(
            &Value::Number(Number::F64(2.0)),
            &Value::Number(Number::U64(2))
        ));
        assert!(!claim_values_equal(
            &Value::String("1".into()),
            &Value::Number(Number::U64(1))
        ));
    }

    #[test]
    fn test_full_id_token_policy() {
        let validation = ClaimsValidation::new()
            .issuer("https://issuer.example/uas")
            .audience(["client-id-123"])
            .require(["sub", "iat", "exp"])
            .pin_issued_at(ISSUED_AT)
            .pin_expiration(EXPIRES_AT);
        assert_eq!(validation.verify(&id_token(), ISSUED_AT), Ok(()));
    }

    #[test]
    fn test_missing_required_claim() {
        let validation = ClaimsValidation::new().require(["sub", "jti"]);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::MissingClaim("jti".into()))
        );
    }

    #[test]
    fn test_exact_claim_is_implicitly_required() {
        let validation = ClaimsValidation::new().exact_claim("nonce", Value::String("n".into()));
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::MissingClaim("nonce".into()))
        );
    }

    #[test]
    fn test_prohibited_claim() {
        let validation = ClaimsValidation::new().prohibit(["act", "email"]);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::ProhibitedClaimPresent("email".into()))
        );
    }

    #[test]
    fn test_issuer_mismatch() {
        let validation = ClaimsValidation::new().issuer("https://issuer.example/other");
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::ClaimMismatch("iss".into()))
        );
    }

    #[test]
    fn test_pinned_timestamp_mismatch() {
        let validation = ClaimsValidation::new().pin_issued_at(ISSUED_AT + 1);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::ClaimMismatch("iat".into()))
        );
    }

    #[test]
    fn test_check_order_is_fixed() {
        // Missing, prohibited and mismatching at once: the missing claim wins
        let validation = ClaimsValidation::new()
            .issuer("https://wrong.example")
            .prohibit(["email"])
            .require(["jti"]);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::MissingClaim("jti".into()))
        );

        let validation = ClaimsValidation::new()
            .issuer("https://wrong.example")
            .prohibit(["email"]);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::ProhibitedClaimPresent("email".into()))
        );
    }

    #[test]
    fn test_audience() {
        let validation = ClaimsValidation::new().audience(["other-client", "third"]);
        assert!(validation.verify(&id_token(), ISSUED_AT).is_ok());

        let validation = ClaimsValidation::new().audience(["wrong-client"]);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::AudienceRejected {
                expected: vec!["wrong-client".into()],
                found: vec!["client-id-123".into(), "other-client".into()],
            })
        );

        let missing = claims(r#"{"sub":"user-123"}"#);
        let validation = ClaimsValidation::new().audience(["client-id-123"]);
        assert!(matches!(
            validation.verify(&missing, ISSUED_AT),
            Err(Error::AudienceRejected { found, .. }) if found.is_empty()
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let validation = ClaimsValidation::new();
        let claims = id_token();

        assert!(validation.verify(&claims, EXPIRES_AT - 1).is_ok());
        assert_eq!(
            validation.verify(&claims, EXPIRES_AT),
            Err(Error::TokenExpired {
                expired_at: EXPIRES_AT,
                now: EXPIRES_AT,
                skew: 0
            })
        );
        assert!(validation.verify(&claims, EXPIRES_AT + 1).is_err());
    }

    #[test]
    fn test_not_before_boundary() {
        let validation = ClaimsValidation::new();
        let claims = id_token();

        assert!(validation.verify(&claims, ISSUED_AT).is_ok());
        assert!(matches!(
            validation.verify(&claims, ISSUED_AT - 1),
            Err(Error::TokenNotYetValid { .. })
        ));
    }

    #[test]
    fn test_clock_skew_is_symmetric() {
        let validation = ClaimsValidation::new().clock_skew(60);
        let claims = id_token();

        assert!(validation.verify(&claims, EXPIRES_AT + 59).is_ok());
        assert!(matches!(
            validation.verify(&claims, EXPIRES_AT + 60),
            Err(Error::TokenExpired { skew: 60, .. })
        ));
        assert!(validation.verify(&claims, ISSUED_AT - 60).is_ok());
        assert!(matches!(
            validation.verify(&claims, ISSUED_AT - 61),
            Err(Error::TokenNotYetValid { skew: 60, .. })
        ));
    }

    #[test]
    fn test_clock_skew_limit() {
        let validation = ClaimsValidation::new().clock_skew(MAX_CLOCK_SKEW_SECONDS + 1);
        assert_eq!(
            validation.verify(&id_token(), ISSUED_AT),
            Err(Error::ClockSkewTooLarge {
                value: MAX_CLOCK_SKEW_SECONDS + 1,
                max: MAX_CLOCK_SKEW_SECONDS
            })
        );
    }

    #[test]
    fn test_non_numeric_timestamp() {
        let claims = claims(r#"{"exp":"tomorrow"}"#);
        assert_eq!(
            ClaimsValidation::new().verify(&claims, ISSUED_AT),
            Err(Error::ClaimTypeInvalid("exp".into()))
        );
        assert_eq!(claims.expiration(), None);
    }

    #[test]
    fn test_fractional_and_oversized_timestamps() {
        let fractional = claims(r#"{"exp":1681406371.75}"#);
        assert_eq!(fractional.expiration(), Some(EXPIRES_AT));

        let oversized = claims(r#"{"exp":18446744073709551615}"#);
        assert_eq!(
            ClaimsValidation::new().verify(&oversized, ISSUED_AT),
            Err(Error::TimestampOverflow)
        );
    }

    #[test]
    fn test_without_time_claims() {
        let claims = claims(r#"{"sub":"user-123"}"#);
        assert!(ClaimsValidation::new().verify(&claims, i64::MAX).is_ok());
    }
}
