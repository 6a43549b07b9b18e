use crate::algorithm::{
    ContentEncryptionPolicy, JoseAlgorithm, KeyWrapPolicy, SignatureAlgorithm, SignaturePolicy,
};
use crate::claims::{ClaimSet, ClaimsValidation};
use crate::clock::{Clock, SystemClock};
use crate::compact::{self, CompactObject, EncryptedObject, SignedObject};
use crate::error::{Error, Result};
use crate::header::{JoseHeader, TypeVerifier};
use crate::jwe;
use crate::jwks::JwkSet;
use crate::jwks::selector::{self, KidMatch};
use crate::jwks::source::{KeyCriteria, KeyRole, KeySource};
use crate::jws;
use std::sync::Arc;

/// JWT processor for signed and nested (signed-then-encrypted) tokens
///
/// The processor is configured once and can be reused, and cloned, for any
/// number of tokens. It holds no state between calls beyond its
/// configuration and the key sources it was given.
#[derive(Clone)]
pub struct JwtProcessor {
    config_signature: SignaturePolicy,
    config_key_wrap: KeyWrapPolicy,
    config_encryption: ContentEncryptionPolicy,
    config_claims: ClaimsValidation,
    config_jws_type: TypeVerifier,
    config_jwe_type: TypeVerifier,
    config_clock: Arc<dyn Clock>,
    config_verification_keys: Option<Arc<dyn KeySource>>,
    config_decryption_keys: Option<Arc<dyn KeySource>>,
    config_require_encryption: bool,
    config_kid_match: KidMatch,
}

/// Pipeline position of one `process` call
enum State {
    Start,
    Classified(CompactObject),
    Decrypted(SignedObject),
    Verified(ClaimSet),
    ClaimsChecked(ClaimSet),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::Classified(_) => "classified",
            State::Decrypted(_) => "decrypted",
            State::Verified(_) => "verified",
            State::ClaimsChecked(_) => "claims-checked",
        }
    }
}

impl JwtProcessor {
    /// Create a new processor with secure defaults
    ///
    /// No key sources are configured; processing fails with
    /// [`Error::ConfigurationInvalid`] until the needed ones are set.
    pub fn new() -> Self {
        Self {
            config_signature: SignaturePolicy::default(),
            config_key_wrap: KeyWrapPolicy::default(),
            config_encryption: ContentEncryptionPolicy::default(),
            config_claims: ClaimsValidation::default(),
            config_jws_type: TypeVerifier::default(),
            config_jwe_type: TypeVerifier::default(),
            config_clock: Arc::new(SystemClock),
            config_verification_keys: None,
            config_decryption_keys: None,
            config_require_encryption: false,
            config_kid_match: KidMatch::Strict,
        }
    }

    /// Configure the allowed JWS signature algorithms
    pub fn signature_algorithms(&mut self, policy: SignaturePolicy) -> &mut Self {
        self.config_signature = policy;
        self
    }

    /// Configure the allowed JWE key management algorithms
    pub fn key_wrap_algorithms(&mut self, policy: KeyWrapPolicy) -> &mut Self {
        self.config_key_wrap = policy;
        self
    }

    /// Configure the allowed JWE content encryption methods
    pub fn content_encryption(&mut self, policy: ContentEncryptionPolicy) -> &mut Self {
        self.config_encryption = policy;
        self
    }

    /// Configure claims validation
    pub fn validate(&mut self, config: ClaimsValidation) -> &mut Self {
        self.config_claims = config;
        self
    }

    /// Configure accepted `typ` values of signed objects
    pub fn jws_type(&mut self, verifier: TypeVerifier) -> &mut Self {
        self.config_jws_type = verifier;
        self
    }

    /// Configure accepted `typ` values of encrypted objects
    pub fn jwe_type(&mut self, verifier: TypeVerifier) -> &mut Self {
        self.config_jwe_type = verifier;
        self
    }

    /// Configure the time source used for `exp` and `nbf`
    pub fn clock(&mut self, clock: impl Clock + 'static) -> &mut Self {
        self.config_clock = Arc::new(clock);
        self
    }

    /// Configure where signature verification keys come from
    pub fn verification_keys(&mut self, source: impl KeySource + 'static) -> &mut Self {
        self.config_verification_keys = Some(Arc::new(source));
        self
    }

    /// Configure where decryption keys come from
    pub fn decryption_keys(&mut self, source: impl KeySource + 'static) -> &mut Self {
        self.config_decryption_keys = Some(Arc::new(source));
        self
    }

    /// Use one source for both decryption and verification keys
    pub fn key_source(&mut self, source: impl KeySource + 'static) -> &mut Self {
        let source: Arc<dyn KeySource> = Arc::new(source);
        self.config_verification_keys = Some(source.clone());
        self.config_decryption_keys = Some(source);
        self
    }

    /// Reject tokens that are only signed
    pub fn require_encryption(&mut self, required: bool) -> &mut Self {
        self.config_require_encryption = required;
        self
    }

    /// Fall back to all compatible decryption keys when the `kid` matches none
    ///
    /// # Security
    /// Off by default. With a shared key set this lets a token pick any
    /// decryption key of the right type, not the one its `kid` names.
    pub fn decryption_kid_fallback(&mut self, enabled: bool) -> &mut Self {
        self.config_kid_match = if enabled {
            KidMatch::FallbackToCompatible
        } else {
            KidMatch::Strict
        };
        self
    }

    pub fn build(&mut self) -> Self {
        self.clone()
    }
}

impl JwtProcessor {
    /// Process a compact serialized token
    ///
    /// Returns the validated claims of the innermost signed object. The first
    /// failing step ends processing and its error is returned unchanged.
    pub fn process(&self, token: &str) -> Result<ClaimSet> {
        let mut state = State::Start;

        loop {
            tracing::debug!(state = state.name(), "processing token");

            state = match state {
                State::Start => State::Classified(compact::parse(token)?),
                State::Classified(CompactObject::Plain(_)) => {
                    return Err(Error::UnacceptableTokenType(
                        "unsecured token (alg none)".into(),
                    ));
                }
                State::Classified(CompactObject::Signed(object)) => {
                    if self.config_require_encryption {
                        return Err(Error::EncryptionRequired);
                    }
                    State::Verified(self.verify_signed(&object)?)
                }
                State::Classified(CompactObject::Encrypted(object)) => {
                    State::Decrypted(self.decrypt_nested(&object)?)
                }
                State::Decrypted(object) => State::Verified(self.verify_signed(&object)?),
                State::Verified(claims) => {
                    self.config_claims
                        .verify(&claims, self.config_clock.now())?;
                    State::ClaimsChecked(claims)
                }
                State::ClaimsChecked(claims) => return Ok(claims),
            };
        }
    }

    /// Decrypt an encrypted object and parse the nested signed object
    fn decrypt_nested(&self, object: &EncryptedObject) -> Result<SignedObject> {
        let header = &object.header;
        header.reject_unsupported()?;
        header.require_nested_jwt()?;
        self.config_jwe_type.verify(header.token_type.as_deref())?;

        let wrap = self.config_key_wrap.resolve(&header.algorithm)?;
        let enc = self
            .config_encryption
            .resolve(header.encryption.as_deref().unwrap_or_default())?;

        let keys = self.resolve_keys(
            self.config_decryption_keys.as_deref(),
            KeyRole::Decrypt,
            header,
        )?;
        let candidates = selector::select(
            &keys,
            KeyRole::Decrypt,
            wrap,
            header.key_id.as_deref(),
            self.config_kid_match,
        )?;

        let plaintext = jwe::decrypt(object, wrap, enc, &candidates)?;
        let inner = String::from_utf8(plaintext)
            .map_err(|_| Error::MalformedToken("nested token is not valid UTF-8".into()))?;

        match compact::parse(&inner)? {
            CompactObject::Signed(signed) => Ok(signed),
            CompactObject::Plain(_) => Err(Error::UnacceptableTokenType(
                "nested token is unsecured (alg none)".into(),
            )),
            CompactObject::Encrypted(_) => Err(Error::UnacceptableTokenType(
                "nested token is encrypted again".into(),
            )),
        }
    }

    /// Verify a signed object and decode its claims
    fn verify_signed(&self, object: &SignedObject) -> Result<ClaimSet> {
        let header = &object.header;
        self.config_jws_type.verify(header.token_type.as_deref())?;
        header.reject_unsupported()?;

        let algorithm: SignatureAlgorithm = self.config_signature.resolve(&header.algorithm)?;

        let keys = self.resolve_keys(
            self.config_verification_keys.as_deref(),
            KeyRole::Verify,
            header,
        )?;
        let candidates = selector::select(
            &keys,
            KeyRole::Verify,
            algorithm,
            header.key_id.as_deref(),
            KidMatch::Strict,
        )?;

        jws::verify(object, algorithm, &candidates)?;
        tracing::debug!(algorithm = algorithm.name(), "signed object verified");

        ClaimSet::from_json(&object.payload)
    }

    fn resolve_keys(
        &self,
        source: Option<&dyn KeySource>,
        role: KeyRole,
        header: &JoseHeader,
    ) -> Result<JwkSet> {
        let source = source.ok_or_else(|| {
            Error::ConfigurationInvalid(format!("no {role} key source configured"))
        })?;

        source.resolve(&KeyCriteria {
            role,
            key_id: header.key_id.as_deref(),
        })
    }
}

impl Default for JwtProcessor {
    fn default() -> Self {
        Self::new()
    }
}
