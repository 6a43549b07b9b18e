//! JWS signature verification

use crate::algorithm::SignatureAlgorithm;
use crate::compact::SignedObject;
use crate::error::{Error, Result};
use crate::jwks::jwk::Jwk;

/// Verify a signed object against candidate keys in order
///
/// Keys whose material cannot be converted are skipped. Succeeds on the
/// first key that verifies; otherwise [`Error::SignatureInvalid`].
pub(crate) fn verify(
    object: &SignedObject,
    algorithm: SignatureAlgorithm,
    candidates: &[&Jwk],
) -> Result<()> {
    let signing_input = object.signing_input();

    for jwk in candidates {
        let key_der = match jwk.to_public_key_der() {
            Ok(der) => der,
            Err(e) => {
                tracing::warn!(kid = jwk.kid.as_deref(), error = %e, "skipping unusable verification key");
                continue;
            }
        };

        if algorithm
            .verify_signature(&signing_input, &object.signature, &key_der)
            .is_ok()
        {
            tracing::debug!(kid = jwk.kid.as_deref(), %algorithm, "signature verified");
            return Ok(());
        }
    }

    Err(Error::SignatureInvalid)
}
