//! Key selection
//!
//! Picks candidate keys for one header out of a resolved key set. A key is
//! compatible when its `use`, `kty` and optional `alg` hint fit the role and
//! algorithm; decryption additionally needs private material. A `kid` in the
//! header narrows compatible keys to exact matches.

use crate::algorithm::JoseAlgorithm;
use crate::error::{Error, Result};
use crate::jwks::JwkSet;
use crate::jwks::jwk::Jwk;
use crate::jwks::source::KeyRole;

/// How a `kid` with no matching key is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KidMatch {
    /// A header `kid` must match a key exactly
    #[default]
    Strict,
    /// Fall back to all compatible keys when the `kid` matches none
    FallbackToCompatible,
}

/// Select candidate keys in key-set order
///
/// Never returns an empty list: no candidate is [`Error::KeyNotFound`].
pub(crate) fn select<'a, A: JoseAlgorithm>(
    set: &'a JwkSet,
    role: KeyRole,
    algorithm: A,
    kid: Option<&str>,
    kid_match: KidMatch,
) -> Result<Vec<&'a Jwk>> {
    let compatible: Vec<&Jwk> = set
        .keys()
        .iter()
        .filter(|jwk| is_compatible(jwk, role, algorithm))
        .collect();

    let candidates = match kid {
        Some(kid) => {
            let matching: Vec<&Jwk> = compatible
                .iter()
                .copied()
                .filter(|jwk| jwk.kid.as_deref() == Some(kid))
                .collect();

            if matching.is_empty() && kid_match == KidMatch::FallbackToCompatible {
                tracing::warn!(
                    kid,
                    %role,
                    candidates = compatible.len(),
                    "no key matches kid, falling back to compatible keys"
                );
                compatible
            } else {
                matching
            }
        }
        None => compatible,
    };

    if candidates.is_empty() {
        return Err(Error::KeyNotFound {
            role: role.to_string(),
            kid: kid.map(ToString::to_string),
        });
    }

    tracing::debug!(%role, algorithm = algorithm.name(), count = candidates.len(), "selected candidate keys");
    Ok(candidates)
}

fn is_compatible<A: JoseAlgorithm>(jwk: &Jwk, role: KeyRole, algorithm: A) -> bool {
    let use_ok = jwk
        .key_use
        .as_deref()
        .is_none_or(|key_use| key_use == role.key_use());
    let kty_ok = jwk.kty.as_deref() == Some(algorithm.key_type());
    let alg_ok = jwk
        .alg
        .as_deref()
        .is_none_or(|alg| alg == algorithm.name());
    let material_ok = match role {
        KeyRole::Decrypt => jwk.is_private(),
        KeyRole::Verify => jwk.n.is_some() && jwk.e.is_some(),
    };

    use_ok && kty_ok && alg_ok && material_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{KeyWrapAlgorithm, SignatureAlgorithm};

    fn key(kid: Option<&str>, key_use: Option<&str>, private: bool) -> Jwk {
        Jwk {
            kty: Some("RSA".into()),
            kid: kid.map(Into::into),
            key_use: key_use.map(Into::into),
            n: Some("AQAB".into()),
            e: Some("AQAB".into()),
            d: private.then(|| "AQAB".into()),
            ..Default::default()
        }
    }

    fn kids(keys: &[&Jwk]) -> Vec<Option<String>> {
        keys.iter().map(|k| k.kid.clone()).collect()
    }

    #[test]
    fn test_select_by_kid() {
        let set = JwkSet::new(vec![
            key(Some("sig-1"), Some("sig"), false),
            key(Some("sig-2"), Some("sig"), false),
        ]);
        let keys = select(
            &set,
            KeyRole::Verify,
            SignatureAlgorithm::RS256,
            Some("sig-2"),
            KidMatch::Strict,
        )
        .unwrap();
        assert_eq!(kids(&keys), vec![Some("sig-2".to_string())]);
    }

    #[test]
    fn test_select_without_kid_keeps_order() {
        let set = JwkSet::new(vec![
            key(Some("b"), None, false),
            key(Some("enc"), Some("enc"), true),
            key(Some("a"), Some("sig"), false),
        ]);
        let keys = select(
            &set,
            KeyRole::Verify,
            SignatureAlgorithm::RS256,
            None,
            KidMatch::Strict,
        )
        .unwrap();
        assert_eq!(kids(&keys), vec![Some("b".into()), Some("a".into())]);
    }

    #[test]
    fn test_select_filters_use() {
        let set = JwkSet::new(vec![key(Some("k"), Some("sig"), true)]);
        let result = select(
            &set,
            KeyRole::Decrypt,
            KeyWrapAlgorithm::RsaOaep,
            Some("k"),
            KidMatch::Strict,
        );
        assert_eq!(
            result.unwrap_err(),
            Error::KeyNotFound {
                role: "decryption".into(),
                kid: Some("k".into())
            }
        );
    }

    #[test]
    fn test_select_decrypt_requires_private_key() {
        let set = JwkSet::new(vec![
            key(Some("public"), Some("enc"), false),
            key(Some("private"), Some("enc"), true),
        ]);
        let keys = select(
            &set,
            KeyRole::Decrypt,
            KeyWrapAlgorithm::RsaOaep,
            None,
            KidMatch::Strict,
        )
        .unwrap();
        assert_eq!(kids(&keys), vec![Some("private".into())]);
    }

    #[test]
    fn test_select_respects_alg_hint() {
        let mut pinned = key(Some("k"), Some("sig"), false);
        pinned.alg = Some("RS256".into());
        let set = JwkSet::new(vec![pinned]);

        assert!(
            select(
                &set,
                KeyRole::Verify,
                SignatureAlgorithm::RS256,
                None,
                KidMatch::Strict
            )
            .is_ok()
        );
        assert!(matches!(
            select(
                &set,
                KeyRole::Verify,
                SignatureAlgorithm::RS512,
                None,
                KidMatch::Strict
            ),
            Err(Error::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_select_filters_kty() {
        let mut ec = key(Some("k"), None, true);
        ec.kty = Some("EC".into());
        let set = JwkSet::new(vec![ec]);
        assert!(
            select(
                &set,
                KeyRole::Decrypt,
                KeyWrapAlgorithm::RsaOaep256,
                None,
                KidMatch::Strict
            )
            .is_err()
        );
    }

    #[test]
    fn test_unknown_kid_strict_and_fallback() {
        let set = JwkSet::new(vec![key(Some("enc-1"), Some("enc"), true)]);

        let strict = select(
            &set,
            KeyRole::Decrypt,
            KeyWrapAlgorithm::RsaOaep,
            Some("enc-rotated"),
            KidMatch::Strict,
        );
        assert!(matches!(strict, Err(Error::KeyNotFound { .. })));

        let fallback = select(
            &set,
            KeyRole::Decrypt,
            KeyWrapAlgorithm::RsaOaep,
            Some("enc-rotated"),
            KidMatch::FallbackToCompatible,
        )
        .unwrap();
        assert_eq!(kids(&fallback), vec![Some("enc-1".into())]);
    }

    #[test]
    fn test_duplicate_kid_yields_all_matches() {
        let set = JwkSet::new(vec![
            key(Some("same"), Some("sig"), false),
            key(Some("same"), None, false),
        ]);
        let keys = select(
            &set,
            KeyRole::Verify,
            SignatureAlgorithm::RS384,
            Some("same"),
            KidMatch::Strict,
        )
        .unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_empty_set() {
        let set = JwkSet::new(Vec::new());
        assert!(matches!(
            select(
                &set,
                KeyRole::Verify,
                SignatureAlgorithm::RS256,
                None,
                KidMatch::Strict
            ),
            Err(Error::KeyNotFound { kid: None, .. })
        ));
    }
}
