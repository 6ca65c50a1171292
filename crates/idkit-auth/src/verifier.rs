//! OIDC ID token verification: signature over the compact token, then the
//! standard claim checks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use idkit_crypto::{ecdsa, rsa, CryptoData, EcdsaAlgorithm, Jwk, JwkSet, PlainData, RsaAlgorithm};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::token::{CompactToken, IdTokenClaims};

/// Default clock skew tolerance for `exp` and `iat`.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// JOSE `alg` values accepted for ID token signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwsAlgorithm {
    Rs256,
    Rs384,
    Rs512,
    Es256,
}

impl JwsAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            JwsAlgorithm::Rs256 => "RS256",
            JwsAlgorithm::Rs384 => "RS384",
            JwsAlgorithm::Rs512 => "RS512",
            JwsAlgorithm::Es256 => "ES256",
        }
    }
}

impl FromStr for JwsAlgorithm {
    type Err = AuthError;

    fn from_str(alg: &str) -> Result<Self, Self::Err> {
        match alg {
            "RS256" => Ok(JwsAlgorithm::Rs256),
            "RS384" => Ok(JwsAlgorithm::Rs384),
            "RS512" => Ok(JwsAlgorithm::Rs512),
            "ES256" => Ok(JwsAlgorithm::Es256),
            other => Err(AuthError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_leeway_secs() -> u64 {
    DEFAULT_LEEWAY_SECS
}

/// What a valid ID token must say about its issuer, audience, and nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Expected `iss`
    pub issuer: String,
    /// Must appear in `aud`
    pub client_id: String,
    /// Expected `nonce`; unchecked when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl VerifyOptions {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            nonce: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// Pick the signing key: by `kid`, or the only key when the header has none.
fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk, AuthError> {
    match kid {
        Some(kid) => keys
            .find(kid)
            .ok_or_else(|| AuthError::KeyNotFound(Some(kid.to_string()))),
        None => match keys.keys.as_slice() {
            [only] => Ok(only),
            _ => Err(AuthError::KeyNotFound(None)),
        },
    }
}

fn verify_signature(
    token: &CompactToken,
    jwk: &Jwk,
    algorithm: JwsAlgorithm,
) -> Result<bool, AuthError> {
    let plain = PlainData::from_text(&token.plain_segment());
    let signature = token.signature_bytes()?;

    let rsa_algorithm = match algorithm {
        JwsAlgorithm::Rs256 => RsaAlgorithm::Sha256,
        JwsAlgorithm::Rs384 => RsaAlgorithm::Sha384,
        JwsAlgorithm::Rs512 => RsaAlgorithm::Sha512,
        JwsAlgorithm::Es256 => return verify_es256(&plain, signature.raw(), jwk),
    };

    let key = jwk.rsa_public_key()?;
    Ok(rsa::verify(&plain, &signature, &key, rsa_algorithm)?)
}

fn verify_es256(plain: &PlainData, raw_signature: &[u8], jwk: &Jwk) -> Result<bool, AuthError> {
    let key = jwk.ec_public_key()?;
    // JWS carries r || s; a wrong-length value can never verify
    let der = match ecdsa::der_signature_from_raw(raw_signature) {
        Ok(der) => der,
        Err(e) => {
            debug!(error = %e, "ES256 signature has the wrong length");
            return Ok(false);
        }
    };
    Ok(ecdsa::verify(plain, &der, &key, EcdsaAlgorithm::Sha256)?)
}

/// Verifies ID tokens against a provider's JWK Set.
#[derive(Debug, Clone)]
pub struct IdTokenVerifier {
    options: VerifyOptions,
}

impl IdTokenVerifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Verify `token` at time `now` and return its claims.
    pub fn verify(
        &self,
        token: &str,
        keys: &JwkSet,
        now: DateTime<Utc>,
    ) -> Result<IdTokenClaims, AuthError> {
        let result = self.verify_token(token, keys, now.timestamp());
        if let Err(e) = &result {
            warn!(error = %e, "ID token rejected");
        }
        result
    }

    pub fn verify_now(&self, token: &str, keys: &JwkSet) -> Result<IdTokenClaims, AuthError> {
        self.verify(token, keys, Utc::now())
    }

    fn verify_token(&self, token: &str, keys: &JwkSet, now: i64) -> Result<IdTokenClaims, AuthError> {
        let token: CompactToken = token.parse()?;
        let header = token.header()?;
        let algorithm: JwsAlgorithm = header.alg.parse()?;

        let jwk = select_key(keys, header.kid.as_deref())?;
        if let Some(key_alg) = jwk.alg.as_deref() {
            if key_alg != algorithm.as_str() {
                return Err(AuthError::KeyAlgorithmMismatch {
                    key_alg: key_alg.to_string(),
                    token_alg: algorithm.as_str().to_string(),
                });
            }
        }

        if !verify_signature(&token, jwk, algorithm)? {
            return Err(AuthError::InvalidSignature);
        }

        let claims = token.claims()?;
        self.validate_claims(&claims, now)?;
        debug!(
            alg = algorithm.as_str(),
            kid = header.kid.as_deref().unwrap_or(""),
            "ID token verified"
        );
        Ok(claims)
    }

    fn validate_claims(&self, claims: &IdTokenClaims, now: i64) -> Result<(), AuthError> {
        if claims.iss != self.options.issuer {
            return Err(AuthError::InvalidClaim {
                claim: "iss",
                expected: self.options.issuer.clone(),
                actual: claims.iss.clone(),
            });
        }

        if !claims.aud.contains(&self.options.client_id) {
            return Err(AuthError::InvalidClaim {
                claim: "aud",
                expected: self.options.client_id.clone(),
                actual: claims.aud.to_string(),
            });
        }

        let leeway = i64::try_from(self.options.leeway_secs).unwrap_or(i64::MAX);
        if claims.exp.saturating_add(leeway) <= now {
            return Err(AuthError::Expired {
                expired_at: claims.exp,
                now,
            });
        }
        if claims.iat.saturating_sub(leeway) > now {
            return Err(AuthError::IssuedInFuture {
                issued_at: claims.iat,
                now,
            });
        }

        if let Some(expected) = &self.options.nonce {
            if claims.nonce.as_deref() != Some(expected.as_str()) {
                return Err(AuthError::InvalidClaim {
                    claim: "nonce",
                    expected: expected.clone(),
                    actual: claims.nonce.clone().unwrap_or_default(),
                });
            }
        }

        Ok(())
    }
}
