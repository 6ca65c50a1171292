//! PKCE (RFC 7636) verifier and S256 challenge generation.

use std::fmt;

use chrono::Utc;
use idkit_crypto::base64url_encode;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::AuthError;

/// Length of the raw code verifier in bytes (43 base64url characters).
pub const VERIFIER_LEN: usize = 32;

/// The only challenge method produced.
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// Where the verifier bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropySource {
    /// Operating system CSPRNG.
    Secure,
    /// Time-seeded non-cryptographic PRNG, used only when the OS source fails.
    Fallback,
}

fn fill_verifier<F>(os_fill: F) -> ([u8; VERIFIER_LEN], EntropySource)
where
    F: FnOnce(&mut [u8]) -> Result<(), getrandom::Error>,
{
    let mut bytes = [0u8; VERIFIER_LEN];
    match os_fill(&mut bytes) {
        Ok(()) => (bytes, EntropySource::Secure),
        Err(e) => {
            warn!(error = %e, "OS random source unavailable, PKCE verifier uses fallback PRNG");
            let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
            SmallRng::seed_from_u64(seed).fill_bytes(&mut bytes);
            (bytes, EntropySource::Fallback)
        }
    }
}

/// Generate 32 random verifier bytes.
///
/// Never fails: when the OS CSPRNG is unavailable the bytes come from a
/// seeded PRNG and the returned source is [`EntropySource::Fallback`].
pub fn generate_verifier() -> ([u8; VERIFIER_LEN], EntropySource) {
    fill_verifier(getrandom::getrandom)
}

/// `base64url(SHA-256(verifier))`, hashing the ASCII text of the encoded verifier.
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    base64url_encode(&hash)
}

/// Random OAuth `state` for the same authorization attempt as the PKCE pair.
///
/// The redirect handler compares it to bind the callback to this client. 16 bytes
/// from the OS CSPRNG, base64url encoded; unlike the verifier there is no
/// fallback source.
pub fn generate_state() -> Result<String, AuthError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| AuthError::RngFailed(e.to_string()))?;
    Ok(base64url_encode(&bytes))
}

/// PKCE parameters for one authorization attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Pkce {
    code_verifier: String,
    code_challenge: String,
    entropy_source: EntropySource,
}

impl Pkce {
    pub fn new() -> Self {
        let (bytes, source) = generate_verifier();
        Self::from_verifier_bytes(&bytes, source)
    }

    fn from_verifier_bytes(bytes: &[u8; VERIFIER_LEN], entropy_source: EntropySource) -> Self {
        let code_verifier = base64url_encode(bytes);
        let code_challenge = compute_code_challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
            entropy_source,
        }
    }

    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    pub fn code_challenge_method(&self) -> &'static str {
        CODE_CHALLENGE_METHOD
    }

    pub fn entropy_source(&self) -> EntropySource {
        self.entropy_source
    }

    /// Query parameters for the authorization request.
    pub fn authorization_params(&self) -> [(&'static str, &str); 2] {
        [
            ("code_challenge", self.code_challenge.as_str()),
            ("code_challenge_method", CODE_CHALLENGE_METHOD),
        ]
    }

    /// Form parameters for the token exchange.
    pub fn token_params(&self) -> [(&'static str, &str); 1] {
        [("code_verifier", self.code_verifier.as_str())]
    }
}

impl Default for Pkce {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pkce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pkce")
            .field("code_challenge", &self.code_challenge)
            .field("entropy_source", &self.entropy_source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential_bytes() -> [u8; VERIFIER_LEN] {
        let mut bytes = [0u8; VERIFIER_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        bytes
    }

    #[test]
    fn verifier_is_32_bytes_from_secure_source() {
        let (bytes, source) = generate_verifier();
        assert_eq!(bytes.len(), 32);
        assert_eq!(source, EntropySource::Secure);
    }

    #[test]
    fn verifiers_are_unique() {
        let (v1, _) = generate_verifier();
        let (v2, _) = generate_verifier();
        assert_ne!(v1, v2);
    }

    #[test]
    fn fallback_used_when_os_source_fails() {
        let (bytes, source) = fill_verifier(|_| Err(getrandom::Error::UNSUPPORTED));
        assert_eq!(source, EntropySource::Fallback);
        assert_ne!(bytes, [0u8; VERIFIER_LEN]);
    }

    #[test]
    fn code_verifier_is_43_base64url_chars() {
        let pkce = Pkce::new();
        assert_eq!(pkce.code_verifier().len(), 43);
        assert!(pkce
            .code_verifier()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn code_challenge_is_43_chars() {
        let pkce = Pkce::new();
        assert_eq!(pkce.code_challenge().len(), 43);
    }

    #[test]
    fn code_challenge_is_deterministic() {
        let verifier = "test-verifier-12345";
        assert_eq!(
            compute_code_challenge(verifier),
            compute_code_challenge(verifier)
        );
    }

    #[test]
    fn sequential_bytes_fixture() {
        let pkce = Pkce::from_verifier_bytes(&sequential_bytes(), EntropySource::Secure);
        assert_eq!(
            pkce.code_verifier(),
            "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8"
        );
        assert_eq!(
            pkce.code_challenge(),
            "6oZqdX5MOLq_qBJ8vppAnT4fk6AP8UiP9zX8-Rev_9A"
        );
    }

    #[test]
    fn rfc7636_appendix_b_vector() {
        assert_eq!(
            compute_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn method_is_s256() {
        assert_eq!(Pkce::new().code_challenge_method(), "S256");
    }

    #[test]
    fn request_params_carry_values_unmodified() {
        let pkce = Pkce::new();
        let auth = pkce.authorization_params();
        assert_eq!(auth[0], ("code_challenge", pkce.code_challenge()));
        assert_eq!(auth[1], ("code_challenge_method", "S256"));
        assert_eq!(pkce.token_params(), [("code_verifier", pkce.code_verifier())]);
    }

    #[test]
    fn debug_hides_verifier() {
        let pkce = Pkce::new();
        let debug = format!("{:?}", pkce);
        assert!(!debug.contains(pkce.code_verifier()));
        assert!(debug.contains(pkce.code_challenge()));
    }

    #[test]
    fn state_encodes_16_random_bytes() {
        let state = generate_state().unwrap();
        assert_eq!(state.len(), 22);
        assert_eq!(idkit_crypto::base64url_decode(&state).unwrap().len(), 16);
    }

    #[test]
    fn state_differs_per_attempt() {
        let states: std::collections::HashSet<String> =
            (0..8).map(|_| generate_state().unwrap()).collect();
        assert_eq!(states.len(), 8);
    }
}
