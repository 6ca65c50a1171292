use thiserror::Error;

/// Nonce values are flow secrets and stay out of messages.
fn claim_mismatch(claim: &str, expected: &str, actual: &str) -> String {
    match claim {
        "nonce" => "value does not match the request".to_string(),
        _ => format!("expected {}, got {}", expected, actual),
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Malformed compact token: expected 3 segments, got {segments}")]
    MalformedToken { token: String, segments: usize },

    #[error("Base64 decode error in {segment}: {reason}")]
    Base64Decode {
        segment: &'static str,
        reason: String,
    },

    #[error("JSON error in {segment}: {source}")]
    Json {
        segment: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("No verification key found for kid {0:?}")]
    KeyNotFound(Option<String>),

    #[error("Key is meant for {key_alg}, token is signed with {token_alg}")]
    KeyAlgorithmMismatch { key_alg: String, token_alg: String },

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Invalid {claim} claim: {}", claim_mismatch(.claim, .expected, .actual))]
    InvalidClaim {
        claim: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Token expired at {expired_at} (now {now})")]
    Expired { expired_at: i64, now: i64 },

    #[error("Token issued in the future at {issued_at} (now {now})")]
    IssuedInFuture { issued_at: i64, now: i64 },

    #[error("Crypto error: {0}")]
    Crypto(#[from] idkit_crypto::CryptoError),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
