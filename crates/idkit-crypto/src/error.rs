use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Base64 decode error: {0}")]
    Base64Decode(String),

    #[error("Input is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Invalid PEM: {0}")]
    InvalidPem(String),

    #[error("Unrecognized {context} key: {reason}")]
    KeyFormat { context: &'static str, reason: String },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("JWK missing {0}")]
    MissingJwkField(&'static str),

    #[error("Invalid JWK: {0}")]
    InvalidJwk(String),

    #[error("Unsupported JWK key type: kty={0}")]
    UnsupportedKeyType(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

impl CryptoError {
    pub(crate) fn key_format(context: &'static str, reason: impl ToString) -> Self {
        CryptoError::KeyFormat {
            context,
            reason: reason.to_string(),
        }
    }
}
