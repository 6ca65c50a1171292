//! RSA engine: PKCS#1 v1.5 signatures and hybrid RSA-OAEP + AES-256-GCM
//! encryption.
//!
//! Encrypted wire format:
//! [modulus-size bytes: RSA-OAEP(session key)][12 bytes: nonce][ciphertext + 16-byte tag]

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rsa::{Oaep, Pkcs1v15Sign};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::algorithm::{Algorithm, DigestAlgorithm, RsaAlgorithm};
use crate::data::{CryptoData, EncryptedData, PlainData, SignedData};
use crate::error::CryptoError;
use crate::keys::{RsaPrivateKey, RsaPublicKey};

const SESSION_KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

fn pkcs1v15_scheme(digest: DigestAlgorithm) -> Pkcs1v15Sign {
    match digest {
        DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        DigestAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn oaep_scheme(digest: DigestAlgorithm) -> Oaep {
    match digest {
        DigestAlgorithm::Sha1 => Oaep::new::<Sha1>(),
        DigestAlgorithm::Sha224 => Oaep::new::<Sha224>(),
        DigestAlgorithm::Sha256 => Oaep::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Oaep::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Oaep::new::<Sha512>(),
    }
}

/// Encrypt `plain` for the holder of `public_key`.
///
/// A fresh AES-256-GCM session key is wrapped with RSA-OAEP using the
/// algorithm's digest; the message itself is sealed with that session key.
pub fn encrypt(
    plain: &PlainData,
    public_key: &RsaPublicKey,
    algorithm: RsaAlgorithm,
) -> Result<EncryptedData, CryptoError> {
    let scheme = algorithm.encryption_algorithm();
    trace!(
        algorithm = scheme.as_str(),
        plain_len = plain.len(),
        "RSA encryption starting"
    );

    let mut session_key = [0u8; SESSION_KEY_LENGTH];
    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut session_key).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;

    let wrapped_key = public_key
        .inner()
        .encrypt(
            &mut rsa::rand_core::OsRng,
            oaep_scheme(scheme.oaep_digest()),
            &session_key,
        )
        .map_err(|e| CryptoError::EncryptionFailed(format!("RSA-OAEP: {}", e)));

    let sealed = Aes256Gcm::new_from_slice(&session_key)
        .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM init: {}", e)))
        .and_then(|cipher| {
            cipher
                .encrypt(Nonce::from_slice(&nonce), plain.raw())
                .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM: {}", e)))
        });
    session_key.zeroize();

    let wrapped_key = wrapped_key?;
    let sealed = sealed?;

    let mut result = Vec::with_capacity(wrapped_key.len() + NONCE_LENGTH + sealed.len());
    result.extend_from_slice(&wrapped_key);
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&sealed);
    Ok(EncryptedData::new(result))
}

/// Decrypt data produced by [`encrypt`] with the matching private key.
pub fn decrypt(
    encrypted: &EncryptedData,
    private_key: &RsaPrivateKey,
    algorithm: RsaAlgorithm,
) -> Result<PlainData, CryptoError> {
    let scheme = algorithm.encryption_algorithm();
    let modulus_len = private_key.size();
    let raw = encrypted.raw();
    trace!(
        algorithm = scheme.as_str(),
        encrypted_len = raw.len(),
        "RSA decryption starting"
    );

    if raw.len() < modulus_len + NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext too short: {} bytes for a {}-byte modulus",
            raw.len(),
            modulus_len
        )));
    }

    let (wrapped_key, rest) = raw.split_at(modulus_len);
    let (nonce, sealed) = rest.split_at(NONCE_LENGTH);

    let mut session_key = private_key
        .inner()
        .decrypt(oaep_scheme(scheme.oaep_digest()), wrapped_key)
        .map_err(|e| CryptoError::DecryptionFailed(format!("RSA-OAEP: {}", e)))?;

    let opened = Aes256Gcm::new_from_slice(&session_key)
        .map_err(|e| CryptoError::DecryptionFailed(format!("AES-GCM init: {}", e)))
        .and_then(|cipher| {
            cipher
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|e| CryptoError::DecryptionFailed(format!("AES-GCM: {}", e)))
        });
    session_key.zeroize();

    Ok(PlainData::new(opened?))
}

/// Sign `plain` with PKCS#1 v1.5 over the algorithm's digest.
pub fn sign(
    plain: &PlainData,
    private_key: &RsaPrivateKey,
    algorithm: RsaAlgorithm,
) -> Result<SignedData, CryptoError> {
    let hashed = plain.digest(algorithm);
    let signature = private_key
        .inner()
        .sign(pkcs1v15_scheme(algorithm.digest_algorithm()), &hashed)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    trace!(
        algorithm = algorithm.signature_algorithm().as_str(),
        data_len = plain.len(),
        signature_len = signature.len(),
        "RSA signing completed"
    );
    Ok(SignedData::new(signature))
}

/// Verify a PKCS#1 v1.5 signature.
///
/// Returns `Ok(false)` when the signature does not match the message and
/// key. Errors are reserved for faults in the primitive itself.
pub fn verify(
    plain: &PlainData,
    signature: &SignedData,
    public_key: &RsaPublicKey,
    algorithm: RsaAlgorithm,
) -> Result<bool, CryptoError> {
    let hashed = plain.digest(algorithm);
    let result = public_key.inner().verify(
        pkcs1v15_scheme(algorithm.digest_algorithm()),
        &hashed,
        signature.raw(),
    );

    match result {
        Ok(()) => {
            debug!(
                algorithm = algorithm.signature_algorithm().as_str(),
                "RSA signature verification succeeded"
            );
            Ok(true)
        }
        Err(rsa::Error::Verification) => {
            debug!(
                algorithm = algorithm.signature_algorithm().as_str(),
                "RSA signature does not match"
            );
            Ok(false)
        }
        Err(e) => Err(CryptoError::VerificationFailed(e.to_string())),
    }
}
