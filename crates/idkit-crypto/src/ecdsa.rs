//! ECDSA P-256 signing and verification.
//!
//! The algorithm's digest is computed first and used as the prehash, so the
//! same curve works with every digest strength. Signatures are ASN.1 DER
//! `ECDSA-Sig-Value` structures.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::Signature;
use tracing::{debug, trace};

use crate::algorithm::{Algorithm, EcdsaAlgorithm};
use crate::data::{CryptoData, PlainData, SignedData};
use crate::error::CryptoError;
use crate::keys::{EcPrivateKey, EcPublicKey};

/// Sign `plain` over the algorithm's digest.
///
/// # Returns
/// DER-encoded signature (70-72 bytes typically)
pub fn sign(
    plain: &PlainData,
    private_key: &EcPrivateKey,
    algorithm: EcdsaAlgorithm,
) -> Result<SignedData, CryptoError> {
    let prehash = plain.digest(algorithm);
    let signature: Signature = private_key
        .inner()
        .sign_prehash(&prehash)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
    let der = signature.to_der();
    trace!(
        algorithm = algorithm.signature_algorithm().as_str(),
        data_len = plain.len(),
        signature_len = der.as_bytes().len(),
        "ECDSA signing completed"
    );
    Ok(SignedData::new(der.as_bytes()))
}

/// Verify a DER-encoded signature.
///
/// # Returns
/// true if valid, false otherwise. A signature that is not valid DER
/// (including the fixed-width r||s form) never verifies.
pub fn verify(
    plain: &PlainData,
    signature: &SignedData,
    public_key: &EcPublicKey,
    algorithm: EcdsaAlgorithm,
) -> Result<bool, CryptoError> {
    let signature = match Signature::from_der(signature.raw()) {
        Ok(signature) => signature,
        Err(e) => {
            debug!(error = %e, "ECDSA signature is not valid DER");
            return Ok(false);
        }
    };

    let prehash = plain.digest(algorithm);
    let valid = public_key
        .inner()
        .verify_prehash(&prehash, &signature)
        .is_ok();
    debug!(
        algorithm = algorithm.signature_algorithm().as_str(),
        valid, "ECDSA signature verification finished"
    );
    Ok(valid)
}

/// Convert a fixed-width `r || s` signature (64 bytes, as carried by JWS)
/// into DER.
pub fn der_signature_from_raw(raw: &[u8]) -> Result<SignedData, CryptoError> {
    let signature = Signature::from_slice(raw)
        .map_err(|e| CryptoError::VerificationFailed(format!("raw P-256 signature: {}", e)))?;
    Ok(SignedData::new(signature.to_der().as_bytes()))
}

/// Convert a DER signature into the fixed-width `r || s` form.
pub fn raw_signature_from_der(der: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signature = Signature::from_der(der)
        .map_err(|e| CryptoError::SigningFailed(format!("DER P-256 signature: {}", e)))?;
    Ok(signature.to_bytes().to_vec())
}
