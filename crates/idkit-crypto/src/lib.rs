//! Cryptographic primitives for verifying identity provider tokens.
//!
//! - Base64url without padding
//! - Key loading from DER, PEM, PEM certificates and JWKs
//! - Digest and algorithm registry for the RSA and ECDSA families
//! - RSA PKCS#1 v1.5 signatures and RSA-OAEP + AES-256-GCM encryption
//! - ECDSA P-256 signatures (DER encoded)

pub mod algorithm;
pub mod base64url;
pub mod data;
pub mod ecdsa;
pub mod error;
pub mod jwk;
pub mod keys;
pub mod rsa;

pub use crate::algorithm::{
    Algorithm, DigestAlgorithm, EcdsaAlgorithm, EncryptionAlgorithm, RsaAlgorithm,
    SignatureAlgorithm,
};
pub use crate::base64url::{base64url_decode, base64url_encode};
pub use crate::data::{CryptoData, EncryptedData, PlainData, SignedData};
pub use crate::error::CryptoError;
pub use crate::jwk::{Jwk, JwkSet};
pub use crate::keys::{
    certificate_public_key_info, EcPrivateKey, EcPublicKey, KeySource, RsaPrivateKey,
    RsaPublicKey, DEFAULT_RSA_BITS,
};
