//! Digest and algorithm registry.
//!
//! Each signature family exposes the same five digest strengths. Every
//! variant maps to a digest function, a digest length and the identifiers
//! the engines dispatch on. The mapping lives in one exhaustive `match` per
//! family so a new strength cannot be added without covering every field.

use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Hash function backing an algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Hash `data` with this function.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

/// Signature scheme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    RsaPkcs1v15Sha1,
    RsaPkcs1v15Sha224,
    RsaPkcs1v15Sha256,
    RsaPkcs1v15Sha384,
    RsaPkcs1v15Sha512,
    EcdsaX962Sha1,
    EcdsaX962Sha224,
    EcdsaX962Sha256,
    EcdsaX962Sha384,
    EcdsaX962Sha512,
}

impl SignatureAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaPkcs1v15Sha1 => "rsa-pkcs1v15-sha1",
            SignatureAlgorithm::RsaPkcs1v15Sha224 => "rsa-pkcs1v15-sha224",
            SignatureAlgorithm::RsaPkcs1v15Sha256 => "rsa-pkcs1v15-sha256",
            SignatureAlgorithm::RsaPkcs1v15Sha384 => "rsa-pkcs1v15-sha384",
            SignatureAlgorithm::RsaPkcs1v15Sha512 => "rsa-pkcs1v15-sha512",
            SignatureAlgorithm::EcdsaX962Sha1 => "ecdsa-x962-sha1",
            SignatureAlgorithm::EcdsaX962Sha224 => "ecdsa-x962-sha224",
            SignatureAlgorithm::EcdsaX962Sha256 => "ecdsa-x962-sha256",
            SignatureAlgorithm::EcdsaX962Sha384 => "ecdsa-x962-sha384",
            SignatureAlgorithm::EcdsaX962Sha512 => "ecdsa-x962-sha512",
        }
    }
}

/// Hybrid RSA-OAEP + AES-GCM encryption scheme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    RsaOaepSha1AesGcm,
    RsaOaepSha224AesGcm,
    RsaOaepSha256AesGcm,
    RsaOaepSha384AesGcm,
    RsaOaepSha512AesGcm,
}

impl EncryptionAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            EncryptionAlgorithm::RsaOaepSha1AesGcm => "rsa-oaep-sha1-aes-gcm",
            EncryptionAlgorithm::RsaOaepSha224AesGcm => "rsa-oaep-sha224-aes-gcm",
            EncryptionAlgorithm::RsaOaepSha256AesGcm => "rsa-oaep-sha256-aes-gcm",
            EncryptionAlgorithm::RsaOaepSha384AesGcm => "rsa-oaep-sha384-aes-gcm",
            EncryptionAlgorithm::RsaOaepSha512AesGcm => "rsa-oaep-sha512-aes-gcm",
        }
    }

    /// Digest used for OAEP padding and MGF1.
    pub fn oaep_digest(self) -> DigestAlgorithm {
        match self {
            EncryptionAlgorithm::RsaOaepSha1AesGcm => DigestAlgorithm::Sha1,
            EncryptionAlgorithm::RsaOaepSha224AesGcm => DigestAlgorithm::Sha224,
            EncryptionAlgorithm::RsaOaepSha256AesGcm => DigestAlgorithm::Sha256,
            EncryptionAlgorithm::RsaOaepSha384AesGcm => DigestAlgorithm::Sha384,
            EncryptionAlgorithm::RsaOaepSha512AesGcm => DigestAlgorithm::Sha512,
        }
    }
}

/// Behaviour shared by the per-family algorithm selectors.
pub trait Algorithm: Copy + std::fmt::Debug {
    fn digest_algorithm(self) -> DigestAlgorithm;

    fn signature_algorithm(self) -> SignatureAlgorithm;

    /// Encryption scheme for this selector.
    ///
    /// # Panics
    /// Families that only sign panic here.
    fn encryption_algorithm(self) -> EncryptionAlgorithm;

    fn digest(self, data: &[u8]) -> Vec<u8> {
        self.digest_algorithm().digest(data)
    }

    fn digest_length(self) -> usize {
        self.digest_algorithm().output_len()
    }
}

/// RSA algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl RsaAlgorithm {
    pub const ALL: [RsaAlgorithm; 5] = [
        RsaAlgorithm::Sha1,
        RsaAlgorithm::Sha224,
        RsaAlgorithm::Sha256,
        RsaAlgorithm::Sha384,
        RsaAlgorithm::Sha512,
    ];
}

impl Algorithm for RsaAlgorithm {
    fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            RsaAlgorithm::Sha1 => DigestAlgorithm::Sha1,
            RsaAlgorithm::Sha224 => DigestAlgorithm::Sha224,
            RsaAlgorithm::Sha256 => DigestAlgorithm::Sha256,
            RsaAlgorithm::Sha384 => DigestAlgorithm::Sha384,
            RsaAlgorithm::Sha512 => DigestAlgorithm::Sha512,
        }
    }

    fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            RsaAlgorithm::Sha1 => SignatureAlgorithm::RsaPkcs1v15Sha1,
            RsaAlgorithm::Sha224 => SignatureAlgorithm::RsaPkcs1v15Sha224,
            RsaAlgorithm::Sha256 => SignatureAlgorithm::RsaPkcs1v15Sha256,
            RsaAlgorithm::Sha384 => SignatureAlgorithm::RsaPkcs1v15Sha384,
            RsaAlgorithm::Sha512 => SignatureAlgorithm::RsaPkcs1v15Sha512,
        }
    }

    fn encryption_algorithm(self) -> EncryptionAlgorithm {
        match self {
            RsaAlgorithm::Sha1 => EncryptionAlgorithm::RsaOaepSha1AesGcm,
            RsaAlgorithm::Sha224 => EncryptionAlgorithm::RsaOaepSha224AesGcm,
            RsaAlgorithm::Sha256 => EncryptionAlgorithm::RsaOaepSha256AesGcm,
            RsaAlgorithm::Sha384 => EncryptionAlgorithm::RsaOaepSha384AesGcm,
            RsaAlgorithm::Sha512 => EncryptionAlgorithm::RsaOaepSha512AesGcm,
        }
    }
}

/// ECDSA algorithm selector. Signing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcdsaAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl EcdsaAlgorithm {
    pub const ALL: [EcdsaAlgorithm; 5] = [
        EcdsaAlgorithm::Sha1,
        EcdsaAlgorithm::Sha224,
        EcdsaAlgorithm::Sha256,
        EcdsaAlgorithm::Sha384,
        EcdsaAlgorithm::Sha512,
    ];
}

impl Algorithm for EcdsaAlgorithm {
    fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            EcdsaAlgorithm::Sha1 => DigestAlgorithm::Sha1,
            EcdsaAlgorithm::Sha224 => DigestAlgorithm::Sha224,
            EcdsaAlgorithm::Sha256 => DigestAlgorithm::Sha256,
            EcdsaAlgorithm::Sha384 => DigestAlgorithm::Sha384,
            EcdsaAlgorithm::Sha512 => DigestAlgorithm::Sha512,
        }
    }

    fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            EcdsaAlgorithm::Sha1 => SignatureAlgorithm::EcdsaX962Sha1,
            EcdsaAlgorithm::Sha224 => SignatureAlgorithm::EcdsaX962Sha224,
            EcdsaAlgorithm::Sha256 => SignatureAlgorithm::EcdsaX962Sha256,
            EcdsaAlgorithm::Sha384 => SignatureAlgorithm::EcdsaX962Sha384,
            EcdsaAlgorithm::Sha512 => SignatureAlgorithm::EcdsaX962Sha512,
        }
    }

    fn encryption_algorithm(self) -> EncryptionAlgorithm {
        panic!(
            "ECDSA is signing-only: no encryption algorithm exists for {:?}",
            self
        )
    }
}
