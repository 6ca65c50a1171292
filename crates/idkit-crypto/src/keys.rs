//! Key material loading.
//!
//! Handles are built from DER (SubjectPublicKeyInfo, PKCS#8, PKCS#1 or SEC1),
//! from PEM armor around those, or from the public key embedded in a PEM
//! certificate. Each handle records where its bytes came from.

use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::Coordinates;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use tracing::debug;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use crate::error::CryptoError;

/// Default modulus size for generated RSA keys.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Where a key handle's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Der,
    Pem,
    CertificatePem,
    Jwk,
    Generated,
}

/// DER body of the first PEM block, whose label must be one of `accepted`.
fn pem_body(pem_bytes: &[u8], accepted: &[&str]) -> Result<Vec<u8>, CryptoError> {
    let text = std::str::from_utf8(pem_bytes).map_err(|e| CryptoError::Encoding(e.to_string()))?;
    let block = pem::parse(text).map_err(|e| CryptoError::InvalidPem(e.to_string()))?;
    if !accepted.contains(&block.tag()) {
        return Err(CryptoError::InvalidPem(format!(
            "unexpected label \"{}\", expected one of {:?}",
            block.tag(),
            accepted
        )));
    }
    Ok(block.into_contents())
}

/// Extract the DER SubjectPublicKeyInfo embedded in a PEM certificate.
///
/// The `-----BEGIN CERTIFICATE-----` / `-----END CERTIFICATE-----` markers
/// and line breaks are stripped, the body is base64 decoded, and the key is
/// read out of the TBS certificate. The chain is not validated.
pub fn certificate_public_key_info(pem_bytes: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let der = pem_body(pem_bytes, &["CERTIFICATE"])?;
    let certificate =
        Certificate::from_der(&der).map_err(|e| CryptoError::key_format("certificate", e))?;
    certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| CryptoError::key_format("certificate", e))
}

/// RSA public key handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    key: rsa::RsaPublicKey,
    source: KeySource,
}

impl RsaPublicKey {
    /// Load from SubjectPublicKeyInfo DER, or a bare PKCS#1 `RSAPublicKey`.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        Self::from_der_with_source(der, KeySource::Der)
    }

    fn from_der_with_source(der: &[u8], source: KeySource) -> Result<Self, CryptoError> {
        let key = match rsa::RsaPublicKey::from_public_key_der(der) {
            Ok(key) => key,
            Err(spki_err) => rsa::RsaPublicKey::from_pkcs1_der(der).map_err(|pkcs1_err| {
                CryptoError::key_format(
                    "RSA public",
                    format!(
                        "{} bytes; SubjectPublicKeyInfo: {}; PKCS#1: {}",
                        der.len(),
                        spki_err,
                        pkcs1_err
                    ),
                )
            })?,
        };
        debug!(bits = key.size() * 8, ?source, "Loaded RSA public key");
        Ok(Self { key, source })
    }

    /// Load from `PUBLIC KEY` or `RSA PUBLIC KEY` PEM text.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let der = pem_body(pem_bytes, &["PUBLIC KEY", "RSA PUBLIC KEY"])?;
        Self::from_der_with_source(&der, KeySource::Pem)
    }

    /// Load the public key embedded in a PEM certificate.
    pub fn from_certificate_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let spki = certificate_public_key_info(pem_bytes)?;
        Self::from_der_with_source(&spki, KeySource::CertificatePem)
    }

    /// Build from big-endian modulus and public exponent bytes.
    pub fn from_components(modulus: &[u8], exponent: &[u8]) -> Result<Self, CryptoError> {
        let key = rsa::RsaPublicKey::new(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(exponent),
        )
        .map_err(|e| CryptoError::key_format("RSA public", e))?;
        Ok(Self {
            key,
            source: KeySource::Jwk,
        })
    }

    /// Modulus length in bytes.
    pub fn size(&self) -> usize {
        self.key.size()
    }

    pub fn modulus(&self) -> Vec<u8> {
        self.key.n().to_bytes_be()
    }

    pub fn exponent(&self) -> Vec<u8> {
        self.key.e().to_bytes_be()
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub(crate) fn inner(&self) -> &rsa::RsaPublicKey {
        &self.key
    }
}

/// RSA private key handle.
#[derive(Clone)]
pub struct RsaPrivateKey {
    key: rsa::RsaPrivateKey,
    source: KeySource,
}

impl RsaPrivateKey {
    /// Load from PKCS#8 DER, or a bare PKCS#1 `RSAPrivateKey`.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        Self::from_der_with_source(der, KeySource::Der)
    }

    fn from_der_with_source(der: &[u8], source: KeySource) -> Result<Self, CryptoError> {
        let key = match rsa::RsaPrivateKey::from_pkcs8_der(der) {
            Ok(key) => key,
            Err(pkcs8_err) => rsa::RsaPrivateKey::from_pkcs1_der(der).map_err(|pkcs1_err| {
                CryptoError::key_format(
                    "RSA private",
                    format!(
                        "{} bytes; PKCS#8: {}; PKCS#1: {}",
                        der.len(),
                        pkcs8_err,
                        pkcs1_err
                    ),
                )
            })?,
        };
        debug!(bits = key.size() * 8, ?source, "Loaded RSA private key");
        Ok(Self { key, source })
    }

    /// Load from `PRIVATE KEY` or `RSA PRIVATE KEY` PEM text.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let der = pem_body(pem_bytes, &["PRIVATE KEY", "RSA PRIVATE KEY"])?;
        Self::from_der_with_source(&der, KeySource::Pem)
    }

    /// Generate a fresh key with a `bits`-bit modulus.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let key = rsa::RsaPrivateKey::new(&mut rsa::rand_core::OsRng, bits)
            .map_err(|e| CryptoError::key_format("RSA private", e))?;
        Ok(Self {
            key,
            source: KeySource::Generated,
        })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            key: self.key.to_public_key(),
            source: self.source,
        }
    }

    pub fn size(&self) -> usize {
        self.key.size()
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub(crate) fn inner(&self) -> &rsa::RsaPrivateKey {
        &self.key
    }
}

impl std::fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &(self.key.size() * 8))
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// ECDSA P-256 public key handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPublicKey {
    key: VerifyingKey,
    source: KeySource,
}

impl EcPublicKey {
    /// Load from SubjectPublicKeyInfo DER, or a bare SEC1 encoded point.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        Self::from_der_with_source(der, KeySource::Der)
    }

    fn from_der_with_source(der: &[u8], source: KeySource) -> Result<Self, CryptoError> {
        let public = match p256::PublicKey::from_public_key_der(der) {
            Ok(public) => public,
            Err(spki_err) => p256::PublicKey::from_sec1_bytes(der).map_err(|sec1_err| {
                CryptoError::key_format(
                    "EC public",
                    format!(
                        "{} bytes; SubjectPublicKeyInfo: {}; SEC1: {}",
                        der.len(),
                        spki_err,
                        sec1_err
                    ),
                )
            })?,
        };
        debug!(?source, "Loaded P-256 public key");
        Ok(Self {
            key: VerifyingKey::from(&public),
            source,
        })
    }

    /// Load from `PUBLIC KEY` PEM text.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let der = pem_body(pem_bytes, &["PUBLIC KEY"])?;
        Self::from_der_with_source(&der, KeySource::Pem)
    }

    /// Load the public key embedded in a PEM certificate.
    pub fn from_certificate_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let spki = certificate_public_key_info(pem_bytes)?;
        Self::from_der_with_source(&spki, KeySource::CertificatePem)
    }

    /// Build from affine coordinates, each exactly 32 bytes.
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, CryptoError> {
        if x.len() != 32 || y.len() != 32 {
            return Err(CryptoError::key_format(
                "EC public",
                format!("coordinates must be 32 bytes, got x={} y={}", x.len(), y.len()),
            ));
        }
        // SEC1 uncompressed point: 0x04 || x || y
        let mut uncompressed = Vec::with_capacity(1 + 32 + 32);
        uncompressed.push(0x04);
        uncompressed.extend_from_slice(x);
        uncompressed.extend_from_slice(y);

        let key = VerifyingKey::from_sec1_bytes(&uncompressed)
            .map_err(|e| CryptoError::key_format("EC public", format!("P-256 point: {}", e)))?;
        Ok(Self {
            key,
            source: KeySource::Jwk,
        })
    }

    /// Affine `(x, y)` coordinates, 32 bytes each.
    pub fn coordinates(&self) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let point = self.key.to_encoded_point(false);
        match point.coordinates() {
            Coordinates::Uncompressed { x, y } => Ok((x.to_vec(), y.to_vec())),
            _ => Err(CryptoError::key_format(
                "EC public",
                "point is not in uncompressed form",
            )),
        }
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub(crate) fn inner(&self) -> &VerifyingKey {
        &self.key
    }
}

/// ECDSA P-256 private key handle.
#[derive(Clone)]
pub struct EcPrivateKey {
    key: SigningKey,
    source: KeySource,
}

impl EcPrivateKey {
    /// Load from PKCS#8 DER, or a bare SEC1 `ECPrivateKey`.
    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        Self::from_der_with_source(der, KeySource::Der)
    }

    fn from_der_with_source(der: &[u8], source: KeySource) -> Result<Self, CryptoError> {
        let secret = match p256::SecretKey::from_pkcs8_der(der) {
            Ok(secret) => secret,
            Err(pkcs8_err) => p256::SecretKey::from_sec1_der(der).map_err(|sec1_err| {
                CryptoError::key_format(
                    "EC private",
                    format!(
                        "{} bytes; PKCS#8: {}; SEC1: {}",
                        der.len(),
                        pkcs8_err,
                        sec1_err
                    ),
                )
            })?,
        };
        debug!(?source, "Loaded P-256 private key");
        Ok(Self {
            key: SigningKey::from(&secret),
            source,
        })
    }

    /// Load from `PRIVATE KEY` or `EC PRIVATE KEY` PEM text.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CryptoError> {
        let der = pem_body(pem_bytes, &["PRIVATE KEY", "EC PRIVATE KEY"])?;
        Self::from_der_with_source(&der, KeySource::Pem)
    }

    /// Generate a new P-256 signing key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut p256::elliptic_curve::rand_core::OsRng),
            source: KeySource::Generated,
        }
    }

    pub fn public_key(&self) -> EcPublicKey {
        EcPublicKey {
            key: VerifyingKey::from(&self.key),
            source: self.source,
        }
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub(crate) fn inner(&self) -> &SigningKey {
        &self.key
    }
}

impl std::fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_PUBLIC_PEM: &str = include_str!("../testdata/rsa_pub.pem");
    const RSA_CERT_PEM: &str = include_str!("../testdata/rsa_cert.pem");
    const RSA_PKCS8_PEM: &str = include_str!("../testdata/rsa_pkcs8.pem");
    const RSA_PKCS1_PEM: &str = include_str!("../testdata/rsa_pkcs1.pem");
    const EC_PUBLIC_PEM: &str = include_str!("../testdata/ec_pub.pem");
    const EC_CERT_PEM: &str = include_str!("../testdata/ec_cert.pem");
    const EC_PKCS8_PEM: &str = include_str!("../testdata/ec_pkcs8.pem");
    const EC_SEC1_PEM: &str = include_str!("../testdata/ec_sec1.pem");

    fn der_of(pem_text: &str) -> Vec<u8> {
        pem::parse(pem_text).unwrap().contents().to_vec()
    }

    #[test]
    fn rsa_public_key_from_spki_der() {
        let key = RsaPublicKey::from_der(&der_of(RSA_PUBLIC_PEM)).unwrap();
        assert_eq!(key.size(), 256);
        assert_eq!(key.exponent(), vec![0x01, 0x00, 0x01]);
        assert_eq!(key.source(), KeySource::Der);
    }

    #[test]
    fn rsa_public_key_from_certificate_matches_spki() {
        let from_cert = RsaPublicKey::from_certificate_pem(RSA_CERT_PEM.as_bytes()).unwrap();
        let from_pem = RsaPublicKey::from_pem(RSA_PUBLIC_PEM.as_bytes()).unwrap();
        assert_eq!(from_cert.modulus(), from_pem.modulus());
        assert_eq!(from_cert.source(), KeySource::CertificatePem);
        assert_eq!(from_pem.source(), KeySource::Pem);
    }

    #[test]
    fn rsa_private_key_pkcs8_and_pkcs1_agree() {
        let pkcs8 = RsaPrivateKey::from_der(&der_of(RSA_PKCS8_PEM)).unwrap();
        let pkcs1 = RsaPrivateKey::from_pem(RSA_PKCS1_PEM.as_bytes()).unwrap();
        assert_eq!(pkcs8.public_key().modulus(), pkcs1.public_key().modulus());

        let public = RsaPublicKey::from_pem(RSA_PUBLIC_PEM.as_bytes()).unwrap();
        assert_eq!(pkcs8.public_key().modulus(), public.modulus());
    }

    #[test]
    fn rsa_public_key_from_components_round_trips() {
        let public = RsaPublicKey::from_pem(RSA_PUBLIC_PEM.as_bytes()).unwrap();
        let rebuilt = RsaPublicKey::from_components(&public.modulus(), &public.exponent()).unwrap();
        assert_eq!(rebuilt.modulus(), public.modulus());
        assert_eq!(rebuilt.source(), KeySource::Jwk);
    }

    #[test]
    fn ec_public_key_from_certificate_matches_spki() {
        let from_cert = EcPublicKey::from_certificate_pem(EC_CERT_PEM.as_bytes()).unwrap();
        let from_der = EcPublicKey::from_der(&der_of(EC_PUBLIC_PEM)).unwrap();
        assert_eq!(from_cert.coordinates().unwrap(), from_der.coordinates().unwrap());
    }

    #[test]
    fn ec_private_key_pkcs8_and_sec1_agree() {
        let pkcs8 = EcPrivateKey::from_pem(EC_PKCS8_PEM.as_bytes()).unwrap();
        let sec1 = EcPrivateKey::from_der(&der_of(EC_SEC1_PEM)).unwrap();
        let public = EcPublicKey::from_pem(EC_PUBLIC_PEM.as_bytes()).unwrap();
        assert_eq!(
            pkcs8.public_key().coordinates().unwrap(),
            sec1.public_key().coordinates().unwrap()
        );
        assert_eq!(
            pkcs8.public_key().coordinates().unwrap(),
            public.coordinates().unwrap()
        );
    }

    #[test]
    fn ec_public_key_from_coordinates() {
        let key = EcPrivateKey::generate();
        let (x, y) = key.public_key().coordinates().unwrap();
        let rebuilt = EcPublicKey::from_coordinates(&x, &y).unwrap();
        assert_eq!(rebuilt.coordinates().unwrap(), (x, y));
    }

    #[test]
    fn ec_public_key_rejects_short_coordinates() {
        let err = EcPublicKey::from_coordinates(&[1u8; 31], &[2u8; 32]).unwrap_err();
        assert!(matches!(err, CryptoError::KeyFormat { context: "EC public", .. }));
    }

    #[test]
    fn rejects_garbage_der() {
        let garbage = [0x30, 0x03, 0x02, 0x01, 0x05];
        assert!(matches!(
            RsaPublicKey::from_der(&garbage),
            Err(CryptoError::KeyFormat { .. })
        ));
        assert!(matches!(
            RsaPrivateKey::from_der(&garbage),
            Err(CryptoError::KeyFormat { .. })
        ));
        assert!(matches!(
            EcPublicKey::from_der(&garbage),
            Err(CryptoError::KeyFormat { .. })
        ));
        assert!(matches!(
            EcPrivateKey::from_der(&garbage),
            Err(CryptoError::KeyFormat { .. })
        ));
    }

    #[test]
    fn rsa_loader_rejects_ec_key() {
        let err = RsaPublicKey::from_pem(EC_PUBLIC_PEM.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("RSA public"));
    }

    #[test]
    fn certificate_requires_utf8() {
        let err = RsaPublicKey::from_certificate_pem(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }

    #[test]
    fn certificate_requires_markers() {
        let body: String = RSA_CERT_PEM
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        let err = RsaPublicKey::from_certificate_pem(body.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPem(_)));
    }

    #[test]
    fn certificate_rejects_other_labels() {
        let err = RsaPublicKey::from_certificate_pem(RSA_PUBLIC_PEM.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPem(_)));
        assert!(err.to_string().contains("PUBLIC KEY"));
    }

    #[test]
    fn certificate_rejects_bad_base64_body() {
        let broken = "-----BEGIN CERTIFICATE-----\n!!!!\n-----END CERTIFICATE-----\n";
        let err = RsaPublicKey::from_certificate_pem(broken.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPem(_)));
    }

    #[test]
    fn certificate_rejects_non_certificate_der() {
        // Valid armor and base64, but the body is a public key, not a certificate
        let relabelled = RSA_PUBLIC_PEM
            .replace("BEGIN PUBLIC KEY", "BEGIN CERTIFICATE")
            .replace("END PUBLIC KEY", "END CERTIFICATE");
        let err = RsaPublicKey::from_certificate_pem(relabelled.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::KeyFormat { context: "certificate", .. }));
    }

    #[test]
    fn private_key_debug_hides_material() {
        let key = EcPrivateKey::generate();
        assert_eq!(format!("{:?}", key), "EcPrivateKey { source: Generated, .. }");
    }
}
