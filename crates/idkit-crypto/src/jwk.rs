//! JSON Web Key (RFC 7517) import for RSA and P-256 public keys.

use serde::{Deserialize, Serialize};

use crate::base64url::{base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::keys::{EcPublicKey, RsaPublicKey};

/// A public JWK as published by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" or "EC")
    pub kty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// JOSE algorithm the key is meant for (e.g. "RS256")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, CryptoError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(CryptoError::MissingJwkField(name))
}

fn decode_field(value: &str, name: &str) -> Result<Vec<u8>, CryptoError> {
    base64url_decode(value).map_err(|e| CryptoError::InvalidJwk(format!("{}: {}", name, e)))
}

/// Left-pad a big-endian coordinate to 32 bytes.
fn pad_coordinate(mut bytes: Vec<u8>, name: &str) -> Result<Vec<u8>, CryptoError> {
    if bytes.len() > 32 {
        return Err(CryptoError::InvalidJwk(format!(
            "{}: expected at most 32 bytes, got {}",
            name,
            bytes.len()
        )));
    }
    if bytes.len() < 32 {
        let mut padded = vec![0u8; 32 - bytes.len()];
        padded.append(&mut bytes);
        return Ok(padded);
    }
    Ok(bytes)
}

impl Jwk {
    /// Import an RSA public key (`kty: "RSA"`).
    pub fn rsa_public_key(&self) -> Result<RsaPublicKey, CryptoError> {
        if self.kty != "RSA" {
            return Err(CryptoError::UnsupportedKeyType(self.kty.clone()));
        }
        let n = decode_field(required(&self.n, "n")?, "n")?;
        let e = decode_field(required(&self.e, "e")?, "e")?;
        RsaPublicKey::from_components(&n, &e)
            .map_err(|err| CryptoError::InvalidJwk(err.to_string()))
    }

    /// Import a P-256 public key (`kty: "EC"`, `crv: "P-256"`).
    pub fn ec_public_key(&self) -> Result<EcPublicKey, CryptoError> {
        if self.kty != "EC" {
            return Err(CryptoError::UnsupportedKeyType(self.kty.clone()));
        }
        let crv = required(&self.crv, "crv")?;
        if crv != "P-256" {
            return Err(CryptoError::InvalidJwk(format!("unsupported curve {}", crv)));
        }
        let x = pad_coordinate(decode_field(required(&self.x, "x")?, "x")?, "x")?;
        let y = pad_coordinate(decode_field(required(&self.y, "y")?, "y")?, "y")?;
        EcPublicKey::from_coordinates(&x, &y)
            .map_err(|err| CryptoError::InvalidJwk(err.to_string()))
    }

    /// Export an RSA public key as a JWK.
    pub fn from_rsa_public_key(key: &RsaPublicKey, kid: Option<&str>) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: kid.map(str::to_string),
            alg: None,
            key_use: Some("sig".to_string()),
            n: Some(base64url_encode(&key.modulus())),
            e: Some(base64url_encode(&key.exponent())),
            crv: None,
            x: None,
            y: None,
        }
    }

    /// Export a P-256 public key as a JWK.
    pub fn from_ec_public_key(key: &EcPublicKey, kid: Option<&str>) -> Result<Self, CryptoError> {
        let (x, y) = key.coordinates()?;
        Ok(Self {
            kty: "EC".to_string(),
            kid: kid.map(str::to_string),
            alg: None,
            key_use: Some("sig".to_string()),
            n: None,
            e: None,
            crv: Some("P-256".to_string()),
            x: Some(base64url_encode(&x)),
            y: Some(base64url_encode(&y)),
        })
    }

    pub fn with_alg(mut self, alg: &str) -> Self {
        self.alg = Some(alg.to_string());
        self
    }
}

/// A JWK Set document (`{"keys": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn from_json(json: &[u8]) -> Result<Self, CryptoError> {
        serde_json::from_slice(json).map_err(|e| CryptoError::InvalidJwk(e.to_string()))
    }

    /// Find a key by `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}
