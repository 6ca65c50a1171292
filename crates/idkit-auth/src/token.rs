//! Compact signed token (JWS compact serialization) parsing.
//!
//! Format: `base64url(header).base64url(payload).base64url(signature)`.
//! Segments keep their original text; the signed input is rebuilt from that
//! text, never from re-encoded JSON.

use std::fmt;
use std::str::FromStr;

use idkit_crypto::{base64url_decode, SignedData};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AuthError;

macro_rules! raw_segment {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            raw: String,
        }

        impl $name {
            /// The segment's base64url text as it appeared in the token.
            pub fn raw(&self) -> &str {
                &self.raw
            }
        }
    };
}

raw_segment!(
    /// First segment: the JOSE header.
    HeaderSegment
);
raw_segment!(
    /// Second segment: the claims payload.
    PayloadSegment
);
raw_segment!(
    /// Third segment: the signature over `header.payload`.
    SignatureSegment
);

fn decode_json<T: DeserializeOwned>(raw: &str, segment: &'static str) -> Result<T, AuthError> {
    let bytes = base64url_decode(raw).map_err(|e| AuthError::Base64Decode {
        segment,
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|source| AuthError::Json { segment, source })
}

impl HeaderSegment {
    pub fn decode(&self) -> Result<JoseHeader, AuthError> {
        decode_json(&self.raw, "header")
    }
}

impl PayloadSegment {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        decode_json(&self.raw, "payload")
    }
}

impl SignatureSegment {
    pub fn decode(&self) -> Result<SignedData, AuthError> {
        base64url_decode(&self.raw)
            .map(SignedData::new)
            .map_err(|e| AuthError::Base64Decode {
                segment: "signature",
                reason: e.to_string(),
            })
    }
}

/// A token split into its three raw segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactToken {
    header: HeaderSegment,
    payload: PayloadSegment,
    signature: SignatureSegment,
}

impl CompactToken {
    /// Parse UTF-8 token bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, AuthError> {
        let text = std::str::from_utf8(bytes).map_err(|e| AuthError::Encoding(e.to_string()))?;
        text.parse()
    }

    pub fn header_segment(&self) -> &HeaderSegment {
        &self.header
    }

    pub fn payload_segment(&self) -> &PayloadSegment {
        &self.payload
    }

    pub fn signature_segment(&self) -> &SignatureSegment {
        &self.signature
    }

    /// The signed input: `header.payload`, verbatim from the source text.
    pub fn plain_segment(&self) -> String {
        format!("{}.{}", self.header.raw, self.payload.raw)
    }

    pub fn header(&self) -> Result<JoseHeader, AuthError> {
        self.header.decode()
    }

    pub fn claims(&self) -> Result<IdTokenClaims, AuthError> {
        self.payload.decode()
    }

    pub fn signature_bytes(&self) -> Result<SignedData, AuthError> {
        self.signature.decode()
    }
}

impl FromStr for CompactToken {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::MalformedToken {
                token: s.to_string(),
                segments: parts.len(),
            });
        }

        Ok(Self {
            header: HeaderSegment {
                raw: parts[0].to_string(),
            },
            payload: PayloadSegment {
                raw: parts[1].to_string(),
            },
            signature: SignatureSegment {
                raw: parts[2].to_string(),
            },
        })
    }
}

impl fmt::Display for CompactToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.header.raw, self.payload.raw, self.signature.raw
        )
    }
}

/// Decoded JOSE header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoseHeader {
    pub alg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// The `aud` claim: a single client ID or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == client_id,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::Single(aud) => f.write_str(aud),
            Audience::Multiple(auds) => write!(f, "[{}]", auds.join(", ")),
        }
    }
}

/// A JSON NumericDate: integer or fractional seconds since the Unix epoch.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Whole(i64),
    Fractional(f64),
}

impl NumericDate {
    /// Whole seconds, fractions rounded toward the past.
    fn seconds(self) -> i64 {
        match self {
            NumericDate::Whole(secs) => secs,
            NumericDate::Fractional(secs) => secs.floor() as i64,
        }
    }
}

fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    NumericDate::deserialize(deserializer).map(NumericDate::seconds)
}

fn optional_numeric_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<NumericDate>::deserialize(deserializer).map(|date| date.map(NumericDate::seconds))
}

/// OpenID Connect ID token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    /// Expiry, seconds since the Unix epoch
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,
    /// Issued-at, seconds since the Unix epoch
    #[serde(deserialize_with = "numeric_date")]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use idkit_crypto::{base64url_encode, CryptoData};

    #[test]
    fn parses_three_segments() {
        let token = CompactToken::parse(b"a.b.c").unwrap();
        assert_eq!(token.header_segment().raw(), "a");
        assert_eq!(token.payload_segment().raw(), "b");
        assert_eq!(token.signature_segment().raw(), "c");
    }

    #[test]
    fn rejects_two_segments() {
        let err = CompactToken::parse(b"a.b").unwrap_err();
        match err {
            AuthError::MalformedToken { token, segments } => {
                assert_eq!(token, "a.b");
                assert_eq!(segments, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_four_segments() {
        let err = CompactToken::parse(b"a.b.c.d").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken { segments: 4, .. }));
    }

    #[test]
    fn malformed_token_message_omits_token_text() {
        let err = CompactToken::parse(b"eyJhbGciOiJSU0EtT0FFUCJ9.key.iv.ct.tag").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("got 5"));
        assert!(!message.contains("eyJhbGciOiJSU0EtT0FFUCJ9"));
    }

    #[test]
    fn rejects_single_segment_and_empty_input() {
        assert!(matches!(
            CompactToken::parse(b"abc"),
            Err(AuthError::MalformedToken { segments: 1, .. })
        ));
        assert!(matches!(
            CompactToken::parse(b""),
            Err(AuthError::MalformedToken { segments: 1, .. })
        ));
    }

    #[test]
    fn rejects_non_utf8() {
        let err = CompactToken::parse(&[0x61, 0x2e, 0xff, 0x2e, 0x63]).unwrap_err();
        assert!(matches!(err, AuthError::Encoding(_)));
    }

    #[test]
    fn plain_segment_is_verbatim() {
        let token: CompactToken = "hdr.pld.sig".parse().unwrap();
        assert_eq!(token.plain_segment(), "hdr.pld");
    }

    #[test]
    fn empty_segments_are_kept() {
        let token: CompactToken = "..".parse().unwrap();
        assert_eq!(token.plain_segment(), ".");
        assert_eq!(token.signature_segment().raw(), "");
    }

    #[test]
    fn display_reproduces_source() {
        let text = "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln";
        let token: CompactToken = text.parse().unwrap();
        assert_eq!(token.to_string(), text);
    }

    #[test]
    fn decodes_header_and_claims() {
        let header = base64url_encode(br#"{"alg":"ES256","kid":"k1","typ":"JWT"}"#);
        let payload = base64url_encode(
            br#"{"iss":"https://idp.example","sub":"U1","aud":["c1","c2"],"exp":200,"iat":100,"nonce":"n","name":"Ann","extra":true}"#,
        );
        let token: CompactToken = format!("{}.{}.{}", header, payload, base64url_encode(b"sig"))
            .parse()
            .unwrap();

        let header = token.header().unwrap();
        assert_eq!(header.alg, "ES256");
        assert_eq!(header.kid.as_deref(), Some("k1"));

        let claims = token.claims().unwrap();
        assert_eq!(claims.iss, "https://idp.example");
        assert!(claims.aud.contains("c2"));
        assert!(!claims.aud.contains("c3"));
        assert_eq!(claims.nonce.as_deref(), Some("n"));
        assert_eq!(claims.email, None);

        assert_eq!(token.signature_bytes().unwrap().raw(), b"sig");
    }

    #[test]
    fn single_audience_string() {
        let claims: IdTokenClaims = serde_json::from_str(
            r#"{"iss":"i","sub":"s","aud":"client","exp":2,"iat":1}"#,
        )
        .unwrap();
        assert_eq!(claims.aud, Audience::Single("client".to_string()));
        assert_eq!(claims.aud.to_string(), "client");
    }

    #[test]
    fn fractional_dates_round_toward_the_past() {
        let claims: IdTokenClaims = serde_json::from_str(
            r#"{"iss":"i","sub":"s","aud":"c","exp":1700000300.5,"iat":1699999999.9,"auth_time":1699999000.25}"#,
        )
        .unwrap();
        assert_eq!(claims.exp, 1_700_000_300);
        assert_eq!(claims.iat, 1_699_999_999);
        assert_eq!(claims.auth_time, Some(1_699_999_000));
    }

    #[test]
    fn non_numeric_dates_rejected() {
        let result: Result<IdTokenClaims, _> = serde_json::from_str(
            r#"{"iss":"i","sub":"s","aud":"c","exp":"soon","iat":1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn header_decode_errors_name_the_segment() {
        let token: CompactToken = "!!!.e30.c2ln".parse().unwrap();
        let err = token.header().unwrap_err();
        assert!(matches!(err, AuthError::Base64Decode { segment: "header", .. }));

        let token: CompactToken = format!("{}.e30.c2ln", base64url_encode(b"not json"))
            .parse()
            .unwrap();
        assert!(matches!(
            token.header(),
            Err(AuthError::Json { segment: "header", .. })
        ));
    }

    #[test]
    fn claims_require_standard_fields() {
        // "{}" has no iss/sub/aud/exp/iat
        let token: CompactToken = "e30.e30.c2ln".parse().unwrap();
        assert!(matches!(
            token.claims(),
            Err(AuthError::Json { segment: "payload", .. })
        ));
    }
}
