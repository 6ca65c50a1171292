//! Client-side OpenID Connect primitives.
//!
//! This crate provides:
//! - Compact token (JWS) parsing with verbatim signed input
//! - ID token verification against a JWK Set (RS256/384/512, ES256)
//! - PKCE (RFC 7636) verifier and S256 challenge generation
//! - OAuth `state` generation
//!
//! Network plumbing (discovery, JWKS fetching, token exchange) stays with the caller.

mod error;
mod pkce;
mod token;
mod verifier;

pub use error::AuthError;
pub use pkce::{
    compute_code_challenge, generate_state, generate_verifier, EntropySource, Pkce,
    CODE_CHALLENGE_METHOD, VERIFIER_LEN,
};
pub use token::{
    Audience, CompactToken, HeaderSegment, IdTokenClaims, JoseHeader, PayloadSegment,
    SignatureSegment,
};
pub use verifier::{IdTokenVerifier, JwsAlgorithm, VerifyOptions, DEFAULT_LEEWAY_SECS};
