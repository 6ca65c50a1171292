use base64ct::{Base64, Base64UrlUnpadded, Encoding};

use crate::error::CryptoError;

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string to bytes.
///
/// The input is re-padded to a multiple of four and mapped back onto the
/// standard alphabet before decoding, so both padded and unpadded forms
/// are accepted.
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    if s.len() % 4 == 1 {
        return Err(CryptoError::Base64Decode(format!(
            "invalid base64url length {}",
            s.len()
        )));
    }

    let mut standard: String = s
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    Base64::decode_vec(&standard).map_err(|e| CryptoError::Base64Decode(format!("{}: {}", e, s)))
}
