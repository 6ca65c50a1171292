//! Tagged byte buffers passed to and returned from the engines.
//!
//! The three wrappers hold the same kind of bytes but are not convertible
//! into each other; only the engines turn one into another.

use crate::algorithm::Algorithm;

/// Capabilities shared by every buffer kind.
pub trait CryptoData {
    fn raw(&self) -> &[u8];

    fn digest<A: Algorithm>(&self, algorithm: A) -> Vec<u8> {
        algorithm.digest(self.raw())
    }
}

macro_rules! tagged_buffer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            raw: Vec<u8>,
        }

        impl $name {
            pub fn new(raw: impl Into<Vec<u8>>) -> Self {
                Self { raw: raw.into() }
            }

            pub fn into_raw(self) -> Vec<u8> {
                self.raw
            }

            pub fn len(&self) -> usize {
                self.raw.len()
            }

            pub fn is_empty(&self) -> bool {
                self.raw.is_empty()
            }
        }

        impl CryptoData for $name {
            fn raw(&self) -> &[u8] {
                &self.raw
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("len", &self.raw.len())
                    .finish()
            }
        }
    };
}

tagged_buffer!(
    /// Message bytes: the input to encrypt and sign, the output of decrypt.
    PlainData
);
tagged_buffer!(
    /// Ciphertext produced by an encryption engine.
    EncryptedData
);
tagged_buffer!(
    /// Signature bytes produced by a signing engine or received with a token.
    SignedData
);

impl PlainData {
    /// Plain data over the UTF-8 bytes of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{EcdsaAlgorithm, RsaAlgorithm};

    #[test]
    fn digest_uses_raw_bytes() {
        let plain = PlainData::from_text("abc");
        assert_eq!(
            hex::encode(plain.digest(RsaAlgorithm::Sha256)),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(plain.digest(EcdsaAlgorithm::Sha384).len(), 48);
    }

    #[test]
    fn buffers_keep_bytes_verbatim() {
        let signed = SignedData::new(vec![1, 2, 3]);
        assert_eq!(signed.raw(), &[1, 2, 3]);
        assert_eq!(signed.len(), 3);
        assert_eq!(signed.into_raw(), vec![1, 2, 3]);
        assert!(EncryptedData::new(Vec::new()).is_empty());
    }

    #[test]
    fn debug_does_not_print_contents() {
        let plain = PlainData::from_text("secret");
        let printed = format!("{:?}", plain);
        assert_eq!(printed, "PlainData { len: 6 }");
    }
}
