//! AES-256-CBC encryption with PKCS#7 padding.
//!
//! The raw primitives live here: key and IV types plus block-level
//! encrypt/decrypt. The [`crate::record`] module layers the persisted
//! envelope (fresh IV per encryption) on top.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Cipher block size in bytes. Ciphertext length is always a multiple.
pub const BLOCK_LEN: usize = 16;

/// A 256-bit AES key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Key length in bytes.
    pub const LEN: usize = 32;

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; Self::LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting any length other than 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| CryptoError::KeyLength {
            expected: Self::LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse from standard base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Encode as standard base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt with an explicit IV. Output length is the padded block count.
    pub fn encrypt_raw(&self, plaintext: &[u8], iv: &Iv) -> Vec<u8> {
        Aes256CbcEnc::new(&self.0.into(), &iv.0.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt with an explicit IV, validating PKCS#7 padding.
    pub fn decrypt_raw(&self, ciphertext: &[u8], iv: &Iv) -> Result<Vec<u8>> {
        Aes256CbcDec::new(&self.0.into(), &iv.0.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Padding)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey(..)")
    }
}

/// A 16-byte CBC initialization vector. Fresh per encryption, never reused.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Iv(pub [u8; 16]);

impl Iv {
    /// IV length in bytes.
    pub const LEN: usize = 16;

    /// Generate a new random IV.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; Self::LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parse from standard base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CryptoError::MalformedRecord(e.to_string()))?;
        let arr: [u8; Self::LEN] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedRecord(format!("iv must be 16 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Encode as standard base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl std::fmt::Debug for Iv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Iv({})", hex_prefix(&self.0))
    }
}

impl Serialize for Iv {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Iv {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Iv::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    let hexed: String = bytes.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("{}..", hexed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"hello, encrypted world!";

        let ciphertext = key.encrypt_raw(plaintext, &iv);
        assert_ne!(&ciphertext[..], &plaintext[..]);
        assert_eq!(ciphertext.len() % BLOCK_LEN, 0);

        let decrypted = key.decrypt_raw(&ciphertext, &iv).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_padding_always_added() {
        // Exactly one block of input pads to two blocks.
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let ciphertext = key.encrypt_raw(&[0u8; 16], &iv);
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn test_nist_cbc_vector() {
        // NIST SP 800-38A F.2.5, CBC-AES256 block 1.
        let key = SymmetricKey::from_slice(
            &hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
                .unwrap(),
        )
        .unwrap();
        let iv = Iv::from_bytes(
            hex::decode("000102030405060708090a0b0c0d0e0f")
                .unwrap()
                .try_into()
                .unwrap(),
        );
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = key.encrypt_raw(&plaintext, &iv);
        assert_eq!(
            hex::encode(&ciphertext[..16]),
            "f58c4c04d6e5f1ba779eabfb5f7bfbd6"
        );
    }

    #[test]
    fn test_wrong_key_fails_padding_or_differs() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"sixteen byte msg";

        let ciphertext = key1.encrypt_raw(plaintext, &iv);
        match key2.decrypt_raw(&ciphertext, &iv) {
            Err(CryptoError::Padding) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(decrypted) => assert_ne!(decrypted, plaintext),
        }
    }

    #[test]
    fn test_tampered_ciphertext_detected() {
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"immutable content";

        let mut ciphertext = key.encrypt_raw(plaintext, &iv);
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        match key.decrypt_raw(&ciphertext, &iv) {
            Err(CryptoError::Padding) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(decrypted) => assert_ne!(decrypted, plaintext),
        }
    }

    #[test]
    fn test_key_from_slice_rejects_wrong_length() {
        let err = SymmetricKey::from_slice(&[0u8; 31]).unwrap_err();
        match err {
            CryptoError::KeyLength { expected, got } => {
                assert_eq!(expected, 32);
                assert_eq!(got, 31);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(SymmetricKey::from_slice(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_key_base64_roundtrip() {
        let key = SymmetricKey::generate();
        let b64 = key.to_base64();
        let recovered = SymmetricKey::from_base64(&b64).unwrap();
        assert_eq!(key.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn test_key_base64_rejects_garbage() {
        assert!(matches!(
            SymmetricKey::from_base64("not base64!!!"),
            Err(CryptoError::KeyFormat(_))
        ));
        // Valid base64 of the wrong length is a key length error.
        assert!(matches!(
            SymmetricKey::from_base64(&BASE64.encode([0u8; 16])),
            Err(CryptoError::KeyLength { .. })
        ));
    }

    #[test]
    fn test_generated_keys_and_ivs_differ() {
        let k1 = SymmetricKey::generate();
        let k2 = SymmetricKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes());

        assert_ne!(Iv::generate(), Iv::generate());
    }

    #[test]
    fn test_iv_serde_base64_string() {
        let iv = Iv::from_bytes([7u8; 16]);
        let json = serde_json::to_string(&iv).unwrap();
        assert_eq!(json, format!("\"{}\"", iv.to_base64()));
        let back: Iv = serde_json::from_str(&json).unwrap();
        assert_eq!(iv, back);
    }
}
