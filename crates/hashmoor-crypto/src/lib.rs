//! # Hashmoor Crypto
//!
//! Symmetric encryption, key wrapping, and record sealing.
//!
//! ## Overview
//!
//! Payloads are encrypted under a fresh AES-256-CBC key with a random IV
//! per encryption. The symmetric key either travels raw (dev mode) or is
//! wrapped under RSA-OAEP for a recipient.
//!
//! ## Key Concepts
//!
//! - **SymmetricKey / Iv**: AES-256-CBC material, zeroized on drop
//! - **EncryptedRecord**: IV + ciphertext, the on-disk `.enc` body
//! - **RsaKeyPair / WrappedKey**: OAEP-SHA256 key wrapping, PEM keys
//! - **KeyBundle**: the `.key` file body, raw or wrapped
//! - **RecordBuilder**: hash, encrypt, and wrap in one pass
//!
//! ## Encryption Model
//!
//! Content is encrypted once under a symmetric key; only the key is
//! re-wrapped per recipient. Ciphertext never embeds key material, so a
//! record and its key bundle can be stored and transmitted separately.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hashmoor_core::Payload;
//! use hashmoor_crypto::{KeyWrap, RecordBuilder};
//!
//! let payload = Payload::classify(br#"{"lat": 40.0, "lon": -73.0}"#.to_vec());
//! let sealed = RecordBuilder::new("tracks.json")
//!     .wrap(KeyWrap::Generated)
//!     .seal(&payload)
//!     .unwrap();
//!
//! let key = sealed.keys.symmetric_key().unwrap();
//! let recovered = sealed.record.decrypt_payload(&key).unwrap();
//! assert_eq!(recovered, payload);
//! ```

pub mod builder;
pub mod cipher;
pub mod error;
pub mod keyfile;
pub mod record;
pub mod wrap;

pub use builder::{KeyWrap, RecordBuilder, SealedRecord};
pub use cipher::{Iv, SymmetricKey, BLOCK_LEN};
pub use error::{CryptoError, Result};
pub use keyfile::{KeyBundle, WrappedKeyEnvelope};
pub use record::EncryptedRecord;
pub use wrap::{
    unwrap_key_pem, wrap_key_pem, RsaKeyPair, WrappedKey, MIN_MODULUS_BITS,
};
