//! Key derivation and blob decryption.
//!
//! Install blobs are AES-256-CBC ciphertext keyed to the machine that wrote
//! them. The key is SHA-256 of the host's identity string; the IV is the
//! first 16 bytes of SHA-256 of a fixed label, so both sides derive it
//! without storing anything. The file starts with a 64-byte integrity
//! header that is not part of the ciphertext.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use sha2::{Digest, Sha256};
use thiserror::Error;

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Bytes of integrity header preceding the ciphertext.
pub const CIPHERTEXT_OFFSET: usize = 64;

/// Label the fixed IV is derived from.
const IV_LABEL: &[u8] = b"allUsersGenericIdIS";

/// Decryption failures.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The file is smaller than its integrity header.
    #[error("blob is {len} bytes, smaller than the {CIPHERTEXT_OFFSET}-byte header")]
    TooShort {
        /// Actual file length.
        len: usize,
    },

    /// The ciphertext did not decrypt to validly padded plaintext. The
    /// usual cause is a key derived on a different machine.
    #[error("decryption failed (wrong key material for this host?)")]
    BadCiphertext,

    /// The plaintext is not UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    NotUtf8,
}

/// Derive the AES-256 key from a host identity string.
pub fn derive_key(identity: &str) -> [u8; 32] {
    Sha256::digest(identity.as_bytes()).into()
}

/// Derive the fixed IV.
pub fn derive_iv() -> [u8; 16] {
    let digest = Sha256::digest(IV_LABEL);
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&digest[..16]);
    iv
}

/// Decrypt a blob file's contents to plaintext.
pub fn decrypt(raw: &[u8], key: &[u8; 32]) -> Result<String, CryptoError> {
    if raw.len() < CIPHERTEXT_OFFSET {
        return Err(CryptoError::TooShort { len: raw.len() });
    }

    let iv = derive_iv();
    let plaintext = Aes256CbcDec::new(key.into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&raw[CIPHERTEXT_OFFSET..])
        .map_err(|_| CryptoError::BadCiphertext)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
}
