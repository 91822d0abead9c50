//! Authenticated Encryption with Associated Data
//!
//! AES-256-GCM.  Key: 32 bytes.  Nonce: 12 bytes (random).  Tag: 16 bytes,
//! appended to the ciphertext.
//!
//! The nonce is NOT prepended here: it travels as the separate `iv` field
//! of the message envelope, so callers hold it alongside the ciphertext.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Symmetric key length (AES-256).
pub const KEY_LEN: usize = 32;
/// Nonce length (96 bits, the GCM-recommended size).
pub const NONCE_LEN: usize = 12;
/// Length of the GCM tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 256-bit message key.  Zeroized on drop.
pub fn generate_key() -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    Zeroizing::new(key)
}

/// Generate a fresh random 96-bit nonce.  Must be unique per key; every
/// message gets a fresh key here, so collision is a non-issue.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext` under a 32-byte key and a 12-byte nonce.
/// Returns ciphertext with the 16-byte tag appended.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::Encrypt)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::Encrypt)
}

/// Decrypt ciphertext+tag.  A tag mismatch (tampered data or a wrong key)
/// surfaces as [`CryptoError::Decrypt`], never as corrupted plaintext.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::Decrypt);
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::Decrypt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decrypt)?;
    Ok(Zeroizing::new(plaintext))
}
