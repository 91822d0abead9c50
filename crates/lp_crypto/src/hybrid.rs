//! Hybrid envelope cipher
//!
//! The symmetric cipher carries the bulk payload cheaply; the RSA
//! operation wraps only the fixed-size message key, sidestepping the RSA
//! payload-size ceiling.  One fresh key and one fresh nonce per message.
//!
//! Wire encoding: all three outputs are standard-base64 strings, which is
//! exactly what the message store persists and what clients exchange.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::aead;
use crate::error::CryptoError;
use crate::keypair;

/// The ciphertext triple stored in a message envelope.
#[derive(Debug, Clone)]
pub struct EncryptedMessage {
    /// AES-256-GCM ciphertext + tag, base64.
    pub encrypted_content: String,
    /// RSA-OAEP-wrapped message key, base64.
    pub encrypted_key: String,
    /// 96-bit AEAD nonce, base64.
    pub iv: String,
}

/// Seal `plaintext` for the holder of `recipient`'s private key.
///
/// Any primitive failure aborts before partial output exists; this
/// function never emits unencrypted or half-encrypted data.
pub fn encrypt(plaintext: &[u8], recipient: &RsaPublicKey) -> Result<EncryptedMessage, CryptoError> {
    let key = aead::generate_key();
    let nonce = aead::generate_nonce();
    let ciphertext = aead::encrypt(&key, &nonce, plaintext)?;
    let wrapped = keypair::wrap_key(recipient, &key)?;
    Ok(EncryptedMessage {
        encrypted_content: BASE64.encode(ciphertext),
        encrypted_key: BASE64.encode(wrapped),
        iv: BASE64.encode(nonce),
    })
}

/// Inverse of [`encrypt`]: unwrap the message key, then open the payload.
///
/// Tampered fields or a mismatched private key surface as
/// [`CryptoError::Decrypt`], never as altered plaintext.
pub fn decrypt(
    encrypted_content: &str,
    encrypted_key: &str,
    iv: &str,
    own_key: &RsaPrivateKey,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let ciphertext = BASE64.decode(encrypted_content)?;
    let wrapped = BASE64.decode(encrypted_key)?;
    let nonce: [u8; aead::NONCE_LEN] = BASE64
        .decode(iv)?
        .try_into()
        .map_err(|_| CryptoError::Decrypt)?;
    let key = keypair::unwrap_key(own_key, &wrapped)?;
    aead::decrypt(&key, &nonce, &ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::RsaKeyPair;
    use std::sync::OnceLock;

    fn test_pair() -> &'static RsaKeyPair {
        static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RsaKeyPair::generate_with_bits(1024).unwrap())
    }

    #[test]
    fn round_trip() {
        let pair = test_pair();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        let opened = decrypt(
            &sealed.encrypted_content,
            &sealed.encrypted_key,
            &sealed.iv,
            pair.private_key(),
        )
        .unwrap();
        assert_eq!(&opened[..], b"hello");
    }

    #[test]
    fn round_trip_large_payload() {
        let pair = test_pair();
        let payload = vec![0xA5u8; 64 * 1024];
        let sealed = encrypt(&payload, pair.public_key()).unwrap();
        let opened = decrypt(
            &sealed.encrypted_content,
            &sealed.encrypted_key,
            &sealed.iv,
            pair.private_key(),
        )
        .unwrap();
        assert_eq!(&opened[..], &payload[..]);
    }

    #[test]
    fn outputs_are_valid_base64() {
        let pair = test_pair();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        use base64::engine::general_purpose::STANDARD;
        assert_eq!(STANDARD.decode(&sealed.iv).unwrap().len(), 12);
        assert!(STANDARD.decode(&sealed.encrypted_content).is_ok());
        assert!(STANDARD.decode(&sealed.encrypted_key).is_ok());
    }

    fn flip_bit(b64: &str) -> String {
        let mut raw = BASE64.decode(b64).unwrap();
        raw[0] ^= 0x01;
        BASE64.encode(raw)
    }

    #[test]
    fn tampered_content_is_rejected() {
        let pair = test_pair();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        let tampered = flip_bit(&sealed.encrypted_content);
        assert!(matches!(
            decrypt(&tampered, &sealed.encrypted_key, &sealed.iv, pair.private_key()),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn tampered_key_is_rejected() {
        let pair = test_pair();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        let tampered = flip_bit(&sealed.encrypted_key);
        assert!(matches!(
            decrypt(&sealed.encrypted_content, &tampered, &sealed.iv, pair.private_key()),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn tampered_iv_is_rejected() {
        let pair = test_pair();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        let tampered = flip_bit(&sealed.iv);
        assert!(matches!(
            decrypt(&sealed.encrypted_content, &sealed.encrypted_key, &tampered, pair.private_key()),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn wrong_private_key_is_rejected() {
        let pair = test_pair();
        let other = RsaKeyPair::generate_with_bits(1024).unwrap();
        let sealed = encrypt(b"hello", pair.public_key()).unwrap();
        assert!(matches!(
            decrypt(
                &sealed.encrypted_content,
                &sealed.encrypted_key,
                &sealed.iv,
                other.private_key()
            ),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn malformed_base64_is_reported() {
        let pair = test_pair();
        assert!(matches!(
            decrypt("@@not-base64@@", "AAAA", "AAAA", pair.private_key()),
            Err(CryptoError::Base64Decode(_))
        ));
    }
}
