//! lp_crypto — Lockpost cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize secret material on drop.
//! - The relay never holds the means to decrypt: payloads are sealed under
//!   a fresh symmetric key that only the recipient can unwrap.
//!
//! # Module layout
//! - `keypair` — long-term RSA pair, JWK codec, PKCS#8 PEM, OAEP key wrap
//! - `aead`    — AES-256-GCM payload encryption
//! - `hybrid`  — the envelope cipher combining the two
//! - `error`   — unified error type

pub mod aead;
pub mod error;
pub mod hybrid;
pub mod keypair;

pub use error::CryptoError;
pub use hybrid::EncryptedMessage;
pub use keypair::{PublicKeyJwk, RsaKeyPair};
