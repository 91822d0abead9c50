//! lp_client — the device-resident half of Lockpost
//!
//! Everything here is scoped to one device acting as a single logical
//! agent: private keys and plaintext never leave it.  Server round trips
//! (key fetch, key publish, envelope submission) go through the traits in
//! [`remote`], so the HTTP layer stays an external concern and tests wire
//! the traits straight onto in-process stores.
//!
//! # Modules
//! - `key_store` — device-local private-key files (PKCS#8 PEM)
//! - `bootstrap` — first-use keypair creation with a single-flight guard
//! - `echo`      — sender-side plaintext cache for own sent messages
//! - `messenger` — encrypt-and-send, decrypt-for-rendering
//! - `remote`    — client-side views of the server collaborators
//! - `error`     — unified error type

pub mod bootstrap;
pub mod echo;
pub mod error;
pub mod key_store;
pub mod messenger;
pub mod remote;

pub use bootstrap::KeyManager;
pub use echo::EchoStore;
pub use error::ClientError;
pub use key_store::LocalKeyStore;
pub use messenger::{DecryptedMessage, MessageBody, Messenger};
pub use remote::{Directory, Mailbox};
