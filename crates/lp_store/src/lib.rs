//! lp_store — server-resident persistence for Lockpost
//!
//! # What the server can and cannot see
//! Envelope rows carry routing metadata in the clear (sender, receiver,
//! timestamps, read state) so the usual queries stay efficient, while the
//! three ciphertext columns are opaque base64: the relay can route and
//! persist messages without ever holding the means to decrypt them.
//! There is no at-rest re-encryption layer here because the payloads
//! arrive already sealed end-to-end.
//!
//! # Identity boundary
//! Every operation takes the verified caller id asserted by the external
//! authentication service.  This crate performs no identity verification
//! of its own and trusts that assertion completely.
//!
//! # Components
//! - `messages`  — opaque-envelope store + conversation index queries
//! - `directory` — per-user public-key directory (a minimal PKI)
//! - `db`        — pool construction and sqlx migrations
//!
//! Both components are constructed over an injected [`sqlx::SqlitePool`];
//! there is no global state, so tests substitute throwaway databases.

pub mod db;
pub mod directory;
pub mod error;
pub mod messages;
pub mod models;

pub use db::open;
pub use directory::KeyDirectory;
pub use error::StoreError;
pub use messages::MessageStore;
