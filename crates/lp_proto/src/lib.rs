//! lp_proto — Wire types shared between Lockpost clients and services
//!
//! All on-wire types are serialised to JSON.  The envelope is what the
//! relay stores; the api module holds the request/response bodies.
//!
//! # Modules
//! - `envelope` — the opaque stored message unit
//! - `api`      — request/response types shared between clients and services

pub mod api;
pub mod envelope;

pub use api::{ConversationSummary, PublicKeyRecord, SendMessageRequest, SendReceipt};
pub use envelope::{MessageEnvelope, MessageId, UserId};
