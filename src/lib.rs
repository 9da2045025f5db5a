//! tartarus: an encrypted credential store.
//!
//! Entries hold a description, an optional identity and notes, and a secret
//! encrypted by a [`Codec`]. Stores persist entries through a [`Store`] and
//! upgrade older layouts through [`MigratableStore`].

pub mod cli;
pub mod codec;
pub mod config;
pub mod entry;
pub mod error;
pub mod gpg;
pub mod io;
pub mod json_store;
pub mod migration;
pub mod models;
pub mod query;
pub mod store;
pub mod timestamp;
pub mod utils;

// Re-export commonly used types
pub use codec::Codec;
pub use entry::{Entry, EntryDict};
pub use error::{Result, VaultError};
pub use json_store::JsonStore;
pub use models::{Ciphertext, Description, EntryId, Identity, KeyId, Metadata, Plaintext};
pub use query::{Matcher, PatternQuery, Query};
pub use store::{MigratableStore, Reader, SchemaVersion, Store, Writer};
