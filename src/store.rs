//! Store interfaces.
//!
//! A store owns an in-memory collection of entries. It is loaded once from a
//! [`Reader`], mutated with `put`/`remove`, and written back in full to a
//! [`Writer`] by `sync`. Stores provide no internal locking: a host that shares
//! one between threads must serialize every call.

use crate::entry::Entry;
use crate::error::Result;
use crate::models::KeyId;
use crate::query::Matcher;
use std::fmt;

/// Supplies the raw serialized state of a store.
pub trait Reader {
    fn read(&mut self) -> Result<Vec<u8>>;
}

/// Receives the full serialized state of a store in a single call.
pub trait Writer {
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

/// Persistence capability over a collection of entries.
pub trait Store {
    /// Replace the in-memory state with the entries read from `reader`.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, malformed payloads, invalid entries, or duplicate
    /// entry ids. On failure the previous state is kept.
    fn init(&mut self, reader: &mut dyn Reader) -> Result<()>;

    /// Insert `entry`, replacing any entry with the same id.
    fn put(&mut self, entry: Entry) -> Result<()>;

    /// Remove the entry with the same id as `entry`. Missing entries are ignored.
    fn remove(&mut self, entry: &Entry) -> Result<()>;

    /// All entries accepted by `query`, in store order.
    fn query(&self, query: &dyn Matcher) -> Result<Vec<Entry>>;

    /// All entries, in store order.
    fn select_all(&self) -> Result<Vec<Entry>>;

    fn get_count(&self) -> Result<usize>;

    fn get_count_of_key_id(&self, key_id: &KeyId) -> Result<usize>;

    /// Serialize the complete state and hand it to `writer` in one call.
    ///
    /// # Errors
    ///
    /// Serialization happens before `writer` is invoked, so a failure never
    /// leaves the writer holding a partial payload.
    fn sync(&self, writer: &mut dyn Writer) -> Result<()>;
}

/// Version tag of a store's serialized layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A store whose serialized layout can be advanced to newer schema versions.
pub trait MigratableStore: Store {
    fn current_schema_version(&self) -> SchemaVersion;

    /// Advance the state to `target`, one version at a time.
    ///
    /// Steps that re-encrypt entries produce ciphertexts for `key_id`. Each
    /// step either completes, leaving the store at the next version, or fails
    /// leaving the store exactly as the previous step left it.
    fn migrate(&mut self, target: SchemaVersion, key_id: &KeyId) -> Result<()>;
}
