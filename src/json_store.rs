//! JSON document store.

use crate::codec::Codec;
use crate::entry::{Entry, EntryDict};
use crate::error::{MigrationError, Result, ValidationError};
use crate::migration::{self, StoreState, LATEST, V1, V3};
use crate::models::{EntryId, KeyId};
use crate::query::Matcher;
use crate::store::{MigratableStore, Reader, SchemaVersion, Store, Writer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Versioned layout used from v2 on.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_id: Option<String>,
    #[serde(default)]
    entries: Vec<EntryDict>,
}

/// A store serialized as a single JSON document.
///
/// Entries keep insertion order; putting an entry whose id already exists
/// replaces it in place. A second `init` replaces the whole state.
#[derive(Debug)]
pub struct JsonStore<C> {
    codec: C,
    state: StoreState,
}

impl<C: Codec> JsonStore<C> {
    /// An empty store at the latest schema version, keyed to the codec's key.
    pub fn new(codec: C) -> Self {
        let state = StoreState::empty(codec.key_id().clone());
        Self { codec, state }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The key entries were last migrated to, if the layout records one.
    pub fn store_key_id(&self) -> Option<&KeyId> {
        self.state.key_id.as_ref()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }
}

impl<C: Codec> Store for JsonStore<C> {
    fn init(&mut self, reader: &mut dyn Reader) -> Result<()> {
        let data = reader.read()?;
        let state = if data.iter().all(u8::is_ascii_whitespace) {
            StoreState::empty(self.codec.key_id().clone())
        } else {
            decode_state(&data)?
        };
        info!(
            version = %state.version,
            entries = state.entries.len(),
            "loaded store"
        );
        self.state = state;
        Ok(())
    }

    fn put(&mut self, entry: Entry) -> Result<()> {
        if let Some(store_key) = &self.state.key_id {
            if entry.key_id() != store_key {
                warn!(
                    id = %entry.entry_id(),
                    key_id = %entry.key_id(),
                    store_key_id = %store_key,
                    "entry is not encrypted for the store key"
                );
            }
        }

        match self
            .state
            .entries
            .iter_mut()
            .find(|existing| existing.entry_id() == entry.entry_id())
        {
            Some(existing) => {
                debug!(id = %entry.entry_id(), "replacing entry");
                *existing = entry;
            }
            None => {
                debug!(id = %entry.entry_id(), "adding entry");
                self.state.entries.push(entry);
            }
        }
        Ok(())
    }

    fn remove(&mut self, entry: &Entry) -> Result<()> {
        let before = self.state.entries.len();
        self.state
            .entries
            .retain(|existing| existing.entry_id() != entry.entry_id());
        if self.state.entries.len() == before {
            debug!(id = %entry.entry_id(), "entry to remove not found");
        }
        Ok(())
    }

    fn query(&self, query: &dyn Matcher) -> Result<Vec<Entry>> {
        Ok(self
            .state
            .entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    fn select_all(&self) -> Result<Vec<Entry>> {
        Ok(self.state.entries.clone())
    }

    fn get_count(&self) -> Result<usize> {
        Ok(self.state.entries.len())
    }

    fn get_count_of_key_id(&self, key_id: &KeyId) -> Result<usize> {
        Ok(self
            .state
            .entries
            .iter()
            .filter(|entry| entry.key_id() == key_id)
            .count())
    }

    fn sync(&self, writer: &mut dyn Writer) -> Result<()> {
        let payload = encode_state(&self.state)?;
        writer.write(&payload)?;
        info!(
            version = %self.state.version,
            entries = self.state.entries.len(),
            "synced store"
        );
        Ok(())
    }
}

impl<C: Codec> MigratableStore for JsonStore<C> {
    fn current_schema_version(&self) -> SchemaVersion {
        self.state.version
    }

    fn migrate(&mut self, target: SchemaVersion, key_id: &KeyId) -> Result<()> {
        migration::migrate(&mut self.state, target, key_id, &mut self.codec)?;
        Ok(())
    }
}

/// Parse a non-empty serialized payload in any supported layout.
///
/// A v3 envelope must name its store key.
pub fn decode_state(data: &[u8]) -> Result<StoreState> {
    match serde_json::from_slice::<Value>(data)? {
        Value::Array(items) => {
            let entries = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(dict) => Ok(dict),
                    _ => Err(ValidationError::InvalidType {
                        key: "entries",
                        expected: "a list of objects",
                    }),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(StoreState {
                version: V1,
                key_id: None,
                entries: parse_entries(&entries)?,
            })
        }
        value @ Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value)?;
            let version = SchemaVersion(envelope.schema_version);
            if version <= V1 || version > LATEST {
                return Err(MigrationError::UnsupportedVersion(version.0).into());
            }
            if version == V3 && envelope.key_id.is_none() {
                return Err(ValidationError::MissingKey { key: "key_id" }.into());
            }
            Ok(StoreState {
                version,
                key_id: envelope.key_id.map(KeyId::new).transpose()?,
                entries: parse_entries(&envelope.entries)?,
            })
        }
        _ => Err(ValidationError::InvalidType {
            key: "store",
            expected: "a JSON array or object",
        }
        .into()),
    }
}

/// Serialize `state` in the layout of its version.
pub fn encode_state(state: &StoreState) -> Result<Vec<u8>> {
    let entries: Vec<EntryDict> = state.entries.iter().map(Entry::to_dict).collect();

    let payload = if state.version == V1 {
        serde_json::to_vec_pretty(&entries)?
    } else {
        serde_json::to_vec_pretty(&Envelope {
            schema_version: state.version.0,
            key_id: state.key_id.as_ref().map(ToString::to_string),
            entries,
        })?
    };
    Ok(payload)
}

fn parse_entries(dicts: &[EntryDict]) -> Result<Vec<Entry>> {
    let mut seen: HashSet<EntryId> = HashSet::with_capacity(dicts.len());
    let mut entries = Vec::with_capacity(dicts.len());

    for dict in dicts {
        let entry = Entry::from_dict(dict)?;
        if !seen.insert(entry.entry_id().clone()) {
            return Err(ValidationError::DuplicateEntryId {
                id: entry.entry_id().to_string(),
            }
            .into());
        }
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CodecError, VaultError};
    use crate::io::MemoryBuffer;
    use crate::models::{Ciphertext, Plaintext};

    struct NullCodec(KeyId);

    impl Codec for NullCodec {
        fn key_id(&self) -> &KeyId {
            &self.0
        }

        fn rebind(&mut self, key_id: KeyId) {
            self.0 = key_id;
        }

        fn encode(&self, plaintext: &Plaintext) -> std::result::Result<Ciphertext, CodecError> {
            Ok(Ciphertext::new(plaintext.as_bytes().to_vec()))
        }

        fn decode(&self, ciphertext: &Ciphertext) -> std::result::Result<Plaintext, CodecError> {
            Plaintext::from_utf8(ciphertext.as_bytes().to_vec())
                .map_err(|e| CodecError::DecodingFailed(e.to_string()))
        }
    }

    fn store() -> JsonStore<NullCodec> {
        JsonStore::new(NullCodec(KeyId::new("KEY").unwrap()))
    }

    const V1_PAYLOAD: &str = r#"[
        {"id": "a", "key_id": "KEY", "timestamp": "2023-06-07T02:58:54Z",
         "description": "github.com", "identity": "alice", "ciphertext": "c2VjcmV0"},
        {"id": "b", "keyId": "KEY", "timestamp": "2023-06-07T02:58Z",
         "description": "gitlab.com", "ciphertext": "", "meta": null}
    ]"#;

    #[test]
    fn test_empty_payload_is_latest_version() {
        let mut store = store();
        store.init(&mut MemoryBuffer::new("  \n")).unwrap();
        assert_eq!(store.current_schema_version(), LATEST);
        assert_eq!(store.get_count().unwrap(), 0);
        assert_eq!(store.store_key_id(), Some(&KeyId::new("KEY").unwrap()));
    }

    #[test]
    fn test_fresh_store_syncs_its_key() {
        let mut store = store();
        let mut out = MemoryBuffer::default();
        store.sync(&mut out).unwrap();

        let value: Value = serde_json::from_slice(out.contents()).unwrap();
        assert_eq!(value["schema_version"], 3);
        assert_eq!(value["key_id"], "KEY");

        store.init(&mut MemoryBuffer::default()).unwrap();
        store.sync(&mut out).unwrap();
        let value: Value = serde_json::from_slice(out.contents()).unwrap();
        assert_eq!(value["key_id"], "KEY");
    }

    #[test]
    fn test_v3_envelope_requires_key() {
        assert!(matches!(
            decode_state(br#"{"schema_version": 3, "entries": []}"#),
            Err(VaultError::Validation(ValidationError::MissingKey { key: "key_id" }))
        ));
    }

    #[test]
    fn test_init_reads_v1_array() {
        let mut store = store();
        store.init(&mut MemoryBuffer::new(V1_PAYLOAD)).unwrap();
        assert_eq!(store.current_schema_version(), V1);
        assert_eq!(store.get_count().unwrap(), 2);
        assert!(store.store_key_id().is_none());
    }

    #[test]
    fn test_sync_keeps_loaded_layout() {
        let mut store = store();
        store.init(&mut MemoryBuffer::new(V1_PAYLOAD)).unwrap();

        let mut out = MemoryBuffer::default();
        store.sync(&mut out).unwrap();
        assert!(matches!(
            serde_json::from_slice::<Value>(out.contents()).unwrap(),
            Value::Array(_)
        ));

        let reloaded = decode_state(out.contents()).unwrap();
        assert_eq!(&reloaded, store.state());
    }

    #[test]
    fn test_envelope_round_trip() {
        let state = StoreState {
            version: LATEST,
            key_id: Some(KeyId::new("KEY").unwrap()),
            entries: decode_state(V1_PAYLOAD.as_bytes()).unwrap().entries,
        };
        let encoded = encode_state(&state).unwrap();
        let value: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value["schema_version"], 3);
        assert_eq!(value["key_id"], "KEY");
        assert_eq!(decode_state(&encoded).unwrap(), state);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let payload = r#"{"schema_version": 2, "entries": [
            {"id": "a", "key_id": "K", "timestamp": "2023-06-07T02:58Z", "description": "x", "ciphertext": ""},
            {"id": "a", "key_id": "K", "timestamp": "2023-06-07T02:58Z", "description": "y", "ciphertext": ""}
        ]}"#;
        let mut store = store();
        let err = store.init(&mut MemoryBuffer::new(payload)).unwrap_err();
        assert!(matches!(
            err,
            VaultError::Validation(ValidationError::DuplicateEntryId { .. })
        ));
    }

    #[test]
    fn test_failed_init_keeps_previous_state() {
        let mut store = store();
        store.init(&mut MemoryBuffer::new(V1_PAYLOAD)).unwrap();

        assert!(store.init(&mut MemoryBuffer::new("{not json")).is_err());
        assert!(store
            .init(&mut MemoryBuffer::new(r#"{"schema_version": 9, "entries": []}"#))
            .is_err());
        assert!(store.init(&mut MemoryBuffer::new("42")).is_err());

        assert_eq!(store.get_count().unwrap(), 2);
        assert_eq!(store.current_schema_version(), V1);
    }

    #[test]
    fn test_envelope_claiming_v1_is_rejected() {
        assert!(matches!(
            decode_state(br#"{"schema_version": 1, "entries": []}"#),
            Err(VaultError::Migration(MigrationError::UnsupportedVersion(1)))
        ));
    }
}
