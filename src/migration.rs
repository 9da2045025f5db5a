//! Schema migrations.
//!
//! | Version | Layout |
//! |---------|--------|
//! | v1 | bare JSON array of entries |
//! | v2 | `{"schema_version": 2, "entries": [...]}` |
//! | v3 | v2 plus a store `key_id`; every entry re-encrypted for that key |
//!
//! Each step moves a state exactly one version forward and builds a new state
//! rather than editing the old one, so a failed step leaves its input untouched.

use crate::codec::Codec;
use crate::entry::Entry;
use crate::error::{CodecError, MigrationError};
use crate::models::KeyId;
use crate::store::SchemaVersion;
use tracing::{debug, info};

pub const V1: SchemaVersion = SchemaVersion(1);
pub const V2: SchemaVersion = SchemaVersion(2);
pub const V3: SchemaVersion = SchemaVersion(3);

/// The version new stores are created at.
pub const LATEST: SchemaVersion = V3;

/// Everything a store holds, independent of how it is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState {
    pub version: SchemaVersion,
    /// Key the entries were last re-encrypted for. Only present from v3 on.
    pub key_id: Option<KeyId>,
    pub entries: Vec<Entry>,
}

impl StoreState {
    /// An empty state at the latest version, keyed to `key_id`.
    pub fn empty(key_id: KeyId) -> Self {
        Self {
            version: LATEST,
            key_id: Some(key_id),
            entries: Vec::new(),
        }
    }
}

/// Short description of the step leaving `from`.
pub fn describe(from: SchemaVersion) -> &'static str {
    match from {
        V1 => "wrap entries in a versioned envelope",
        V2 => "re-encrypt entries for the store key",
        _ => "unknown step",
    }
}

/// Apply the single step leaving `state.version`.
///
/// The codec is rebound to `key_id` by steps that re-encrypt. If such a step
/// fails, the codec's previous key is restored.
pub fn step<C: Codec>(
    state: &StoreState,
    key_id: &KeyId,
    codec: &mut C,
) -> Result<StoreState, MigrationError> {
    let next = match state.version {
        V1 => wrap_in_envelope(state),
        V2 => reencrypt(state, key_id, codec)?,
        other => return Err(MigrationError::UnsupportedVersion(other.0)),
    };

    info!(
        from = %state.version,
        to = %next.version,
        entries = next.entries.len(),
        "migrated store: {}",
        describe(state.version)
    );
    Ok(next)
}

/// Apply consecutive steps until `target` is reached.
///
/// Each successful step replaces `state`, so on failure `state` holds the
/// last version that was fully reached.
pub fn migrate<C: Codec>(
    state: &mut StoreState,
    target: SchemaVersion,
    key_id: &KeyId,
    codec: &mut C,
) -> Result<(), MigrationError> {
    check_target(state.version, target)?;

    while state.version < target {
        *state = step(state, key_id, codec)?;
    }
    Ok(())
}

/// Reject targets that are unknown or older than `current`.
pub fn check_target(current: SchemaVersion, target: SchemaVersion) -> Result<(), MigrationError> {
    if target > LATEST || target < V1 {
        return Err(MigrationError::UnsupportedVersion(target.0));
    }
    if target < current {
        return Err(MigrationError::Downgrade {
            from: current.0,
            to: target.0,
        });
    }
    Ok(())
}

fn wrap_in_envelope(state: &StoreState) -> StoreState {
    StoreState {
        version: state.version.next(),
        key_id: None,
        entries: state.entries.clone(),
    }
}

fn reencrypt<C: Codec>(
    state: &StoreState,
    key_id: &KeyId,
    codec: &mut C,
) -> Result<StoreState, MigrationError> {
    let previous = codec.key_id().clone();
    codec.rebind(key_id.clone());

    let result: Result<Vec<Entry>, CodecError> = state
        .entries
        .iter()
        .map(|entry| {
            if entry.key_id() == key_id {
                return Ok(entry.clone());
            }
            debug!(id = %entry.entry_id(), from = %entry.key_id(), "re-encrypting entry");
            let plaintext = codec.decode(entry.ciphertext())?;
            let ciphertext = codec.encode(&plaintext)?;
            Ok(entry.reencrypted(key_id.clone(), ciphertext))
        })
        .collect();

    match result {
        Ok(entries) => Ok(StoreState {
            version: state.version.next(),
            key_id: Some(key_id.clone()),
            entries,
        }),
        Err(e) => {
            codec.rebind(previous);
            Err(MigrationError::StepFailed {
                from: state.version.0,
                to: state.version.next().0,
                reason: e.to_string(),
            })
        }
    }
}
