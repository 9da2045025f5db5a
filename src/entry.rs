//! The entry record and its dictionary representation.

use crate::error::ValidationError;
use crate::models::{Ciphertext, Description, EntryId, Identity, KeyId, Metadata};
use crate::timestamp::{format_timestamp, now, parse_timestamp, truncate_to_micros};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};

/// An entry in its serialized, string-keyed form.
pub type EntryDict = Map<String, Value>;

/// One field of the serialized entry layout.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
}

/// The serialized entry layout, in the order required keys are checked.
pub const FIELDS: [Field; 7] = [
    Field { name: "id", required: true },
    Field { name: "key_id", required: true },
    Field { name: "timestamp", required: true },
    Field { name: "description", required: true },
    Field { name: "ciphertext", required: true },
    Field { name: "identity", required: false },
    Field { name: "meta", required: false },
];

lazy_static! {
    static ref WORD_BOUNDARY: Regex = Regex::new(r"([a-zA-Z])([A-Z][a-z]+)").unwrap();
    static ref CASE_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
}

/// A record holding an encrypted value along with what it is for.
///
/// Entries are values: they compare equal when every field is equal, and an
/// update is modeled as removing the old entry and putting a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    entry_id: EntryId,
    key_id: KeyId,
    timestamp: DateTime<Utc>,
    description: Description,
    identity: Option<Identity>,
    ciphertext: Ciphertext,
    meta: Option<Metadata>,
}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry_id.hash(state);
    }
}

impl Entry {
    /// Assemble an entry. The timestamp is truncated to microsecond precision.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry_id: EntryId,
        key_id: KeyId,
        timestamp: DateTime<Utc>,
        description: Description,
        identity: Option<Identity>,
        ciphertext: Ciphertext,
        meta: Option<Metadata>,
    ) -> Self {
        Self {
            entry_id,
            key_id,
            timestamp: truncate_to_micros(timestamp),
            description,
            identity,
            ciphertext,
            meta,
        }
    }

    /// Create a new entry with a fresh id, stamped with the current time.
    pub fn create(
        key_id: KeyId,
        description: Description,
        identity: Option<Identity>,
        ciphertext: Ciphertext,
        meta: Option<Metadata>,
    ) -> Self {
        Self::new(
            EntryId::generate(),
            key_id,
            now(),
            description,
            identity,
            ciphertext,
            meta,
        )
    }

    /// A copy of this entry holding a ciphertext produced under another key.
    pub fn reencrypted(&self, key_id: KeyId, ciphertext: Ciphertext) -> Self {
        Self {
            key_id,
            ciphertext,
            ..self.clone()
        }
    }

    pub fn entry_id(&self) -> &EntryId {
        &self.entry_id
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    pub fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }

    /// Build an entry from its dictionary form.
    ///
    /// Keys are normalized to snake_case first, so `keyId` is read as `key_id`.
    /// Every required key must be present before any value is validated.
    /// Empty `identity` or `meta` values are treated as absent.
    pub fn from_dict(data: &EntryDict) -> Result<Self, ValidationError> {
        let data = keys_to_snake_case(data);

        if let Some(field) = FIELDS
            .iter()
            .find(|field| field.required && !data.contains_key(field.name))
        {
            return Err(ValidationError::MissingKey { key: field.name });
        }

        let timestamp_str = required_str(&data, "timestamp")?;
        let timestamp = parse_timestamp(timestamp_str).map_err(|source| {
            ValidationError::InvalidTimestamp {
                value: timestamp_str.to_string(),
                source,
            }
        })?;

        let ciphertext = Ciphertext::from_base64(required_str(&data, "ciphertext")?)?;

        Ok(Self::new(
            EntryId::new(required_str(&data, "id")?)?,
            KeyId::new(required_str(&data, "key_id")?)?,
            timestamp,
            Description::new(required_str(&data, "description")?)?,
            optional_str(&data, "identity")?.map(Identity::new).transpose()?,
            ciphertext,
            optional_str(&data, "meta")?.map(Metadata::new).transpose()?,
        ))
    }

    /// The dictionary form of this entry. Every field is present; absent
    /// optional fields are written as null.
    pub fn to_dict(&self) -> EntryDict {
        let mut data = EntryDict::new();
        data.insert("id".into(), self.entry_id.as_str().into());
        data.insert("key_id".into(), self.key_id.as_str().into());
        data.insert("timestamp".into(), format_timestamp(&self.timestamp).into());
        data.insert("description".into(), self.description.as_str().into());
        data.insert(
            "identity".into(),
            self.identity.as_ref().map(Identity::as_str).into(),
        );
        data.insert("ciphertext".into(), self.ciphertext.to_base64().into());
        data.insert("meta".into(), self.meta.as_ref().map(Metadata::as_str).into());
        data
    }
}

fn required_str<'a>(data: &'a EntryDict, key: &'static str) -> Result<&'a str, ValidationError> {
    match data.get(key) {
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(ValidationError::InvalidType {
            key,
            expected: "a string",
        }),
        None => Err(ValidationError::MissingKey { key }),
    }
}

fn optional_str<'a>(
    data: &'a EntryDict,
    key: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(ValidationError::InvalidType {
            key,
            expected: "a string or null",
        }),
    }
}

/// Convert a CamelCase or camelCase name to snake_case. snake_case input is unchanged.
pub fn convert_to_snake(name: &str) -> String {
    let underscored = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    CASE_BOUNDARY
        .replace_all(&underscored, "${1}_${2}")
        .to_lowercase()
}

/// Copy of `data` with every key converted to snake_case.
pub fn keys_to_snake_case(data: &EntryDict) -> EntryDict {
    data.iter()
        .map(|(key, value)| (convert_to_snake(key), value.clone()))
        .collect()
}
