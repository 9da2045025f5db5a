//! Filters over entries.

use crate::entry::Entry;
use crate::error::ValidationError;
use crate::models::{Description, EntryId, Identity, Metadata};
use regex::Regex;

/// Decides whether an entry belongs to a result set.
///
/// `Store::query` accepts any matcher, so richer filters can be added
/// without touching store backends.
pub trait Matcher {
    fn matches(&self, entry: &Entry) -> bool;
}

/// Exact-match filter. Each present field narrows the result; an empty
/// query matches every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    entry_id: Option<EntryId>,
    description: Option<Description>,
    identity: Option<Identity>,
    meta: Option<Metadata>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match on description and, if given, identity.
    pub fn lookup(description: Description, identity: Option<Identity>) -> Self {
        Self {
            description: Some(description),
            identity,
            ..Self::default()
        }
    }

    pub fn with_entry_id(mut self, entry_id: EntryId) -> Self {
        self.entry_id = Some(entry_id);
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn entry_id(&self) -> Option<&EntryId> {
        self.entry_id.as_ref()
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }
}

impl Matcher for Query {
    fn matches(&self, entry: &Entry) -> bool {
        self.entry_id
            .as_ref()
            .map_or(true, |id| id == entry.entry_id())
            && self
                .description
                .as_ref()
                .map_or(true, |description| description == entry.description())
            && self
                .identity
                .as_ref()
                .map_or(true, |identity| entry.identity() == Some(identity))
            && self
                .meta
                .as_ref()
                .map_or(true, |meta| entry.meta() == Some(meta))
    }
}

/// Regex filter over the free-form fields. Entry ids still match exactly.
/// A pattern on an optional field never matches an entry lacking that field.
#[derive(Debug, Clone, Default)]
pub struct PatternQuery {
    entry_id: Option<EntryId>,
    description: Option<Regex>,
    identity: Option<Regex>,
    meta: Option<Regex>,
}

impl PatternQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match descriptions containing `text` literally, ignoring case.
    pub fn containing(text: &str) -> Self {
        let pattern = format!("(?i){}", regex::escape(text));
        Self {
            // An escaped literal always compiles.
            description: Regex::new(&pattern).ok(),
            ..Self::default()
        }
    }

    pub fn with_entry_id(mut self, entry_id: EntryId) -> Self {
        self.entry_id = Some(entry_id);
        self
    }

    pub fn with_description(mut self, pattern: &str) -> Result<Self, ValidationError> {
        self.description = Some(compile("description", pattern)?);
        Ok(self)
    }

    pub fn with_identity(mut self, pattern: &str) -> Result<Self, ValidationError> {
        self.identity = Some(compile("identity", pattern)?);
        Ok(self)
    }

    pub fn with_meta(mut self, pattern: &str) -> Result<Self, ValidationError> {
        self.meta = Some(compile("meta", pattern)?);
        Ok(self)
    }
}

impl Matcher for PatternQuery {
    fn matches(&self, entry: &Entry) -> bool {
        self.entry_id
            .as_ref()
            .map_or(true, |id| id == entry.entry_id())
            && self
                .description
                .as_ref()
                .map_or(true, |re| re.is_match(entry.description().as_str()))
            && self.identity.as_ref().map_or(true, |re| {
                entry.identity().is_some_and(|identity| re.is_match(identity.as_str()))
            })
            && self.meta.as_ref().map_or(true, |re| {
                entry.meta().is_some_and(|meta| re.is_match(meta.as_str()))
            })
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ValidationError> {
    Regex::new(pattern).map_err(|source| ValidationError::InvalidPattern { field, source })
}
