//! Runtime configuration resolved from defaults, the environment and flags.

use crate::error::{Result, VaultError};
use crate::models::KeyId;
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable holding the GPG key id new entries are encrypted for.
pub const ENV_KEY_ID: &str = "TARTARUS_KEY_ID";
/// Environment variable overriding the store file location.
pub const ENV_DATA_FILE: &str = "TARTARUS_DATA_FILE";

const APP_DIR: &str = "tartarus";
const DATA_FILE_NAME: &str = "store.json";
const FALLBACK_DATA_FILE: &str = "tartarus.json";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub key_id: KeyId,
    pub data_file: PathBuf,
}

/// Builds a [`Config`]; later layers override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    key_id: Option<String>,
    data_file: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default store location: `$XDG_DATA_HOME/tartarus/store.json`, then the
    /// platform data directory, then `./tartarus.json`.
    pub fn with_defaults(mut self, env: &HashMap<String, String>) -> Self {
        let data_dir = non_empty(env, "XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(dirs::data_dir);

        self.data_file = Some(match data_dir {
            Some(dir) => dir.join(APP_DIR).join(DATA_FILE_NAME),
            None => PathBuf::from(FALLBACK_DATA_FILE),
        });
        self
    }

    /// Apply `TARTARUS_KEY_ID` and `TARTARUS_DATA_FILE`. Empty values are ignored.
    pub fn with_env(mut self, env: &HashMap<String, String>) -> Self {
        if let Some(key_id) = non_empty(env, ENV_KEY_ID) {
            self.key_id = Some(key_id.to_string());
        }
        if let Some(path) = non_empty(env, ENV_DATA_FILE) {
            self.data_file = Some(PathBuf::from(path));
        }
        self
    }

    pub fn with_key_id(mut self, key_id: Option<String>) -> Self {
        if key_id.is_some() {
            self.key_id = key_id;
        }
        self
    }

    pub fn with_data_file(mut self, data_file: Option<PathBuf>) -> Self {
        if data_file.is_some() {
            self.data_file = data_file;
        }
        self
    }

    /// # Errors
    ///
    /// Returns `VaultError::Config` naming the first setting that is missing or invalid.
    pub fn build(self) -> Result<Config> {
        let key_id = self.key_id.ok_or_else(|| {
            VaultError::Config(format!(
                "no key id configured. Set {ENV_KEY_ID} or pass --key-id."
            ))
        })?;
        let key_id = KeyId::new(key_id)
            .map_err(|e| VaultError::Config(format!("invalid key id: {e}")))?;

        let data_file = self.data_file.ok_or_else(|| {
            VaultError::Config(format!(
                "no data file configured. Set {ENV_DATA_FILE} or pass --file."
            ))
        })?;

        Ok(Config { key_id, data_file })
    }
}

fn non_empty<'a>(env: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    env.get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
