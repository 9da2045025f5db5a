//! Command-line interface implementation.

use crate::codec::Codec;
use crate::config::{Config, ConfigBuilder};
use crate::entry::Entry;
use crate::error::{Result, VaultError};
use crate::gpg::GpgCodec;
use crate::io::{FileReader, FileWriter};
use crate::json_store::JsonStore;
use crate::migration::LATEST;
use crate::models::{Alphabet, Description, EntryId, Identity, KeyId, Metadata, Plaintext};
use crate::query::{PatternQuery, Query};
use crate::store::{MigratableStore, SchemaVersion, Store};
use crate::timestamp::format_timestamp;
use crate::utils::{self, success, warning};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::collections::HashMap;
use std::path::PathBuf;
use zeroize::Zeroize;

/// A minimal password manager.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the store file
    #[arg(short = 'f', long, global = true)]
    pub file: Option<PathBuf>,

    /// GPG key id new secrets are encrypted for
    #[arg(short = 'k', long, global = true)]
    pub key_id: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decrypt and print the secrets matching a description
    Lookup {
        /// Exact description, e.g. github.com
        description: String,

        /// Only entries with this identity
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// List entries without decrypting them
    List {
        /// Only descriptions containing this text (case-insensitive)
        description: Option<String>,
    },

    /// Encrypt and store a new secret
    Add {
        /// What the secret is for
        description: String,

        /// Identity, e.g. a username
        #[arg(short, long)]
        identity: Option<String>,

        /// Additional notes
        #[arg(short, long)]
        meta: Option<String>,

        /// Generate a random secret of this length instead of prompting
        #[arg(short, long, value_name = "LENGTH")]
        generate: Option<usize>,

        /// Include punctuation in a generated secret
        #[arg(short, long, requires = "generate")]
        punctuation: bool,
    },

    /// Remove an entry by id
    Remove {
        /// Entry id as shown by `list`
        entry_id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print a random secret
    Generate {
        /// Number of characters
        #[arg(default_value = "20")]
        length: usize,

        #[arg(long)]
        no_lowercase: bool,

        #[arg(long)]
        no_uppercase: bool,

        #[arg(long)]
        no_digits: bool,

        #[arg(short, long)]
        punctuation: bool,
    },

    /// Migrate the store to a newer schema version
    Migrate {
        /// Target schema version (default: latest)
        #[arg(long)]
        to: Option<u32>,
    },

    /// Count entries
    Count {
        /// Only entries encrypted for this key id
        #[arg(long)]
        for_key: Option<String>,
    },
}

impl Cli {
    /// Resolve configuration from defaults, the environment and flags.
    pub fn config(&self) -> Result<Config> {
        let env: HashMap<String, String> = std::env::vars().collect();
        ConfigBuilder::new()
            .with_defaults(&env)
            .with_env(&env)
            .with_key_id(self.key_id.clone())
            .with_data_file(self.file.clone())
            .build()
    }

    /// Execute the CLI command.
    pub fn execute(&self) -> Result<()> {
        if let Commands::Generate {
            length,
            no_lowercase,
            no_uppercase,
            no_digits,
            punctuation,
        } = &self.command
        {
            let alphabet = Alphabet {
                lowercase: !no_lowercase,
                uppercase: !no_uppercase,
                digits: !no_digits,
                punctuation: *punctuation,
            };
            println!("{}", Plaintext::random(*length, &alphabet)?);
            return Ok(());
        }

        let config = self.config()?;
        let mut store = open_store(&config)?;
        self.run(&mut store, &config)
    }

    fn run(&self, store: &mut CliStore, config: &Config) -> Result<()> {
        match &self.command {
            Commands::Lookup {
                description,
                identity,
            } => lookup(store, description, identity.as_deref()),
            Commands::List { description } => list(store, description.as_deref()),
            Commands::Add {
                description,
                identity,
                meta,
                generate,
                punctuation,
            } => {
                let entry = NewEntry {
                    description,
                    identity: identity.as_deref(),
                    meta: meta.as_deref(),
                    generate: *generate,
                    punctuation: *punctuation,
                };
                add(store, config, entry)
            }
            Commands::Remove { entry_id, yes } => remove(store, config, entry_id, *yes),
            Commands::Migrate { to } => migrate(store, config, *to),
            Commands::Count { for_key } => count(store, for_key.as_deref()),
            Commands::Generate { .. } => Ok(()),
        }
    }
}

type CliStore = JsonStore<GpgCodec>;

fn open_store(config: &Config) -> Result<CliStore> {
    for message in utils::check_file_permissions(&config.data_file) {
        warning(&message);
    }

    let mut store = JsonStore::new(GpgCodec::new(config.key_id.clone()));
    store.init(&mut FileReader::new(&config.data_file))?;
    Ok(store)
}

fn save(store: &CliStore, config: &Config) -> Result<()> {
    store.sync(&mut FileWriter::new(&config.data_file))
}

fn lookup(store: &CliStore, description: &str, identity: Option<&str>) -> Result<()> {
    let query = Query::lookup(
        Description::new(description)?,
        identity.map(Identity::new).transpose()?,
    );
    let results = store.query(&query)?;
    if results.is_empty() {
        warning(&format!("No entries found for '{description}'"));
        return Ok(());
    }

    store.codec().check_available()?;
    for entry in &results {
        let plaintext = store.codec().decode(entry.ciphertext())?;
        if results.len() > 1 {
            let label = entry.identity().map_or("-", Identity::as_str);
            println!("{}: {}", label.cyan(), plaintext);
        } else {
            println!("{plaintext}");
        }
    }
    Ok(())
}

fn list(store: &CliStore, filter: Option<&str>) -> Result<()> {
    let entries = match filter {
        Some(text) => store.query(&PatternQuery::containing(text))?,
        None => store.select_all()?,
    };

    if entries.is_empty() {
        println!("(empty)");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}  {}  {}",
            entry.entry_id().as_str().dimmed(),
            entry.description().as_str().bold(),
            entry.identity().map_or("-", Identity::as_str),
            format_timestamp(entry.timestamp()).as_str().dimmed()
        );
        if let Some(meta) = entry.meta() {
            println!("    {}", meta.as_str().italic());
        }
    }
    Ok(())
}

struct NewEntry<'a> {
    description: &'a str,
    identity: Option<&'a str>,
    meta: Option<&'a str>,
    generate: Option<usize>,
    punctuation: bool,
}

fn add(store: &mut CliStore, config: &Config, new: NewEntry<'_>) -> Result<()> {
    let description = Description::new(new.description)?;
    let identity = new.identity.map(Identity::new).transpose()?;
    let meta = new.meta.map(Metadata::new).transpose()?;

    store.codec().check_available()?;

    let secret = match new.generate {
        Some(length) => {
            let alphabet = Alphabet {
                punctuation: new.punctuation,
                ..Alphabet::default()
            };
            Plaintext::random(length, &alphabet)?
        }
        None => prompt_secret()?,
    };

    let ciphertext = store.codec().encode(&secret)?;
    let entry = Entry::create(
        config.key_id.clone(),
        description,
        identity,
        ciphertext,
        meta,
    );
    let entry_id = entry.entry_id().clone();

    store.put(entry)?;
    save(store, config)?;

    success(&format!("Added entry {entry_id}"));
    if new.generate.is_some() {
        println!("{secret}");
    }
    Ok(())
}

/// Read a secret twice without echo.
fn prompt_secret() -> Result<Plaintext> {
    let mut first = rpassword::prompt_password("Secret: ")?;
    if first.is_empty() {
        return Err(VaultError::NoSecret);
    }

    let mut second = rpassword::prompt_password("Confirm secret: ")?;
    let matches = first == second;
    second.zeroize();

    if !matches {
        first.zeroize();
        return Err(VaultError::SecretMismatch);
    }
    Ok(Plaintext::new(first))
}

fn remove(store: &mut CliStore, config: &Config, entry_id: &str, yes: bool) -> Result<()> {
    let query = Query::new().with_entry_id(EntryId::new(entry_id)?);
    let Some(entry) = store.query(&query)?.into_iter().next() else {
        warning(&format!("No entry with id '{entry_id}'"));
        return Ok(());
    };

    if !yes {
        let prompt = format!(
            "Remove '{}' ({})?",
            entry.description(),
            entry.identity().map_or("no identity", Identity::as_str)
        );
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|_| VaultError::Cancelled)?;
        if !confirmed {
            return Err(VaultError::Cancelled);
        }
    }

    store.remove(&entry)?;
    save(store, config)?;
    success(&format!("Removed entry {entry_id}"));
    Ok(())
}

fn migrate(store: &mut CliStore, config: &Config, to: Option<u32>) -> Result<()> {
    let target = to.map(SchemaVersion).unwrap_or(LATEST);
    let current = store.current_schema_version();

    if current == target {
        success(&format!("Store is already at schema {current}"));
        return Ok(());
    }

    store.migrate(target, &config.key_id)?;
    save(store, config)?;
    success(&format!("Migrated store from schema {current} to {target}"));
    Ok(())
}

fn count(store: &CliStore, for_key: Option<&str>) -> Result<()> {
    let count = match for_key {
        Some(key_id) => store.get_count_of_key_id(&KeyId::new(key_id)?)?,
        None => store.get_count()?,
    };
    println!("{count}");
    Ok(())
}
