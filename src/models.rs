//! Value types carried by entries, queries and codecs.

use crate::error::ValidationError;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, seq::SliceRandom};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Defines a non-empty string newtype.
macro_rules! text_type {
    ($(#[$doc:meta])* $name:ident, $field:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Wrap a value, rejecting the empty string.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(ValidationError::Empty { field: $field });
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

text_type!(
    /// Identifies the asymmetric key an entry is encrypted for.
    KeyId,
    "key_id"
);
text_type!(
    /// Uniquely identifies an entry within a store.
    EntryId,
    "id"
);
text_type!(
    /// What the secret is for, e.g. a URI or label.
    Description,
    "description"
);
text_type!(
    /// Disambiguates entries sharing a description, e.g. a username.
    Identity,
    "identity"
);
text_type!(
    /// Free-form auxiliary notes.
    Metadata,
    "meta"
);

impl EntryId {
    /// Generate a fresh random identifier (32 hex characters).
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// Encrypted secret bytes, represented externally as base64.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext(Vec<u8>);

impl Ciphertext {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode from standard base64. Invalid input is an error, never an empty value.
    pub fn from_base64(value: &str) -> Result<Self, ValidationError> {
        STANDARD
            .decode(value)
            .map(Self)
            .map_err(|source| ValidationError::InvalidCiphertext { source })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.len())
    }
}

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Character classes used when generating a plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    pub lowercase: bool,
    pub uppercase: bool,
    pub digits: bool,
    pub punctuation: bool,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            lowercase: true,
            uppercase: true,
            digits: true,
            punctuation: false,
        }
    }
}

impl Alphabet {
    /// All characters of the enabled classes.
    pub fn characters(&self) -> Vec<char> {
        [
            (self.lowercase, LOWERCASE),
            (self.uppercase, UPPERCASE),
            (self.digits, DIGITS),
            (self.punctuation, PUNCTUATION),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .flat_map(|(_, class)| class.chars())
        .collect()
    }
}

/// A decrypted secret. The buffer is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Plaintext(String);

impl Plaintext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Interpret decoded bytes as UTF-8.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, ValidationError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self(text)),
            Err(err) => {
                err.into_bytes().zeroize();
                Err(ValidationError::InvalidUtf8)
            }
        }
    }

    /// Generate `length` characters, each drawn uniformly from `alphabet` using the OS CSPRNG.
    pub fn random(length: usize, alphabet: &Alphabet) -> Result<Self, ValidationError> {
        let chars = alphabet.characters();
        if chars.is_empty() && length > 0 {
            return Err(ValidationError::EmptyAlphabet);
        }

        let mut rng = OsRng;
        let value = (0..length)
            .filter_map(|_| chars.choose(&mut rng))
            .collect();
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Plaintext(<redacted>)")
    }
}

impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
