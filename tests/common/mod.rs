#![allow(dead_code)]

use tartarus::error::CodecError;
use tartarus::{Ciphertext, Codec, Description, Entry, Identity, KeyId, Plaintext};

/// Test codec: ciphertext is `<key>:<plaintext>`, decodable only for known keys.
pub struct TagCodec {
    pub key_id: KeyId,
    pub known: Vec<KeyId>,
}

impl TagCodec {
    pub fn new(key_id: &str, known: &[&str]) -> Self {
        Self {
            key_id: key(key_id),
            known: known.iter().map(|k| key(k)).collect(),
        }
    }
}

impl Codec for TagCodec {
    fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    fn rebind(&mut self, key_id: KeyId) {
        self.key_id = key_id;
    }

    fn encode(&self, plaintext: &Plaintext) -> Result<Ciphertext, CodecError> {
        Ok(Ciphertext::new(format!("{}:{}", self.key_id, plaintext)))
    }

    fn decode(&self, ciphertext: &Ciphertext) -> Result<Plaintext, CodecError> {
        let text = std::str::from_utf8(ciphertext.as_bytes())
            .map_err(|e| CodecError::DecodingFailed(e.to_string()))?;
        let (tag, value) = text
            .split_once(':')
            .ok_or_else(|| CodecError::DecodingFailed("missing key tag".to_string()))?;
        if !self.known.iter().any(|k| k.as_str() == tag) {
            return Err(CodecError::DecodingFailed(format!("no secret key for {tag}")));
        }
        Ok(Plaintext::new(value))
    }
}

pub fn key(id: &str) -> KeyId {
    KeyId::new(id).unwrap()
}

pub fn entry(codec: &TagCodec, description: &str, identity: Option<&str>, secret: &str) -> Entry {
    Entry::create(
        codec.key_id().clone(),
        Description::new(description).unwrap(),
        identity.map(|i| Identity::new(i).unwrap()),
        codec.encode(&Plaintext::new(secret)).unwrap(),
        None,
    )
}
