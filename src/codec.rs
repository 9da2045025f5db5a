//! The cryptographic boundary between plaintexts and ciphertexts.

use crate::error::CodecError;
use crate::models::{Ciphertext, KeyId, Plaintext};

/// Converts plaintexts to ciphertexts and back.
///
/// The active key is held as state and changed only through [`Codec::rebind`].
/// Rebinding never affects ciphertexts produced earlier; they stay decodable by
/// whichever key they were produced for.
pub trait Codec {
    /// The key new ciphertexts are produced for.
    fn key_id(&self) -> &KeyId;

    /// Switch the key used by subsequent calls to [`Codec::encode`].
    fn rebind(&mut self, key_id: KeyId);

    /// Encrypt `plaintext` for the current key.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::EncodingFailed` if the backend cannot produce a
    /// ciphertext for the current key, or `CodecError::Unavailable` if the
    /// backend cannot be reached at all.
    fn encode(&self, plaintext: &Plaintext) -> Result<Ciphertext, CodecError>;

    /// Recover the plaintext of `ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::DecodingFailed` for a wrong key, corrupted input, or
    /// output that is not UTF-8, and `CodecError::Unavailable` if the backend
    /// cannot be reached.
    fn decode(&self, ciphertext: &Ciphertext) -> Result<Plaintext, CodecError>;
}
