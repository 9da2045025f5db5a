//! GPG-backed codec.

use crate::codec::Codec;
use crate::error::CodecError;
use crate::models::{Ciphertext, KeyId, Plaintext};
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread;
use tracing::debug;

/// Encrypts and decrypts entries by shelling out to `gpg`.
#[derive(Debug, Clone)]
pub struct GpgCodec {
    key_id: KeyId,
    program: String,
}

impl GpgCodec {
    /// Create a codec encrypting for `key_id` with the `gpg` found on `PATH`.
    pub fn new(key_id: KeyId) -> Self {
        Self {
            key_id,
            program: "gpg".to_string(),
        }
    }

    /// Use a different gpg executable, e.g. `gpg2`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Check if GPG is available on the system.
    pub fn check_available(&self) -> Result<(), CodecError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| {
                CodecError::Unavailable(format!(
                    "{} not found: {e}. Please install GPG.",
                    self.program
                ))
            })?;

        if !output.status.success() {
            return Err(CodecError::Unavailable(format!(
                "{} --version failed",
                self.program
            )));
        }

        Ok(())
    }

    /// Run gpg with `input` on stdin and collect its output.
    fn run(&self, args: &[&str], input: &[u8]) -> Result<Output, CodecError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CodecError::Unavailable(format!("Failed to run {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CodecError::Unavailable("gpg stdin was not captured".to_string()))?;

        // stdin is written from a second thread so a large output cannot block the write.
        thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output().map_err(|e| {
                CodecError::Unavailable(format!("Failed to wait for {}: {e}", self.program))
            })?;

            if let Ok(Err(e)) = writer.join() {
                if output.status.success() {
                    return Err(CodecError::Unavailable(format!(
                        "Failed to write to {}: {e}",
                        self.program
                    )));
                }
            }
            Ok(output)
        })
    }
}

fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        format!("gpg exited with {}", output.status)
    } else {
        text
    }
}

impl Codec for GpgCodec {
    fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    fn rebind(&mut self, key_id: KeyId) {
        debug!(from = %self.key_id, to = %key_id, "rebinding gpg codec");
        self.key_id = key_id;
    }

    fn encode(&self, plaintext: &Plaintext) -> Result<Ciphertext, CodecError> {
        let args = [
            "--batch",
            "--yes",
            "--quiet",
            // Key trust is managed outside tartarus.
            "--trust-model",
            "always",
            "--encrypt",
            "--recipient",
            self.key_id.as_str(),
            "--output",
            "-",
        ];
        let output = self.run(&args, plaintext.as_bytes())?;

        if !output.status.success() {
            return Err(CodecError::EncodingFailed {
                key_id: self.key_id.to_string(),
                reason: stderr_text(&output),
            });
        }

        debug!(key_id = %self.key_id, bytes = output.stdout.len(), "encoded plaintext");
        Ok(Ciphertext::new(output.stdout))
    }

    fn decode(&self, ciphertext: &Ciphertext) -> Result<Plaintext, CodecError> {
        let output = self.run(
            &["--batch", "--quiet", "--decrypt", "--output", "-"],
            ciphertext.as_bytes(),
        )?;

        if !output.status.success() {
            return Err(CodecError::DecodingFailed(stderr_text(&output)));
        }

        Plaintext::from_utf8(output.stdout).map_err(|_| {
            CodecError::DecodingFailed("decrypted value is not valid UTF-8".to_string())
        })
    }
}
