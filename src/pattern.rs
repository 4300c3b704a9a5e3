//! Overwrite patterns and the chunk generator.

use crate::crypto::{encrypt_chunk, padded_len, EncryptionMaterial};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Byte content rule for a fill buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// Every byte 0x00.
    Zeros,
    /// Every byte 0xFF.
    Ones,
    /// Pseudorandom bytes.
    Random,
    /// Pseudorandom bytes encrypted under a throwaway AES-256-CBC key.
    Encrypted,
}

impl Pattern {
    /// All patterns in pass order.
    pub const ALL: [Pattern; 4] = [
        Pattern::Zeros,
        Pattern::Ones,
        Pattern::Random,
        Pattern::Encrypted,
    ];

    /// Position of the pattern within a pass, used in temp file names.
    pub fn index(self) -> usize {
        match self {
            Pattern::Zeros => 0,
            Pattern::Ones => 1,
            Pattern::Random => 2,
            Pattern::Encrypted => 3,
        }
    }

    /// Look up a pattern by its index.
    pub fn from_index(index: usize) -> Option<Pattern> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Pattern::Zeros => "zeros",
            Pattern::Ones => "ones",
            Pattern::Random => "random",
            Pattern::Encrypted => "encrypted",
        }
    }

    /// Whether this pattern needs a scratch buffer for ciphertext.
    pub fn needs_scratch(self) -> bool {
        matches!(self, Pattern::Encrypted)
    }

    /// Scratch buffer size needed for a chunk of `chunk_size` bytes.
    pub fn scratch_len(self, chunk_size: usize) -> usize {
        if self.needs_scratch() {
            padded_len(chunk_size)
        } else {
            0
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fills chunks according to a [`Pattern`].
///
/// Owns its random source. The encrypted pattern draws both the plaintext and
/// the per-chunk key material from it.
pub struct ChunkGenerator<R: RngCore> {
    rng: R,
}

impl ChunkGenerator<StdRng> {
    /// Create a generator seeded once from the wall clock.
    pub fn from_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Create a generator with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> ChunkGenerator<R> {
    /// Wrap an existing random source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Fill `buf` for `pattern`.
    ///
    /// `scratch` is only touched by [`Pattern::Encrypted`] and must then hold
    /// at least `padded_len(buf.len())` bytes. On error the contents of `buf`
    /// are unspecified and the chunk must not be written.
    pub fn fill(&mut self, pattern: Pattern, buf: &mut [u8], scratch: &mut [u8]) -> Result<()> {
        match pattern {
            Pattern::Zeros => buf.fill(0x00),
            Pattern::Ones => buf.fill(0xFF),
            Pattern::Random => self.rng.fill_bytes(buf),
            Pattern::Encrypted => {
                self.rng.fill_bytes(buf);
                if scratch.len() < padded_len(buf.len()) {
                    return Err(Error::Encrypt(format!(
                        "scratch buffer too small: need {} bytes, have {}",
                        padded_len(buf.len()),
                        scratch.len()
                    )));
                }

                let material = EncryptionMaterial::generate(&mut self.rng);
                let produced = encrypt_chunk(&material, buf, scratch)?;
                drop(material);

                let copy_len = produced.min(buf.len());
                buf[..copy_len].copy_from_slice(&scratch[..copy_len]);
            }
        }
        Ok(())
    }

    /// Fill `out` straight from the random source.
    pub fn random_bytes(&mut self, out: &mut [u8]) {
        self.rng.fill_bytes(out);
    }
}
