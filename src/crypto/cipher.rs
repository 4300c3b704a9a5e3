//! AES-256-CBC encryption of fill chunks.

use crate::error::{Error, Result};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key size for AES-256 (256 bits).
pub const KEY_SIZE: usize = 32;

/// IV size for CBC mode (128 bits).
pub const IV_SIZE: usize = 16;

/// AES block size. PKCS#7 adds between 1 and this many bytes.
pub const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Ephemeral key and IV for a single chunk.
///
/// Wiped from memory on drop and never printed.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl EncryptionMaterial {
    /// Draw a fresh key and IV from `rng`.
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut material = Self {
            key: [0u8; KEY_SIZE],
            iv: [0u8; IV_SIZE],
        };
        rng.fill_bytes(&mut material.key);
        rng.fill_bytes(&mut material.iv);
        material
    }

    /// Build material from a known key and IV.
    pub fn from_parts(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }
}

impl fmt::Debug for EncryptionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionMaterial([REDACTED])")
    }
}

/// Size of the PKCS#7 padded ciphertext for a plaintext of `len` bytes.
pub fn padded_len(len: usize) -> usize {
    (len / BLOCK_SIZE)
        .saturating_add(1)
        .saturating_mul(BLOCK_SIZE)
}

/// Encrypt `plaintext` into `out` with AES-256-CBC and PKCS#7 padding.
///
/// `out` must hold at least `padded_len(plaintext.len())` bytes.
///
/// # Returns
///
/// The number of ciphertext bytes written to `out`.
pub fn encrypt_chunk(
    material: &EncryptionMaterial,
    plaintext: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    let encryptor = Aes256CbcEnc::new_from_slices(&material.key, &material.iv)
        .map_err(|e| Error::Encrypt(format!("cipher init failed: {}", e)))?;

    let out_len = out.len();
    let ciphertext = encryptor
        .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, out)
        .map_err(|_| {
            Error::Encrypt(format!(
                "output buffer too small: need {} bytes, have {}",
                padded_len(plaintext.len()),
                out_len
            ))
        })?;

    Ok(ciphertext.len())
}
