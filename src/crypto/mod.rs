//! Cryptographic operations for the encrypted fill pattern.
//!
//! This module provides:
//! - Ephemeral per-chunk key material
//! - AES-256-CBC encryption with PKCS#7 padding

mod cipher;

pub use cipher::{
    encrypt_chunk, padded_len, EncryptionMaterial, BLOCK_SIZE, IV_SIZE, KEY_SIZE,
};
