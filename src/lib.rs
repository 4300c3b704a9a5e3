//! Free Space Shredder
//!
//! Overwrites the unallocated space of a mounted filesystem so fragments of
//! deleted files cannot be recovered, without raw block device access.
//!
//! # Features
//!
//! - **Multi-pass fill**: every pass writes zeros, ones, random and encrypted data
//! - **Write until full**: exhaustion is detected by failed writes, not by arithmetic
//! - **Encrypted pattern**: random data under a throwaway AES-256-CBC key per chunk
//! - **Cleanup**: removes fill files left behind by an interrupted run
//! - **File shredding**: overwrite, rename and unlink a single file
//!
//! # Architecture
//!
//! ```text
//! probe (statvfs) → for pass, pattern: create temp file → fill until full → delete
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use free_shred::{ChunkGenerator, FreeSpaceWiper, WipeRequest};
//!
//! let request = WipeRequest::new("/mnt/usb", 1);
//! let mut wiper = FreeSpaceWiper::new(request, ChunkGenerator::from_time());
//!
//! let report = wiper.run();
//! println!("wrote {} bytes", report.total_bytes());
//! ```

pub mod cleanup;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod probe;
pub mod shred;
pub mod wiper;

pub use config::WipeRequest;
pub use error::{Error, Result};
pub use pattern::{ChunkGenerator, Pattern};
pub use wiper::{FreeSpaceWiper, WipeReport};
