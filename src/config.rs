//! Configuration constants and types for the free space shredder.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default number of passes over the four patterns.
pub const DEFAULT_PASSES: u32 = 3;

/// Default chunk size (512 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024 * 1024;

/// Prefix of the temporary fill files.
pub const TEMP_FILE_PREFIX: &str = "shred_temp_";

/// Extension of the temporary fill files.
pub const TEMP_FILE_EXTENSION: &str = "dat";

/// Consecutive `Interrupted` writes retried before the loop gives up.
pub const MAX_TRANSIENT_RETRIES: u32 = 3;

/// Consecutive skipped chunks tolerated before the loop gives up.
pub const MAX_CONSECUTIVE_SKIPS: u32 = 8;

/// Single-file shredding parameters.
pub mod shred_params {
    /// Number of overwrite passes (each pass runs every pattern).
    pub const DEFAULT_PASSES: u32 = 3;

    /// Number of random renames before the final unlink.
    pub const DEFAULT_RENAMES: u32 = 5;

    /// Length of the random file names, in bytes before hex encoding.
    pub const NAME_BYTES: usize = 8;

    /// Chunk size used when overwriting an existing file (1 MiB).
    pub const CHUNK_SIZE: usize = 1024 * 1024;
}

/// Build the temp file path for one (pass, pattern) iteration.
///
/// `<target>/shred_temp_<pass>_<pattern_index>.dat`
pub fn temp_file_path(target: &Path, pass: u32, pattern_index: usize) -> PathBuf {
    target.join(format!(
        "{}{}_{}.{}",
        TEMP_FILE_PREFIX, pass, pattern_index, TEMP_FILE_EXTENSION
    ))
}

/// Parse a pass count argument.
///
/// Accepts any non-negative integer. Anything else is a configuration error.
pub fn parse_pass_count(raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| Error::Config(format!("invalid pass count '{}': {}", raw, e)))
}

/// Immutable configuration for one wipe invocation.
#[derive(Debug, Clone, Serialize)]
pub struct WipeRequest {
    /// Directory on the filesystem whose free space is wiped.
    pub target: PathBuf,

    /// Number of passes. Each pass writes all four patterns.
    pub passes: u32,

    /// Size of each write in bytes.
    pub chunk_size: usize,

    /// Stop each temp file after this many chunks, even if space remains.
    pub max_chunks_per_file: Option<u64>,

    /// Flush each temp file to stable storage before deleting it.
    pub sync_each_file: bool,
}

impl Default for WipeRequest {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            passes: DEFAULT_PASSES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks_per_file: None,
            sync_each_file: true,
        }
    }
}

impl WipeRequest {
    /// Create a request for `target` with default settings.
    pub fn new(target: impl Into<PathBuf>, passes: u32) -> Self {
        Self {
            target: target.into(),
            passes,
            ..Default::default()
        }
    }

    /// Build a request from raw invocation arguments.
    ///
    /// A missing pass count falls back to [`DEFAULT_PASSES`].
    pub fn from_args(target: impl Into<PathBuf>, passes: Option<&str>) -> Result<Self> {
        let passes = match passes {
            Some(raw) => parse_pass_count(raw)?,
            None => DEFAULT_PASSES,
        };
        let request = Self::new(target, passes);
        request.validate()?;
        Ok(request)
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Cap the number of chunks written per temp file.
    pub fn with_max_chunks(mut self, max_chunks: Option<u64>) -> Self {
        self.max_chunks_per_file = max_chunks;
        self
    }

    /// Enable or disable the fsync before each temp file is removed.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync_each_file = sync;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.target.as_os_str().is_empty() {
            return Err(Error::Config("target path must not be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk size must be greater than 0".to_string()));
        }
        if self.max_chunks_per_file == Some(0) {
            return Err(Error::Config(
                "max chunks per file must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pass_count() {
        assert_eq!(parse_pass_count("3").unwrap(), 3);
        assert_eq!(parse_pass_count("0").unwrap(), 0);
        assert_eq!(parse_pass_count(" 7 ").unwrap(), 7);
    }

    #[test]
    fn test_parse_pass_count_rejects_garbage() {
        assert!(matches!(parse_pass_count("abc"), Err(Error::Config(_))));
        assert!(matches!(parse_pass_count("-1"), Err(Error::Config(_))));
        assert!(matches!(parse_pass_count("2.5"), Err(Error::Config(_))));
        assert!(matches!(parse_pass_count(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_args_defaults() {
        let request = WipeRequest::from_args("/mnt/data", None).unwrap();
        assert_eq!(request.passes, DEFAULT_PASSES);
        assert_eq!(request.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(request.max_chunks_per_file.is_none());
        assert!(request.sync_each_file);
    }

    #[test]
    fn test_validate() {
        assert!(WipeRequest::new("/tmp", 1).validate().is_ok());
        assert!(WipeRequest::new("", 1).validate().is_err());
        assert!(WipeRequest::new("/tmp", 1).with_chunk_size(0).validate().is_err());
        assert!(WipeRequest::new("/tmp", 1)
            .with_max_chunks(Some(0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_temp_file_path() {
        let path = temp_file_path(Path::new("/mnt/data"), 2, 3);
        assert_eq!(path, PathBuf::from("/mnt/data/shred_temp_2_3.dat"));
    }
}
