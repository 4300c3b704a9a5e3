//! In-place shredding of a single existing file.
//!
//! Each pass overwrites the whole file once per pattern and syncs it. The
//! emptied file is then renamed to random names to scrub its directory
//! entry and finally unlinked.

use crate::config::shred_params;
use crate::error::{Error, Result};
use crate::pattern::{ChunkGenerator, Pattern};
use crate::wiper::FillBuffers;
use rand::RngCore;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Summary of a shredded file.
#[derive(Debug, Clone, Serialize)]
pub struct ShredReport {
    pub path: PathBuf,
    pub size: u64,
    pub passes: u32,
    pub bytes_written: u64,
    pub renames: u32,
}

/// Overwrite, rename and delete the file at `path`.
///
/// # Arguments
///
/// * `path` - File to destroy
/// * `passes` - Number of passes (each pass writes all four patterns)
/// * `renames` - Number of random renames before unlinking
/// * `generator` - Source of pattern data and random names
pub fn shred_file<R: RngCore>(
    path: &Path,
    passes: u32,
    renames: u32,
    generator: &mut ChunkGenerator<R>,
) -> Result<ShredReport> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(Error::Config(format!("not a regular file: {}", path.display())));
    }
    let size = metadata.len();

    let mut bytes_written = 0u64;
    for pass in 0..passes {
        log::info!("Shred pass {}/{}: {}", pass + 1, passes, path.display());
        for pattern in Pattern::ALL {
            bytes_written += overwrite(path, size, pattern, generator)?;
        }
    }

    let mut current = path.to_path_buf();
    {
        let file = OpenOptions::new().write(true).open(&current)?;
        file.set_len(0)?;
        file.sync_all()?;
    }

    for _ in 0..renames {
        let next = random_sibling(&current, generator);
        fs::rename(&current, &next)?;
        log::debug!("Renamed {} -> {}", current.display(), next.display());
        current = next;
    }

    fs::remove_file(&current).map_err(|source| Error::Delete {
        path: current.clone(),
        source,
    })?;
    log::info!("Shredded {} ({} bytes)", path.display(), size);

    Ok(ShredReport {
        path: path.to_path_buf(),
        size,
        passes,
        bytes_written,
        renames,
    })
}

fn overwrite<R: RngCore>(
    path: &Path,
    size: u64,
    pattern: Pattern,
    generator: &mut ChunkGenerator<R>,
) -> Result<u64> {
    let chunk_size = (size.min(shred_params::CHUNK_SIZE as u64) as usize).max(1);
    let mut buffers = FillBuffers::allocate(pattern, chunk_size)?;

    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(0))?;

    let mut remaining = size;
    while remaining > 0 {
        let len = remaining.min(chunk_size as u64) as usize;
        let chunk = buffers.generate(generator, pattern)?;
        file.write_all(&chunk[..len])?;
        remaining -= len as u64;
    }

    file.sync_all()?;
    Ok(size)
}

/// Pick a random name next to `path` that does not exist yet.
///
/// `rename` replaces an existing destination, so taken names are skipped.
fn random_sibling<R: RngCore>(path: &Path, generator: &mut ChunkGenerator<R>) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut name = [0u8; shred_params::NAME_BYTES];
    loop {
        generator.random_bytes(&mut name);
        let candidate = dir.join(hex::encode(name));
        if !candidate.exists() {
            return candidate;
        }
        log::debug!("Random name {} already taken", candidate.display());
    }
}
