//! Free-space detection through the filesystem's reported statistics.
//!
//! The figures are advisory. The fill loop never sizes itself from them,
//! since other processes may grow or shrink the free space while it runs.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Capacity figures for the filesystem containing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityInfo {
    /// Filesystem block size.
    pub block_size: u64,
    /// Total size of the filesystem.
    pub total: u64,
    /// Free bytes, including blocks reserved for the superuser.
    pub free: u64,
    /// Free bytes available to unprivileged users.
    pub available: u64,
}

/// Bytes available to the calling user on the filesystem containing `path`.
///
/// Computed as block size × available blocks.
pub fn free_space(path: &Path) -> Result<u64> {
    capacity(path).map(|info| info.available)
}

/// Query all capacity figures for the filesystem containing `path`.
#[cfg(unix)]
pub fn capacity(path: &Path) -> Result<CapacityInfo> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| Error::Probe {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is NUL-terminated and stat is a valid out-pointer.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(Error::Probe {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    let block_size = stat.f_bsize as u64;
    let fragment_size = if stat.f_frsize == 0 {
        block_size
    } else {
        stat.f_frsize as u64
    };

    Ok(CapacityInfo {
        block_size,
        total: (stat.f_blocks as u64).saturating_mul(fragment_size),
        free: (stat.f_bfree as u64).saturating_mul(fragment_size),
        available: (stat.f_bavail as u64).saturating_mul(block_size),
    })
}

#[cfg(not(unix))]
pub fn capacity(path: &Path) -> Result<CapacityInfo> {
    Err(Error::Probe {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "free space query not supported on this platform",
        ),
    })
}

/// Format a byte count in MiB for progress lines.
pub fn as_mib(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}
