//! Temporary fill file with guaranteed removal.

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A fill file that is removed when the iteration ends.
///
/// Call [`TempFile::finish`] to close and delete it with error reporting.
/// If the guard is dropped on another path, removal is attempted silently.
pub struct TempFile {
    path: PathBuf,
    file: Option<File>,
    removed: bool,
}

impl TempFile {
    /// Create (or truncate) the file for writing only.
    pub fn create(path: PathBuf) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options
            .open(&path)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Some(file),
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the file and delete it.
    ///
    /// A failed sync is logged. A failed removal is returned as
    /// [`Error::Delete`].
    pub fn finish(mut self, sync: bool) -> Result<()> {
        if let Some(file) = self.file.take() {
            if sync {
                if let Err(e) = file.sync_all() {
                    log::warn!("Failed to sync {}: {}", self.path.display(), e);
                }
            }
        }

        self.removed = true;
        fs::remove_file(&self.path).map_err(|source| Error::Delete {
            path: self.path.clone(),
            source,
        })
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "temp file already closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.file.take();
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::error!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finish_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fill.dat");

        let mut temp = TempFile::create(path.clone()).unwrap();
        temp.write_all(b"some data").unwrap();
        assert!(path.exists());

        temp.finish(true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fill.dat");

        {
            let mut temp = TempFile::create(path.clone()).unwrap();
            temp.write_all(b"abandoned").unwrap();
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_create_truncates_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fill.dat");
        fs::write(&path, vec![0xAAu8; 4096]).unwrap();

        let temp = TempFile::create(path.clone()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        temp.finish(false).unwrap();
    }

    #[test]
    fn test_finish_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fill.dat");

        let temp = TempFile::create(path.clone()).unwrap();
        fs::remove_file(&path).unwrap();

        let result = temp.finish(false);
        assert!(matches!(result, Err(Error::Delete { .. })));
    }

    #[test]
    fn test_open_in_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("fill.dat");

        let result = TempFile::create(path);
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fill.dat");

        let temp = TempFile::create(path.clone()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        temp.finish(false).unwrap();
    }
}
