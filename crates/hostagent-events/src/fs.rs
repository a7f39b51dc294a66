//! Filesystem operations used by the spool
//!
//! The spool talks to the disk only through [`SpoolFs`], so tests can wrap
//! [`OsFs`] and fail a single step (a removal, a rename) on demand.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// The filesystem primitives the spool needs
pub trait SpoolFs: Send + Sync {
    /// Whether `path` exists and is a directory
    fn dir_exists(&self, path: &Path) -> bool;

    /// Create `path` (and missing parents) with `mode` on the leaf directory
    fn create_dir(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// File names directly under `path`; names that are not UTF-8 are skipped
    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate `path` and write `data`, syncing to disk if `sync`
    fn write_file(&self, path: &Path, data: &[u8], sync: bool) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Flush directory entries of `path` (such as a finished rename) to disk
    fn sync_dir(&self, path: &Path) -> io::Result<()>;
}

/// [`SpoolFs`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl SpoolFs for OsFs {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

            builder.mode(mode);
            builder.create(path)?;
            // The umask may have masked bits off the requested mode.
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }

        #[cfg(not(unix))]
        {
            let _ = mode;
            builder.create(path)?;
        }

        Ok(())
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn write_file(&self, path: &Path, data: &[u8], sync: bool) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    #[cfg(unix)]
    fn sync_dir(&self, path: &Path) -> io::Result<()> {
        File::open(path)?.sync_all()
    }

    // Directories cannot be opened as files here.
    #[cfg(not(unix))]
    fn sync_dir(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_dir_is_recursive() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");

        OsFs.create_dir(&nested, 0o700).unwrap();
        assert!(OsFs.dir_exists(&nested));
    }

    #[cfg(unix)]
    #[test]
    fn test_create_dir_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("events");

        OsFs.create_dir(&dir, 0o700).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_write_list_rename_remove() {
        let temp = TempDir::new().unwrap();
        let tmp = temp.path().join("1.tmp");
        let done = temp.path().join("1.tld");

        OsFs.write_file(&tmp, b"payload", true).unwrap();
        OsFs.rename(&tmp, &done).unwrap();
        OsFs.sync_dir(temp.path()).unwrap();
        assert_eq!(OsFs.list_dir(temp.path()).unwrap(), vec!["1.tld".to_string()]);
        assert_eq!(fs::read(&done).unwrap(), b"payload");

        OsFs.remove_file(&done).unwrap();
        assert!(OsFs.list_dir(temp.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_dir_on_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let err = OsFs.sync_dir(&temp.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
