//! Atomic file operations
//!
//! Snapshots are replaced whole. To never leave a half-written document:
//!
//! 1. Write to a temporary sibling file (`.tmp`)
//! 2. Call `sync_all()` to flush it to disk
//! 3. Rename it over the final path (atomic on most filesystems)
//!
//! A reader therefore sees either the previous snapshot or the new one.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for atomic operations
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors that can occur during atomic operations
#[derive(Debug, Error)]
pub enum AtomicError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("path has no file name: {0}")]
    InvalidPath(String),
}

/// Temp path used while writing `path`
///
/// The extension is appended rather than replaced so that `logs-data.json`
/// and `logs-data.bak` never share a temp file.
pub fn temp_path_for(path: &Path) -> AtomicResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AtomicError::InvalidPath(path.display().to_string()))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

/// Atomically write content using a writer function
///
/// Avoids building the whole document in memory first; the writer is
/// buffered and flushed before the sync.
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> AtomicResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    write_fn(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove the temp files an interrupted write of `targets` left behind
///
/// Only the exact temp siblings of the given paths are touched; other
/// `.tmp` files in the same directory are not ours.
pub fn cleanup_temp_files<P: AsRef<Path>>(targets: &[P]) -> AtomicResult<usize> {
    let mut cleaned = 0;

    for target in targets {
        let temp_path = temp_path_for(target.as_ref())?;
        match fs::remove_file(&temp_path) {
            Ok(()) => cleaned += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_str(path: &Path, content: &str) -> AtomicResult<()> {
        atomic_write_with(path, |w| w.write_all(content.as_bytes()))
    }

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("aliases.json");

        write_str(&path, "{\"dev-1\":\"Kiosk\"}").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"dev-1\":\"Kiosk\"}");
        assert!(!temp_path_for(&path).unwrap().exists());
    }

    #[test]
    fn test_atomic_write_with_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs-data.json");
        fs::write(&path, "old").unwrap();

        atomic_write_with(&path, |w| {
            writeln!(w, "[")?;
            writeln!(w, "]")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n]\n");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("nested").join("logs.json");

        write_str(&path, "[]").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_temp_path_appends_extension() {
        let temp = temp_path_for(Path::new("data/logs-data.json")).unwrap();
        assert_eq!(temp, PathBuf::from("data/logs-data.json.tmp"));
    }

    #[test]
    fn test_cleanup_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let events = temp_dir.path().join("logs-data.json");
        let aliases = temp_dir.path().join("device-aliases.json");
        fs::write(temp_dir.path().join("logs-data.json.tmp"), "partial").unwrap();
        fs::write(&events, "[]").unwrap();

        let cleaned = cleanup_temp_files(&[&events, &aliases]).unwrap();
        assert_eq!(cleaned, 1);
        assert!(events.exists());
        assert!(!temp_dir.path().join("logs-data.json.tmp").exists());
    }

    #[test]
    fn test_cleanup_leaves_foreign_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let foreign = temp_dir.path().join("someone-elses-report.tmp");
        fs::write(&foreign, "keep me").unwrap();

        let targets = [temp_dir.path().join("logs-data.json")];
        assert_eq!(cleanup_temp_files(&targets).unwrap(), 0);
        assert!(foreign.exists());
    }
}
