//! Atomic artifact persistence.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error_codes;

#[derive(Debug, Error)]
#[error("[PBIDOCS_WRITE_001] failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl WriteError {
    pub fn code(&self) -> &'static str {
        error_codes::WRITE_FAILED
    }
}

/// Writes `contents` to a temporary file beside `path` and renames it into
/// place, so readers never observe a partially written artifact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let wrap = |source: std::io::Error| WriteError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(wrap)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.json");
        std::fs::write(&target, b"old").expect("seed");
        write_atomic(&target, b"new").expect("write");
        assert_eq!(std::fs::read(&target).expect("read"), b"new");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a").join("b").join("doc.md");
        write_atomic(&target, b"# doc").expect("write");
        assert!(target.is_file());
        let leftovers = std::fs::read_dir(target.parent().expect("parent"))
            .expect("list")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn failure_names_the_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        std::fs::create_dir_all(target.join("child")).expect("mkdir");
        let err = write_atomic(&target, b"x").expect_err("persist over dir fails");
        assert_eq!(err.path, target);
        assert_eq!(err.code(), "PBIDOCS_WRITE_001");
    }
}
