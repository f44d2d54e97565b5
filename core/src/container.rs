//! Package container handling.
//!
//! A Power BI template (`.pbit`) or report (`.pbix`) is a ZIP archive whose
//! entries are opaque to us except for the single schema payload. The
//! [`Container`] trait abstracts "a set of named byte entries" so the locator
//! and extraction pipeline work the same over a real archive or an in-memory
//! fixture.

use std::io::{Read, Seek};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerLimits {
    pub max_entries: usize,
    pub max_entry_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for ContainerLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_entry_bytes: 256 * 1024 * 1024,
            max_total_bytes: 512 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContainerError {
    #[error("[PBIDOCS_CONTAINER_001] I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("[PBIDOCS_CONTAINER_002] not a ZIP container")]
    NotZipContainer,
    #[error("[PBIDOCS_CONTAINER_003] the package is empty or corrupted")]
    Empty,
    #[error("[PBIDOCS_CONTAINER_004] archive has too many entries: {entries} (limit: {max_entries})")]
    TooManyEntries { entries: usize, max_entries: usize },
    #[error("[PBIDOCS_CONTAINER_005] entry '{name}' is too large: {size} bytes (limit: {limit} bytes)")]
    EntryTooLarge { name: String, size: u64, limit: u64 },
    #[error("[PBIDOCS_CONTAINER_006] total uncompressed size would exceed {limit} bytes")]
    TotalTooLarge { limit: u64 },
    #[error("[PBIDOCS_CONTAINER_007] failed to read entry '{name}': {reason}")]
    EntryRead { name: String, reason: String },
    #[error("[PBIDOCS_CONTAINER_008] entry not found in package: {name}")]
    EntryNotFound { name: String },
    #[error("[PBIDOCS_CONTAINER_009] invalid input '{path}': {reason}")]
    InvalidInput { path: String, reason: String },
}

impl ContainerError {
    pub fn code(&self) -> &'static str {
        match self {
            ContainerError::Io(_) => error_codes::CONTAINER_IO,
            ContainerError::NotZipContainer => error_codes::CONTAINER_NOT_ZIP,
            ContainerError::Empty => error_codes::CONTAINER_EMPTY,
            ContainerError::TooManyEntries { .. } => error_codes::CONTAINER_TOO_MANY_ENTRIES,
            ContainerError::EntryTooLarge { .. } => error_codes::CONTAINER_ENTRY_TOO_LARGE,
            ContainerError::TotalTooLarge { .. } => error_codes::CONTAINER_TOTAL_TOO_LARGE,
            ContainerError::EntryRead { .. } => error_codes::CONTAINER_ENTRY_READ,
            ContainerError::EntryNotFound { .. } => error_codes::CONTAINER_ENTRY_NOT_FOUND,
            ContainerError::InvalidInput { .. } => error_codes::CONTAINER_BAD_INPUT,
        }
    }
}

/// A source of named byte entries.
pub trait Container {
    /// Entry names in archive order.
    fn entry_names(&self) -> Vec<String>;

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ContainerError>;
}

pub(crate) trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

pub struct ZipContainer {
    archive: ZipArchive<Box<dyn ReadSeek>>,
    limits: ContainerLimits,
    total_read: u64,
}

impl ZipContainer {
    pub fn open_from_reader<R: Read + Seek + 'static>(
        reader: R,
    ) -> Result<ZipContainer, ContainerError> {
        Self::open_from_reader_with_limits(reader, ContainerLimits::default())
    }

    pub fn open_from_reader_with_limits<R: Read + Seek + 'static>(
        reader: R,
        limits: ContainerLimits,
    ) -> Result<ZipContainer, ContainerError> {
        let reader: Box<dyn ReadSeek> = Box::new(reader);
        let archive = ZipArchive::new(reader).map_err(|err| match err {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                ContainerError::NotZipContainer
            }
            ZipError::Io(e) => ContainerError::Io(e),
            other => ContainerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        })?;

        if archive.len() == 0 {
            return Err(ContainerError::Empty);
        }
        if archive.len() > limits.max_entries {
            return Err(ContainerError::TooManyEntries {
                entries: archive.len(),
                max_entries: limits.max_entries,
            });
        }

        Ok(ZipContainer {
            archive,
            limits,
            total_read: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Container for ZipContainer {
    fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ContainerError> {
        let size = {
            let file = self.archive.by_name(name).map_err(|e| match e {
                ZipError::FileNotFound => ContainerError::EntryNotFound {
                    name: name.to_string(),
                },
                other => ContainerError::EntryRead {
                    name: name.to_string(),
                    reason: other.to_string(),
                },
            })?;
            file.size()
        };

        if size > self.limits.max_entry_bytes {
            return Err(ContainerError::EntryTooLarge {
                name: name.to_string(),
                size,
                limit: self.limits.max_entry_bytes,
            });
        }

        let new_total = self.total_read.saturating_add(size);
        if new_total > self.limits.max_total_bytes {
            return Err(ContainerError::TotalTooLarge {
                limit: self.limits.max_total_bytes,
            });
        }

        let mut file = self
            .archive
            .by_name(name)
            .map_err(|e| ContainerError::EntryRead {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| ContainerError::EntryRead {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.total_read = new_total;
        Ok(buf)
    }
}

/// An ordered, in-memory set of entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    entries: Vec<(String, Vec<u8>)>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.push(name, bytes);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.push((name.into(), bytes.into()));
    }
}

impl Container for MemoryContainer {
    fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ContainerError> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ContainerError::EntryNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(feature = "std-fs")]
const SUPPORTED_EXTENSIONS: &[&str] = &["pbit", "pbix"];

/// Validates `path` as a package file and opens it.
#[cfg(feature = "std-fs")]
pub fn open_container(
    path: impl AsRef<std::path::Path>,
    limits: ContainerLimits,
) -> Result<ZipContainer, ContainerError> {
    let path = path.as_ref();
    let invalid = |reason: &str| ContainerError::InvalidInput {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if !path.exists() {
        return Err(invalid("file does not exist"));
    }
    if !path.is_file() {
        return Err(invalid("path is not a file"));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid(&format!(
            "only .pbit and .pbix packages are supported (got '{}')",
            extension
        )));
    }

    if std::fs::metadata(path)?.len() == 0 {
        return Err(invalid("file is empty"));
    }

    let file = std::fs::File::open(path)?;
    ZipContainer::open_from_reader_with_limits(file, limits)
}
