//! Error types for the export library.
//!
//! Naming, sanitizing and checksumming are total and never fail. What can fail is
//! fitting an archive into the classic (non-ZIP64) format, reading the page
//! capture, rendering markdown and handing artifacts to the host.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// A ZIP header field with a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipField {
    EntryCount,
    NameLength,
    EntrySize,
    LocalHeaderOffset,
    CentralDirectorySize,
    CentralDirectoryOffset,
}

impl fmt::Display for ZipField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EntryCount => "entry count",
            Self::NameLength => "file name length",
            Self::EntrySize => "entry size",
            Self::LocalHeaderOffset => "local header offset",
            Self::CentralDirectorySize => "central directory size",
            Self::CentralDirectoryOffset => "central directory offset",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A value does not fit its ZIP field; ZIP64 is not written.
    #[error("archive too large: {field} {actual} exceeds the limit of {limit}")]
    ArchiveTooLarge {
        field: ZipField,
        actual: u64,
        limit: u64,
    },

    /// The host could not take an artifact. Earlier artifacts stay delivered.
    #[error("failed to deliver '{artifact}': {source}")]
    Delivery {
        artifact: String,
        delivered: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read page capture '{path}': {source}")]
    CaptureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse page capture: {0}")]
    CaptureParse(#[from] serde_json::Error),

    #[error("failed to render conversation markdown: {0}")]
    Render(#[source] std::io::Error),
}

impl Error {
    pub fn archive_too_large(field: ZipField, actual: u64, limit: u64) -> Self {
        Self::ArchiveTooLarge {
            field,
            actual,
            limit,
        }
    }

    pub fn capture_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CaptureRead {
            path: path.into(),
            source,
        }
    }
}
