//! Handing finished artifacts to the host.
//!
//! In the browser this is a download; here it is a trait so the CLI can write
//! files and tests can collect artifacts in memory.

use crate::artifact::Artifact;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub trait Delivery {
    /// Hand one artifact over. Returns once the host has it.
    fn deliver(&mut self, artifact: &Artifact) -> io::Result<()>;
}

/// Writes artifacts into a directory, like a browser's download folder.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    target_dir: PathBuf,
    force: bool,
}

impl DirectoryDelivery {
    pub fn new(target_dir: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            target_dir: target_dir.into(),
            force,
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&mut self, artifact: &Artifact) -> io::Result<()> {
        fs::create_dir_all(&self.target_dir)?;
        let path = self.target_dir.join(&artifact.name);
        if !self.force && path.try_exists()? {
            return Err(already_exists(&path));
        }

        // Readers of the directory never see a half-written artifact.
        let mut tmp = NamedTempFile::new_in(&self.target_dir)?;
        tmp.write_all(&artifact.data)?;
        tmp.flush()?;
        place(tmp, &path, self.force)?;

        info!(
            kind = %artifact.kind,
            mime = artifact.mime_type(),
            bytes = artifact.data.len(),
            path = %path.display(),
            "delivered artifact"
        );
        Ok(())
    }
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists (use --force to overwrite)", path.display()),
    )
}

/// Move a finished temp file to `path`. Without `force` an existing file at
/// `path` is left alone, even one that appeared after the earlier check.
fn place(tmp: NamedTempFile, path: &Path, force: bool) -> io::Result<()> {
    if force {
        tmp.persist(path).map_err(|e| e.error)?;
        return Ok(());
    }
    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(already_exists(path)),
        Err(e) => Err(e.error),
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    pub delivered: Vec<Artifact>,
}

impl Delivery for MemoryDelivery {
    fn deliver(&mut self, artifact: &Artifact) -> io::Result<()> {
        self.delivered.push(artifact.clone());
        Ok(())
    }
}
