use super::{DirEntry, FileSystem};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Passes straight through to `std::fs`. Marker probes follow symlinks, so a
/// linked experiment directory behaves like a real one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
            .map(|entry| -> Result<DirEntry> {
                let entry = entry.with_context(|| {
                    format!("Failed to read an entry of {}", path.display())
                })?;
                let file_type = entry
                    .file_type()
                    .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

                Ok(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: entry.path(),
                    file_type: file_type.into(),
                })
            })
            .collect()
    }
}
