use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

impl FileType {
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }
}

impl From<std::fs::FileType> for FileType {
    fn from(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            FileType::Symlink
        } else if file_type.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        }
    }
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub file_type: FileType,
}

/// Read-only view of the file system: enough to enumerate an experiment root
/// and probe marker files beneath each child.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate children of `path`, in no particular order
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Whether `marker` (a path relative to `dir`) is present
    fn has_marker(&self, dir: &Path, marker: &str) -> bool {
        self.exists(&dir.join(marker))
    }
}
