use super::{DirEntry, FileSystem, FileType};
use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tree {
    nodes: BTreeMap<PathBuf, FileType>,
    unreadable: BTreeSet<PathBuf>,
}

impl Tree {
    fn insert(&mut self, path: PathBuf, file_type: FileType) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(FileType::Directory);
        }
        self.nodes.insert(path, file_type);
    }
}

/// In-memory experiment tree.
///
/// Relative paths are taken relative to the mock root. Entries can be added
/// through `&self`, so a step double can create the files a real program
/// would have written while the sweeper holds the file system.
pub struct MockFileSystem {
    root: PathBuf,
    tree: RwLock<Tree>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    /// Creates a mock whose root directory already exists.
    pub fn with_root(root: PathBuf) -> Self {
        let mut tree = Tree::default();
        tree.insert(root.clone(), FileType::Directory);
        Self {
            root,
            tree: RwLock::new(tree),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.write().insert(path, FileType::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.write().insert(path, FileType::Directory);
    }

    /// Makes `read_dir` on this path fail as if permission were denied.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.write().unreadable.insert(path);
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn lookup(&self, path: &Path) -> Option<FileType> {
        self.read().nodes.get(&self.resolve(path)).copied()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lookup(path).is_some_and(FileType::is_dir)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let dir = self.resolve(path);
        let tree = self.read();

        if tree.unreadable.contains(&dir) {
            bail!("Permission denied: {}", dir.display());
        }
        match tree.nodes.get(&dir) {
            Some(FileType::Directory) => {}
            Some(_) => bail!("Not a directory: {}", dir.display()),
            None => bail!("No such directory: {}", dir.display()),
        }

        Ok(tree
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(dir.as_path()))
            .filter_map(|(child, file_type)| {
                let name = child.file_name()?.to_string_lossy().into_owned();
                Some(DirEntry {
                    name,
                    path: child.clone(),
                    file_type: *file_type,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_add_file_creates_parents() {
        let fs = MockFileSystem::new();
        fs.add_file("exp1/plots/allplots.pdf");

        assert!(fs.is_dir(Path::new("/mock/exp1")));
        assert!(fs.is_dir(Path::new("/mock/exp1/plots")));
        assert!(fs.exists(Path::new("/mock/exp1/plots/allplots.pdf")));
        assert!(!fs.is_dir(Path::new("/mock/exp1/plots/allplots.pdf")));
    }

    #[test]
    fn test_root_exists_when_empty() {
        let fs = MockFileSystem::with_root(PathBuf::from("/data/experiments"));

        assert!(fs.is_dir(Path::new("/data/experiments")));
        assert!(fs.read_dir(fs.root()).unwrap().is_empty());
    }

    #[test]
    fn test_read_dir_lists_immediate_children_only() {
        let fs = MockFileSystem::new();
        fs.add_file("exp1/log.txt");
        fs.add_dir("exp2");
        fs.add_file("README");

        let entries = fs.read_dir(Path::new("/mock")).unwrap();
        assert_eq!(names(&entries), vec!["README", "exp1", "exp2"]);
        assert_eq!(entries[0].file_type, FileType::File);
        assert_eq!(entries[1].path, PathBuf::from("/mock/exp1"));
    }

    #[test]
    fn test_read_dir_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("README");
        fs.add_dir("locked");
        fs.deny_read("locked");

        assert!(fs.read_dir(Path::new("missing")).is_err());
        assert!(fs.read_dir(Path::new("README")).is_err());
        let err = fs.read_dir(Path::new("locked")).unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
    }
}
