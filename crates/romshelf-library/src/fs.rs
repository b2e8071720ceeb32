//! Filesystem access used by sources, the reconciler and local scraping

use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Filesystem operations the engine needs
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Every file below `root`, any depth
    fn list_recursive(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Files directly inside `root`
    fn list_shallow(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    /// Skip hidden files/directories
    pub skip_hidden: bool,
    /// Follow symbolic links while walking
    pub follow_links: bool,
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            follow_links: false,
        }
    }
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
    }

    fn walk(&self, root: &Path, max_depth: Option<usize>) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }

        let mut walker = WalkDir::new(root).follow_links(self.follow_links);
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| !(self.skip_hidden && Self::is_hidden(e)))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_recursive(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        self.walk(root, None)
    }

    fn list_shallow(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        self.walk(root, Some(1))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("a.zip"), b"a").unwrap();
        fs::write(dir.path().join(".secret.zip"), b"s").unwrap();
        fs::write(dir.path().join("sub/b.zip"), b"b").unwrap();
        fs::write(dir.path().join("sub/deeper/c.zip"), b"c").unwrap();
        fs::write(dir.path().join(".hidden/d.zip"), b"d").unwrap();
        dir
    }

    #[test]
    fn test_list_recursive_skips_hidden() {
        let dir = tree();
        let fs = LocalFileSystem::new();

        let mut files = fs.list_recursive(dir.path()).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                dir.path().join("a.zip"),
                dir.path().join("sub/b.zip"),
                dir.path().join("sub/deeper/c.zip"),
            ]
        );
    }

    #[test]
    fn test_list_shallow() {
        let dir = tree();
        let fs = LocalFileSystem::new();

        let files = fs.list_shallow(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.zip")]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let fs = LocalFileSystem::new();
        assert!(fs.list_recursive(Path::new("/nonexistent/romshelf")).is_err());
    }
}
