/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source loading for templates, data files and schemas.
//!
//! All file access of the component pipeline goes through [`SourceLoader`],
//! so the pipeline can run against the filesystem or against in-memory
//! sources in tests.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Trait for reading component sources.
///
/// A missing file must be reported as an error of kind
/// [`io::ErrorKind::NotFound`]; callers distinguish "absent" from
/// "unreadable" on that kind.
pub trait SourceLoader: Send + Sync {
    /// Read the entire file as bytes.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read the file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            )
        })
    }
}

/// Loader that reads from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader;

impl SourceLoader for FileSystemLoader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Loader that serves files from an in-memory map.
///
/// Useful for testing and for components bundled into the application.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryLoader {
    /// Create a new empty memory loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the loader.
    pub fn add(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Create a loader with the given files.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut loader = Self::new();
        for (path, content) in files {
            loader.add(path, content);
        }
        loader
    }
}

impl SourceLoader for MemoryLoader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::with_files([("/c/a.hbs", "a"), ("/c/b.hbs", "b")]);
        assert_eq!(loader.read_to_string(Path::new("/c/a.hbs")).unwrap(), "a");
        assert_eq!(loader.read(Path::new("/c/b.hbs")).unwrap(), b"b".to_vec());
    }

    #[test]
    fn test_memory_loader_missing_is_not_found() {
        let loader = MemoryLoader::new();
        let err = loader.read(Path::new("/missing.hbs")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut loader = MemoryLoader::new();
        loader.add("/bad.json", vec![0xff, 0xfe]);
        let err = loader.read_to_string(Path::new("/bad.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_filesystem_loader_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSystemLoader
            .read(&dir.path().join("nope.hbs"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
