//! Archive collaborators
//!
//! Archives are flat collections of named entries. Entry names use `/`
//! separators regardless of platform and are relative to the archive root.
//!
//! - [`DirectoryArchive`]: an unpacked archive on disk
//! - [`MemoryArchive`]: an in-memory archive, ordered by insertion

use crate::error::ArchiveError;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Readable archive
pub trait ArchiveSource: Send + Sync {
    /// Entry names, in a stable order
    fn entries(&self) -> Vec<String>;

    /// Read an entry
    ///
    /// # Errors
    /// [`ArchiveError::MissingEntry`] if absent, or an IO failure.
    fn read(&self, name: &str) -> Result<Vec<u8>, ArchiveError>;
}

/// Writable archive
pub trait ArchiveSink {
    /// Write an entry, replacing any previous content
    ///
    /// # Errors
    /// [`ArchiveError::InvalidEntry`] for names escaping the root, or an IO failure.
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError>;

    /// Flush and close the archive
    ///
    /// # Errors
    /// IO failure while flushing.
    fn finish(&mut self) -> Result<(), ArchiveError> {
        Ok(())
    }
}

/// Copy every entry of `source` into `sink`, returning the entry count
///
/// # Errors
/// The first read or write failure.
pub fn copy_archive(source: &dyn ArchiveSource, sink: &mut dyn ArchiveSink) -> Result<usize, ArchiveError> {
    let entries = source.entries();
    for name in &entries {
        let bytes = source.read(name)?;
        sink.write(name, &bytes)?;
    }
    sink.finish()?;
    Ok(entries.len())
}

/// Archive unpacked into a directory
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    entries: Vec<String>,
}

impl DirectoryArchive {
    /// Open an existing directory, indexing every regular file below it
    ///
    /// # Errors
    /// IO failure while walking the directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        let mut entries = Vec::new();

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                ArchiveError::io_error(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&root)
                .map_err(|_| ArchiveError::InvalidEntry(entry.path().display().to_string()))?;
            entries.push(entry_name(relative)?);
        }

        tracing::debug!(root = %root.display(), entries = entries.len(), "directory archive opened");
        Ok(Self { root, entries })
    }

    /// Create an empty archive at `root`, removing whatever was there
    ///
    /// # Errors
    /// IO failure while clearing or creating the directory.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        if root.exists() {
            std::fs::remove_dir_all(&root).map_err(|e| ArchiveError::io_error(&root, e))?;
        }
        std::fs::create_dir_all(&root).map_err(|e| ArchiveError::io_error(&root, e))?;
        Ok(Self {
            root,
            entries: Vec::new(),
        })
    }

    /// Archive root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, ArchiveError> {
        let relative = Path::new(name);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !safe {
            return Err(ArchiveError::InvalidEntry(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn entry_name(relative: &Path) -> Result<String, ArchiveError> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| ArchiveError::InvalidEntry(relative.display().to_string()))?,
            ),
            _ => return Err(ArchiveError::InvalidEntry(relative.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}

impl ArchiveSource for DirectoryArchive {
    fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let path = self.path_of(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::MissingEntry(name.to_string()))
            }
            Err(e) => Err(ArchiveError::io_error(path, e)),
        }
    }
}

impl ArchiveSink for DirectoryArchive {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let path = self.path_of(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ArchiveError::io_error(parent, e))?;
        }
        std::fs::write(&path, bytes).map_err(|e| ArchiveError::io_error(&path, e))?;
        if !self.entries.iter().any(|e| e == name) {
            self.entries.push(name.to_string());
        }
        Ok(())
    }
}

/// In-memory archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryArchive {
    entries: IndexMap<String, Vec<u8>>,
}

impl MemoryArchive {
    /// Create empty archive
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an entry
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }

    /// Entry content
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveSource for MemoryArchive {
    fn entries(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ArchiveError::MissingEntry(name.to_string()))
    }
}

impl ArchiveSink for MemoryArchive {
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.entries.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn directory_round_trip() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let mut sink = DirectoryArchive::create(&root).unwrap();
        sink.write("a/A.class.json", b"{}").unwrap();
        sink.write("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n").unwrap();
        sink.finish().unwrap();

        let source = DirectoryArchive::open(&root).unwrap();
        assert_eq!(source.entries(), vec!["META-INF/MANIFEST.MF", "a/A.class.json"]);
        assert_eq!(source.read("a/A.class.json").unwrap(), b"{}");
        assert!(matches!(source.read("nope"), Err(ArchiveError::MissingEntry(_))));
    }

    #[test]
    fn create_clears_previous_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("stale.txt"), "old").unwrap();
        let archive = DirectoryArchive::create(dir.path()).unwrap();
        assert!(!archive.root().join("stale.txt").exists());
    }

    #[test]
    fn escaping_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectoryArchive::create(dir.path().join("x")).unwrap();
        assert!(matches!(
            sink.write("../evil", b""),
            Err(ArchiveError::InvalidEntry(_))
        ));
        assert!(matches!(sink.write("", b""), Err(ArchiveError::InvalidEntry(_))));
    }

    #[test]
    fn copy_preserves_order() {
        let source = MemoryArchive::new()
            .with_entry("b", "2")
            .with_entry("a", "1");
        let mut sink = MemoryArchive::new();
        assert_eq!(copy_archive(&source, &mut sink).unwrap(), 2);
        assert_eq!(sink, source);
        assert_eq!(sink.get("a"), Some(&b"1"[..]));
    }
}
