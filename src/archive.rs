//! The archive index: a flat, immutable entry table.
//!
//! [`ArchiveIndex`] owns a [`Container`] (the decoder for one concrete
//! archive format) and is the only thing the resolver, enumerator and read
//! path talk to. It never synthesizes directories; it answers questions about
//! stored entries by index.

use crate::error::ArchiveError;
use crate::io::{ArchiveBytes, ByteSource};
use crate::zip::ZipContainer;

/// Metadata for one stored entry.
///
/// Regenerated on every call; only decompressed bodies are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub path: String,
    pub size: u64,
    /// Seconds since the Unix epoch.
    pub mtime: i64,
    pub is_directory: bool,
}

/// Capabilities an archive decoder provides to the index.
///
/// Implementations must present entries in an order where every set of paths
/// sharing a prefix is contiguous (byte-lexicographic order satisfies this),
/// and indices must never change once the container is built.
pub trait Container: Send + Sync {
    fn entry_count(&self) -> usize;

    /// Stored path of entry `index`, borrowed.
    fn path(&self, index: usize) -> Option<&str>;

    fn stat_by_index(&self, index: usize) -> Result<EntryStat, ArchiveError>;

    /// Index of the entry whose path is exactly `path` (case-sensitive).
    fn find_exact(&self, path: &str) -> Option<usize>;

    /// Index of some entry whose path starts with `prefix`.
    ///
    /// Need not be the first of the run; callers walk back to find it.
    fn find_directory_prefix(&self, prefix: &str) -> Option<usize>;

    /// Decompress the full body of entry `index`.
    fn inflate(&self, index: usize) -> Result<Vec<u8>, ArchiveError>;
}

/// Exclusive owner of an opened archive.
pub struct ArchiveIndex<C = ZipContainer> {
    container: C,
}

impl ArchiveIndex<ZipContainer> {
    /// Parse a ZIP archive's central directory.
    ///
    /// Fails with [`ArchiveError::CorruptHeader`] if the bytes are not a
    /// readable ZIP container.
    pub fn open(bytes: impl Into<ArchiveBytes>) -> Result<Self, ArchiveError> {
        Self::from_source(bytes.into())
    }
}

impl<S: ByteSource> ArchiveIndex<ZipContainer<S>> {
    /// Parse the central directory of a ZIP archive read through `source`.
    pub fn from_source(source: S) -> Result<Self, ArchiveError> {
        Ok(Self::new(ZipContainer::parse(source)?))
    }
}

impl<C: Container> ArchiveIndex<C> {
    pub fn new(container: C) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn entry_count(&self) -> usize {
        self.container.entry_count()
    }

    pub fn stat_at(&self, index: usize) -> Result<EntryStat, ArchiveError> {
        self.check(index)?;
        self.container.stat_by_index(index)
    }

    /// Borrowed path of entry `index`, `None` when out of range.
    pub fn path_at(&self, index: usize) -> Option<&str> {
        self.container.path(index)
    }

    pub fn exact_locate(&self, path: &str) -> Option<usize> {
        self.container.find_exact(path)
    }

    pub fn prefix_locate(&self, prefix: &str) -> Option<usize> {
        self.container.find_directory_prefix(prefix)
    }

    pub fn decompress(&self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        self.check(index)?;
        self.container.inflate(index)
    }

    fn check(&self, index: usize) -> Result<(), ArchiveError> {
        let count = self.entry_count();
        if index < count {
            Ok(())
        } else {
            Err(ArchiveError::IndexOutOfRange { index, count })
        }
    }
}

/// In-memory container for exercising the resolver and enumerator without
/// building real archives.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub struct MemoryContainer {
        entries: Vec<(String, Vec<u8>)>,
    }

    impl MemoryContainer {
        /// Entries are sorted; names ending in `/` become directory markers.
        pub fn new(paths: &[&str]) -> Self {
            let mut entries: Vec<(String, Vec<u8>)> = paths
                .iter()
                .map(|p| (p.to_string(), p.as_bytes().to_vec()))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Self { entries }
        }
    }

    impl Container for MemoryContainer {
        fn entry_count(&self) -> usize {
            self.entries.len()
        }

        fn path(&self, index: usize) -> Option<&str> {
            self.entries.get(index).map(|(p, _)| p.as_str())
        }

        fn stat_by_index(&self, index: usize) -> Result<EntryStat, ArchiveError> {
            let (path, body) = &self.entries[index];
            let is_directory = path.ends_with('/');
            Ok(EntryStat {
                path: path.clone(),
                size: if is_directory { 0 } else { body.len() as u64 },
                mtime: index as i64 * 60,
                is_directory,
            })
        }

        fn find_exact(&self, path: &str) -> Option<usize> {
            self.entries.iter().position(|(p, _)| p == path)
        }

        // Deliberately returns the last match so callers must walk back.
        fn find_directory_prefix(&self, prefix: &str) -> Option<usize> {
            self.entries.iter().rposition(|(p, _)| p.starts_with(prefix))
        }

        fn inflate(&self, index: usize) -> Result<Vec<u8>, ArchiveError> {
            let (path, body) = &self.entries[index];
            Ok(if path.ends_with('/') { Vec::new() } else { body.clone() })
        }
    }

    pub fn index(paths: &[&str]) -> ArchiveIndex<MemoryContainer> {
        ArchiveIndex::new(MemoryContainer::new(paths))
    }
}
