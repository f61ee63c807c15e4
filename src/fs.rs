//! The per-mount session: archive index plus body cache.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::archive::{ArchiveIndex, Container, EntryStat};
use crate::cache::{BodyCache, DEFAULT_CACHE_CAPACITY};
use crate::enumerate::{ChildStat, Children, enumerate};
use crate::error::{ArchiveError, FsError};
use crate::io::{ArchiveBytes, ByteSource};
use crate::resolver::{ResolvedNode, locate};
use crate::zip::ZipContainer;

/// Tunables for one mount.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Number of decompressed bodies kept in memory.
    pub cache_capacity: usize,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// A mounted archive.
///
/// Owns the archive for its whole lifetime and is safe to share between
/// threads: the archive bytes are immutable and the cache locks per
/// operation.
pub struct ZipFs<C = ZipContainer> {
    archive: ArchiveIndex<C>,
    cache: BodyCache,
}

impl ZipFs<ZipContainer> {
    /// Index a ZIP archive and set up its body cache.
    pub fn open(bytes: ArchiveBytes, options: &MountOptions) -> Result<Self, ArchiveError> {
        Self::from_source(bytes, options)
    }
}

impl<S: ByteSource> ZipFs<ZipContainer<S>> {
    /// Index a ZIP archive read through `source`, such as a
    /// [`RemoteSource`](crate::io::RemoteSource).
    pub fn from_source(source: S, options: &MountOptions) -> Result<Self, ArchiveError> {
        Ok(Self::new(ArchiveIndex::from_source(source)?, options))
    }
}

impl<C: Container> ZipFs<C> {
    pub fn new(archive: ArchiveIndex<C>, options: &MountOptions) -> Self {
        Self {
            archive,
            cache: BodyCache::new(options.cache_capacity),
        }
    }

    pub fn archive(&self) -> &ArchiveIndex<C> {
        &self.archive
    }

    pub fn cache(&self) -> &BodyCache {
        &self.cache
    }

    pub fn locate(&self, path: &str) -> ResolvedNode {
        locate(&self.archive, path)
    }

    pub fn stat_at(&self, index: usize) -> Result<EntryStat, ArchiveError> {
        self.archive.stat_at(index)
    }

    /// Index of the explicit `path/` marker behind a directory `path`
    /// resolved to, if the archive stores one.
    ///
    /// The resolver points a marked directory at the slot after its marker.
    pub fn directory_marker(&self, path: &str, node: ResolvedNode) -> Option<usize> {
        let ResolvedNode::SyntheticDirectory { first_child } = node else {
            return None;
        };
        let marker = first_child.checked_sub(1)?;
        let stored = self.archive.path_at(marker)?.strip_suffix('/')?;
        (stored == path.trim_matches('/')).then_some(marker)
    }

    /// Resolve `path` and iterate its direct children.
    pub fn children(&self, path: &str) -> Result<Children<'_, C>, FsError> {
        enumerate(&self.archive, self.locate(path), path)
    }

    /// Callback form of [`children`](Self::children).
    pub fn enumerate(&self, path: &str, mut visit: impl FnMut(ChildStat)) -> Result<(), FsError> {
        for child in self.children(path)? {
            visit(child?);
        }
        Ok(())
    }

    /// Read up to `length` bytes of entry `index` starting at `offset`.
    ///
    /// The range is clamped to the body; a request entirely past the end
    /// returns no bytes.
    pub fn read(&self, index: usize, offset: u64, length: usize) -> Result<Vec<u8>, ArchiveError> {
        let body = self.body(index)?;
        let len = body.len() as u64;
        let start = offset.min(len) as usize;
        let end = offset.saturating_add(length as u64).min(len) as usize;
        Ok(body[start..end].to_vec())
    }

    /// Full decompressed body of entry `index`, through the cache.
    #[instrument(level = "debug", skip(self))]
    pub fn body(&self, index: usize) -> Result<Arc<[u8]>, ArchiveError> {
        if let Some(body) = self.cache.get(index) {
            return Ok(body);
        }

        let stat = self.archive.stat_at(index)?;
        debug!(path = %stat.path, size = stat.size, "cache miss");

        let body: Arc<[u8]> = self.archive.decompress(index)?.into();
        self.cache.insert(index, Arc::clone(&body));
        Ok(body)
    }
}
