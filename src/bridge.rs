//! Host filesystem bridge adapter.
//!
//! Drivers such as Dokan, WinFsp or FUSE call back into the program with a
//! path and expect host-shaped answers. This module turns those calls into
//! [`ZipFs`] operations: it normalizes bridge paths, applies the create
//! disposition rules of a write-protected volume, and converts metadata via
//! [`HostStat`]. Driver registration and mount-point lifecycle stay with the
//! caller.

use tracing::debug;

use crate::archive::Container;
use crate::enumerate::enumerate;
use crate::error::FsError;
use crate::fs::ZipFs;
use crate::resolver::ResolvedNode;
use crate::time::HostStat;

/// What the caller wants to happen when opening a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    /// Open an existing file; fail if missing.
    Open,
    /// Create a new file; fail if it exists.
    CreateNew,
    /// Open if present, create otherwise.
    OpenAlways,
    /// Create or overwrite.
    CreateAlways,
    /// Open and truncate an existing file.
    TruncateExisting,
}

impl CreateDisposition {
    /// Whether this disposition would create a file that is missing.
    fn creates(self) -> bool {
        matches!(
            self,
            CreateDisposition::CreateNew | CreateDisposition::OpenAlways | CreateDisposition::CreateAlways
        )
    }

    /// Whether this disposition would modify an existing file.
    fn overwrites(self) -> bool {
        matches!(
            self,
            CreateDisposition::CreateAlways | CreateDisposition::TruncateExisting
        )
    }
}

/// Per-open context handed back to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenHandle {
    Directory { path: String, node: ResolvedNode },
    File { path: String, index: usize },
}

impl OpenHandle {
    pub fn is_directory(&self) -> bool {
        matches!(self, OpenHandle::Directory { .. })
    }

    pub fn path(&self) -> &str {
        match self {
            OpenHandle::Directory { path, .. } | OpenHandle::File { path, .. } => path,
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindData {
    pub name: String,
    pub stat: HostStat,
}

/// Normalize a bridge path: `\` becomes `/`, surrounding slashes go.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

impl<C: Container> ZipFs<C> {
    /// Open `path` the way a driver's create callback would.
    pub fn create_file(&self, path: &str, disposition: CreateDisposition) -> Result<OpenHandle, FsError> {
        let path = normalize_path(path);
        let node = self.locate(&path);

        let is_directory = match node {
            ResolvedNode::NotFound => {
                debug!(%path, ?disposition, "open of missing path");
                return Err(if disposition.creates() {
                    FsError::AccessDenied
                } else {
                    FsError::NotFound
                });
            }
            ResolvedNode::SyntheticDirectory { .. } => true,
            ResolvedNode::RealEntry(index) => self.stat_at(index)?.is_directory,
        };

        if disposition == CreateDisposition::CreateNew {
            return Err(FsError::FileExists);
        }

        if is_directory {
            if disposition == CreateDisposition::OpenAlways {
                return Err(FsError::NameCollision);
            }
            if disposition.overwrites() {
                return Err(FsError::AccessDenied);
            }
            return Ok(OpenHandle::Directory { path, node });
        }

        if disposition.overwrites() {
            return Err(FsError::AccessDenied);
        }

        match node {
            ResolvedNode::RealEntry(index) => Ok(OpenHandle::File { path, index }),
            _ => Err(FsError::NotFound),
        }
    }

    /// Metadata for an open handle.
    pub fn file_information(&self, handle: &OpenHandle) -> Result<HostStat, FsError> {
        match handle {
            OpenHandle::Directory {
                node: ResolvedNode::RealEntry(index),
                ..
            } => {
                let stat = self.stat_at(*index)?;
                Ok(HostStat::new(true, 0, stat.mtime))
            }
            OpenHandle::Directory { path, node } => match self.directory_marker(path, *node) {
                // Same timestamp the parent's listing shows for this directory.
                Some(marker) => Ok(HostStat::new(true, 0, self.stat_at(marker)?.mtime)),
                None => Ok(HostStat::directory()),
            },
            OpenHandle::File { index, .. } => {
                let stat = self.stat_at(*index)?;
                Ok(HostStat::new(stat.is_directory, stat.size, stat.mtime))
            }
        }
    }

    /// List a directory handle, one [`FindData`] per direct child.
    pub fn find_files(&self, handle: &OpenHandle, mut visit: impl FnMut(FindData)) -> Result<(), FsError> {
        let OpenHandle::Directory { path, node } = handle else {
            return Err(FsError::NotADirectory);
        };

        for child in enumerate(self.archive(), *node, path)? {
            let child = child?;
            visit(FindData {
                stat: HostStat::new(child.is_directory, child.size, child.mtime),
                name: child.name,
            });
        }
        Ok(())
    }

    /// Copy bytes at `offset` into `buf`, returning how many were copied.
    pub fn read_file(&self, handle: &OpenHandle, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let OpenHandle::File { index, .. } = handle else {
            return Err(FsError::IsADirectory);
        };

        let bytes = self.read(*index, offset, buf.len())?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}
