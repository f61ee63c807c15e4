//! Listing the direct children of a directory.
//!
//! Children are found by a single forward scan over the sorted entry table,
//! starting at the position the resolver produced. Any entry nested more
//! than one level below the directory is collapsed into a single child
//! directory named after its first segment, and the rest of that subtree is
//! skipped without being emitted.

use crate::archive::{ArchiveIndex, Container};
use crate::error::{ArchiveError, FsError};
use crate::resolver::ResolvedNode;

/// One direct child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildStat {
    /// Single path segment, relative to the listed directory.
    pub name: String,
    pub size: u64,
    pub mtime: i64,
    pub is_directory: bool,
}

/// Start listing the directory `node` that `base_path` resolved to.
///
/// Fails with [`FsError::NotFound`] for an unresolved node and
/// [`FsError::NotADirectory`] for a stored file.
pub fn enumerate<'a, C: Container>(
    archive: &'a ArchiveIndex<C>,
    node: ResolvedNode,
    base_path: &str,
) -> Result<Children<'a, C>, FsError> {
    let start = match node {
        ResolvedNode::NotFound => return Err(FsError::NotFound),
        ResolvedNode::SyntheticDirectory { first_child } => first_child,
        ResolvedNode::RealEntry(index) => {
            if !archive.stat_at(index)?.is_directory {
                return Err(FsError::NotADirectory);
            }
            index + 1
        }
    };

    let base = base_path.trim_matches('/');
    let prefix = if base.is_empty() {
        String::new()
    } else {
        format!("{base}/")
    };

    Ok(Children {
        archive,
        prefix,
        cursor: start,
        end: archive.entry_count(),
    })
}

/// Lazy, one-shot iterator over a directory's direct children.
///
/// Each stored entry is looked at no more than twice: once by the outer scan
/// and at most once more by a subtree skip.
pub struct Children<'a, C> {
    archive: &'a ArchiveIndex<C>,
    /// `base/`, or empty for the root.
    prefix: String,
    cursor: usize,
    end: usize,
}

impl<C: Container> Iterator for Children<'_, C> {
    type Item = Result<ChildStat, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let index = self.cursor;
            let path = self.archive.path_at(index)?;

            // End of this directory's contiguous run.
            let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
                self.cursor = self.end;
                return None;
            };

            let Some((segment, _)) = rest.split_once('/') else {
                self.cursor += 1;
                // Empty remainder: the directory's own marker.
                if rest.is_empty() {
                    continue;
                }
                return Some(self.archive.stat_at(index).map(|stat| ChildStat {
                    name: rest.to_string(),
                    size: stat.size,
                    mtime: stat.mtime,
                    is_directory: stat.is_directory,
                }));
            };

            let subtree = &path[..self.prefix.len() + segment.len() + 1];

            // An explicit marker sorts first in its run and carries a mtime.
            let mtime = if path.len() == subtree.len() {
                match self.archive.stat_at(index) {
                    Ok(stat) => stat.mtime,
                    Err(e) => {
                        self.cursor += 1;
                        return Some(Err(e));
                    }
                }
            } else {
                0
            };

            self.cursor += 1;
            while self.cursor < self.end
                && self
                    .archive
                    .path_at(self.cursor)
                    .is_some_and(|p| p.starts_with(subtree))
            {
                self.cursor += 1;
            }

            // `base//x` has no name to show.
            if segment.is_empty() {
                continue;
            }

            return Some(Ok(ChildStat {
                name: segment.to_string(),
                size: 0,
                mtime,
                is_directory: true,
            }));
        }

        None
    }
}
