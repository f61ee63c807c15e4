//! Path resolution over the flat entry table.
//!
//! ZIP archives store files and, optionally, explicit directory markers
//! (`dir/`). Most directories exist only as a common prefix of their
//! descendants, so resolving a path may yield a *synthetic* directory: a
//! position in the sorted table where its children start, with no stored
//! entry of its own.

use tracing::debug;

use crate::archive::{ArchiveIndex, Container};

/// Result of resolving a path against the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedNode {
    NotFound,
    /// A stored entry. Whether it is a file or a directory comes from
    /// [`ArchiveIndex::stat_at`].
    RealEntry(usize),
    /// A directory with no stored entry. Children are scanned starting at
    /// `first_child`, which may be past the end of the table (empty
    /// directory).
    SyntheticDirectory { first_child: usize },
}

impl ResolvedNode {
    /// The archive root: scan from the first entry, no self entry to skip.
    pub const ROOT: ResolvedNode = ResolvedNode::SyntheticDirectory { first_child: 0 };

    pub fn is_found(&self) -> bool {
        !matches!(self, ResolvedNode::NotFound)
    }
}

/// Resolve `path` (forward-slash separated; leading and trailing `/` are
/// ignored).
///
/// Resolution order: root, exact entry, explicit directory marker, then the
/// first entry of the contiguous run under `path/`.
///
/// A path stored as a file that is also the prefix of other entries (`a` and
/// `a/b` in the same archive) resolves to the file. ZIP does not forbid this,
/// and the file lookup runs first.
pub fn locate<C: Container>(archive: &ArchiveIndex<C>, path: &str) -> ResolvedNode {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return ResolvedNode::ROOT;
    }

    if let Some(index) = archive.exact_locate(path) {
        debug!(path, index, "resolved to stored entry");
        return ResolvedNode::RealEntry(index);
    }

    let prefix = format!("{path}/");

    if let Some(index) = archive.exact_locate(&prefix) {
        debug!(path, marker = index, "resolved to directory marker");
        return ResolvedNode::SyntheticDirectory {
            first_child: index + 1,
        };
    }

    let Some(mut first) = archive.prefix_locate(&prefix) else {
        debug!(path, "no entry or prefix match");
        return ResolvedNode::NotFound;
    };

    while first > 0
        && archive
            .path_at(first - 1)
            .is_some_and(|p| p.starts_with(&prefix))
    {
        first -= 1;
    }

    debug!(path, first_child = first, "resolved to implicit directory");
    ResolvedNode::SyntheticDirectory { first_child: first }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::index;

    #[test]
    fn root_forms() {
        let archive = index(&["a.txt"]);
        assert_eq!(locate(&archive, ""), ResolvedNode::ROOT);
        assert_eq!(locate(&archive, "/"), ResolvedNode::ROOT);
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let archive = index(&["dir/b.txt", "marked/"]);
        assert_eq!(locate(&archive, "dir/"), locate(&archive, "dir"));
        assert_eq!(
            locate(&archive, "/dir/"),
            ResolvedNode::SyntheticDirectory { first_child: 0 }
        );
        assert_eq!(
            locate(&archive, "marked/"),
            ResolvedNode::SyntheticDirectory { first_child: 2 }
        );
    }

    #[test]
    fn exact_file_match() {
        let archive = index(&["a.txt", "dir/b.txt"]);
        assert_eq!(locate(&archive, "a.txt"), ResolvedNode::RealEntry(0));
        assert_eq!(locate(&archive, "/dir/b.txt"), ResolvedNode::RealEntry(1));
    }

    #[test]
    fn implicit_directory_seeds_first_descendant() {
        // Sorted: a.txt, dir/b.txt, dir/sub/c.txt, dir/z.txt
        let archive = index(&["dir/z.txt", "a.txt", "dir/sub/c.txt", "dir/b.txt"]);
        assert_eq!(
            locate(&archive, "dir"),
            ResolvedNode::SyntheticDirectory { first_child: 1 }
        );
        assert_eq!(
            locate(&archive, "dir/sub"),
            ResolvedNode::SyntheticDirectory { first_child: 2 }
        );
    }

    #[test]
    fn marker_directory_skips_itself() {
        let archive = index(&["empty/", "z.txt"]);
        assert_eq!(
            locate(&archive, "empty"),
            ResolvedNode::SyntheticDirectory { first_child: 1 }
        );
    }

    #[test]
    fn marker_at_end_points_past_table() {
        let archive = index(&["a.txt", "zz/"]);
        assert_eq!(
            locate(&archive, "zz"),
            ResolvedNode::SyntheticDirectory { first_child: 2 }
        );
    }

    #[test]
    fn missing_path() {
        let archive = index(&["a.txt", "dir/b.txt"]);
        assert_eq!(locate(&archive, "missing"), ResolvedNode::NotFound);
        assert!(!locate(&archive, "di").is_found());
        assert!(!locate(&archive, "dir/b").is_found());
    }

    #[test]
    fn sibling_with_shared_stem_is_not_a_child() {
        // "dir-x/f" sorts between "dir" and "dir/…" and must not be picked up.
        let archive = index(&["dir-x/f", "dir/a"]);
        assert_eq!(
            locate(&archive, "dir"),
            ResolvedNode::SyntheticDirectory { first_child: 1 }
        );
    }

    #[test]
    fn file_wins_over_prefix() {
        let archive = index(&["a", "a/b"]);
        assert_eq!(locate(&archive, "a"), ResolvedNode::RealEntry(0));
    }
}
