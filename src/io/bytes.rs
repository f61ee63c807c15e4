use std::borrow::Cow;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

use super::ByteSource;
use crate::error::ArchiveError;

/// The archive image a mount is served from.
///
/// Local archives are memory-mapped so only the central directory and the
/// entries actually read are paged in. Archives already in memory are held
/// as an owned buffer.
pub enum ArchiveBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ArchiveBytes {
    /// Map a local archive file read-only.
    pub fn map_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open archive '{}'", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat archive '{}'", path.display()))?
            .len();

        // Zero-length mappings are rejected on some platforms.
        if len == 0 {
            return Ok(ArchiveBytes::Owned(Vec::new()));
        }

        // The archive is treated as immutable for the lifetime of the mount.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("map archive '{}'", path.display()))?;
        Ok(ArchiveBytes::Mapped(mmap))
    }
}

impl Deref for ArchiveBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            ArchiveBytes::Mapped(mmap) => mmap,
            ArchiveBytes::Owned(data) => data,
        }
    }
}

impl ByteSource for ArchiveBytes {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_range(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>, ArchiveError> {
        usize::try_from(offset)
            .ok()
            .and_then(|start| self.get(start..start.checked_add(len)?))
            .map(Cow::Borrowed)
            .ok_or_else(|| {
                ArchiveError::corrupt(format!("range {offset}+{len} is outside the archive"))
            })
    }
}

impl From<Vec<u8>> for ArchiveBytes {
    fn from(data: Vec<u8>) -> Self {
        ArchiveBytes::Owned(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK archive bytes").unwrap();
        file.flush().unwrap();

        let bytes = ArchiveBytes::map_file(file.path()).unwrap();
        assert!(matches!(bytes, ArchiveBytes::Mapped(_)));
        assert_eq!(&bytes[..], b"PK archive bytes");
    }

    #[test]
    fn empty_file_is_owned() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let bytes = ArchiveBytes::map_file(file.path()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn ranges_borrow_from_the_image() {
        let bytes = ArchiveBytes::from(b"0123456789".to_vec());
        let range = bytes.read_range(3, 4).unwrap();
        assert!(matches!(range, Cow::Borrowed(b"3456")));
        assert!(bytes.read_range(8, 4).is_err());
        assert!(bytes.read_range(u64::MAX, 1).is_err());
        assert_eq!(ByteSource::size(&bytes), 10);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ArchiveBytes::map_file(Path::new("/nonexistent/archive.zip"))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("archive.zip"));
    }
}
