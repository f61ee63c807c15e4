use std::io::Read;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use tracing::{debug, info};

use crate::archive::{Container, EntryStat};
use crate::error::ArchiveError;
use crate::io::{ArchiveBytes, ByteSource};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// A parsed ZIP archive: its byte source plus its central directory, sorted
/// by path.
///
/// Sorting once at open time makes every set of entries sharing a path
/// prefix contiguous, which is what exact and prefix lookups (and the
/// directory scans built on them) rely on. The sort is stable, so duplicate
/// names keep their central directory order and lookups find the first.
pub struct ZipContainer<S = ArchiveBytes> {
    source: S,
    entries: Vec<ZipFileEntry>,
}

impl<S: ByteSource> ZipContainer<S> {
    /// Read the central directory. Entry data stays in `source` until it
    /// is inflated.
    pub fn parse(source: S) -> Result<Self, ArchiveError> {
        let mut entries = ZipParser::new(&source).list_files()?;
        entries.sort_by(|a, b| a.file_name.as_bytes().cmp(b.file_name.as_bytes()));

        info!(
            entries = entries.len(),
            bytes = source.size(),
            "indexed ZIP central directory"
        );

        Ok(Self { source, entries })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Central directory record at `index` (sorted order).
    pub fn entry(&self, index: usize) -> Option<&ZipFileEntry> {
        self.entries.get(index)
    }

    /// First index whose name is not less than `key`.
    fn lower_bound(&self, key: &str) -> usize {
        self.entries
            .partition_point(|e| e.file_name.as_bytes() < key.as_bytes())
    }

    fn entry_or_err(&self, index: usize) -> Result<&ZipFileEntry, ArchiveError> {
        self.entries
            .get(index)
            .ok_or(ArchiveError::IndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }
}

impl<S: ByteSource> Container for ZipContainer<S> {
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn path(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.file_name.as_str())
    }

    fn stat_by_index(&self, index: usize) -> Result<EntryStat, ArchiveError> {
        let entry = self.entry_or_err(index)?;
        Ok(EntryStat {
            path: entry.file_name.clone(),
            size: entry.uncompressed_size,
            mtime: entry.mtime(),
            is_directory: entry.is_directory,
        })
    }

    fn find_exact(&self, path: &str) -> Option<usize> {
        let index = self.lower_bound(path);
        (self.path(index) == Some(path)).then_some(index)
    }

    fn find_directory_prefix(&self, prefix: &str) -> Option<usize> {
        let index = self.lower_bound(prefix);
        self.path(index)
            .is_some_and(|p| p.starts_with(prefix))
            .then_some(index)
    }

    fn inflate(&self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let entry = self.entry_or_err(index)?;
        if entry.is_directory {
            return Ok(Vec::new());
        }
        if entry.is_encrypted() {
            return Err(ArchiveError::decode(index, "encrypted entries are not supported"));
        }

        let raw = ZipParser::new(&self.source)
            .entry_data(entry)
            .map_err(|e| match e {
                ArchiveError::Unavailable(_) => e,
                other => ArchiveError::decode(index, other),
            })?;

        let expected = usize::try_from(entry.uncompressed_size)
            .map_err(|_| ArchiveError::decode(index, "entry too large for this platform"))?;

        let body = match entry.compression_method {
            CompressionMethod::Stored => raw.into_owned(),
            CompressionMethod::Deflate => {
                let mut body = Vec::with_capacity(expected.min(raw.len().saturating_mul(4)));
                // Read one byte past the declared size so an overlong stream
                // is caught by the length check below.
                DeflateDecoder::new(&raw[..])
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut body)
                    .map_err(|e| ArchiveError::decode(index, e))?;
                body
            }
            CompressionMethod::Unknown(method) => {
                return Err(ArchiveError::decode(
                    index,
                    format!("unsupported compression method {method}"),
                ));
            }
        };

        if body.len() != expected {
            return Err(ArchiveError::decode(
                index,
                format!("expected {expected} bytes, got {}", body.len()),
            ));
        }

        let mut crc = Crc::new();
        crc.update(&body);
        if crc.sum() != entry.crc32 {
            return Err(ArchiveError::decode(
                index,
                format!("CRC-32 mismatch: stored {:08x}, computed {:08x}", entry.crc32, crc.sum()),
            ));
        }

        debug!(index, name = %entry.file_name, size = body.len(), "inflated entry");
        Ok(body)
    }
}
