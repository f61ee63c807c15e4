//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures through a
//! [`ByteSource`]. Every structure is read with one ranged read, so a remote
//! source only transfers the records the parser actually looks at.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header to find its data

use byteorder::{LittleEndian, ReadBytesExt};
use std::borrow::Cow;
use std::io::{Cursor, Read};

use crate::error::ArchiveError;
use crate::io::ByteSource;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Low-level ZIP parser over a borrowed byte source.
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(&source);
/// let entries = parser.list_files()?;
/// for entry in &entries {
///     let compressed = parser.entry_data(entry)?;
///     // Inflate according to entry.compression_method...
/// }
/// ```
pub struct ZipParser<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: ByteSource + ?Sized> ZipParser<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Read `len` bytes at `offset`, failing if the archive is too short.
    fn slice(&self, offset: u64, len: u64) -> Result<Cow<'a, [u8]>, ArchiveError> {
        let size = self.source.size();
        if offset.checked_add(len).is_none_or(|end| end > size) {
            return Err(ArchiveError::corrupt(format!(
                "structure at {offset}+{len} runs past end of archive ({size} bytes)"
            )));
        }
        let len = usize::try_from(len)
            .map_err(|_| ArchiveError::corrupt("length exceeds address space"))?;
        self.source.read_range(offset, len)
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
        let size = self.source.size();
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if size < eocd_size {
            return Err(ArchiveError::corrupt("not a valid ZIP file"));
        }

        // Fast path: no archive comment, EOCD sits at the very end.
        let offset = size - eocd_size;
        let tail = self.slice(offset, eocd_size)?;
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&tail)?, offset));
        }

        // Search backwards through the region a comment could occupy.
        let search_start = size.saturating_sub((MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE) as u64);
        let buf = self.slice(search_start, size - search_start)?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length field must account for every remaining byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&buf[i..])?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ArchiveError::corrupt("not a valid ZIP file"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ArchiveError> {
        // The ZIP64 EOCD Locator is located immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| ArchiveError::corrupt("missing ZIP64 locator"))?;
        let locator = Zip64EOCDLocator::from_bytes(
            &self.slice(locator_offset, Zip64EOCDLocator::SIZE as u64)?,
        )?;

        Zip64EOCD::from_bytes(&self.slice(locator.eocd64_offset, Zip64EOCD::MIN_SIZE as u64)?)
    }

    /// List all entries in the archive, in central directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.slice(cd_offset, cd_size)?;

        // Each header takes at least CDFH_MIN_SIZE bytes, which bounds the
        // preallocation even if the entry count is garbage.
        let max_entries = (cd_data.len() / CDFH_MIN_SIZE) as u64;
        if total_entries > max_entries {
            return Err(ArchiveError::corrupt(format!(
                "central directory claims {total_entries} entries in {cd_size} bytes"
            )));
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(&cd_data[..]);

        for _ in 0..total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    ///
    /// The CDFH contains metadata about a file in the archive, including
    /// its name, sizes, and location of the actual file data.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ArchiveError> {
        // Read and verify the signature (PK\x01\x02)
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(ArchiveError::corrupt("invalid central directory file header"));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        let extra_field_end = cursor.position() + extra_field_length as u64;
        let mut unix_mtime = None;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            match header_id {
                EXTRA_ZIP64 => {
                    // Fields are present only if the header field is saturated
                    if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                        uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                    }
                    if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                        compressed_size = cursor.read_u64::<LittleEndian>()?;
                    }
                    if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                        lfh_offset = cursor.read_u64::<LittleEndian>()?;
                    }
                }
                EXTRA_EXTENDED_TIMESTAMP => {
                    // Flag byte, then mtime first when bit 0 is set
                    if cursor.position() + 5 <= field_end {
                        let ts_flags = cursor.read_u8()?;
                        if ts_flags & 0x01 != 0 {
                            unix_mtime = Some(cursor.read_i32::<LittleEndian>()? as i64);
                        }
                    }
                }
                _ => {}
            }

            cursor.set_position(field_end);
        }

        // Skip past the extra field and the file comment (unused)
        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            unix_mtime,
            is_directory,
        })
    }

    /// An entry's compressed data.
    ///
    /// The Local File Header has variable-length fields (filename, extra
    /// field) that may differ from the Central Directory entry, so it has to
    /// be read to find where the data begins.
    pub fn entry_data(&self, entry: &ZipFileEntry) -> Result<Cow<'a, [u8]>, ArchiveError> {
        let lfh = self.slice(entry.lfh_offset, LFH_SIZE as u64)?;

        // Verify LFH signature (PK\x03\x04)
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::corrupt("invalid local file header"));
        }

        let mut cursor = Cursor::new(&lfh[..]);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        // Data starts after: LFH (30 bytes) + filename + extra field
        let data_offset =
            entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;
        self.slice(data_offset, entry.compressed_size)
    }
}
