#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

/// 2024-01-02 03:04:06 UTC
pub const MTIME: i64 = 1_704_164_646;

/// Build an in-memory ZIP. Names ending in `/` become directory markers.
///
/// Entries are written in the order given, so callers can check that the
/// index does not depend on central directory order.
pub fn build(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_with(entries, CompressionMethod::Deflated, None)
}

pub fn build_stored(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_with(entries, CompressionMethod::Stored, None)
}

pub fn build_with(
    entries: &[(&str, &[u8])],
    method: CompressionMethod,
    comment: Option<&str>,
) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::from_date_and_time(2024, 1, 2, 3, 4, 6).unwrap());

    for (name, body) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body).unwrap();
        }
    }

    if let Some(comment) = comment {
        writer.set_comment(comment);
    }

    writer.finish().unwrap().into_inner()
}

/// DOS date and time fields for [`MTIME`].
const DOS_DATE: u16 = ((2024 - 1980) << 9) | (1 << 5) | 2;
const DOS_TIME: u16 = (3 << 11) | (4 << 5) | 3;

/// A stored entry for [`build_raw`], with extra field bytes for its central
/// directory header.
pub struct RawEntry<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
    pub extra: Vec<u8>,
}

impl<'a> RawEntry<'a> {
    pub fn new(name: &'a str, body: &'a [u8]) -> Self {
        Self {
            name,
            body,
            extra: Vec::new(),
        }
    }
}

/// Extended timestamp ("UT") extra field carrying a modification time.
pub fn extended_timestamp(mtime: i32) -> Vec<u8> {
    let mut field = Vec::new();
    field.extend_from_slice(&0x5455u16.to_le_bytes());
    field.extend_from_slice(&5u16.to_le_bytes());
    field.push(0x01);
    field.extend_from_slice(&mtime.to_le_bytes());
    field
}

/// Assemble a stored archive byte by byte.
///
/// With `zip64`, every size and offset in the central directory is saturated
/// and carried in a ZIP64 extra field instead, and the archive ends with
/// ZIP64 end-of-central-directory records ahead of a saturated EOCD.
pub fn build_raw(entries: &[RawEntry], zip64: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let offset = out.len() as u64;
        let size = entry.body.len() as u64;
        let mut crc = flate2::Crc::new();
        crc.update(entry.body);
        let crc = crc.sum();

        out.extend_from_slice(b"PK\x03\x04");
        for field in [20, 0, 0, DOS_TIME, DOS_DATE] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(size as u32).to_le_bytes());
        out.extend_from_slice(&(size as u32).to_le_bytes());
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(entry.body);

        let mut extra = entry.extra.clone();
        let (size32, offset32) = if zip64 {
            extra.extend_from_slice(&0x0001u16.to_le_bytes());
            extra.extend_from_slice(&24u16.to_le_bytes());
            extra.extend_from_slice(&size.to_le_bytes());
            extra.extend_from_slice(&size.to_le_bytes());
            extra.extend_from_slice(&offset.to_le_bytes());
            (u32::MAX, u32::MAX)
        } else {
            (size as u32, offset as u32)
        };

        central.extend_from_slice(b"PK\x01\x02");
        for field in [45, 45, 0, 0, DOS_TIME, DOS_DATE] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size32.to_le_bytes());
        central.extend_from_slice(&size32.to_le_bytes());
        for field in [entry.name.len() as u16, extra.len() as u16, 0, 0, 0] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset32.to_le_bytes());
        central.extend_from_slice(entry.name.as_bytes());
        central.extend_from_slice(&extra);
    }

    let cd_offset = out.len() as u64;
    let cd_size = central.len() as u64;
    let count = entries.len() as u64;
    out.extend_from_slice(&central);

    if zip64 {
        let eocd64_offset = out.len() as u64;
        out.extend_from_slice(b"PK\x06\x06");
        out.extend_from_slice(&44u64.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for field in [count, count, cd_size, cd_offset] {
            out.extend_from_slice(&field.to_le_bytes());
        }

        out.extend_from_slice(b"PK\x06\x07");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&eocd64_offset.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
    }

    let (count16, cd_size32, cd_offset32) = if zip64 {
        (u16::MAX, u32::MAX, u32::MAX)
    } else {
        (count as u16, cd_size as u32, cd_offset as u32)
    };
    out.extend_from_slice(b"PK\x05\x06");
    for field in [0, 0, count16, count16] {
        out.extend_from_slice(&field.to_le_bytes());
    }
    out.extend_from_slice(&cd_size32.to_le_bytes());
    out.extend_from_slice(&cd_offset32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}
