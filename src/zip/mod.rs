//! ZIP container decoding.
//!
//! This module reads ZIP archives held in memory (owned or memory-mapped),
//! supporting both the standard format and ZIP64 extensions.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`container`]: The sorted entry table and per-entry inflate, exposed
//!   to the rest of the crate through [`Container`](crate::archive::Container)
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first, then the Central Directory, which is all that is
//! needed to answer lookups and listings. Entry data is only touched when a
//! body is inflated.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods, CRC-32 verified
//! - Extended timestamp extra field for modification times
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod container;
mod parser;
mod structures;

pub use container::ZipContainer;
pub use parser::ZipParser;
pub use structures::*;
