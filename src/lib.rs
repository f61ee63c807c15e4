//! # zipmount
//!
//! Serve the contents of a ZIP archive as a read-only virtual filesystem.
//!
//! The archive's central directory is indexed once. After that, every
//! filesystem call is answered from the flat, path-sorted entry table:
//! paths resolve to stored entries or to directories implied by common
//! prefixes, listings collapse nested paths into single child directories,
//! and decompressed file bodies are kept in a bounded LRU cache.
//!
//! ## Features
//!
//! - Mount local archives (memory-mapped) or remote ones over HTTP Range
//!   requests, fetching only the central directory and the entries read
//! - Support for ZIP64 format (archives larger than 4GB)
//! - STORED and DEFLATE entries, CRC-32 verified
//! - Directories synthesized from entry paths, no tree built up front
//! - Host bridge adapter with read-only create semantics
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipmount::{ArchiveBytes, MountOptions, ZipFs};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bytes = ArchiveBytes::map_file(Path::new("archive.zip"))?;
//!     let fs = ZipFs::open(bytes, &MountOptions::default())?;
//!
//!     fs.enumerate("/", |child| {
//!         println!("{}{}", child.name, if child.is_directory { "/" } else { "" });
//!     })?;
//!
//!     if let zipmount::ResolvedNode::RealEntry(index) = fs.locate("README.md") {
//!         let head = fs.read(index, 0, 256)?;
//!         println!("{}", String::from_utf8_lossy(&head));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod bridge;
pub mod cache;
pub mod cli;
pub mod enumerate;
pub mod error;
pub mod fs;
pub mod io;
pub mod resolver;
pub mod time;
pub mod zip;

pub use archive::{ArchiveIndex, Container, EntryStat};
pub use bridge::{CreateDisposition, FindData, OpenHandle};
pub use cache::{BodyCache, LruCache};
pub use cli::Cli;
pub use enumerate::ChildStat;
pub use error::{ArchiveError, FsError};
pub use fs::{MountOptions, ZipFs};
pub use io::{ArchiveBytes, ByteSource, HttpRangeReader, ReadAt, RemoteSource};
pub use resolver::ResolvedNode;
pub use self::time::HostStat;
pub use self::zip::ZipContainer;
