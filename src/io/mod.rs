//! Byte sources an archive can be mounted from.
//!
//! The ZIP decoder reads through [`ByteSource`], a synchronous random-access
//! view. Local archives implement it directly as [`ArchiveBytes`]. Remote
//! archives implement the async [`ReadAt`] and are adapted by
//! [`RemoteSource`], which fetches each range the decoder asks for when it
//! asks for it.

mod bytes;
mod http;
mod remote;

pub use bytes::ArchiveBytes;
pub use http::HttpRangeReader;
pub use remote::RemoteSource;

use std::borrow::Cow;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ArchiveError;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// Synchronous random access to archive bytes.
pub trait ByteSource: Send + Sync {
    fn size(&self) -> u64;

    /// Exactly `len` bytes starting at `offset`.
    ///
    /// Callers keep the range within [`size`](Self::size).
    fn read_range(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>, ArchiveError>;
}
