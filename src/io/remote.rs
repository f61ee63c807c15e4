use std::borrow::Cow;

use anyhow::{Result, bail};
use tokio::runtime::Handle;
use tracing::debug;

use super::{ByteSource, ReadAt};
use crate::error::ArchiveError;

/// Blocking [`ByteSource`] over an async [`ReadAt`].
///
/// Each `read_range` call is driven to completion on the runtime behind
/// `handle`, so only the ranges the decoder touches are fetched: the archive
/// tail, the central directory, and the local header and data of each entry
/// that is read. Calls made from a multi-threaded runtime's thread go through
/// [`tokio::task::block_in_place`]; calls from a current-thread runtime panic.
pub struct RemoteSource<R> {
    reader: R,
    handle: Handle,
}

impl<R: ReadAt> RemoteSource<R> {
    /// Wrap `reader`, driving it on the runtime the caller is running in.
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self::with_handle(reader, Handle::try_current()?))
    }

    pub fn with_handle(reader: R, handle: Handle) -> Self {
        Self { reader, handle }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Fill `buf` from `offset`, tolerating short reads.
    async fn fill(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let at = offset + filled as u64;
            let n = self.reader.read_at(at, &mut buf[filled..]).await?;
            if n == 0 {
                bail!("source ended at byte {at}, {} short", buf.len() - filled);
            }
            filled += n;
        }
        Ok(())
    }
}

impl<R: ReadAt> ByteSource for RemoteSource<R> {
    fn size(&self) -> u64 {
        self.reader.size()
    }

    fn read_range(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>, ArchiveError> {
        let mut buf = vec![0u8; len];
        tokio::task::block_in_place(|| self.handle.block_on(self.fill(offset, &mut buf)))
            .map_err(|e| ArchiveError::Unavailable(format!("{e:#}")))?;

        debug!(offset, len, "fetched remote range");
        Ok(Cow::Owned(buf))
    }
}
