use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::ReadAt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 10;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Random access to an archive served over HTTP.
///
/// Every read becomes one or more `Range` requests, so a mount downloads the
/// archive tail, its central directory and the entries that are actually
/// read, never the whole file.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    requests: AtomicU64,
}

impl HttpRangeReader {
    /// Query `url` with a HEAD request for its length and range support.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let resp = client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?;

        if !resp.status().is_success() {
            bail!("HEAD {url} returned {}", resp.status());
        }

        let headers = resp.headers();
        let accept_ranges = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        if !accept_ranges.contains("bytes") {
            bail!("{url} does not accept byte range requests");
        }

        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| anyhow!("{url} did not report a Content-Length"))?;

        debug!(%url, size, "remote archive accepts range requests");

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            requests: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body bytes received so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Range requests sent so far, retries included.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// One `Range` request covering `buf`, retried on timeouts, refused
    /// connections and 5xx responses. Returns how much of `buf` was filled.
    async fn fetch_into(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        let range = format!("bytes={}-{}", start, start + buf.len() as u64 - 1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.requests.fetch_add(1, Ordering::Relaxed);

            let failure = match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    let body = resp.bytes().await?;
                    if body.is_empty() {
                        bail!("empty response for {range}");
                    }
                    let n = body.len().min(buf.len());
                    buf[..n].copy_from_slice(&body[..n]);
                    self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
                    return Ok(n);
                }
                Ok(resp) if resp.status().is_server_error() => resp.status().to_string(),
                Ok(resp) => bail!("{range} returned {}", resp.status()),
                Err(e) if e.is_timeout() || e.is_connect() => e.to_string(),
                Err(e) => return Err(e.into()),
            };

            if attempt >= MAX_ATTEMPTS {
                bail!("{range} failed after {attempt} attempts: {failure}");
            }
            warn!(attempt, max = MAX_ATTEMPTS, %failure, "retrying range request");
            tokio::time::sleep(BACKOFF_STEP * attempt).await;
        }
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let available = usize::try_from(self.size - offset).unwrap_or(usize::MAX);
        let len = buf.len().min(available);

        let mut filled = 0;
        while filled < len {
            filled += self
                .fetch_into(offset + filled as u64, &mut buf[filled..len])
                .await?;
        }

        debug!(offset, len, "range read");
        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
