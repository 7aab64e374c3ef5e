//! Network retrieval of release archives into the cache.
//!
//! ## Features
//!
//! - Streaming downloads: chunks go straight into a pending cache entry
//! - Atomic publication through [`CacheStore::begin`] and [`PendingEntry::commit`]
//! - SHA-256 of the received bytes, reported with the stored entry
//! - Optional progress callbacks, throttled
//! - Cancellation between chunks and while waiting for the response
//!
//! The transport is a trait so the pipeline can be driven without a network.
//! [`HttpTransport`] is the `reqwest` implementation.
//!
//! [`PendingEntry`]: crate::cache::PendingEntry
//! [`PendingEntry::commit`]: crate::cache::PendingEntry::commit

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cache::{CacheStore, StoredEntry};
use crate::config::Settings;
use crate::error::{BoxError, FetchError};

/// Body of a download, chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// An open download: headers have arrived with a success status.
pub struct Download {
    /// Announced body length, if any.
    pub content_length: Option<u64>,
    /// The body.
    pub body: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Something that can open a URL for reading.
pub trait Transport: Send + Sync {
    /// Sends the request for `url` and waits for a success response.
    ///
    /// # Errors
    ///
    /// [`FetchError::Transport`] if no response arrives and
    /// [`FetchError::Status`] for a non-2xx status.
    fn open(&self, url: &Url) -> impl Future<Output = Result<Download, FetchError>> + Send;
}

/// `reqwest`-backed HTTP(S) transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client with the timeouts and user agent from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the TLS backend cannot be initialized.
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn open(&self, url: &Url) -> Result<Download, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Download {
            content_length: response.content_length(),
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| Box::new(e) as BoxError))
                .boxed(),
        })
    }
}

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Response headers arrived.
    Started {
        /// The URL being downloaded.
        url: String,
        /// Announced size in bytes.
        total: Option<u64>,
    },
    /// More of the body arrived.
    Progress {
        /// Bytes received so far.
        downloaded: u64,
        /// Announced size in bytes.
        total: Option<u64>,
        /// Average speed since the start, in bytes per second.
        speed: u64,
    },
    /// The entry was stored.
    Completed {
        /// Final size in bytes.
        size: u64,
    },
}

/// Callback type for receiving progress updates during downloads.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Minimum interval between progress callback invocations in milliseconds.
const PROGRESS_CALLBACK_INTERVAL_MS: u128 = 100;

/// Downloads `url` into `cache` under `filename`.
///
/// Nothing appears under `filename` unless the whole body arrived; on any
/// error or cancellation the partial download is discarded.
///
/// # Errors
///
/// - [`FetchError::Transport`] or [`FetchError::Status`] from the transport.
/// - [`FetchError::Stream`] if the body breaks off or is shorter than announced.
/// - [`FetchError::Store`] if the cache cannot be written.
/// - [`FetchError::Cancelled`] if `cancel` fires.
pub async fn fetch<T: Transport>(
    transport: &T,
    url: &Url,
    cache: &CacheStore,
    filename: &str,
    cancel: &CancellationToken,
    progress: Option<&ProgressCallback>,
) -> Result<StoredEntry, FetchError> {
    let cancelled = || FetchError::Cancelled {
        url: url.to_string(),
    };
    let store_err = |source| FetchError::Store {
        url: url.to_string(),
        source,
    };

    tracing::info!(url = %url, filename, "downloading");
    let download = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(cancelled()),
        opened = transport.open(url) => opened?,
    };
    let Download {
        content_length,
        mut body,
    } = download;

    let mut pending = cache.begin(filename).await.map_err(store_err)?;
    emit(
        progress,
        ProgressEvent::Started {
            url: url.to_string(),
            total: content_length,
        },
    );

    let start = Instant::now();
    let mut last_update = start;
    loop {
        let chunk = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled()),
            chunk = body.next() => chunk,
        };
        let chunk = match chunk {
            None => break,
            Some(Ok(chunk)) => chunk,
            Some(Err(source)) => {
                return Err(FetchError::Stream {
                    url: url.to_string(),
                    received: pending.size(),
                    source,
                });
            }
        };
        pending.write_chunk(&chunk).await.map_err(store_err)?;

        let now = Instant::now();
        if now.duration_since(last_update).as_millis() >= PROGRESS_CALLBACK_INTERVAL_MS {
            emit(
                progress,
                ProgressEvent::Progress {
                    downloaded: pending.size(),
                    total: content_length,
                    speed: bytes_per_second(pending.size(), start),
                },
            );
            last_update = now;
        }
    }

    if let Some(expected) = content_length
        && pending.size() != expected
    {
        return Err(FetchError::Stream {
            url: url.to_string(),
            received: pending.size(),
            source: format!("expected {expected} bytes").into(),
        });
    }

    emit(
        progress,
        ProgressEvent::Progress {
            downloaded: pending.size(),
            total: content_length,
            speed: bytes_per_second(pending.size(), start),
        },
    );
    let stored = pending.commit().await.map_err(store_err)?;
    emit(progress, ProgressEvent::Completed { size: stored.size });

    tracing::info!(url = %url, size = stored.size, sha256 = %stored.sha256, "download complete");
    Ok(stored)
}

fn emit(progress: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = progress {
        callback(event);
    }
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn bytes_per_second(bytes: u64, start: Instant) -> u64 {
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        (bytes as f64 / elapsed) as u64
    } else {
        0
    }
}
