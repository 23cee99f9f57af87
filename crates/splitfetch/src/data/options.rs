use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::range::ByteRange;
use crate::progress::ProgressSink;

/// Default number of concurrent connections.
pub const DEFAULT_CONNECTIONS: u32 = 8;

/// Resources smaller than this are never split.
pub const MINIMUM_PART_SIZE: u64 = 1024 * 1024;

/// Builds a progress sink for one part, given its index and range.
pub type PartProgressFactory = Arc<dyn Fn(usize, &ByteRange) -> Arc<dyn ProgressSink> + Send + Sync>;

/// Configuration for a multi-connection download.
///
/// # Examples
///
/// ```
/// use splitfetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .connections(16)
///     .max_retries(8)
///     .retry_backoff(Duration::from_millis(250))
///     .allocate_on_disk(true);
/// assert_eq!(options.connections, 16);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Number of ranges (and connections) to split the resource into.
    ///
    /// Default: 8
    pub connections: u32,

    /// Resources shorter than this are fetched as one unbounded stream.
    ///
    /// Default: 1 MiB
    pub minimum_part_size: u64,

    /// Truncate the sink to the content length before any part starts.
    ///
    /// Only applied when the content length is known.
    ///
    /// Default: false
    pub allocate_on_disk: bool,

    /// Retries allowed per part after attempts that made no progress.
    ///
    /// - The counter resets whenever an attempt writes at least one byte
    /// - Retries are triggered for transport errors, timeouts, premature
    ///   end of stream and 5xx responses
    /// - Sink errors and other HTTP errors are never retried
    ///
    /// Default: 5
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries.
    ///
    /// The delay before retry N (0-indexed) is `retry_backoff * 2^N`.
    ///
    /// Default: 100ms
    pub retry_backoff: Duration,

    /// Upper bound for receiving response headers.
    ///
    /// Default: 30s
    pub connect_timeout: Duration,

    /// Upper bound for waiting on the next body chunk.
    ///
    /// Default: 30s
    pub read_timeout: Duration,

    /// Fetcher-wide progress sink, updated by every part.
    ///
    /// Bytes replayed after an unbounded part restarts are not counted again.
    ///
    /// Default: None
    pub progress: Option<Arc<dyn ProgressSink>>,

    /// Per-part progress sinks.
    ///
    /// Default: None
    pub part_progress: Option<PartProgressFactory>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("connections", &self.connections)
            .field("minimum_part_size", &self.minimum_part_size)
            .field("allocate_on_disk", &self.allocate_on_disk)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("progress", &self.progress.as_ref().map(|_| "{ ... }"))
            .field("part_progress", &self.part_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connections: DEFAULT_CONNECTIONS,
            minimum_part_size: MINIMUM_PART_SIZE,
            allocate_on_disk: false,
            max_retries: 5,
            retry_backoff: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            progress: None,
            part_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn connections(mut self, connections: u32) -> Self {
        self.connections = connections;
        self
    }

    #[must_use]
    pub fn minimum_part_size(mut self, minimum_part_size: u64) -> Self {
        self.minimum_part_size = minimum_part_size;
        self
    }

    #[must_use]
    pub fn allocate_on_disk(mut self, allocate_on_disk: bool) -> Self {
        self.allocate_on_disk = allocate_on_disk;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the fetcher-wide progress sink.
    ///
    /// # Examples
    ///
    /// ```
    /// use splitfetch::{FetchOptions, ProgressCounter};
    /// use std::sync::Arc;
    ///
    /// let counter = Arc::new(ProgressCounter::new());
    /// let options = FetchOptions::default().progress(counter.clone());
    /// assert!(options.progress.is_some());
    /// ```
    #[must_use]
    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the factory that builds a progress sink for each part.
    #[must_use]
    pub fn part_progress(mut self, factory: PartProgressFactory) -> Self {
        self.part_progress = Some(factory);
        self
    }
}
