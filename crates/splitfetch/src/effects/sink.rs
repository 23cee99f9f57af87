use std::future::Future;
use std::io::{self, Cursor, Seek, SeekFrom, Write};

use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::error;

use crate::error::{Error, Result};

/// Destination for downloaded bytes.
///
/// Both asynchronous sinks ([`tokio::fs::File`]) and synchronous in-memory
/// sinks ([`Cursor<Vec<u8>>`]) are supported. A blocking
/// [`std::fs::File`] is adapted with [`tokio::fs::File::from_std`].
pub trait OutputSink: Send {
    fn seek(&mut self, offset: u64) -> impl Future<Output = io::Result<()>> + Send;

    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    fn flush(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Resize the sink to exactly `size` bytes.
    fn truncate(&mut self, size: u64) -> impl Future<Output = io::Result<()>> + Send {
        let _ = size;
        async { Err(io::Error::new(io::ErrorKind::Unsupported, "sink cannot be truncated")) }
    }
}

impl OutputSink for tokio::fs::File {
    async fn seek(&mut self, offset: u64) -> io::Result<()> {
        AsyncSeekExt::seek(self, SeekFrom::Start(offset)).await.map(|_| ())
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(self, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(self).await
    }

    async fn truncate(&mut self, size: u64) -> io::Result<()> {
        self.set_len(size).await
    }
}

impl OutputSink for Cursor<Vec<u8>> {
    async fn seek(&mut self, offset: u64) -> io::Result<()> {
        Seek::seek(self, SeekFrom::Start(offset)).map(|_| ())
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(self, data)
    }

    async fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    async fn truncate(&mut self, size: u64) -> io::Result<()> {
        let size = usize::try_from(size).map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "size exceeds memory"))?;
        self.get_mut().resize(size, 0);
        Ok(())
    }
}

/// Serializes writes from concurrent parts into one sink.
///
/// The mutex is the only point of mutual exclusion in a download. It keeps a
/// part's seek-then-write pair from interleaving with another part's; parts
/// write disjoint offsets, so no ordering between parts is enforced.
#[derive(Debug)]
pub struct WriteCoordinator<S> {
    sink: Mutex<S>,
}

impl<S: OutputSink> WriteCoordinator<S> {
    pub fn new(sink: S) -> Self {
        Self { sink: Mutex::new(sink) }
    }

    /// Write `data` at `offset` and flush.
    ///
    /// The gate is released when this returns, whether or not the write
    /// succeeded.
    pub async fn commit(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut sink = self.sink.lock().await;
        let written = async {
            sink.seek(offset).await?;
            sink.write_all(data).await?;
            sink.flush().await
        }
        .await;

        written.map_err(|e| {
            error!(offset, len = data.len(), error = %e, "sink write failed");
            Error::Sink(e)
        })
    }

    /// Resize the sink to `size` bytes under the gate.
    pub async fn truncate(&self, size: u64) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.truncate(size).await.map_err(|e| {
            error!(size, error = %e, "sink truncate failed");
            Error::Sink(e)
        })
    }

    pub fn into_inner(self) -> S {
        self.sink.into_inner()
    }
}
