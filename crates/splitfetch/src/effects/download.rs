use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::http::HttpClient;
use super::part::PartFetcher;
use super::probe::{ProbeResponse, probe};
use super::sink::{OutputSink, WriteCoordinator};
use crate::core::allocate;
use crate::data::{ByteRange, DownloadReport, FetchOptions, PartReport, PartState, PartStatus, Request};
use crate::error::{Error, Result};

/// The sink handed back after a download, with what landed in it.
#[derive(Debug)]
pub struct Downloaded<S> {
    pub sink: S,
    pub report: DownloadReport,
}

/// Downloads one resource over several concurrent range requests.
///
/// # Examples
///
/// ```no_run
/// use splitfetch::{FetchOptions, ReqwestClient, Request, SplitFetcher};
///
/// # async fn run() -> splitfetch::Result<()> {
/// let fetcher = SplitFetcher::new(ReqwestClient::new()?, Request::get("https://example.com/big.iso"))
///     .options(FetchOptions::default().connections(16).allocate_on_disk(true));
///
/// let probe = fetcher.probe().await?;
/// let length = probe.total_length();
/// let file = tokio::fs::File::create("big.iso").await.map_err(splitfetch::Error::Sink)?;
///
/// let downloaded = if probe.is_resumable() {
///     fetcher.download(file, length, None).await?
/// } else {
///     fetcher.download_ranges(file, vec![splitfetch::ByteRange::unbounded()], length, None).await?
/// };
/// downloaded.report.into_result()?;
/// # Ok(())
/// # }
/// ```
pub struct SplitFetcher<C> {
    client: Arc<C>,
    request: Request,
    options: FetchOptions,
}

impl<C: HttpClient + 'static> SplitFetcher<C> {
    pub fn new(client: C, request: Request) -> Self {
        Self::with_shared_client(Arc::new(client), request)
    }

    /// Build a fetcher around a client shared with other downloads.
    pub fn with_shared_client(client: Arc<C>, request: Request) -> Self {
        Self { client, request, options: FetchOptions::default() }
    }

    #[must_use]
    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn fetch_options(&self) -> &FetchOptions {
        &self.options
    }

    /// Ask the server whether it honors range requests for this resource.
    pub async fn probe(&self) -> Result<ProbeResponse> {
        probe(self.client.as_ref(), &self.request).await
    }

    /// Split the resource per [`FetchOptions`] and fetch every range into `sink`.
    ///
    /// `content_length` of `None`, or below the minimum part size, fetches the
    /// resource as a single unbounded stream. Callers should only pass a
    /// length when [`probe`](Self::probe) reported range support.
    ///
    /// # Errors
    ///
    /// Returns an error only if pre-allocating the sink fails. Failures of
    /// individual parts are reported in [`Downloaded::report`].
    pub async fn download<S: OutputSink + 'static>(
        &self,
        sink: S,
        content_length: Option<u64>,
        cancel: Option<CancellationToken>,
    ) -> Result<Downloaded<S>> {
        let ranges = allocate(content_length, self.options.connections, self.options.minimum_part_size);
        info!(
            url = %self.request.url,
            content_length,
            parts = ranges.len(),
            "allocated ranges"
        );
        self.download_ranges(sink, ranges, content_length, cancel).await
    }

    /// Fetch an explicit list of ranges into `sink`.
    ///
    /// This is how a partial download is resumed: pass the
    /// [`DownloadReport::remaining`] ranges of the previous attempt together
    /// with the same sink.
    pub async fn download_ranges<S: OutputSink + 'static>(
        &self,
        sink: S,
        ranges: Vec<ByteRange>,
        content_length: Option<u64>,
        cancel: Option<CancellationToken>,
    ) -> Result<Downloaded<S>> {
        let writer = Arc::new(WriteCoordinator::new(sink));
        if self.options.allocate_on_disk
            && let Some(len) = content_length
        {
            writer.truncate(len).await?;
        }

        // Cancelled by a sink failure, by the caller, or by dropping this future.
        let token = cancel.map(|c| c.child_token()).unwrap_or_default();
        let _guard = token.clone().drop_guard();

        let fetcher = Arc::new(PartFetcher::new(
            Arc::clone(&self.client),
            self.request.clone(),
            Arc::clone(&writer),
            self.options.clone(),
            token.clone(),
        ));

        let handles: Vec<_> = ranges
            .iter()
            .copied()
            .enumerate()
            .map(|(index, range)| {
                let fetcher = Arc::clone(&fetcher);
                let token = token.clone();
                let part_progress = self.options.part_progress.as_ref().map(|factory| factory(index, &range));
                tokio::spawn(async move {
                    let mut state = PartState::new(range);
                    let status = match fetcher.run_state(&mut state, part_progress.as_deref()).await {
                        Ok(status) => status,
                        Err(e) => {
                            if e.is_fatal() {
                                token.cancel();
                            }
                            error!(index, range = %range, position = state.position, error = %e, "part failed");
                            PartStatus::Failed(e)
                        }
                    };
                    PartReport::new(index, state, status)
                })
            })
            .collect();
        drop(fetcher);

        let parts = join_all(handles)
            .await
            .into_iter()
            .zip(ranges)
            .enumerate()
            .map(|(index, (joined, range))| {
                joined.unwrap_or_else(|e| {
                    error!(index, range = %range, error = %e, "part task aborted");
                    PartReport::new(index, PartState::new(range), PartStatus::Failed(Error::Join(e.to_string())))
                })
            })
            .collect();

        let report = DownloadReport { parts, content_length };
        info!(
            url = %self.request.url,
            status = %report.status(),
            bytes = report.bytes_written(),
            "download finished"
        );

        let writer = Arc::try_unwrap(writer).map_err(|_| Error::Join("output sink still in use".into()))?;
        Ok(Downloaded { sink: writer.into_inner(), report })
    }
}
