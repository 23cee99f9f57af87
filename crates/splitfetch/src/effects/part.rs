use std::sync::Arc;

use futures_util::StreamExt;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::http::{HttpClient, StreamResponse};
use super::sink::{OutputSink, WriteCoordinator};
use crate::core::{parse_content_range_span, retry_delay};
use crate::data::{ByteRange, FetchOptions, PartState, PartStatus, Request};
use crate::error::{Error, Result};
use crate::progress::ProgressSink;

/// How one streaming attempt ended without error.
enum AttemptEnd {
    Complete,
    Cancelled,
}

/// Fetches ranges of one resource into a shared sink.
///
/// One fetcher serves every part of a download; each call to [`run`]
/// drives a single range to completion, re-requesting the remaining bytes
/// from the last written offset after transient failures.
///
/// [`run`]: PartFetcher::run
pub struct PartFetcher<C, S> {
    client: Arc<C>,
    request: Request,
    writer: Arc<WriteCoordinator<S>>,
    options: FetchOptions,
    cancel: CancellationToken,
}

impl<C: HttpClient, S: OutputSink> PartFetcher<C, S> {
    pub fn new(
        client: Arc<C>,
        request: Request,
        writer: Arc<WriteCoordinator<S>>,
        options: FetchOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self { client, request, writer, options, cancel }
    }

    /// Fetch `range` and return `(start, position)`: the range's first
    /// offset and the offset reached.
    ///
    /// `position` falls short of the range end only when cancellation was
    /// requested; failures are returned as errors.
    pub async fn run(&self, range: ByteRange, part_progress: Option<&dyn ProgressSink>) -> Result<(u64, u64)> {
        let mut state = PartState::new(range);
        self.run_state(&mut state, part_progress).await?;
        Ok((range.offset(), state.position))
    }

    /// Drive `state` until it is complete or cancelled.
    ///
    /// On success the returned status is [`PartStatus::Complete`] or
    /// [`PartStatus::Cancelled`]. On error, `state` still holds the offset
    /// reached so the caller can resume from it.
    pub async fn run_state(&self, state: &mut PartState, part_progress: Option<&dyn ProgressSink>) -> Result<PartStatus> {
        let mut attempts = 0u32;
        let mut retries = 0u32;
        // Highest offset already reported to progress sinks.
        let mut reported = state.position;

        loop {
            if state.is_complete() {
                return Ok(PartStatus::Complete);
            }
            if self.cancel.is_cancelled() {
                return Ok(PartStatus::Cancelled);
            }

            attempts += 1;
            let before = state.position;

            let err = match self.attempt(state, &mut reported, part_progress).await {
                Ok(AttemptEnd::Complete) => {
                    debug!(range = %state.range, position = state.position, attempts, "part complete");
                    return Ok(PartStatus::Complete);
                }
                Ok(AttemptEnd::Cancelled) => {
                    debug!(range = %state.range, position = state.position, "part cancelled");
                    return Ok(PartStatus::Cancelled);
                }
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            if state.position > before {
                retries = 0;
            }
            if retries >= self.options.max_retries {
                warn!(range = %state.range, position = state.position, attempts, error = %err, "part retries exhausted");
                return Err(Error::RetriesExhausted {
                    start: state.range.offset(),
                    position: state.position,
                    attempts,
                    source: Box::new(err),
                });
            }

            let delay = retry_delay(retries, self.options.retry_backoff);
            retries += 1;
            warn!(
                range = %state.range,
                position = state.position,
                retry = retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying part"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(PartStatus::Cancelled),
                _ = sleep(delay) => {}
            }
        }
    }

    /// One request and its streamed body.
    async fn attempt(
        &self,
        state: &mut PartState,
        reported: &mut u64,
        part_progress: Option<&dyn ProgressSink>,
    ) -> Result<AttemptEnd> {
        if state.range.is_unbounded() {
            // No Range header: the server restarts at byte 0.
            state.position = 0;
        }
        let request_offset = state.position;
        let pending = state.pending();
        let request = match pending.header_value() {
            Some(value) => self.request.clone().with_header("Range", value),
            None => self.request.clone().without_header("Range"),
        };
        debug!(url = %request.url, range = %state.range, pending = %pending, "requesting part");

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(AttemptEnd::Cancelled),
            sent = timeout(self.options.connect_timeout, self.client.stream(&request)) => sent,
        };
        let response = match sent {
            Err(_) => return Err(Error::Timeout),
            Ok(Err(e)) => return Err(Error::Transport(e.to_string())),
            Ok(Ok(response)) => response,
        };
        debug!(status = response.status, pending = %pending, "part response");
        check_status(&response, &pending, request_offset)?;

        if let Some(len) = response.content_length() {
            state.learn_length(request_offset, len);
        }
        if let (Some(progress), Some(len)) = (part_progress, state.known_length) {
            progress.set_total(len);
        }

        let mut body = response.body;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(AttemptEnd::Cancelled),
                next = timeout(self.options.read_timeout, body.next()) => next,
            };
            let mut chunk = match next {
                Err(_) => return Err(Error::Timeout),
                Ok(None) => break,
                Ok(Some(Err(e))) => return Err(Error::Transport(e.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };

            if let Some(remaining) = state.remaining()
                && chunk.len() as u64 > remaining
            {
                chunk.truncate(remaining as usize);
            }
            if !chunk.is_empty() {
                let len = chunk.len() as u64;
                let end = state.position.saturating_add(len);
                // A restarted unbounded part replays bytes it already reported.
                let fresh = end.saturating_sub((*reported).max(state.position));
                if fresh > 0 {
                    if let Some(progress) = self.options.progress.as_deref() {
                        progress.update(fresh);
                    }
                    if let Some(progress) = part_progress {
                        progress.update(fresh);
                    }
                    *reported = end;
                }
                self.writer.commit(state.position, &chunk).await?;
                state.position = end;
            }

            if state.is_complete() {
                return Ok(AttemptEnd::Complete);
            }
            if self.cancel.is_cancelled() {
                return Ok(AttemptEnd::Cancelled);
            }
        }

        match state.end_offset() {
            None => {
                state.known_length = Some(state.position - state.range.offset());
                if let (Some(progress), Some(len)) = (part_progress, state.known_length) {
                    progress.set_total(len);
                }
                Ok(AttemptEnd::Complete)
            }
            Some(end) if state.position >= end => Ok(AttemptEnd::Complete),
            Some(end) => Err(Error::PrematureEof {
                expected: end - request_offset,
                received: state.position - request_offset,
            }),
        }
    }
}

/// Reject responses that cannot be written at `request_offset`.
///
/// A 206 must start where it was asked to, and its `Content-Length` must
/// match its `Content-Range` span. A 200 carries the resource from byte 0,
/// which is only usable when the request itself starts at 0.
fn check_status<E>(response: &StreamResponse<E>, pending: &ByteRange, request_offset: u64) -> Result<()> {
    let status = response.status;
    if !(200..300).contains(&status) {
        return Err(Error::Status { status, url: response.url.clone() });
    }

    let Some(requested) = pending.header_value() else {
        return Ok(());
    };
    match status {
        206 => {
            let span_len = |(start, end): (u64, u64)| (end - start).checked_add(1);
            match parse_content_range_span(&response.headers) {
                Some((start, _)) if start != request_offset => Err(Error::RangeNotSatisfied { status, requested }),
                Some(span) if response.content_length().is_some_and(|len| span_len(span) != Some(len)) => {
                    Err(Error::RangeNotSatisfied { status, requested })
                }
                _ => Ok(()),
            }
        }
        200 if request_offset == 0 => Ok(()),
        _ => Err(Error::RangeNotSatisfied { status, requested }),
    }
}
