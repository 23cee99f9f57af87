//! Scripted in-memory HTTP server shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use splitfetch::{BoxStream, HttpClient, OutputSink, ProgressSink, Request, StreamResponse};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

/// How a scripted request misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// No response at all.
    Refuse,
    /// Respond with this status and an empty body.
    Status(u16),
    /// Deliver this many body bytes, then fail the stream.
    ErrorAfter(usize),
    /// Deliver this many body bytes, then end the stream cleanly.
    CloseAfter(usize),
    /// Deliver this many body bytes, then never send another.
    StallAfter(usize),
    /// Never send the response head.
    StallHead,
    /// Serve normally but advertise this `Content-Length`.
    WrongLength(u64),
    /// Advertise this `Content-Length` and omit `Content-Range`.
    BareLength(u64),
    /// Panic inside the client.
    Panic,
}

struct ScriptedFault {
    offset: u64,
    fault: Fault,
    remaining: usize,
}

/// Serves `data` and honors `Range: bytes=a-b` / `bytes=a-` requests.
pub struct MockClient {
    data: Bytes,
    honor_ranges: bool,
    chunk_size: usize,
    chunk_delay: Duration,
    faults: Mutex<VecDeque<ScriptedFault>>,
    requests: Mutex<Vec<Option<String>>>,
}

impl MockClient {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            honor_ranges: true,
            chunk_size: 8192,
            chunk_delay: Duration::ZERO,
            faults: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ignoring_ranges(mut self) -> Self {
        self.honor_ranges = false;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Apply `fault` to the next request whose body starts at `offset`.
    pub fn fault_once(self, offset: u64, fault: Fault) -> Self {
        self.fault_times(offset, fault, 1)
    }

    /// Apply `fault` to the next `times` requests whose body starts at `offset`.
    pub fn fault_times(self, offset: u64, fault: Fault, times: usize) -> Self {
        self.faults
            .lock()
            .unwrap()
            .push_back(ScriptedFault { offset, fault, remaining: times });
        self
    }

    /// `Range` header of every request received, in order.
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn take_fault(&self, offset: u64) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let index = faults.iter().position(|f| f.offset == offset && f.remaining > 0)?;
        let scripted = &mut faults[index];
        scripted.remaining -= 1;
        let fault = scripted.fault;
        if scripted.remaining == 0 {
            faults.remove(index);
        }
        Some(fault)
    }

    fn body(&self, start: usize, end: usize, fault: Option<Fault>) -> BoxStream<'static, Result<Bytes, MockError>> {
        let limit = match fault {
            Some(Fault::ErrorAfter(n) | Fault::CloseAfter(n) | Fault::StallAfter(n)) => (start + n).min(end),
            _ => end,
        };

        let mut chunks = Vec::new();
        let mut offset = start;
        while offset < limit {
            let next = (offset + self.chunk_size).min(limit);
            chunks.push(Ok(self.data.slice(offset..next)));
            offset = next;
        }
        if let Some(Fault::ErrorAfter(_)) = fault {
            chunks.push(Err(MockError("connection reset by peer".into())));
        }

        let delay = self.chunk_delay;
        let stream = futures_util::stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk
        });

        match fault {
            Some(Fault::StallAfter(_)) => Box::pin(stream.chain(futures_util::stream::pending())),
            _ => Box::pin(stream),
        }
    }
}

fn parse_range(value: &str) -> Option<(u64, Option<u64>)> {
    let span = value.strip_prefix("bytes=")?;
    let (start, end) = span.split_once('-')?;
    let start = start.parse().ok()?;
    let end = if end.is_empty() { None } else { Some(end.parse().ok()?) };
    Some((start, end))
}

impl HttpClient for MockClient {
    type Error = MockError;

    async fn stream(&self, request: &Request) -> Result<StreamResponse<MockError>, MockError> {
        let range_header = request.header_value("Range").map(str::to_string);
        self.requests.lock().unwrap().push(range_header.clone());

        let len = self.data.len() as u64;
        let range = range_header.as_deref().and_then(parse_range).filter(|_| self.honor_ranges);
        let offset = range.map_or(0, |(start, _)| start);
        let fault = self.take_fault(offset);

        match fault {
            Some(Fault::Refuse) => return Err(MockError("connection refused".into())),
            Some(Fault::StallHead) => futures_util::future::pending::<()>().await,
            Some(Fault::Panic) => panic!("mock client panicked at offset {offset}"),
            Some(Fault::Status(status)) => {
                return Ok(StreamResponse {
                    status,
                    url: request.url.clone(),
                    headers: vec![("Content-Length".into(), "0".into())],
                    body: Box::pin(futures_util::stream::empty::<Result<Bytes, MockError>>()),
                });
            }
            _ => {}
        }

        let (status, start, end, mut headers) = match range {
            Some((start, _)) if start >= len => {
                return Ok(StreamResponse {
                    status: 416,
                    url: request.url.clone(),
                    headers: vec![("Content-Range".into(), format!("bytes */{len}"))],
                    body: Box::pin(futures_util::stream::empty::<Result<Bytes, MockError>>()),
                });
            }
            Some((start, end)) => {
                let end = end.map_or(len, |e| (e + 1).min(len));
                let content_range = format!("bytes {}-{}/{}", start, end - 1, len);
                (206, start, end, vec![("Content-Range".to_string(), content_range)])
            }
            None => (200, 0, len, Vec::new()),
        };
        match fault {
            Some(Fault::WrongLength(advertised)) => headers.push(("Content-Length".into(), advertised.to_string())),
            Some(Fault::BareLength(advertised)) => {
                headers.retain(|(name, _)| name != "Content-Range");
                headers.push(("Content-Length".into(), advertised.to_string()));
            }
            _ => headers.push(("Content-Length".into(), (end - start).to_string())),
        }
        headers.push(("Accept-Ranges".into(), "bytes".into()));

        Ok(StreamResponse {
            status,
            url: request.url.clone(),
            headers,
            body: self.body(start as usize, end as usize, fault),
        })
    }
}

/// Deterministic, non-repeating-looking test payload.
pub fn payload(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

pub fn memory_sink() -> Cursor<Vec<u8>> {
    Cursor::new(Vec::new())
}

/// Cancels `token` once `limit` bytes have been reported.
pub struct CancelAfter {
    pub token: CancellationToken,
    pub limit: u64,
    pub seen: AtomicU64,
}

impl CancelAfter {
    pub fn new(token: CancellationToken, limit: u64) -> Self {
        Self { token, limit, seen: AtomicU64::new(0) }
    }
}

impl ProgressSink for CancelAfter {
    fn update(&self, bytes: u64) {
        if self.seen.fetch_add(bytes, Ordering::SeqCst) + bytes >= self.limit {
            self.token.cancel();
        }
    }

    fn set_total(&self, _total: u64) {}
}

/// In-memory sink whose writes fail inside `[fail_from, fail_to)`.
pub struct FailingSink {
    pub inner: Cursor<Vec<u8>>,
    pub fail_from: u64,
    pub fail_to: u64,
    position: u64,
}

impl FailingSink {
    pub fn new(fail_from: u64, fail_to: u64) -> Self {
        Self { inner: memory_sink(), fail_from, fail_to, position: 0 }
    }
}

impl OutputSink for FailingSink {
    async fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.position = offset;
        OutputSink::seek(&mut self.inner, offset).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.position >= self.fail_from && self.position < self.fail_to {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device"));
        }
        OutputSink::write_all(&mut self.inner, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        OutputSink::flush(&mut self.inner).await
    }
}
