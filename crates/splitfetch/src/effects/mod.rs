//! I/O operations for range downloading.
//!
//! The transport trait, the output sink and its write coordinator, the
//! per-range fetcher, the resumability probe and the orchestrator that ties
//! them together.

mod download;
mod http;
mod part;
mod probe;
mod sink;

pub use download::{Downloaded, SplitFetcher};
pub use http::{BoxStream, HttpClient, StreamResponse};
pub use part::PartFetcher;
pub use probe::{ProbeResponse, is_resumable, probe};
pub use sink::{OutputSink, WriteCoordinator};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
