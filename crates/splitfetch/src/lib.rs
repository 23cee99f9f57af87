//! Multi-connection HTTP range downloading into a single shared sink.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Range Allocation**: the resource is cut into disjoint ranges, the last
//!   one open-ended so it absorbs any remainder
//! - **Serialized Writes**: every part writes through one gate that owns the sink
//! - **Resume by Offset**: a failed attempt is re-requested from the last
//!   written byte, with a bounded retry budget and exponential backoff
//! - **Cooperative Cancellation**: parts stop at the next chunk boundary and
//!   report how far they got

pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod progress;

pub use data::{
    ByteRange, DownloadReport, DownloadStatus, FetchOptions, Method, PartReport, PartState, PartStatus, Request,
};
pub use effects::{
    BoxStream, Downloaded, HttpClient, OutputSink, PartFetcher, ProbeResponse, SplitFetcher, StreamResponse,
    WriteCoordinator, is_resumable, probe,
};
pub use progress::{ProgressCounter, ProgressSink};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

#[cfg(feature = "indicatif")]
pub use progress::progress_bar;

pub use error::{Error, Result};

pub use tokio_util::sync::CancellationToken;
