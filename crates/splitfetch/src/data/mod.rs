//! Immutable data types for range downloading.
//!
//! Configuration, request templates, byte ranges, per-part state and the
//! reports handed back to callers. Nothing in here performs I/O.

pub mod options;
pub mod range;
pub mod report;
pub mod request;
pub mod state;

pub use options::{DEFAULT_CONNECTIONS, FetchOptions, MINIMUM_PART_SIZE, PartProgressFactory};
pub use range::ByteRange;
pub use report::{DownloadReport, DownloadStatus, PartReport, PartStatus};
pub use request::{Method, Request};
pub use state::PartState;
