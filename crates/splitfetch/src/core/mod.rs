//! Pure transformations for range downloading.
//!
//! Range allocation, header parsing and retry backoff. No function in this
//! module performs I/O.

mod allocate;
mod headers;
mod retry;

pub use allocate::allocate;
pub use headers::{
    find_header, parse_content_length, parse_content_range_span, parse_content_range_total,
};
pub use retry::{MAX_RETRY_DELAY, retry_delay};
