use std::fmt;

/// A span of byte offsets within the remote resource.
///
/// `end` is inclusive, matching the `Range: bytes=<start>-<end>` header.
///
/// - `start = Some(s), end = Some(e)`: the closed span `[s, e]`
/// - `start = Some(s), end = None`: from `s` to the end of the resource
/// - `start = None, end = None`: the whole resource as one unbounded stream,
///   requested without any `Range` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl ByteRange {
    /// The whole resource, fetched without a `Range` header.
    pub const fn unbounded() -> Self {
        Self { start: None, end: None }
    }

    /// From `start` to the end of the resource.
    pub const fn from(start: u64) -> Self {
        Self { start: Some(start), end: None }
    }

    /// The closed span `[start, end]`.
    ///
    /// `end` is clamped to `start` so the range is never inverted.
    pub fn bounded(start: u64, end: u64) -> Self {
        Self { start: Some(start), end: Some(end.max(start)) }
    }

    /// First byte offset covered by this range.
    pub fn offset(&self) -> u64 {
        self.start.unwrap_or(0)
    }

    /// Number of bytes covered, if the range is closed.
    pub fn len(&self) -> Option<u64> {
        self.end
            .and_then(|end| end.checked_sub(self.offset()))
            .and_then(|span| span.checked_add(1))
    }

    /// Returns `true` when no `Range` header is sent for this range.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// The `Range` header value for this range, if one is needed.
    pub fn header_value(&self) -> Option<String> {
        match (self.start, self.end) {
            (None, None) => None,
            (start, Some(end)) => Some(format!("bytes={}-{}", start.unwrap_or(0), end)),
            (Some(start), None) => Some(format!("bytes={start}-")),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "*"),
            (start, Some(end)) => write!(f, "{}-{}", start.unwrap_or(0), end),
            (Some(start), None) => write!(f, "{start}-"),
        }
    }
}
