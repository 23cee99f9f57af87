use std::fmt;

use super::range::ByteRange;
use super::state::PartState;
use crate::error::{Error, Result};

/// How a single part ended.
#[derive(Debug)]
pub enum PartStatus {
    /// Every byte of the range was written.
    Complete,
    /// Stopped by cancellation; the range is partially written.
    Cancelled,
    /// Stopped by an error; the range is partially written.
    Failed(Error),
}

impl PartStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, PartStatus::Complete)
    }
}

/// Final state of one allocated range.
#[derive(Debug)]
pub struct PartReport {
    /// Position of the range in allocation order.
    pub index: usize,
    pub range: ByteRange,
    /// First offset of the range.
    pub start: u64,
    /// Final offset reached; bytes in `start..position` are written.
    pub position: u64,
    pub known_length: Option<u64>,
    pub status: PartStatus,
}

impl PartReport {
    pub(crate) fn new(index: usize, state: PartState, status: PartStatus) -> Self {
        Self {
            index,
            range: state.range,
            start: state.range.offset(),
            position: state.position,
            known_length: state.known_length,
            status,
        }
    }

    /// The `(start, position)` pair of this part.
    pub fn offsets(&self) -> (u64, u64) {
        (self.start, self.position)
    }

    pub fn bytes_written(&self) -> u64 {
        self.position.saturating_sub(self.start)
    }

    /// Exclusive end offset, once the length is known.
    pub fn end_offset(&self) -> Option<u64> {
        self.known_length.and_then(|len| self.start.checked_add(len))
    }

    /// The range to fetch to finish this part, or `None` when it is complete.
    pub fn remaining(&self) -> Option<ByteRange> {
        if self.status.is_complete() {
            return None;
        }
        let state = PartState {
            range: self.range,
            position: self.position,
            known_length: self.known_length,
        };
        if state.is_complete() {
            return None;
        }
        Some(state.pending())
    }
}

/// Overall outcome of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Every part finished and the parts cover the whole resource.
    Complete,
    /// Some parts stopped early; resumable from [`DownloadReport::remaining`].
    Partial,
    /// The output sink failed; its contents cannot be trusted to resume.
    Failed,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Complete => write!(f, "Complete"),
            DownloadStatus::Partial => write!(f, "Partial"),
            DownloadStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Per-part results of a download, in allocation order.
#[derive(Debug)]
pub struct DownloadReport {
    pub parts: Vec<PartReport>,
    pub content_length: Option<u64>,
}

impl DownloadReport {
    pub fn status(&self) -> DownloadStatus {
        if self
            .parts
            .iter()
            .any(|p| matches!(&p.status, PartStatus::Failed(e) if e.is_fatal()))
        {
            return DownloadStatus::Failed;
        }
        if !self.parts.iter().all(|p| p.status.is_complete()) {
            return DownloadStatus::Partial;
        }
        // Only an open-ended tail can stop short without the part noticing.
        if let Some(total) = self.content_length
            && self
                .parts
                .iter()
                .filter(|p| p.range.end.is_none())
                .any(|p| p.end_offset() != Some(total))
        {
            return DownloadStatus::Partial;
        }
        DownloadStatus::Complete
    }

    pub fn is_complete(&self) -> bool {
        self.status() == DownloadStatus::Complete
    }

    /// The `(start, position)` pair of every part.
    pub fn offsets(&self) -> Vec<(u64, u64)> {
        self.parts.iter().map(PartReport::offsets).collect()
    }

    pub fn bytes_written(&self) -> u64 {
        self.parts.iter().map(PartReport::bytes_written).sum()
    }

    /// Ranges still to fetch to finish the download.
    pub fn remaining(&self) -> Vec<ByteRange> {
        self.parts.iter().filter_map(PartReport::remaining).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PartReport, &Error)> {
        self.parts.iter().filter_map(|p| match &p.status {
            PartStatus::Failed(e) => Some((p, e)),
            _ => None,
        })
    }

    /// Convert to an error unless the download is complete.
    ///
    /// A sink failure is returned as-is; any other shortfall becomes
    /// [`Error::Incomplete`].
    pub fn into_result(self) -> Result<Self> {
        match self.status() {
            DownloadStatus::Complete => Ok(self),
            DownloadStatus::Failed => {
                let complete = self.parts.iter().filter(|p| p.status.is_complete()).count();
                let total = self.parts.len();
                let fatal = self.parts.into_iter().find_map(|p| match p.status {
                    PartStatus::Failed(e) if e.is_fatal() => Some(e),
                    _ => None,
                });
                Err(fatal.unwrap_or(Error::Incomplete { complete, total }))
            }
            DownloadStatus::Partial => Err(Error::Incomplete {
                complete: self.parts.iter().filter(|p| p.status.is_complete()).count(),
                total: self.parts.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn part(index: usize, range: ByteRange, position: u64, status: PartStatus) -> PartReport {
        let mut state = PartState::new(range);
        state.position = position;
        if state.known_length.is_none() && status.is_complete() {
            state.known_length = Some(position - range.offset());
        }
        PartReport::new(index, state, status)
    }

    #[test]
    fn test_complete_when_lengths_cover_content() {
        let report = DownloadReport {
            parts: vec![
                part(0, ByteRange::bounded(0, 49), 50, PartStatus::Complete),
                part(1, ByteRange::from(50), 100, PartStatus::Complete),
            ],
            content_length: Some(100),
        };
        assert_eq!(report.status(), DownloadStatus::Complete);
        assert_eq!(report.offsets(), vec![(0, 50), (50, 100)]);
        assert_eq!(report.bytes_written(), 100);
        assert!(report.remaining().is_empty());
    }

    #[test]
    fn test_short_coverage_is_partial() {
        let report = DownloadReport {
            parts: vec![part(0, ByteRange::unbounded(), 80, PartStatus::Complete)],
            content_length: Some(100),
        };
        assert_eq!(report.status(), DownloadStatus::Partial);
    }

    #[test]
    fn test_resumed_ranges_judged_on_their_own() {
        let report = DownloadReport {
            parts: vec![
                part(0, ByteRange::bounded(20, 49), 50, PartStatus::Complete),
                part(1, ByteRange::bounded(70, 99), 100, PartStatus::Complete),
            ],
            content_length: Some(100),
        };
        assert_eq!(report.status(), DownloadStatus::Complete);
        assert_eq!(report.bytes_written(), 60);
    }

    #[test]
    fn test_cancelled_part_is_resumable() {
        let report = DownloadReport {
            parts: vec![
                part(0, ByteRange::bounded(0, 49), 20, PartStatus::Cancelled),
                part(1, ByteRange::from(50), 100, PartStatus::Complete),
            ],
            content_length: Some(100),
        };
        assert_eq!(report.status(), DownloadStatus::Partial);
        assert_eq!(report.remaining(), vec![ByteRange::bounded(20, 49)]);
        assert!(matches!(
            report.into_result(),
            Err(Error::Incomplete { complete: 1, total: 2 })
        ));
    }

    #[test]
    fn test_sink_failure_fails_the_download() {
        let report = DownloadReport {
            parts: vec![
                part(0, ByteRange::bounded(0, 49), 10, PartStatus::Failed(Error::Sink(io::Error::other("full")))),
                part(1, ByteRange::from(50), 60, PartStatus::Failed(Error::Timeout)),
            ],
            content_length: Some(100),
        };
        assert_eq!(report.status(), DownloadStatus::Failed);
        assert_eq!(report.failures().count(), 2);
        assert!(matches!(report.into_result(), Err(Error::Sink(_))));
    }
}
