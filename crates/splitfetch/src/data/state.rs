use super::range::ByteRange;

/// Progress of one in-flight range.
///
/// `position` is the next unwritten offset. `known_length` counts bytes from
/// [`ByteRange::offset`], so the range is finished once
/// `position >= offset + known_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartState {
    pub range: ByteRange,
    pub position: u64,
    pub known_length: Option<u64>,
}

impl PartState {
    pub fn new(range: ByteRange) -> Self {
        Self {
            range,
            position: range.offset(),
            known_length: range.len(),
        }
    }

    /// Exclusive end offset, once the length is known.
    ///
    /// `None` as well when the end would not fit in a `u64`.
    pub fn end_offset(&self) -> Option<u64> {
        self.known_length.and_then(|len| self.range.offset().checked_add(len))
    }

    /// Bytes still expected, once the length is known.
    pub fn remaining(&self) -> Option<u64> {
        self.end_offset().map(|end| end.saturating_sub(self.position))
    }

    pub fn is_complete(&self) -> bool {
        self.end_offset().is_some_and(|end| self.position >= end)
    }

    /// Record a length learned from a response whose body starts at
    /// `request_offset`. A length that is already known is never replaced,
    /// and one whose end offset does not fit in a `u64` is ignored.
    pub fn learn_length(&mut self, request_offset: u64, content_length: u64) {
        if self.known_length.is_some() || content_length == 0 {
            return;
        }
        let offset = self.range.offset();
        let length = request_offset
            .checked_sub(offset)
            .and_then(|skipped| skipped.checked_add(content_length))
            .filter(|length| offset.checked_add(*length).is_some());
        if length.is_some() {
            self.known_length = length;
        }
    }

    /// The range still to fetch, starting at the current position.
    ///
    /// An unbounded range cannot be resumed, so it restarts from scratch.
    pub fn pending(&self) -> ByteRange {
        if self.range.is_unbounded() {
            return ByteRange::unbounded();
        }
        match self.end_offset() {
            Some(end) => ByteRange::bounded(self.position, end.saturating_sub(1).max(self.position)),
            None => ByteRange::from(self.position),
        }
    }
}
