use crate::data::ByteRange;

/// Split a resource into the ranges fetched by each connection.
///
/// When `content_length` is unknown or below `minimum_part_size`, the whole
/// resource is fetched as a single [`ByteRange::unbounded`] stream.
///
/// Otherwise the resource is cut into `connections` ranges of
/// `content_length / connections` bytes. The last range is left open so it
/// absorbs the remainder of the integer division.
///
/// A `connections` of 0 is treated as 1, and the count is capped at
/// `content_length` so no range is empty.
///
/// # Examples
///
/// ```
/// use splitfetch::core::allocate;
/// use splitfetch::ByteRange;
///
/// let ranges = allocate(Some(10), 3, 1);
/// assert_eq!(ranges, vec![
///     ByteRange::bounded(0, 2),
///     ByteRange::bounded(3, 5),
///     ByteRange::from(6),
/// ]);
///
/// assert_eq!(allocate(None, 8, 1024), vec![ByteRange::unbounded()]);
/// ```
pub fn allocate(content_length: Option<u64>, connections: u32, minimum_part_size: u64) -> Vec<ByteRange> {
    let content_length = match content_length {
        Some(len) if len >= minimum_part_size && len > 0 => len,
        _ => return vec![ByteRange::unbounded()],
    };

    let connections = u64::from(connections.max(1)).min(content_length);
    let chunk = content_length / connections;

    let mut ranges = Vec::with_capacity(connections as usize);
    for i in 0..connections - 1 {
        ranges.push(ByteRange::bounded(i * chunk, (i + 1) * chunk - 1));
    }
    ranges.push(ByteRange::from((connections - 1) * chunk));
    ranges
}
