/// Look up a header by name, ignoring ASCII case.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
}

/// Parse a `Content-Length` header.
///
/// Returns `None` when the header is absent, malformed, or zero; a zero
/// length is treated as unknown.
///
/// # Examples
///
/// ```
/// use splitfetch::core::parse_content_length;
///
/// let headers = vec![("content-length".to_string(), "1024".to_string())];
/// assert_eq!(parse_content_length(&headers), Some(1024));
/// ```
pub fn parse_content_length(headers: &[(String, String)]) -> Option<u64> {
    find_header(headers, "Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|len| *len > 0)
}

/// Parse the complete length out of a `Content-Range: bytes a-b/total` header.
///
/// Returns `None` when the header is absent, malformed, or the total is `*`.
pub fn parse_content_range_total(headers: &[(String, String)]) -> Option<u64> {
    let value = find_header(headers, "Content-Range")?;
    let rest = value.strip_prefix("bytes")?.trim_start();
    let (_, total) = rest.split_once('/')?;
    total.trim().parse::<u64>().ok()
}

/// Parse the inclusive `(a, b)` span out of a `Content-Range: bytes a-b/total`
/// header.
pub fn parse_content_range_span(headers: &[(String, String)]) -> Option<(u64, u64)> {
    let value = find_header(headers, "Content-Range")?;
    let rest = value.strip_prefix("bytes")?.trim_start();
    let (span, _) = rest.split_once('/')?;
    let (start, end) = span.split_once('-')?;
    let start = start.trim().parse::<u64>().ok()?;
    let end = end.trim().parse::<u64>().ok()?;
    (end >= start).then_some((start, end))
}
