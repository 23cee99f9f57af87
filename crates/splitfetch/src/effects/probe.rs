use tracing::debug;

use super::http::HttpClient;
use crate::core::{find_header, parse_content_length, parse_content_range_total};
use crate::data::Request;
use crate::error::{Error, Result};

/// Header value requesting only the first byte.
const PROBE_RANGE: &str = "bytes=0-0";

/// What the server answered to a one-byte range request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// The URL the response was served from, after redirects.
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl ProbeResponse {
    /// `true` when the server answered with partial content (206), meaning
    /// the resource may be split into ranges.
    pub fn is_resumable(&self) -> bool {
        self.status == 206
    }

    /// Total size of the resource.
    ///
    /// Taken from `Content-Range` on a 206, or from `Content-Length` when
    /// the server ignored the range and sent the whole resource.
    pub fn total_length(&self) -> Option<u64> {
        match self.status {
            206 => parse_content_range_total(&self.headers),
            200 => parse_content_length(&self.headers),
            _ => None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Send `request` with `Range: bytes=0-0` and report the response head.
///
/// The body is dropped unread.
pub async fn probe<C: HttpClient>(client: &C, request: &Request) -> Result<ProbeResponse> {
    let request = request.clone().with_header("Range", PROBE_RANGE);
    let response = client
        .stream(&request)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    debug!(url = %response.url, status = response.status, "probed range support");
    Ok(ProbeResponse {
        status: response.status,
        url: response.url,
        headers: response.headers,
    })
}

/// Whether the server honors range requests for `request`.
pub async fn is_resumable<C: HttpClient>(client: &C, request: &Request) -> Result<bool> {
    probe(client, request).await.map(|response| response.is_resumable())
}
