use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::core::{find_header, parse_content_length};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Headers and body of a streaming response.
///
/// The body is lazy and finite; it cannot be restarted, so a new request is
/// issued to continue after a failure.
pub struct StreamResponse<E> {
    pub status: u16,
    /// The URL the response was served from, after redirects.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> StreamResponse<E> {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// `Content-Length`, with zero treated as unknown.
    pub fn content_length(&self) -> Option<u64> {
        parse_content_length(&self.headers)
    }

    pub fn is_partial_content(&self) -> bool {
        self.status == 206
    }
}

impl<E> fmt::Debug for StreamResponse<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP transport.
///
/// The minimal interface needed by the part fetchers and the resumability
/// probe. Implementations handle redirects and TLS themselves; they must
/// not turn non-2xx statuses into errors, since callers inspect the status.
///
/// # Implementations
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - scripted clients in tests
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `request` and return as soon as the response headers arrive.
    ///
    /// # Errors
    ///
    /// Returns an error when no response could be obtained (DNS failure,
    /// connection refused, reset before headers, ...).
    fn stream(
        &self,
        request: &crate::data::Request,
    ) -> impl Future<Output = std::result::Result<StreamResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;
    use crate::data::{Method, Request};
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with default configuration.
        pub fn new() -> Result<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| Error::Transport(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an already configured `reqwest::Client`.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(&self, request: &Request) -> std::result::Result<StreamResponse<Self::Error>, Self::Error> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Head => reqwest::Method::HEAD,
            };
            let mut builder = self.client.request(method, &request.url);
            for (key, value) in request.headers.iter() {
                builder = builder.header(key, value);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let url = response.url().to_string();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect();
            let body = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));

            Ok(StreamResponse { status, url, headers, body: Box::pin(body) })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
