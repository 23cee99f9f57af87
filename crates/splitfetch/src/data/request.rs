use std::fmt;
use std::sync::Arc;

/// HTTP method used for the request template.
///
/// Requests carry no body, so only bodiless methods exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request template shared by every part of one download.
///
/// Each part clones the template and adds its own `Range` header, so the
/// caller's headers (authorization, user agent, ...) are sent with every
/// request including retries.
///
/// # Examples
///
/// ```
/// use splitfetch::Request;
///
/// let request = Request::get("https://example.com/big.iso")
///     .header("User-Agent", "splitfetch/0.1");
/// assert_eq!(request.header_value("user-agent"), Some("splitfetch/0.1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Arc<[(String, String)]>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Arc::new([]) }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Add a header, keeping any existing header with the same name.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Set a header, replacing any existing one with the same name
    /// (compared case-insensitively).
    #[must_use]
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self
            .headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case(key))
            .cloned()
            .collect();
        headers.push((key.to_string(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Remove every header with the given name.
    #[must_use]
    pub fn without_header(mut self, key: &str) -> Self {
        if self.header_value(key).is_some() {
            let headers: Vec<_> = self
                .headers
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case(key))
                .cloned()
                .collect();
            self.headers = Arc::from(headers);
        }
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
