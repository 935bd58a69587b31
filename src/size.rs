//! Remote size detection and byte formatting

use futures::future::join_all;
use std::future::Future;
use tracing::{debug, warn};

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("missing content-length header")]
    MissingLength,
}

/// Result of one size lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLookup {
    Known(u64),
    Unknown,
}

impl SizeLookup {
    pub fn bytes(self) -> Option<u64> {
        match self {
            SizeLookup::Known(bytes) => Some(bytes),
            SizeLookup::Unknown => None,
        }
    }

    pub fn display(self) -> String {
        match self {
            SizeLookup::Known(bytes) => format_size(bytes),
            SizeLookup::Unknown => "Unknown".to_string(),
        }
    }
}

/// One pending lookup in a size batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRequest {
    pub item_id: u32,
    pub url: String,
}

/// Where byte lengths come from
pub trait SizeSource {
    /// Length advertised by a metadata-only request
    fn head_length(&self, url: &str) -> impl Future<Output = Result<u64, SizeError>> + Send;

    /// Length of the fully retrieved payload
    fn fetch_length(&self, url: &str) -> impl Future<Output = Result<u64, SizeError>> + Send;
}

#[derive(Clone, Default)]
pub struct HttpSizeSource {
    client: reqwest::Client,
}

impl HttpSizeSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SizeSource for HttpSizeSource {
    async fn head_length(&self, url: &str) -> Result<u64, SizeError> {
        let response = self.client.head(url).send().await?;
        if !response.status().is_success() {
            return Err(SizeError::Status(response.status().as_u16()));
        }
        // Read the header directly: the body of a HEAD response is always empty.
        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or(SizeError::MissingLength)
    }

    async fn fetch_length(&self, url: &str) -> Result<u64, SizeError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SizeError::Status(response.status().as_u16()));
        }
        let body = response.bytes().await?;
        Ok(body.len() as u64)
    }
}

/// Metadata request first, full retrieval second, `Unknown` when both fail.
pub async fn resolve<S: SizeSource>(source: &S, url: &str) -> SizeLookup {
    match source.head_length(url).await {
        Ok(bytes) => {
            debug!(url, bytes, "Size from HEAD");
            return SizeLookup::Known(bytes);
        }
        Err(e) => debug!(url, error = %e, "HEAD size lookup failed, fetching body"),
    }

    match source.fetch_length(url).await {
        Ok(bytes) => {
            debug!(url, bytes, "Size from full fetch");
            SizeLookup::Known(bytes)
        }
        Err(e) => {
            warn!(url, error = %e, "Size lookup failed");
            SizeLookup::Unknown
        }
    }
}

/// Resolve a whole batch concurrently; results keep request order.
pub async fn resolve_all<S: SizeSource>(
    source: &S,
    requests: Vec<SizeRequest>,
) -> Vec<(u32, SizeLookup)> {
    let lookups = requests.iter().map(|request| async move {
        (request.item_id, resolve(source, &request.url).await)
    });
    join_all(lookups).await
}

/// Format bytes into human-readable string (B, KB, MB, GB)
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{} B", bytes);
    }
    // 1023.96 KB would print as "1024.0 KB"
    if (value * 10.0).round() / 10.0 >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Inverse of [`format_size`], exact only to the one displayed decimal
pub fn parse_size(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() || value < 0.0 {
        return None;
    }
    let exponent = UNITS.iter().position(|u| u.eq_ignore_ascii_case(unit))?;
    Some((value * 1024f64.powi(exponent as i32)).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn formats_each_unit() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(5_368_709_120), "5.0 GB");
    }

    #[test]
    fn gb_is_the_largest_unit() {
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2048.0 GB");
    }

    #[test]
    fn rounding_up_promotes_to_next_unit() {
        assert_eq!(format_size(1_048_575), "1.0 MB");
        assert_eq!(format_size(1_073_741_823), "1.0 GB");
        assert_eq!(format_size(1_048_524), "1023.9 KB");
    }

    // One displayed decimal loses precision; 1% relative is the accepted bound.
    #[test]
    fn formatted_sizes_parse_back_within_tolerance() {
        assert_eq!(parse_size(&format_size(0)), Some(0));
        for bytes in [1023u64, 1024, 1536, 1_048_576, 5_368_709_120] {
            let parsed = parse_size(&format_size(bytes)).unwrap() as f64;
            let error = (parsed - bytes as f64).abs() / bytes as f64;
            assert!(error <= 0.01, "{bytes} parsed back as {parsed}");
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_size("Unknown"), None);
        assert_eq!(parse_size("Loading…"), None);
        assert_eq!(parse_size("1.5 TB"), None);
        assert_eq!(parse_size("12"), None);
    }

    #[derive(Default)]
    struct FakeSource {
        head: HashMap<String, u64>,
        body: HashMap<String, u64>,
    }

    impl SizeSource for FakeSource {
        async fn head_length(&self, url: &str) -> Result<u64, SizeError> {
            self.head.get(url).copied().ok_or(SizeError::MissingLength)
        }

        async fn fetch_length(&self, url: &str) -> Result<u64, SizeError> {
            self.body.get(url).copied().ok_or(SizeError::Status(404))
        }
    }

    #[tokio::test]
    async fn head_length_wins() {
        let mut source = FakeSource::default();
        source.head.insert("a".into(), 10);
        source.body.insert("a".into(), 99);
        assert_eq!(resolve(&source, "a").await, SizeLookup::Known(10));
    }

    #[tokio::test]
    async fn falls_back_to_full_fetch() {
        let mut source = FakeSource::default();
        source.body.insert("a".into(), 2048);
        assert_eq!(resolve(&source, "a").await, SizeLookup::Known(2048));
    }

    #[tokio::test]
    async fn both_paths_failing_is_unknown() {
        let source = FakeSource::default();
        let lookup = resolve(&source, "missing").await;
        assert_eq!(lookup, SizeLookup::Unknown);
        assert_eq!(lookup.display(), "Unknown");
    }

    #[tokio::test]
    async fn batch_keeps_request_order() {
        let mut source = FakeSource::default();
        source.head.insert("one".into(), 1);
        source.body.insert("three".into(), 3);
        let requests = vec![
            SizeRequest { item_id: 3, url: "three".into() },
            SizeRequest { item_id: 2, url: "two".into() },
            SizeRequest { item_id: 1, url: "one".into() },
        ];
        let results = resolve_all(&source, requests).await;
        assert_eq!(
            results,
            vec![
                (3, SizeLookup::Known(3)),
                (2, SizeLookup::Unknown),
                (1, SizeLookup::Known(1)),
            ]
        );
    }

    /// Local one-shot-per-connection HTTP server; `respond` maps the
    /// request method to the raw response text.
    async fn serve(respond: fn(&str) -> String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut len = 0;
                    while len < buf.len() {
                        let n = socket.read(&mut buf[len..]).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        len += n;
                        if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let request = String::from_utf8_lossy(&buf[..len]).to_string();
                    let method = request.split_whitespace().next().unwrap_or("");
                    let _ = socket.write_all(respond(method).as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{}/worlds/A.rbxl", addr)
    }

    fn reply(status: &str, headers: &str, body: &str) -> String {
        format!("HTTP/1.1 {status}\r\n{headers}Connection: close\r\n\r\n{body}")
    }

    fn http_source() -> HttpSizeSource {
        HttpSizeSource::new(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn http_head_reads_content_length() {
        let url = serve(|method| match method {
            "HEAD" => reply("200 OK", "Content-Length: 12345\r\n", ""),
            _ => reply("500 Internal Server Error", "Content-Length: 0\r\n", ""),
        })
        .await;
        assert_eq!(resolve(&http_source(), &url).await, SizeLookup::Known(12345));
    }

    #[tokio::test]
    async fn http_rejected_head_falls_back_to_get() {
        let url = serve(|method| match method {
            "HEAD" => reply("405 Method Not Allowed", "Content-Length: 0\r\n", ""),
            _ => reply("200 OK", "Content-Length: 3\r\n", "abc"),
        })
        .await;
        assert_eq!(resolve(&http_source(), &url).await, SizeLookup::Known(3));
    }

    #[tokio::test]
    async fn http_head_without_length_falls_back_to_get() {
        let url = serve(|method| match method {
            "HEAD" => reply("200 OK", "", ""),
            _ => reply("200 OK", "Content-Length: 5\r\n", "hello"),
        })
        .await;
        let source = http_source();
        assert!(matches!(
            source.head_length(&url).await,
            Err(SizeError::MissingLength)
        ));
        assert_eq!(resolve(&source, &url).await, SizeLookup::Known(5));
    }

    #[tokio::test]
    async fn http_both_missing_is_unknown() {
        let url = serve(|_| reply("404 Not Found", "Content-Length: 0\r\n", "")).await;
        let source = http_source();
        assert!(matches!(
            source.fetch_length(&url).await,
            Err(SizeError::Status(404))
        ));
        assert_eq!(resolve(&source, &url).await, SizeLookup::Unknown);
    }
}
