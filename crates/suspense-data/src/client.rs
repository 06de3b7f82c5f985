//! JSON fetch client with no-cache semantics.

use http::header::{CACHE_CONTROL, PRAGMA, USER_AGENT};
use serde::de::DeserializeOwned;
use suspense_core::ProducerError;
use tracing::debug;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("suspense-stream/", env!("CARGO_PKG_VERSION"));

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error! status: {status}")]
    Http { status: u16, url: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Deserialization error: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<FetchError> for ProducerError {
    fn from(err: FetchError) -> Self {
        ProducerError::new(err.to_string())
    }
}

/// HTTP client for section producers.
///
/// Every request bypasses caches (`Cache-Control: no-store`) so each
/// producer invocation sees fresh data.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    user_agent: String,
}

impl FetchClient {
    /// Create a new fetch client.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Resolve relative paths against `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Override the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) if !path.starts_with("http://") && !path.starts_with("https://") => {
                format!("{}/{}", base, path.trim_start_matches('/'))
            }
            _ => path.to_string(),
        }
    }

    /// GET `path` and decode the JSON body.
    ///
    /// Non-success statuses become [`FetchError::Http`]; network failures
    /// become [`FetchError::Request`]; malformed bodies become
    /// [`FetchError::Decode`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        debug!(%url, "fetching");

        let resp = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[derive(Debug, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    /// Answer exactly one request with a canned response; hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            let _ = tx.send(String::from_utf8_lossy(&request).to_string());
        });

        (format!("http://{}", addr), rx)
    }

    #[test]
    fn test_url_resolution() {
        let client = FetchClient::new().with_base_url("https://jsonplaceholder.typicode.com/");
        assert_eq!(client.url("/users/1"), "https://jsonplaceholder.typicode.com/users/1");
        assert_eq!(client.url("posts?_limit=3"), "https://jsonplaceholder.typicode.com/posts?_limit=3");
        assert_eq!(client.url("http://localhost/x"), "http://localhost/x");
        assert_eq!(FetchClient::new().url("/users/1"), "/users/1");
    }

    #[tokio::test]
    async fn test_get_json_sends_no_cache_headers() {
        let (base, request) = serve_once("200 OK", r#"{"id":1,"name":"Leanne Graham"}"#).await;
        let client = FetchClient::new().with_base_url(base);

        let user: User = client.get_json("/users/1").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Leanne Graham");

        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /users/1 "));
        assert!(request.contains("cache-control: no-store"));
        assert!(request.contains("pragma: no-cache"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (base, _request) = serve_once("500 Internal Server Error", "{}").await;
        let client = FetchClient::new().with_base_url(base);

        let err = client.get_json::<User>("/users/1").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error! status: 500");

        let producer_err: ProducerError = err.into();
        assert_eq!(producer_err.message(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (base, _request) = serve_once("200 OK", "not json").await;
        let client = FetchClient::new().with_base_url(base);

        let err = client.get_json::<User>("/users/1").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
