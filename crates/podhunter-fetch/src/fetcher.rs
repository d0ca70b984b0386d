//! Endpoint-fallback fetcher.
//!
//! A download request first tries the target directly. Page-source requests
//! skip that step because the caller already assumes the page is not
//! reachable without a relay. Either way the proxy chain is then walked in
//! order, each relay at most once, until one returns a success status (and,
//! for text, a non-blank body). Individual failures are logged and only the
//! last one is reported when the whole chain is exhausted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use bytes::Bytes;
use metrics::counter;
use podhunter_settings::FetchSettings;
use tracing::{debug, info, instrument, warn};

use crate::errors::FetchError;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::proxy::ProxyChain;

/// Extension appended to downloaded audio files.
const AUDIO_EXTENSION: &str = ".mp3";

/// One retrieval, built per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalRequest {
    /// Target URL.
    pub url: String,
    /// Binary download (direct attempt first) vs. page source text.
    pub expect_binary: bool,
}

impl RetrievalRequest {
    /// Page-source request.
    pub fn text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expect_binary: false,
        }
    }

    /// Download request.
    pub fn binary(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expect_binary: true,
        }
    }
}

/// Successful retrieval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Decoded page text (non-blank).
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
}

impl Payload {
    /// Text view of the payload; binary bodies are decoded lossily.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Byte view of the payload.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(text) => Bytes::from(text),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Retrieves content through a direct attempt and an ordered proxy chain.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    chain: ProxyChain,
}

impl Fetcher {
    /// Fetcher over an explicit client and chain.
    pub fn new(client: Arc<dyn HttpClient>, chain: ProxyChain) -> Self {
        Self { client, chain }
    }

    /// Production fetcher built from settings.
    pub fn from_settings(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = ReqwestHttpClient::new(
            Duration::from_millis(settings.timeout_ms),
            &settings.user_agent,
        )?;
        Ok(Self::new(
            Arc::new(client),
            ProxyChain::from_endpoints(&settings.proxies),
        ))
    }

    /// The configured proxy chain.
    pub fn chain(&self) -> &ProxyChain {
        &self.chain
    }

    /// Retrieve `request.url`, falling back through the proxy chain.
    #[instrument(skip_all, fields(url = %request.url, binary = request.expect_binary))]
    pub async fn fetch(&self, request: &RetrievalRequest) -> Result<Payload, FetchError> {
        let mut attempts = 0usize;
        let mut last_error: Option<FetchError> = None;

        if request.expect_binary {
            attempts += 1;
            match self.attempt(&request.url, false).await {
                Ok(payload) => {
                    counter!("fetch_requests_total", "path" => "direct", "outcome" => "success")
                        .increment(1);
                    return Ok(payload);
                }
                Err(e) => {
                    counter!("fetch_requests_total", "path" => "direct", "outcome" => "failure")
                        .increment(1);
                    debug!(error = %e, "direct request failed, trying proxies");
                    last_error = Some(e);
                }
            }
        }

        let want_text = !request.expect_binary;
        for (index, proxy) in self.chain.iter().enumerate() {
            attempts += 1;
            let proxied = proxy.apply(&request.url);
            match self.attempt(&proxied, want_text).await {
                Ok(payload) => {
                    counter!("fetch_requests_total", "path" => "proxy", "outcome" => "success")
                        .increment(1);
                    info!(proxy_index = index, proxy = proxy.name(), "retrieved via proxy");
                    return Ok(payload);
                }
                Err(e) => {
                    counter!("fetch_requests_total", "path" => "proxy", "outcome" => "failure")
                        .increment(1);
                    warn!(
                        proxy_index = index,
                        proxy = proxy.name(),
                        kind = e.kind(),
                        error = %e,
                        "proxy attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error.map_or_else(
            || "no retrieval paths configured".to_string(),
            |e| e.to_string(),
        );
        warn!(attempts, %last_error, "retrieval exhausted");
        Err(FetchError::RetrievalExhausted {
            attempts,
            last_error,
        })
    }

    /// Page source through the proxy chain only.
    pub async fn fetch_page_source(&self, url: &str) -> Result<String, FetchError> {
        self.fetch(&RetrievalRequest::text(url))
            .await
            .map(Payload::into_text)
    }

    /// Audio bytes, direct first then through the proxy chain.
    pub async fn fetch_audio(&self, url: &str) -> Result<Bytes, FetchError> {
        self.fetch(&RetrievalRequest::binary(url))
            .await
            .map(Payload::into_bytes)
    }

    /// Audio bytes as standard base64.
    pub async fn fetch_audio_base64(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_audio(url).await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }

    /// Download audio into `dest_dir` and return the written path.
    ///
    /// `.mp3` is appended when `file_name` lacks it; without a name the file
    /// is called `extracted_audio_<unix millis>.mp3`.
    pub async fn download_to(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: Option<&str>,
    ) -> Result<PathBuf, FetchError> {
        let bytes = self.fetch_audio(url).await?;
        let path = dest_dir.join(audio_file_name(file_name));
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "audio saved");
        Ok(path)
    }

    async fn attempt(&self, url: &str, want_text: bool) -> Result<Payload, FetchError> {
        let response = self.client.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        if !want_text {
            return Ok(Payload::Binary(response.body));
        }
        let text = String::from_utf8_lossy(&response.body).into_owned();
        if text.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(Payload::Text(text))
    }
}

fn audio_file_name(requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if name.to_lowercase().ends_with(AUDIO_EXTENSION) => name.to_string(),
        Some(name) => format!("{name}{AUDIO_EXTENSION}"),
        None => format!(
            "extracted_audio_{}{AUDIO_EXTENSION}",
            chrono::Utc::now().timestamp_millis()
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::proxy::ProxyTransform;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted client: URLs map to a status and body; unknown URLs fail
    /// at the transport level.
    #[derive(Default)]
    struct ScriptedClient {
        routes: HashMap<String, (u16, &'static str)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn route(mut self, url: &str, status: u16, body: &'static str) -> Self {
            let _ = self.routes.insert(url.to_string(), (status, body));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.routes.get(url) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: Bytes::from_static(body.as_bytes()),
                }),
                None => Err(FetchError::Transport(format!("connection refused: {url}"))),
            }
        }
    }

    fn chain(n: usize) -> ProxyChain {
        ProxyChain::new(
            (0..n)
                .map(|i| ProxyTransform::Path {
                    name: format!("p{i}"),
                    prefix: format!("https://p{i}/"),
                })
                .collect(),
        )
    }

    fn fetcher(client: ScriptedClient, proxies: usize) -> (Fetcher, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        (Fetcher::new(client.clone(), chain(proxies)), client)
    }

    const TARGET: &str = "https://site.com/ep";

    #[tokio::test]
    async fn nth_proxy_success_makes_exactly_n_requests() {
        let client = ScriptedClient::default()
            .route(&format!("https://p0/{TARGET}"), 503, "busy")
            .route(&format!("https://p2/{TARGET}"), 200, "<html>ok</html>");
        let (fetcher, client) = fetcher(client, 4);

        let text = fetcher.fetch_page_source(TARGET).await.unwrap();
        assert_eq!(text, "<html>ok</html>");
        assert_eq!(
            client.calls(),
            [
                format!("https://p0/{TARGET}"),
                format!("https://p1/{TARGET}"),
                format!("https://p2/{TARGET}"),
            ]
        );
    }

    #[tokio::test]
    async fn all_proxies_fail_each_tried_once() {
        let client = ScriptedClient::default().route(&format!("https://p3/{TARGET}"), 404, "");
        let (fetcher, client) = fetcher(client, 4);

        let err = fetcher.fetch_page_source(TARGET).await.unwrap_err();
        assert_matches!(
            err,
            FetchError::RetrievalExhausted { attempts: 4, ref last_error } if last_error.contains("HTTP 404")
        );
        let calls = client.calls();
        assert_eq!(calls.len(), 4);
        for i in 0..4 {
            assert_eq!(calls[i], format!("https://p{i}/{TARGET}"));
        }
    }

    #[tokio::test]
    async fn blank_text_body_counts_as_failure() {
        let client = ScriptedClient::default()
            .route(&format!("https://p0/{TARGET}"), 200, "  \n\t ")
            .route(&format!("https://p1/{TARGET}"), 200, "source");
        let (fetcher, client) = fetcher(client, 2);

        assert_eq!(fetcher.fetch_page_source(TARGET).await.unwrap(), "source");
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn page_source_never_tries_direct() {
        let client = ScriptedClient::default().route(TARGET, 200, "direct");
        let (fetcher, client) = fetcher(client, 2);

        let _ = fetcher.fetch_page_source(TARGET).await.unwrap_err();
        assert!(!client.calls().iter().any(|c| c == TARGET));
    }

    #[tokio::test]
    async fn audio_direct_success_skips_proxies() {
        let client = ScriptedClient::default().route(TARGET, 200, "ID3audio");
        let (fetcher, client) = fetcher(client, 3);

        let bytes = fetcher.fetch_audio(TARGET).await.unwrap();
        assert_eq!(&bytes[..], b"ID3audio");
        assert_eq!(client.calls(), [TARGET.to_string()]);
    }

    #[tokio::test]
    async fn audio_direct_failure_falls_back_silently() {
        let client = ScriptedClient::default()
            .route(TARGET, 403, "forbidden")
            .route(&format!("https://p1/{TARGET}"), 200, "ID3");
        let (fetcher, client) = fetcher(client, 3);

        let bytes = fetcher.fetch_audio(TARGET).await.unwrap();
        assert_eq!(&bytes[..], b"ID3");
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn audio_exhaustion_counts_direct_attempt() {
        let (fetcher, _) = fetcher(ScriptedClient::default(), 2);
        let err = fetcher.fetch_audio(TARGET).await.unwrap_err();
        assert_matches!(err, FetchError::RetrievalExhausted { attempts: 3, .. });
    }

    #[tokio::test]
    async fn audio_base64_encodes_standard() {
        let client = ScriptedClient::default().route(TARGET, 200, "hello");
        let (fetcher, _) = fetcher(client, 1);
        assert_eq!(fetcher.fetch_audio_base64(TARGET).await.unwrap(), "aGVsbG8=");
    }

    #[tokio::test]
    async fn download_appends_extension() {
        let client = ScriptedClient::default().route(TARGET, 200, "ID3");
        let (fetcher, _) = fetcher(client, 1);
        let dir = tempfile::tempdir().unwrap();

        let path = fetcher
            .download_to(TARGET, dir.path(), Some("episode 12"))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("episode 12.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3");
    }

    #[tokio::test]
    async fn download_failure_writes_nothing() {
        let (fetcher, _) = fetcher(ScriptedClient::default(), 1);
        let dir = tempfile::tempdir().unwrap();

        let _ = fetcher.download_to(TARGET, dir.path(), None).await.unwrap_err();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn audio_file_names() {
        assert_eq!(audio_file_name(Some("show.MP3")), "show.MP3");
        assert_eq!(audio_file_name(Some("show")), "show.mp3");
        let generated = audio_file_name(Some("   "));
        assert!(generated.starts_with("extracted_audio_"));
        assert!(generated.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn end_to_end_with_wiremock_relay() {
        use wiremock::matchers::{method, path_regex};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let dead = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&dead)
            .await;
        let relay = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<audio src=x.mp3>"))
            .expect(1)
            .mount(&relay)
            .await;

        let chain = ProxyChain::new(vec![
            ProxyTransform::Path {
                name: "dead".into(),
                prefix: format!("{}/fetch/", dead.uri()),
            },
            ProxyTransform::Query {
                name: "relay".into(),
                prefix: format!("{}/raw?url=", relay.uri()),
            },
        ]);
        let client = ReqwestHttpClient::new(Duration::from_secs(5), "podhunter-test").unwrap();
        let fetcher = Fetcher::new(Arc::new(client), chain);

        let text = fetcher.fetch_page_source(TARGET).await.unwrap();
        assert_eq!(text, "<audio src=x.mp3>");
    }
}
