//! iNaturalist API HTTP client

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::query::QueryParams;
use crate::rate_limiter::RateLimiter;

/// Client for the iNaturalist v1 API
///
/// Cloning is cheap; clones share the connection pool and the rate limiter,
/// so requests from every clone count against the same per-second ceiling.
#[derive(Clone)]
pub struct INatClient {
    inner: Arc<ClientInner>,
    cancel: CancellationToken,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    limiter: RateLimiter,
}

impl INatClient {
    /// Create a client from an explicit configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Config(format!("invalid API token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {}", e)))?;

        let limiter = RateLimiter::new(config.min_interval());

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                limiter,
            }),
            cancel: CancellationToken::new(),
        })
    }

    /// Create a client with default settings (public API, 1 request/second)
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Create a client configured from `INATURALIST_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// A handle whose calls stop at the next blocking point once `token` fires
    ///
    /// The returned handle still shares the rate limiter with `self`.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: self.inner.clone(),
            cancel: token,
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Execute a GET request
    pub async fn get(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        self.execute(Method::GET, endpoint, Some(params), None).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// Retried like GET; callers posting non-idempotent data should set
    /// `max_retries` to 1 on a dedicated client.
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.execute(Method::POST, endpoint, None, Some(body)).await
    }

    /// Issue one logical call with rate limiting and retries
    ///
    /// A 401 fails at once. A 429 backs off `retry_delay * attempt`, while
    /// transport failures and other error statuses back off `retry_delay`.
    /// When the attempts run out the last failure is returned wrapped in
    /// [`ApiError::RetriesExhausted`]. An empty success body yields `{}`.
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.build_url(endpoint, params)?;
        let attempts = self.inner.config.attempts();
        let mut attempt: u32 = 0;

        loop {
            self.inner.limiter.acquire(&self.cancel).await?;
            attempt += 1;
            debug!(attempt, %method, %url, "Sending iNaturalist request");

            let err = match self.dispatch(method.clone(), url.clone(), body).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() {
                debug!(attempt, %method, %url, error = %err, "iNaturalist request failed");
                return Err(err);
            }

            if attempt >= attempts {
                warn!(attempts, %method, %url, error = %err, "iNaturalist request exhausted retries");
                return Err(ApiError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let delay = self.backoff(&err, attempt);
            warn!(
                attempt,
                %method,
                %url,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Retrying iNaturalist request"
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Delay before the next attempt; `attempt` is 1-based
    fn backoff(&self, err: &ApiError, attempt: u32) -> Duration {
        let delay = self.inner.config.retry_delay;
        if err.is_rate_limited() {
            delay.saturating_mul(attempt)
        } else {
            delay
        }
    }

    async fn dispatch(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let mut request = self.inner.http.request(method, url);
        if let Some(b) = body {
            request = request.json(b);
        }

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
            r = request.send() => r?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { body },
                StatusCode::UNAUTHORIZED => ApiError::Authentication { body },
                _ => ApiError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let bytes = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
            b = response.bytes() => b?,
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn build_url(&self, endpoint: &str, params: Option<&QueryParams>) -> Result<Url> {
        let base = self.inner.config.base_url.trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))?;

        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Instant;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fast client pointed at a mock server
    pub(crate) fn test_client(server: &MockServer) -> INatClient {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_rate_limit(1000.0)
            .with_retry_delay(Duration::from_millis(5))
            .with_max_retries(3);
        INatClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taxa"))
            .and(query_param("q", "Pica pica"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_results": 1,
                "results": [{"id": 13823, "name": "Pica pica"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let params: QueryParams = [("q", "Pica pica")].into_iter().collect();
        let value = client.get("/taxa", &params).await.unwrap();

        assert_eq!(value["results"][0]["id"], 13823);
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value = client.get("taxa", &QueryParams::new()).await.unwrap();

        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("/observations", &QueryParams::new()).await.unwrap_err();

        assert!(err.is_authentication());
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("/observations", &QueryParams::new()).await.unwrap_err();

        match &err {
            ApiError::RetriesExhausted { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert!(last.is_rate_limited());
            }
            other => panic!("expected retries exhausted, got {:?}", other),
        }
        assert_eq!(err.status(), Some(429));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_retries_server_error_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value = client.get("/taxa", &QueryParams::new()).await.unwrap();

        assert_eq!(value, json!({"results": []}));
    }

    #[tokio::test]
    async fn test_status_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad taxon_id"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get("/observations", &QueryParams::new()).await.unwrap_err();

        assert!(matches!(err, ApiError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.body(), Some("bad taxon_id"));
    }

    #[tokio::test]
    async fn test_network_failure_exhausts_retries() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig::default()
            .with_base_url(format!("http://{}", addr))
            .with_rate_limit(1000.0)
            .with_retry_delay(Duration::from_millis(5))
            .with_max_retries(2);
        let client = INatClient::new(config).unwrap();

        let err = client.get("/taxa", &QueryParams::new()).await.unwrap_err();
        match err {
            ApiError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ApiError::Http(_)));
            }
            other => panic!("expected retries exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/observations"))
            .and(body_json(json!({"species_guess": "Magpie"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let value = client
            .post("/observations", &json!({"species_guess": "Magpie"}))
            .await
            .unwrap();

        assert_eq!(value["id"], 1);
    }

    #[tokio::test]
    async fn test_bearer_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer secret-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_rate_limit(1000.0)
            .with_api_token("secret-jwt");
        let client = INatClient::new(config).unwrap();

        client.get("/users/me", &QueryParams::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_spacing_between_real_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_rate_limit(20.0);
        let client = INatClient::new(config).unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            client.get("/taxa", &QueryParams::new()).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let client = test_client(&server).with_cancellation(token);

        let err = client.get("/taxa", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }

    fn slow_retry_client(server: &MockServer, retry_delay: Duration) -> INatClient {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let config = ClientConfig::default()
            .with_base_url(server.uri())
            .with_rate_limit(1000.0)
            .with_retry_delay(retry_delay)
            .with_max_retries(3);
        INatClient::new(config).unwrap()
    }

    #[test]
    fn test_backoff_grows_only_for_rate_limits() {
        let config = ClientConfig::default().with_retry_delay(Duration::from_millis(100));
        let client = INatClient::new(config).unwrap();
        let limited = ApiError::RateLimited { body: String::new() };
        let unavailable = ApiError::Status {
            status: 503,
            body: String::new(),
        };

        assert_eq!(client.backoff(&limited, 1), Duration::from_millis(100));
        assert_eq!(client.backoff(&limited, 2), Duration::from_millis(200));
        assert_eq!(client.backoff(&limited, 3), Duration::from_millis(300));
        assert_eq!(client.backoff(&unavailable, 1), Duration::from_millis(100));
        assert_eq!(client.backoff(&unavailable, 3), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_rate_limit_waits_longer_than_server_error() {
        let limited = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&limited)
            .await;
        let unavailable = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&unavailable)
            .await;
        let delay = Duration::from_millis(100);

        let start = Instant::now();
        let err = slow_retry_client(&limited, delay)
            .get("/taxa", &QueryParams::new())
            .await
            .unwrap_err();
        let limited_elapsed = start.elapsed();
        assert_eq!(err.status(), Some(429));

        let start = Instant::now();
        let err = slow_retry_client(&unavailable, delay)
            .get("/taxa", &QueryParams::new())
            .await
            .unwrap_err();
        let unavailable_elapsed = start.elapsed();
        assert_eq!(err.status(), Some(503));

        // 100ms + 200ms against a flat 100ms + 100ms
        assert!(limited_elapsed >= Duration::from_millis(300), "{:?}", limited_elapsed);
        assert!(unavailable_elapsed >= Duration::from_millis(200), "{:?}", unavailable_elapsed);
        assert!(limited_elapsed > unavailable_elapsed);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let client =
            slow_retry_client(&server, Duration::from_secs(30)).with_cancellation(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let start = Instant::now();
        let err = client.get("/taxa", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_while_response_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": []}))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let client = test_client(&server).with_cancellation(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let start = Instant::now();
        let err = client.get("/taxa", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_build_url_joins_slashes() {
        let config = ClientConfig::default().with_base_url("https://api.inaturalist.org/v1/");
        let client = INatClient::new(config).unwrap();
        let params: QueryParams = [("per_page", "5"), ("q", "喜鹊")].into_iter().collect();

        let url = client.build_url("/taxa/autocomplete", Some(&params)).unwrap();

        assert_eq!(url.path(), "/v1/taxa/autocomplete");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("per_page".to_string(), "5".to_string()),
                ("q".to_string(), "喜鹊".to_string())
            ]
        );
    }
}
