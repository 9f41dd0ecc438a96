// Review service client - POST /analyze and /fix against the code review backend
use crate::models::{AnalyzeResponse, CodeRequest, FixResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Path prefix under which the backend exposes its code endpoints
pub const ENDPOINT_PREFIX: &str = "/api/code";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to reach review service: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx reply; carries the server's `error` text or a generic status line
    #[error("{0}")]
    Status(String),
    #[error("Malformed response from review service: {0}")]
    Decode(String),
}

/// The remote analysis service, as seen by the workflow
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn analyze(&self, request: &CodeRequest) -> Result<AnalyzeResponse, ApiError>;
    async fn fix(&self, request: &CodeRequest) -> Result<FixResponse, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct ReviewClient {
    http: Client,
    base_url: String,
}

impl ReviewClient {
    /// `api_url` is the server root; endpoints live under `/api/code`
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: endpoint_base(api_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &CodeRequest,
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("POST {} ({} bytes of {})", url, request.code.len(), request.language);

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            warn!("{} returned {}: {}", endpoint, status.as_u16(), message);
            return Err(ApiError::Status(message));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ReviewService for ReviewClient {
    async fn analyze(&self, request: &CodeRequest) -> Result<AnalyzeResponse, ApiError> {
        self.post("analyze", request).await
    }

    async fn fix(&self, request: &CodeRequest) -> Result<FixResponse, ApiError> {
        self.post("fix", request).await
    }
}

pub fn endpoint_base(api_url: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), ENDPOINT_PREFIX)
}

/// The body's `error` field if present, else a generic status line
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| {
            format!(
                "API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ReviewClient {
        ReviewClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn request() -> CodeRequest {
        CodeRequest::new("print('hi')", "python")
    }

    #[test]
    fn test_endpoint_base() {
        assert_eq!(
            endpoint_base("http://localhost:8080/"),
            "http://localhost:8080/api/code"
        );
        assert_eq!(endpoint_base("https://x.dev"), "https://x.dev/api/code");
    }

    #[test]
    fn test_error_message_prefers_body() {
        let msg = error_message(StatusCode::BAD_GATEWAY, r#"{"error":"Failed to analyze code: boom"}"#);
        assert_eq!(msg, "Failed to analyze code: boom");
    }

    #[test]
    fn test_error_message_generic_fallback() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "API error: 500 Internal Server Error"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"detail":"x"}"#),
            "API error: 404 Not Found"
        );
    }

    #[tokio::test]
    async fn test_analyze_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/code/analyze"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"code": "print('hi')", "language": "python"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"analysis": "Looks good", "tokens": 12})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).analyze(&request()).await.unwrap();
        assert_eq!(response.analysis, "Looks good");
    }

    #[tokio::test]
    async fn test_fix_returns_fixed_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/code/fix"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"fixed_code": "print('hi')"})),
            )
            .mount(&server)
            .await;

        let response = client(&server).fix(&request()).await.unwrap();
        assert_eq!(response.fixed_code, "print('hi')");
    }

    #[tokio::test]
    async fn test_non_success_uses_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/code/analyze"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to analyze code"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).analyze(&request()).await.unwrap_err();
        match err {
            ApiError::Status(ref message) => assert_eq!(message, "Failed to analyze code"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.to_string(), "Failed to analyze code");
    }

    #[tokio::test]
    async fn test_non_success_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/code/fix"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).fix(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_fix_without_fixed_code_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/code/fix"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": 1})))
            .mount(&server)
            .await;

        let err = client(&server).fix(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = ReviewClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client.analyze(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
