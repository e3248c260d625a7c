use crate::config::ProviderSettings;
use crate::converters::gemini::{GeminiRequest, GeminiResponse};
use crate::error::RelayError;
use crate::request_id::RequestId;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct LlmClient {
    http_client: Arc<reqwest::Client>,
}

impl LlmClient {
    pub fn new(http_client: Arc<reqwest::Client>) -> Self {
        Self { http_client }
    }

    /// `{api_base}/models/{model}:generateContent`, without the key.
    pub fn build_target_url(provider: &ProviderSettings) -> String {
        let api_base = &provider.api_base;
        let path = format!("models/{}:generateContent", provider.model);
        if api_base.ends_with('/') { format!("{}{}", api_base, path) } else { format!("{}/{}", api_base, path) }
    }

    /// Sends one `generateContent` call and returns the raw upstream response.
    pub async fn forward_request(
        &self,
        provider: &ProviderSettings,
        request: &GeminiRequest,
        request_id: &RequestId,
    ) -> Result<reqwest::Response, RelayError> {
        let api_key = provider.api_key().ok_or(RelayError::MissingApiKey)?;
        let target_url = Self::build_target_url(provider);

        let mut target_request = self
            .http_client
            .post(&target_url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(provider.request_timeout_secs));

        // Propagate request id upstream
        if let Ok(val) = HeaderValue::from_str(&request_id.0) {
            target_request = target_request.header("x-request-id", val);
        }

        info!("Forwarding request to: {}", target_url);
        debug!(
            "request body: {}",
            serde_json::to_string(request).unwrap_or_default()
        );
        // The URL carries the key; keep it out of errors and logs
        target_request
            .json(request)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.without_url()))
    }

    /// Runs the call and unwraps the first candidate's text.
    pub async fn generate(
        &self,
        provider: &ProviderSettings,
        request: &GeminiRequest,
        request_id: &RequestId,
    ) -> Result<String, RelayError> {
        let response = match self.forward_request(provider, request, request_id).await {
            Ok(resp) => resp,
            Err(RelayError::Transport(e)) => {
                error!("Failed to reach provider: {}", e);
                return Err(RelayError::Transport(e));
            }
            Err(e) => return Err(e),
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            error!("Provider request failed with status {}: {}", status, error_text);
            return Err(RelayError::UpstreamStatus { status });
        }

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to read provider response: {}", e);
            RelayError::Transport(e)
        })?;
        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse provider response: {}; body: {}", e, body);
            RelayError::MalformedResponse(e.to_string())
        })?;

        debug!(
            "model_version={:?} finish_reason={:?}",
            parsed.model_version,
            parsed.candidates.first().and_then(|c| c.finish_reason.as_ref())
        );
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "usage: prompt={:?} candidates={:?} total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                let finish_reason = parsed.candidates.first().and_then(|c| c.finish_reason.clone());
                let block_reason = parsed.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone());
                warn!(
                    "Provider response has no text: candidates={}, finish_reason={:?}, block_reason={:?}",
                    parsed.candidates.len(),
                    finish_reason,
                    block_reason
                );
                Err(RelayError::MalformedResponse(
                    "first candidate has no text part".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PromptSettings;
    use crate::converters::conversation::build_request;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn provider(api_base: String, api_key: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            api_base,
            model: "test-model".to_string(),
            api_key: api_key.map(str::to_string),
            request_timeout_secs: 5,
        }
    }

    fn client() -> LlmClient {
        LlmClient::new(Arc::new(reqwest::Client::new()))
    }

    fn request() -> GeminiRequest {
        build_request(&[], "hello", &PromptSettings::default())
    }

    fn rid() -> RequestId {
        RequestId("req-1".to_string())
    }

    #[test]
    fn test_build_target_url() {
        let p = provider("https://example.com/v1beta".to_string(), None);
        assert_eq!(
            LlmClient::build_target_url(&p),
            "https://example.com/v1beta/models/test-model:generateContent"
        );
        let p = provider("https://example.com/v1beta/".to_string(), None);
        assert_eq!(
            LlmClient::build_target_url(&p),
            "https://example.com/v1beta/models/test-model:generateContent"
        );
    }

    #[tokio::test]
    async fn test_generate_sends_key_and_payload() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/models/test-model:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_header("x-request-id", "req-1")
            .match_body(Matcher::Json(serde_json::to_value(request()).unwrap()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"candidates":[{"content":{"role":"model","parts":[{"text":"Ответ"}]}}]}).to_string())
            .create_async()
            .await;

        let reply = client()
            .generate(&provider(server.url(), Some("secret")), &request(), &rid())
            .await
            .unwrap();
        assert_eq!(reply, "Ответ");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_key_skips_call() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client()
            .generate(&provider(server.url(), None), &request(), &rid())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/test-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let err = client()
            .generate(&provider(server.url(), Some("bad")), &request(), &rid())
            .await
            .unwrap_err();
        match err {
            RelayError::UpstreamStatus { status } => assert_eq!(status.as_u16(), 400),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        // Nothing listens on port 1
        let err = client()
            .generate(&provider("http://127.0.0.1:1".to_string(), Some("k")), &request(), &rid())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(err.code(), "generation_error");
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let err = client()
            .generate(&provider("http://127.0.0.1:1".to_string(), Some("SECRET123")), &request(), &rid())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert!(!err.to_string().contains("SECRET123"));
        assert!(!format!("{:?}", err).contains("SECRET123"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/test-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(3));
                w.write_all(br#"{"candidates":[{"content":{"parts":[{"text":"late"}]}}]}"#)
            })
            .create_async()
            .await;

        let mut settings = provider(server.url(), Some("SECRET123"));
        settings.request_timeout_secs = 1;
        let started = std::time::Instant::now();
        let err = client().generate(&settings, &request(), &rid()).await.unwrap_err();

        assert!(matches!(err, RelayError::Transport(ref e) if e.is_timeout()));
        assert_eq!(err.code(), "generation_error");
        assert!(!err.to_string().contains("SECRET123"));
        assert!(started.elapsed() < std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_success_without_candidates_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/test-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let err = client()
            .generate(&provider(server.url(), Some("k")), &request(), &rid())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/test-model:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client()
            .generate(&provider(server.url(), Some("k")), &request(), &rid())
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }
}
