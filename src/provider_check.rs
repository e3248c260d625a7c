use crate::config::ProviderSettings;
use crate::converters::gemini::{GeminiContent, GeminiRequest};
use crate::error::RelayError;
use crate::llm_client::LlmClient;
use crate::request_id::RequestId;

/// Sends a single "ping" turn to the configured provider and reports the outcome.
pub async fn perform_provider_check(
    provider: &ProviderSettings,
    llm_client: &LlmClient,
) -> anyhow::Result<()> {
    println!("Checking provider model {} at {}:", provider.model, provider.api_base);

    let request = GeminiRequest { contents: vec![GeminiContent::user("ping")] };
    let req_id = RequestId::generate();

    match llm_client.forward_request(provider, &request, &req_id).await {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                println!("[OK] {}", provider.model);
                Ok(())
            } else {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read body>".to_string());
                println!("[FAIL] {} (status: {})\n  {}", provider.model, status, truncate(&body, 500));
                anyhow::bail!("provider check failed with status {}", status)
            }
        }
        Err(RelayError::MissingApiKey) => {
            println!("[ERROR] {}: no API key configured", provider.model);
            Err(RelayError::MissingApiKey.into())
        }
        Err(e) => {
            println!("[ERROR] {}: {}", provider.model, e);
            Err(e.into())
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}
