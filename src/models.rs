use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of the caller's chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// `"user"` for the human side; any other value is treated as the model.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, deserialize_with = "lenient_history")]
    pub history: Vec<Message>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: String,
}

/// Accepts any JSON value: strings as-is, `null` as empty, other scalars
/// and structures as their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Message>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_missing_fields() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.history.is_empty());
        assert_eq!(req.prompt, "");

        let req: GenerateRequest =
            serde_json::from_str(r#"{"history":[{"text":"hi"}],"prompt":"p"}"#).unwrap();
        assert_eq!(req.history[0].sender, "");
        assert_eq!(req.history[0].text, "hi");
    }

    #[test]
    fn test_request_accepts_non_string_fields() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{"history":[{"sender":null,"text":"hi"},{"sender":2,"text":null},{"sender":"user","text":7}],"prompt":null}"#,
        )
        .unwrap();
        assert_eq!(req.history[0].sender, "");
        assert_eq!(req.history[1].sender, "2");
        assert_eq!(req.history[1].text, "");
        assert_eq!(req.history[2].text, "7");
        assert_eq!(req.prompt, "");

        let req: GenerateRequest = serde_json::from_str(r#"{"history":null,"prompt":"p"}"#).unwrap();
        assert!(req.history.is_empty());
    }
}
