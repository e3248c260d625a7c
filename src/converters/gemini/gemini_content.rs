use crate::converters::gemini::GeminiPart;
use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_MODEL: &str = "model";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // "user" or "model"
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    pub fn text<R: Into<String>, T: Into<String>>(role: R, text: T) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![GeminiPart::text(text)],
        }
    }

    pub fn user<T: Into<String>>(text: T) -> Self {
        Self::text(ROLE_USER, text)
    }

    /// Text of the first part, if that part is text.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().and_then(GeminiPart::as_text)
    }
}
