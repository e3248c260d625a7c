use crate::config::PromptSettings;
use crate::converters::gemini::gemini_content::{ROLE_MODEL, ROLE_USER};
use crate::converters::gemini::{GeminiContent, GeminiRequest};
use crate::models::Message;

impl From<&Message> for GeminiContent {
    fn from(msg: &Message) -> Self {
        let role = if msg.sender == ROLE_USER { ROLE_USER } else { ROLE_MODEL };
        GeminiContent::text(role, msg.text.clone())
    }
}

/// Text of the opening user turn: instruction, blank line, label, prompt.
pub fn first_turn_text(prompt: &str, settings: &PromptSettings) -> String {
    format!("{}\n\n{}{}", settings.system_instruction, settings.task_label, prompt)
}

/// Builds the provider payload: the history in order, then the new user turn.
///
/// The instruction is only injected when there is no prior history, so every
/// conversation carries it exactly once, in its first user turn.
pub fn build_request(history: &[Message], prompt: &str, settings: &PromptSettings) -> GeminiRequest {
    let mut contents: Vec<GeminiContent> = history.iter().map(GeminiContent::from).collect();

    let current = if contents.is_empty() {
        GeminiContent::user(first_turn_text(prompt, settings))
    } else {
        GeminiContent::user(prompt)
    };
    contents.push(current);

    GeminiRequest { contents }
}
