pub mod conversation;
pub mod gemini;
