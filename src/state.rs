use crate::config::Config;
use crate::llm_client::LlmClient;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub llm_client: Arc<LlmClient>,
}

impl AppState {
    pub fn new(config: Arc<RwLock<Config>>, llm_client: Arc<LlmClient>) -> Self {
        Self { config, llm_client }
    }
}
