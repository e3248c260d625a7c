use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Ты — StartMind, опытный бизнес-аналитик и стратег. Твоя задача — помогать пользователям развивать их идеи в конкретные бизнес-документы. Когда пользователь дает тебе идею, твой первый шаг — предложить основной документ для создания (например, 'отчет по анализу рынка', 'структура бизнес-плана', 'финансовый прогноз'). Затем задавай уточняющие вопросы, чтобы шаг за шагом составить документ. Отвечай в четких, структурированных форматах, таких как списки или планы, когда это уместно. Твои ответы должны быть лаконичными и по делу. Общайся на русском языке.";
pub const DEFAULT_TASK_LABEL: &str = "ЗАДАЧА ПОЛЬЗОВАТЕЛЯ: ";

/// Environment variable holding the provider key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub prompt: PromptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ProviderSettings {
    /// Configured key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Prepended to the first user turn of a conversation.
    pub system_instruction: String,
    pub task_label: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            task_label: DEFAULT_TASK_LABEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the optional YAML file, then applies process environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: Option<&str>, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(lookup))
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.provider.api_key = Some(key);
        }
        self
    }
}
