//! Application configuration
//!
//! Values come from three layers, later ones winning:
//! built-in defaults, an optional JSON file (`config.json` unless
//! `STOCK_AGENTS_CONFIG` points elsewhere), and environment variables
//! (a `.env` file is loaded into the environment at startup).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::YahooClient;
use crate::models::{AgentSpec, LookbackPeriod};
use crate::services::chart_service::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::utils::errors::ConfigError;

pub const CONFIG_PATH_VAR: &str = "STOCK_AGENTS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Top-level key accepted for compatibility with a bare `{"api_key": "..."}` file
    api_key: Option<String>,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub requests_per_minute: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            request_timeout_secs: 120,
            requests_per_minute: 60,
        }
    }
}

// Keeps the API key out of logs
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Upper bound on transcript length, opening message included.
    ///
    /// Each agent speaks once, so this only cuts the session short for panels
    /// of `max_round` agents or more.
    pub max_round: usize,
    pub agents: Vec<AgentConfig>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_round: 10,
            agents: AgentSpec::default_panel()
                .into_iter()
                .map(|a| AgentConfig {
                    name: a.name,
                    system_message: a.system_message,
                })
                .collect(),
        }
    }
}

impl ChatConfig {
    pub fn panel(&self) -> Vec<AgentSpec> {
        self.agents
            .iter()
            .map(|a| AgentSpec::new(&a.name, &a.system_message))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub system_message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbol: String,
    pub period: LookbackPeriod,
    pub output_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub market_data_base_url: String,
    pub market_data_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: "MSFT".to_string(),
            period: LookbackPeriod::default(),
            output_dir: PathBuf::from("."),
            chart_width: DEFAULT_WIDTH,
            chart_height: DEFAULT_HEIGHT,
            market_data_base_url: YahooClient::DEFAULT_BASE_URL.to_string(),
            market_data_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `STOCK_AGENTS_CONFIG` (or
    /// `config.json`) and the process environment.
    ///
    /// A missing default file is fine; a missing file that was asked for explicitly is not.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_VAR).ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() || explicit.is_some() {
            Self::from_file(&path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let top_level_key = config.api_key.take();
        if config.llm.api_key.is_none() {
            config.llm.api_key = top_level_key;
        }
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Override values from environment variables, looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = non_empty("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = non_empty("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(raw) = non_empty("LLM_TEMPERATURE") {
            self.llm.temperature = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("LLM_TEMPERATURE '{}' is not a number", raw)))?;
        }
        if let Some(raw) = non_empty("LLM_REQUEST_TIMEOUT_SECS") {
            self.llm.request_timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("LLM_REQUEST_TIMEOUT_SECS '{}' is not a whole number", raw))
            })?;
        }
        if let Some(symbol) = non_empty("STOCK_SYMBOL") {
            self.analysis.symbol = symbol;
        }
        if let Some(period) = non_empty("STOCK_PERIOD") {
            self.analysis.period = period.parse()?;
        }
        if let Some(dir) = non_empty("CHART_OUTPUT_DIR") {
            self.analysis.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.request_timeout_secs == 0 || self.analysis.market_data_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".to_string()));
        }
        if self.llm.requests_per_minute == 0 {
            return Err(ConfigError::Invalid("requests_per_minute must be greater than zero".to_string()));
        }
        if self.chat.max_round < 2 {
            return Err(ConfigError::Invalid(format!(
                "max_round must allow at least one reply, got {}",
                self.chat.max_round
            )));
        }
        if self.chat.agents.is_empty() {
            return Err(ConfigError::Invalid("chat panel has no agents".to_string()));
        }
        if self.analysis.chart_width == 0 || self.analysis.chart_height == 0 {
            return Err(ConfigError::Invalid("chart dimensions must be non-zero".to_string()));
        }
        normalize_symbol(&self.analysis.symbol)?;
        Ok(())
    }

    /// The LLM API key, required only once the chat panel runs
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Trim and upper-case a ticker, rejecting empty or non-ticker input
pub fn normalize_symbol(symbol: &str) -> Result<String, ConfigError> {
    let normalized = symbol.trim().to_uppercase();
    let valid = !normalized.is_empty()
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(ConfigError::InvalidSymbol(symbol.to_string()));
    }
    Ok(normalized)
}
