use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// store config
    pub store: StoreConfig,
    /// execution status channel config
    pub status: StatusConfig,
    /// ai suggestion config
    pub suggestion: SuggestionConfig,
    /// number of async worker threads, range [1, 32768), defaults to 16
    pub async_worker_thread_number: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// store type
    pub store_type: StoreType,
    /// postgres config
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// postgres database url
    pub database_url: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// fetch the status on a fixed cadence
    #[default]
    Interval,
    /// keep one streaming connection open
    Push,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// base url of the execution status service
    pub endpoint: String,
    /// how status updates are delivered
    pub channel: ChannelType,
    /// interval channel cadence in milliseconds
    pub poll_interval_ms: u64,
    /// timeout of a single status request in milliseconds
    pub request_timeout_ms: u64,
    /// stop polling once the execution completed or failed
    pub stop_on_terminal: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3001/api".to_string(),
            channel: ChannelType::Interval,
            poll_interval_ms: 2000,
            request_timeout_ms: 5000,
            stop_on_terminal: true,
        }
    }
}

impl StatusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// base url of an OpenAI compatible api
    pub endpoint: String,
    /// model name passed to the provider
    pub model: String,
    /// api key, takes precedence over `api_key_env`
    pub api_key: Option<String>,
    /// environment variable holding the api key
    pub api_key_env: String,
    /// provider request timeout in milliseconds
    pub timeout_ms: u64,
    /// agent type of the fallback node when no agent types are known
    pub fallback_agent_type: String,
    /// max number of goal characters used for the fallback node name
    pub fallback_name_len: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 30_000,
            fallback_agent_type: "generic-agent".to_string(),
            fallback_name_len: 30,
        }
    }
}

impl SuggestionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the api key from the config or the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| std::env::var(&self.api_key_env).ok()).filter(|key| !key.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            status: StatusConfig::default(),
            suggestion: SuggestionConfig::default(),
            async_worker_thread_number: 16,
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}
