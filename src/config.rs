//! Configuration management for the research agent.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8501`.
//! - `DEFAULT_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o-mini`.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible API base. Defaults to `https://api.openai.com/v1`.
//! - `LLM_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.3`.
//! - `LLM_MAX_TOKENS` - Optional. Completion length cap. Defaults to `1000`.
//! - `MAX_ITERATIONS` - Optional. Maximum reasoning loop turns. Defaults to `15`.
//! - `MAX_PARSE_RETRIES` - Optional. Malformed-output retries per run. Defaults to `3`.
//! - `WIKIPEDIA_TOP_K` - Optional. Wikipedia pages per lookup. Defaults to `3`.
//! - `ARXIV_TOP_K` - Optional. arXiv papers per lookup. Defaults to `3`.
//! - `PYTHON_BIN` - Optional. Interpreter for the Python REPL tool. Defaults to `python3`.
//! - `PYTHON_TIMEOUT_SECS` - Optional. Python REPL timeout. Defaults to `30`.
//! - `AGENT_CACHE_CAPACITY` - Optional. Cached reasoning loops. Defaults to `64`.
//!
//! The OpenAI API key is not read from the environment. It is
//! supplied with each request and handed to the model client directly.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Model client settings shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Chat model identifier
    pub model: String,

    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion length cap in tokens
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// Bounds on a single reasoning loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopLimits {
    /// Maximum think/act/observe turns
    pub max_iterations: usize,

    /// Malformed model outputs tolerated before giving up
    pub max_parse_retries: usize,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_parse_retries: 3,
        }
    }
}

/// Tool adapter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Wikipedia pages returned per lookup
    pub wikipedia_top_k: usize,

    /// Wikipedia output cap in characters
    pub wikipedia_max_chars: usize,

    /// arXiv papers returned per lookup
    pub arxiv_top_k: usize,

    /// Python interpreter binary
    pub python_bin: String,

    /// Python execution timeout in seconds
    pub python_timeout_secs: u64,

    /// Outbound HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            wikipedia_top_k: 3,
            wikipedia_max_chars: 4000,
            arxiv_top_k: 3,
            python_bin: "python3".to_string(),
            python_timeout_secs: 30,
            http_timeout_secs: 30,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Model client settings
    pub llm: LlmConfig,

    /// Reasoning loop bounds
    pub limits: LoopLimits,

    /// Tool adapter settings
    pub tools: ToolsConfig,

    /// Maximum number of cached reasoning loops
    pub agent_cache_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT", defaults.port)?;

        let llm = LlmConfig {
            model: std::env::var("DEFAULT_MODEL").unwrap_or(defaults.llm.model),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.llm.base_url),
            temperature: env_parse("LLM_TEMPERATURE", defaults.llm.temperature)?,
            max_tokens: env_parse("LLM_MAX_TOKENS", defaults.llm.max_tokens)?,
        };

        let limits = LoopLimits {
            max_iterations: env_parse("MAX_ITERATIONS", defaults.limits.max_iterations)?,
            max_parse_retries: env_parse("MAX_PARSE_RETRIES", defaults.limits.max_parse_retries)?,
        };
        if limits.max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let tools = ToolsConfig {
            wikipedia_top_k: env_parse("WIKIPEDIA_TOP_K", defaults.tools.wikipedia_top_k)?,
            arxiv_top_k: env_parse("ARXIV_TOP_K", defaults.tools.arxiv_top_k)?,
            python_bin: std::env::var("PYTHON_BIN").unwrap_or(defaults.tools.python_bin),
            python_timeout_secs: env_parse(
                "PYTHON_TIMEOUT_SECS",
                defaults.tools.python_timeout_secs,
            )?,
            ..defaults.tools
        };

        let agent_cache_capacity =
            env_parse("AGENT_CACHE_CAPACITY", defaults.agent_cache_capacity)?;

        Ok(Self {
            host,
            port,
            llm,
            limits,
            tools,
            agent_cache_capacity,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            llm: LlmConfig::default(),
            limits: LoopLimits::default(),
            tools: ToolsConfig::default(),
            agent_cache_capacity: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
