use maxline_types::MaxlineError;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_model_id() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_max_thinking_tokens() -> u32 {
    1024
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier sent with every invocation.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Output-token budget per invocation (defaults to 4096).
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Thinking-token budget; 0 disables extended thinking.
    #[serde(default = "default_max_thinking_tokens")]
    pub max_thinking_tokens: u32,
    /// Whether to annotate system context with the ephemeral-cache marker.
    #[serde(default = "default_true")]
    pub enable_prompt_caching: bool,
    /// Raw API key (takes precedence over OAuth tokens).
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            max_output_tokens: default_max_output_tokens(),
            max_thinking_tokens: default_max_thinking_tokens(),
            enable_prompt_caching: true,
            api_key: None,
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults and
    /// `MAXLINE_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::Config`] if the YAML is invalid or the result
    /// fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, MaxlineError> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::string(yaml))
            .merge(Env::prefixed("MAXLINE_"))
            .extract()
            .map_err(|e| MaxlineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file path, merged with defaults and
    /// `MAXLINE_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::Config`] if the file cannot be read or parsed,
    /// or the result fails validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self, MaxlineError> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("MAXLINE_"))
            .extract()
            .map_err(|e| MaxlineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde defaults alone cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`MaxlineError::Config`] if `model_id` is empty or
    /// `max_output_tokens` is zero.
    pub fn validate(&self) -> Result<(), MaxlineError> {
        if self.model_id.trim().is_empty() {
            return Err(MaxlineError::Config("model_id must not be empty".into()));
        }
        if self.max_output_tokens == 0 {
            return Err(MaxlineError::Config(
                "max_output_tokens must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
