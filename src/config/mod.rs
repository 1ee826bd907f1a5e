use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CourierConfig {
    /// Cracking server address. Required.
    pub server_ip: String,

    /// Cracking server port. Required.
    pub server_port: u16,

    /// Override for the job-list endpoint. Defaults to
    /// `http://{server_ip}:{server_port}/api/jobs`.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Conversion tool binary name or path.
    #[serde(default = "default_convert_tool")]
    pub convert_tool: String,

    /// Seconds between status-poller cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upload attempts per queued file before it is dropped as
    /// permanently failed.
    #[serde(default = "default_max_upload_attempts")]
    pub max_upload_attempts: u32,

    /// Timeout applied to every HTTP request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Timeout for a single conversion-tool run.
    #[serde(default = "default_convert_timeout_secs")]
    pub convert_timeout_secs: u64,
}

fn default_convert_tool() -> String {
    "hcxpcapngtool".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_max_upload_attempts() -> u32 {
    3
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_convert_timeout_secs() -> u64 {
    60
}

impl CourierConfig {
    /// Load configuration from `COURIER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed("COURIER_").from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject connection settings the courier cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_ip.trim().is_empty() {
            return Err(ConfigError::Invalid("server_ip must not be empty"));
        }
        if self.server_port == 0 {
            return Err(ConfigError::Invalid("server_port must not be zero"));
        }
        if self.max_upload_attempts == 0 {
            return Err(ConfigError::Invalid("max_upload_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Base URL of the cracking server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server_ip, self.server_port)
    }

    /// Job-list endpoint, honoring the `api_url` override.
    pub fn jobs_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("{}/api/jobs", self.base_url()))
    }
}

/// The only failure that is fatal at plugin load.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid connection settings: {0}")]
    Invalid(&'static str),

    #[error("failed to load configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
