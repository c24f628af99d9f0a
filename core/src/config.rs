use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE: &str = "config.toml";
pub const HOME_ENV: &str = "LEADDESK_HOME";
pub const API_TOKEN_ENV: &str = "LEADDESK_API_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("could not locate home directory")]
    NoHome,
}

/// Settings for talking to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaddeskConfig {
    /// Root URL of the record store API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Operator the session acts for; `mine` scope resolves to this id
    #[serde(default)]
    pub operator_id: String,

    /// Unit opened when none is given on the command line
    #[serde(default)]
    pub unit_id: Option<String>,

    /// Bearer token; `LEADDESK_API_TOKEN` takes precedence
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Page size used when selecting every matching lead
    #[serde(default = "default_select_chunk_size")]
    pub select_chunk_size: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_select_chunk_size() -> u32 {
    crate::expander::DEFAULT_CHUNK_SIZE
}

impl Default for LeaddeskConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            operator_id: String::new(),
            unit_id: None,
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            select_chunk_size: default_select_chunk_size(),
        }
    }
}

impl LeaddeskConfig {
    /// Reads `config.toml` under `home`, falling back to defaults when the
    /// file does not exist, then applies environment overrides.
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_FILE);
        let config = match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let config = config.with_token_override(std::env::var(API_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// A non-empty `token` replaces the configured one.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        Url::parse(&self.base_url).map_err(|err| {
            ConfigError::Invalid(format!("base_url '{}' is not a URL: {err}", self.base_url))
        })?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.select_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "select_chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// `explicit`, else `$LEADDESK_HOME`, else `~/.leaddesk`.
pub fn find_leaddesk_home(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_home) = std::env::var(HOME_ENV)
        && !env_home.is_empty()
    {
        return Ok(PathBuf::from(env_home));
    }

    let mut home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    home.push(".leaddesk");
    Ok(home)
}
