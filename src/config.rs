use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::common::constants::{
    DEFAULT_INTERVAL_SECS, DEFAULT_LOG_TYPE, DEFAULT_PAGE_LIMIT, DEFAULT_WINDOW_SECS, MAX_LOG_TYPE_LEN,
};
use crate::common::error::ConfigError;

/// Prefix shared by every environment variable the forwarder reads
pub const ENV_PREFIX: &str = "AUDIT_FWD_";

/// Longest window we accept; anything larger is almost certainly a unit mistake
const MAX_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Optional TOML file layout. Every key may also come from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub workspace_id: Option<String>,
    pub shared_key: Option<String>,
    pub source_url: Option<String>,
    pub source_email: Option<String>,
    pub source_token: Option<String>,
    pub log_type: Option<String>,
    pub window_secs: Option<i64>,
    pub page_limit: Option<u32>,
    pub interval_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub time_generated_field: Option<String>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Fully resolved forwarder settings, built once at startup
#[derive(Clone)]
pub struct ForwarderConfig {
    pub workspace_id: String,
    pub shared_key: String,
    pub source_url: String,
    pub source_email: String,
    pub source_token: String,
    pub log_type: String,
    pub window_secs: i64,
    pub page_limit: u32,
    pub interval_secs: u64,
    pub http_timeout_secs: Option<u64>,
    pub time_generated_field: Option<String>,
}

impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("workspace_id", &self.workspace_id)
            .field("shared_key", &"<redacted>")
            .field("source_url", &self.source_url)
            .field("source_email", &self.source_email)
            .field("source_token", &"<redacted>")
            .field("log_type", &self.log_type)
            .field("window_secs", &self.window_secs)
            .field("page_limit", &self.page_limit)
            .field("interval_secs", &self.interval_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("time_generated_field", &self.time_generated_field)
            .finish()
    }
}

impl ForwarderConfig {
    /// Load from `.env`, an optional TOML file and the process environment.
    ///
    /// The file path comes from `path`, falling back to `AUDIT_FWD_CONFIG`.
    /// Environment values win over file values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_file_layer(path)?;
        Self::from_sources(file, process_env)
    }

    /// Merge a file layer with an environment lookup and validate the result.
    /// `env` receives the unprefixed variable name, e.g. `WORKSPACE_ID`.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, fallback: Option<String>| {
            env(key).filter(|v| !v.trim().is_empty()).or(fallback)
        };

        let config = Self {
            workspace_id: text("WORKSPACE_ID", file.workspace_id)
                .ok_or(ConfigError::Missing("workspace_id"))?,
            shared_key: text("SHARED_KEY", file.shared_key).ok_or(ConfigError::Missing("shared_key"))?,
            source_url: text("SOURCE_URL", file.source_url).ok_or(ConfigError::Missing("source_url"))?,
            source_email: text("SOURCE_EMAIL", file.source_email)
                .ok_or(ConfigError::Missing("source_email"))?,
            source_token: text("SOURCE_TOKEN", file.source_token)
                .ok_or(ConfigError::Missing("source_token"))?,
            log_type: text("LOG_TYPE", file.log_type).unwrap_or_else(|| DEFAULT_LOG_TYPE.to_string()),
            window_secs: parse_env(&env, "WINDOW_SECS", "window_secs")?
                .or(file.window_secs)
                .unwrap_or(DEFAULT_WINDOW_SECS),
            page_limit: parse_env(&env, "PAGE_LIMIT", "page_limit")?
                .or(file.page_limit)
                .unwrap_or(DEFAULT_PAGE_LIMIT),
            interval_secs: parse_env(&env, "INTERVAL_SECS", "interval_secs")?
                .or(file.interval_secs)
                .unwrap_or(DEFAULT_INTERVAL_SECS),
            http_timeout_secs: parse_env(&env, "HTTP_TIMEOUT_SECS", "http_timeout_secs")?
                .or(file.http_timeout_secs),
            time_generated_field: text("TIME_GENERATED_FIELD", file.time_generated_field),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would fail at request time
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_workspace_id(&self.workspace_id)?;
        validate_shared_key(&self.shared_key)?;
        require_non_blank("source_email", &self.source_email)?;
        require_non_blank("source_token", &self.source_token)?;

        let url = reqwest::Url::parse(&self.source_url)
            .map_err(|e| invalid("source_url", e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(invalid("source_url", format!("unsupported scheme '{}'", url.scheme())));
        }

        if self.log_type.is_empty()
            || self.log_type.len() > MAX_LOG_TYPE_LEN
            || !self.log_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(invalid(
                "log_type",
                format!("must be 1-{MAX_LOG_TYPE_LEN} letters, digits or '_'"),
            ));
        }

        if self.window_secs <= 0 || self.window_secs > MAX_WINDOW_SECS {
            return Err(invalid("window_secs", format!("must be between 1 and {MAX_WINDOW_SECS}")));
        }
        if self.page_limit == 0 {
            return Err(invalid("page_limit", "must be greater than zero"));
        }
        if self.interval_secs == 0 {
            return Err(invalid("interval_secs", "must be greater than zero"));
        }
        if self.http_timeout_secs == Some(0) {
            return Err(invalid("http_timeout_secs", "must be greater than zero when set"));
        }
        Ok(())
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

/// The subset of settings needed to sign ingestion requests.
/// Used by the `sign` diagnostics command, which never talks to the audit source.
#[derive(Clone)]
pub struct SigningConfig {
    pub workspace_id: String,
    pub shared_key: String,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("workspace_id", &self.workspace_id)
            .field("shared_key", &"<redacted>")
            .finish()
    }
}

impl SigningConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_file_layer(path)?;
        Self::from_sources(file, process_env)
    }

    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, fallback: Option<String>| {
            env(key).filter(|v| !v.trim().is_empty()).or(fallback)
        };
        let config = Self {
            workspace_id: text("WORKSPACE_ID", file.workspace_id)
                .ok_or(ConfigError::Missing("workspace_id"))?,
            shared_key: text("SHARED_KEY", file.shared_key).ok_or(ConfigError::Missing("shared_key"))?,
        };
        validate_workspace_id(&config.workspace_id)?;
        validate_shared_key(&config.shared_key)?;
        Ok(config)
    }
}

/// Load `.env`, then the TOML file from `path` or `AUDIT_FWD_CONFIG` if either is set
fn load_file_layer(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    dotenv::dotenv().ok();

    let env_path = std::env::var(format!("{ENV_PREFIX}CONFIG")).ok();
    match path.map(Path::to_path_buf).or_else(|| env_path.map(Into::into)) {
        Some(p) => FileConfig::from_path(&p),
        None => Ok(FileConfig::default()),
    }
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn validate_workspace_id(workspace_id: &str) -> Result<(), ConfigError> {
    require_non_blank("workspace_id", workspace_id)?;
    if !workspace_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("workspace_id", "must contain only letters, digits and '-'"));
    }
    Ok(())
}

fn validate_shared_key(shared_key: &str) -> Result<(), ConfigError> {
    require_non_blank("shared_key", shared_key)?;
    STANDARD
        .decode(shared_key.trim())
        .map_err(|e| invalid("shared_key", format!("not valid base64: {e}")))?;
    Ok(())
}

fn parse_env<F, T>(env: &F, key: &str, field: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match env(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(field, format!("'{raw}': {e}"))),
        None => Ok(None),
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(field));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
