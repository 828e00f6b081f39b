//! Configuration for the judge, loaded from a JSON file and validated before startup.

use crate::pipeline::SelectionSettings;
use crate::{DEFAULT_POOL_SIZE, DEFAULT_QUEUE_CAPACITY, MIN_FETCH_PERIOD_MS};
use log::LevelFilter;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix every target schema's database user must carry in front of its configured name.
pub const TARGET_USERNAME_PREFIX: &str = "JUDGE_";

/// Default comparison templates. Both call functions from `sql/review_functions.sql`.
pub const DEFAULT_CONTENT_TEMPLATE: &str = "SELECT * FROM judge_content_difference($1, $2)";
pub const DEFAULT_ORDER_TEMPLATE: &str = "SELECT * FROM judge_order_difference($1, $2)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown configuration file extension: {0}")]
    UnsupportedExtension(String),
    #[error("{0} is required")]
    Missing(String),
    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: String },
    #[error("selection DB \"{name}\" must connect as JUDGE_{name}, not {username}")]
    UsernameMismatch { name: String, username: String },
    #[error("selection DB \"{0}\" is configured more than once")]
    DuplicateTarget(String),
    #[error("fetch_period must be at least {min} ms, found {found}")]
    FetchPeriodTooShort { min: u64, found: u64 },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

fn required(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(field.to_string()))
    } else {
        Ok(())
    }
}

/// Credentials for one database.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DbConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DbConfig {
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// The connection string with the password hidden, for logging.
    #[must_use]
    pub fn masked_connection_string(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }

    /// # Errors
    /// Returns the first missing or malformed field, prefixed with `scope`.
    pub fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        required(&format!("{scope}.username"), &self.username)?;
        required(&format!("{scope}.password"), &self.password)?;
        required(&format!("{scope}.host"), &self.host)?;
        required(&format!("{scope}.database"), &self.database)?;
        if self.host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(invalid(format!("{scope}.host"), "not a host name"));
        }
        if self.port == 0 {
            return Err(invalid(format!("{scope}.port"), "must not be 0"));
        }
        Ok(())
    }
}

/// A target schema that submissions are executed against.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetDbConfig {
    pub name: String,
    pub config: DbConfig,
}

impl TargetDbConfig {
    /// # Errors
    /// Returns an error if the credentials are incomplete or the user does not match the name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        required("selection_judge.dbs.name", &self.name)?;
        self.config
            .validate(&format!("selection_judge.dbs.{}", self.name))?;
        if self.config.username != format!("{TARGET_USERNAME_PREFIX}{}", self.name) {
            return Err(ConfigError::UsernameMismatch {
                name: self.name.clone(),
                username: self.config.username.clone(),
            });
        }
        Ok(())
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

fn default_content_template() -> String {
    DEFAULT_CONTENT_TEMPLATE.to_string()
}

fn default_order_template() -> String {
    DEFAULT_ORDER_TEMPLATE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for the selection judge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SelectionJudgeConfig {
    pub dbs: Vec<TargetDbConfig>,
    /// Milliseconds between two fetches of pending jobs.
    pub fetch_period: u64,
    pub reviewer_count: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Connections per database pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_content_template")]
    pub content_template: String,
    #[serde(default = "default_order_template")]
    pub order_template: String,
}

impl SelectionJudgeConfig {
    /// # Errors
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for target in &self.dbs {
            target.validate()?;
            if !names.insert(target.name.as_str()) {
                return Err(ConfigError::DuplicateTarget(target.name.clone()));
            }
        }
        if self.fetch_period < MIN_FETCH_PERIOD_MS {
            return Err(ConfigError::FetchPeriodTooShort {
                min: MIN_FETCH_PERIOD_MS,
                found: self.fetch_period,
            });
        }
        if self.queue_capacity == 0 {
            return Err(invalid("selection_judge.queue_capacity", "must be at least 1"));
        }
        if self.pool_size == 0 {
            return Err(invalid("selection_judge.pool_size", "must be at least 1"));
        }
        validate_template("selection_judge.content_template", &self.content_template)?;
        validate_template("selection_judge.order_template", &self.order_template)?;
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> SelectionSettings {
        SelectionSettings {
            fetch_period: Duration::from_millis(self.fetch_period),
            reviewer_count: self.reviewer_count,
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Templates receive the candidate as `$1` and the reference as `$2`.
fn validate_template(field: &str, template: &str) -> Result<(), ConfigError> {
    required(field, template)?;
    for placeholder in ["$1", "$2"] {
        if !template.contains(placeholder) {
            return Err(invalid(field, format!("does not reference {placeholder}")));
        }
    }
    Ok(())
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JudgesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub main_db: DbConfig,
    pub selection_judge: SelectionJudgeConfig,
}

impl JudgesConfig {
    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not JSON, or fails validation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {}
            other => {
                return Err(ConfigError::UnsupportedExtension(
                    other.unwrap_or_default().to_string(),
                ));
            }
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parse and validate a configuration from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid configuration.
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level_filter()?;
        self.main_db.validate("main_db")?;
        self.selection_judge.validate()
    }

    /// # Errors
    /// Returns an error if `log_level` is not a log level name.
    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| invalid("log_level", format!("unknown level {:?}", self.log_level)))
    }
}
