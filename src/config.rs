use crate::core::{Result, SqlRangeError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub sqlite: Option<SqliteConfig>,
    pub exec: Option<ExecConfig>,
}

/// SQLite connection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SqliteConfig {
    /// Database file; `None` or `":memory:"` opens an in-memory database.
    pub path: Option<String>,
    /// Pragmas applied after opening, e.g. `"journal_mode = WAL"`.
    #[serde(default)]
    pub pragmas: Vec<String>,
    pub statement_cache_capacity: Option<usize>,
    pub busy_timeout_ms: Option<u64>,
}

/// Write pipeline configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExecConfig {
    /// Initial capacity of the reusable argument buffer.
    pub arg_capacity: Option<usize>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(sqlite) = &self.sqlite {
            if sqlite.pragmas.iter().any(|p| p.trim().is_empty()) {
                return Err(SqlRangeError::Config("empty pragma entry".to_string()));
            }
            if sqlite.path.as_deref() == Some("") {
                return Err(SqlRangeError::Config("sqlite.path must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```ignore
/// let config = load_config("sqlrange.toml")?;
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}
