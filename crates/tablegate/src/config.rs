//! TOML configuration.
//!
//! ```toml
//! version = "1"
//!
//! [database]
//! url = "${DATABASE_URL}"
//! max_connections = 5
//!
//! [tables]
//! allowed = ["users", "analyst_recommendations"]
//! ```
//!
//! `${VAR}` references are expanded from the environment before validation.

use crate::allow::TableAllowList;
use crate::error::{GateError, GateResult};
use crate::pool::DEFAULT_MAX_CONNECTIONS;
use serde::Deserialize;
use std::path::Path;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "tablegate.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    pub version: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablesConfig {
    #[serde(default)]
    pub allowed: Vec<String>,
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

impl GateConfig {
    /// Read, expand and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GateError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            GateError::Config(msg) => {
                GateError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse, expand and validate config text.
    pub fn from_toml_str(raw: &str) -> GateResult<Self> {
        let mut config: GateConfig = toml::from_str(raw)
            .map_err(|e| GateError::config(format!("failed to parse config: {e}")))?;
        config.expand_env()?;
        config.validate()?;
        Ok(config)
    }

    /// The `[tables]` allow-list.
    pub fn allow_list(&self) -> GateResult<TableAllowList> {
        TableAllowList::new(&self.tables.allowed)
            .map_err(|e| GateError::config(format!("tables.allowed: {e}")))
    }

    fn expand_env(&mut self) -> GateResult<()> {
        self.database.url = expand_env_vars(&self.database.url)?;
        for table in &mut self.tables.allowed {
            *table = expand_env_vars(table)?;
        }
        Ok(())
    }

    fn validate(&self) -> GateResult<()> {
        if self.version.trim() != "1" {
            return Err(GateError::config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(GateError::config("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(GateError::config(
                "database.max_connections must be at least 1",
            ));
        }
        self.allow_list()?;
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> GateResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(GateError::config(format!(
                    "unterminated env var reference: ${{{key}"
                )));
            }
            if key.is_empty() {
                return Err(GateError::config("invalid env var reference: ${}"));
            }

            let v = std::env::var(&key).map_err(|_| {
                GateError::config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = "1"

[database]
url = "postgres://app@localhost/app"
max_connections = 5

[tables]
allowed = ["users", "analyst_recommendations"]
"#;

    #[test]
    fn parses_sample() {
        let config = GateConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.database.url, "postgres://app@localhost/app");
        assert_eq!(config.database.max_connections, 5);

        let allow = config.allow_list().unwrap();
        assert!(allow.contains("users"));
        assert!(allow.contains("analyst_recommendations"));
        assert_eq!(allow.len(), 2);
    }

    #[test]
    fn max_connections_defaults() {
        let config = GateConfig::from_toml_str(
            "version = \"1\"\n[database]\nurl = \"postgres://localhost/db\"\n",
        )
        .unwrap();
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.allow_list().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = GateConfig::from_toml_str(&SAMPLE.replace("\"1\"", "\"2\"")).unwrap_err();
        assert!(err.to_string().contains("unsupported config version"));
    }

    #[test]
    fn rejects_zero_connections() {
        let err = GateConfig::from_toml_str(
            &SAMPLE.replace("max_connections = 5", "max_connections = 0"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_connections"));
    }

    #[test]
    fn rejects_bad_table_names() {
        let err = GateConfig::from_toml_str(
            &SAMPLE.replace("\"analyst_recommendations\"", "\"bad name\""),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
        assert!(err.to_string().contains("tables.allowed"));

        let err =
            GateConfig::from_toml_str(&SAMPLE.replace("\"analyst_recommendations\"", "\"users\""))
                .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_empty_url() {
        let err = GateConfig::from_toml_str(
            &SAMPLE.replace("postgres://app@localhost/app", "  "),
        )
        .unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn expands_env_references() {
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("a-${PATH}-b").unwrap(), format!("a-{path}-b"));
        assert_eq!(expand_env_vars("no refs $HOME").unwrap(), "no refs $HOME");
    }

    #[test]
    fn env_reference_errors() {
        assert!(expand_env_vars("${TABLEGATE_SURELY_UNSET_VAR_1234}").is_err());
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${OPEN").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GateConfig::load("/nonexistent/tablegate.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
