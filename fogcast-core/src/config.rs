use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

/// Server configuration, merged from the optional TOML config file and
/// environment variables. Environment values win over the file.
///
/// Example TOML:
/// base_url = "http://localhost:5000"
/// timeout_secs = 30
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the upstream Fogcast API.
    pub base_url: String,

    /// Per-request timeout in seconds. A single attempt, no retries.
    pub timeout_secs: u64,

    /// Name announced during the MCP handshake.
    pub server_name: String,

    /// Log filter, e.g. "info" or "fogcast_core=debug".
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            server_name: "fogcast-weather".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults if the file doesn't exist yet),
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        cfg.apply_vars(|name| env::var(name).ok())?;
        Ok(cfg)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a plain map in tests).
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var("FOGCAST_BASE_URL") {
            self.base_url = url;
        }
        if let Some(timeout) = var("FOGCAST_TIMEOUT") {
            self.timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid FOGCAST_TIMEOUT value: {timeout}"))?;
        }
        if let Some(name) = var("MCP_SERVER_NAME") {
            self.server_name = name;
        }
        if let Some(filter) = var("FOGCAST_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    /// Reject configurations that cannot possibly work.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!("Missing required configuration: base_url"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("de", "fogcast", "fogcast-mcp")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_reference_deployment() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url, "http://localhost:5000");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.server_name, "fogcast-weather");
    }

    #[test]
    fn environment_overrides_take_precedence() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("FOGCAST_BASE_URL", "http://fogcast.example:8080"),
            ("FOGCAST_TIMEOUT", "5"),
            ("MCP_SERVER_NAME", "fogcast-test"),
        ]);

        let mut cfg = Config::default();
        cfg.apply_vars(|name| vars.get(name).map(ToString::to_string)).expect("apply");

        assert_eq!(cfg.base_url, "http://fogcast.example:8080");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.server_name, "fogcast-test");
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn malformed_timeout_is_an_error() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_vars(|name| (name == "FOGCAST_TIMEOUT").then(|| "soon".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("Invalid FOGCAST_TIMEOUT"));
    }

    #[test]
    fn empty_base_url_fails_validation() {
        let cfg = Config { base_url: "  ".to_string(), ..Config::default() };
        let err = cfg.validate().unwrap_err();

        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("base_url = \"http://upstream:5000\"").expect("parse");

        assert_eq!(cfg.base_url, "http://upstream:5000");
        assert_eq!(cfg.timeout_secs, 30);
    }
}
