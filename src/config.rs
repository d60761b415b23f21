//! Configuration management module
//!
//! Per §6, the listening port and bind address are configurable and
//! "all other behaviours are code-level constants" — so this stays
//! deliberately small. Layering: built-in defaults, then an optional
//! file (`TASKBROWSER_CONFIG`, defaulting to `config/taskbrowser.toml`
//! if present), then environment variables prefixed `TASKBROWSER_`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::AppResult;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on Agent Sessions running concurrently; each holds a
    /// dedicated headful browser, so this is a real resource ceiling.
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,

    /// Both must be set to unlock the reasoning path (§6); absent means
    /// the deterministic fallback runs unconditionally via `NullOracle`.
    pub oracle_endpoint: Option<String>,
    pub oracle_api_key: Option<String>,

    /// Best-effort Workstream persistence target (§6). `None` disables
    /// persistence entirely rather than failing requests.
    pub workstream_store_path: Option<PathBuf>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent_sessions() -> usize {
    4
}

impl AppConfig {
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut builder = config::Config::builder()
            .set_default("bind_addr", default_bind_addr())?
            .set_default("log_level", default_log_level())?
            .set_default("max_concurrent_sessions", default_max_concurrent_sessions() as i64)?;

        let file_path = config_path.or_else(|| {
            std::env::var("TASKBROWSER_CONFIG").ok().map(PathBuf::from).or_else(|| {
                let default = PathBuf::from("config/taskbrowser.toml");
                default.exists().then_some(default)
            })
        });

        if let Some(path) = file_path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TASKBROWSER")
                .try_parsing(true)
                .separator("__"),
        );

        let settings = builder.build()?;
        let app_config: AppConfig = settings.try_deserialize()?;
        Ok(app_config)
    }

    pub fn oracle_configured(&self) -> bool {
        self.oracle_endpoint.is_some() && self.oracle_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        std::env::remove_var("TASKBROWSER_CONFIG");
        let config = AppConfig::load(None).expect("defaults always parse");
        assert_eq!(config.bind_addr, default_bind_addr());
        assert_eq!(config.max_concurrent_sessions, 4);
        assert!(!config.oracle_configured());
    }
}
