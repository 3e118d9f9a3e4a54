use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/violations_admin.toml";
const ENV_PREFIX: &str = "VIOLATIONS_ADMIN";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Page size used by the reports and appeals listings.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_database_path() -> String {
    "violations_admin.sqlite3".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_workers() -> usize {
    8
}

fn default_page_size() -> usize {
    10
}

fn default_log_filter() -> String {
    "violations_admin=info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: default_bind_addr(),
            max_workers: default_max_workers(),
            page_size: default_page_size(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Load from `config/violations_admin.toml` (optional), then
    /// `VIOLATIONS_ADMIN__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        if cfg.page_size == 0 {
            return Err(ConfigError::Message("page_size must be at least 1".into()));
        }
        Ok(cfg)
    }
}
