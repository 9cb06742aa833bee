//! Application configuration.
//!
//! Figment merges three layers: built-in defaults, an optional `omr.toml`
//! file (path overridable through `OMR_CONFIG`), and `OMR_`-prefixed
//! environment variables (`__` separates nesting, e.g.
//! `OMR_BROKER__URL`). Queue names are overridable; routing keys are not.

mod types;

pub use types::{
    AppConfig, BrokerConfig, DatabaseConfig, LoggingConfig, OcrConfig, QueuesConfig,
    StorageConfig, WorkerConfig,
};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use omr_domain::error::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "OMR_CONFIG";
/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "omr.toml";

impl AppConfig {
    /// Load configuration: defaults → TOML file → environment.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());
        Self::load_from(&path)
    }

    /// Load with an explicit TOML path (missing file is fine; defaults and
    /// environment still apply).
    pub fn load_from(path: &str) -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("OMR_").split("__"))
            .extract()
            .map_err(|e| Error::config(format!("configuration invalid: {e}")))
    }
}
