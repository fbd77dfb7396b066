use std::env;

use auth::HasherSettings;
use auth::SigningConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub jwt: SigningConfig,
    #[serde(default)]
    pub password: HasherSettings,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AUTH__JWT__SECRET_KEY, AUTH__PASSWORD__ITERATIONS, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: AUTH__JWT__SECRET_KEY=... overrides jwt.secret_key
            .add_source(Environment::with_prefix("AUTH").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }

    /// Load configuration from an embedded TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
