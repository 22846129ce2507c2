use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::schemas::SchemasConfig;
use super::secrets::SecretsConfig;
use crate::platforms::PlatformConfig;

/// Environment variable pointing at the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "ACCOUNTOTRON_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
const ENV_PREFIX: &str = "ACCOUNTOTRON_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: the active platform, every configured platform,
/// token secrets and the request schemas.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub logging: LoggingConfig,
    /// Id (name) of the platform every request is dispatched to.
    pub platform: String,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub schemas: SchemasConfig,
}

/// The layered configuration sources: the YAML file, then `ACCOUNTOTRON_*`
/// environment overrides (nested keys separated by `__`).
pub fn config_sources() -> Figment {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extract the configuration from the given figment.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load the configuration, exiting the process if it is unusable.
pub fn load_config() -> ConfigV1 {
    match extract_config(&config_sources()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
