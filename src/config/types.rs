use figment::providers::{Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0. Every field has a default, so an absent
/// config file yields a runnable server.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ConfigV1 {
    pub bind_address: String,
    /// Seconds open connections get to finish after shutdown is requested.
    pub shutdown_timeout_secs: u64,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Default for ConfigV1 {
    fn default() -> Self {
        ConfigV1 {
            bind_address: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Figment seeded with the built-in defaults; callers merge their sources on top.
pub fn base_figment() -> Figment {
    Figment::from(Serialized::defaults(Config::ConfigV1(ConfigV1::default())))
}

/// Extract a versioned config from a figment and migrate it to the current version.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from a YAML file. A missing file leaves the defaults untouched.
pub fn load_config(path: &str) -> Result<ConfigV1, figment::Error> {
    extract_config(base_figment().merge(Yaml::file(path)))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
