use serde::Deserialize;
use std::env;

use stelfly_core::resource::{AircraftMaintenance, Instructor, ResourceCatalog};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// An OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// The club's resource reference data. Fixed at startup; there is no
/// runtime fleet mutation.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub aircraft: Vec<AircraftMaintenance>,
    pub instructors: Vec<String>,
}

impl CatalogConfig {
    pub fn build(&self) -> ResourceCatalog {
        ResourceCatalog::new(
            self.aircraft.clone(),
            self.instructors
                .iter()
                .map(|name| Instructor::new(name))
                .collect(),
        )
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("STELFLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
