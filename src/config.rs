use anyhow::Context;
use log::{error, info};
use serde::Deserialize;
use std::{fs::File, io::ErrorKind};

/// App configuration. Every field has a default, so the file can override
/// just the ones it cares about.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the timings service
    pub api_host: String,
    /// `country` query parameter sent with every request
    pub country: String,
    /// Calculation method ID, from the AlAdhan method list. 5 is the
    /// Egyptian General Authority of Survey.
    pub method: u32,
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the file system. The widget should come up even
    /// without a config file, so a missing or broken file falls back to
    /// defaults instead of failing.
    pub fn load() -> Self {
        match Self::read() {
            Ok(Some(config)) => {
                info!("Loaded config from `{}`: {config:?}", Self::PATH);
                config
            }
            Ok(None) => {
                info!("No config file at `{}`, using defaults", Self::PATH);
                Self::default()
            }
            Err(err) => {
                error!("Error loading config from `{}`: {err:?}", Self::PATH);
                Self::default()
            }
        }
    }

    fn read() -> anyhow::Result<Option<Self>> {
        let file = match File::open(Self::PATH) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).context(format!(
                    "Error opening config file {}",
                    Self::PATH
                ))
            }
        };
        let config = serde_json::from_reader(file)
            .context(format!("Error parsing config file {}", Self::PATH))?;
        Ok(Some(config))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "https://api.aladhan.com".into(),
            country: "Egypt".into(),
            method: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_host, "https://api.aladhan.com");
        assert_eq!(config.country, "Egypt");
        assert_eq!(config.method, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"method": 3}"#).unwrap();
        assert_eq!(config.method, 3);
        assert_eq!(config.country, "Egypt");
        assert_eq!(config.api_host, "https://api.aladhan.com");
    }
}
