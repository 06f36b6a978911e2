use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
#[error("Invalid {key} value: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub connect_timeout: Duration,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "8000")?,
            database_url: try_load("DATABASE_URL", "redis://127.0.0.1:6379/0")?,
            connect_timeout: Duration::from_millis(try_load("DB_CONNECT_TIMEOUT_MS", "1000")?),
            static_dir: try_load("STATIC_DIR", "build")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|e| {
            if let env::VarError::NotUnicode(_) = e {
                warn!("Environment variable {key} is not unicode, ignoring it");
            }
        })
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");

            ConfigError {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
}
