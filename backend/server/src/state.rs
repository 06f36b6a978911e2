use std::sync::Arc;

use super::{
    config::{Config, ConfigError},
    database::{Database, StoreError},
};

pub struct State {
    pub config: Config,
    pub database: Database,
}

#[derive(thiserror::Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] StoreError),
}

impl State {
    pub fn new() -> Result<Arc<Self>, StateError> {
        let config = Config::load()?;
        let database = Database::open(&config.database_url, config.connect_timeout)?;

        Ok(Self::with_database(config, database))
    }

    pub fn with_database(config: Config, database: Database) -> Arc<Self> {
        Arc::new(Self { config, database })
    }
}
