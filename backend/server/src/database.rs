//! # Storage
//!
//! Persistent home of the article documents.
//!
//! ## Requirements
//!
//! - Survive server restarts, unlike the old in-process object
//! - Lookup by article name, no surrogate ids
//! - Upvotes and comments change by exactly one step per request
//!
//! ## Implementation
//!
//! - Redis hash per article: `articles:{name}` with `name` and `upvotes`
//! - Redis list per article: `comments:{name}`, one JSON comment per element
//! - Increment and append are Lua scripts, so the existence check and the write are atomic
//!   and two concurrent upvotes never collapse into one
//! - `memory://` swaps Redis for an in-process map, meant for local runs and tests
//!
//! ## Connections
//!
//! Every request opens its own connection through [`with_db`] and drops it when the unit of
//! work finishes, whether it succeeded or not. Nothing is pooled.
use std::{future::Future, time::Duration};

use thiserror::Error;
use tracing::{debug, error, info};

mod memory_store;
mod redis_store;

pub use memory_store::{MemoryConnection, MemoryDb};
pub use redis_store::{RedisConnection, RedisDb};

use crate::{
    error::AppError,
    models::{Article, Comment},
};

pub const MEMORY_SCHEME: &str = "memory://";

pub const DEMO_ARTICLES: [&str; 3] = [
    "learn-react",
    "take-care-of-mainecoon-cat",
    "how-to-tame-dragon",
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid database url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: redis::RedisError,
    },

    #[error("failed to connect: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("database unavailable")]
    Unavailable,

    #[error("query failed: {0}")]
    Query(#[from] redis::RedisError),

    #[error("failed to encode comment: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt article {name}: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("article {0} does not exist")]
    MissingArticle(String),
}

#[derive(Clone)]
pub enum Database {
    Redis(RedisDb),
    Memory(MemoryDb),
}

impl Database {
    pub fn open(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        if url.starts_with(MEMORY_SCHEME) {
            info!("Using in-memory database seeded with {} articles", DEMO_ARTICLES.len());
            return Ok(Self::Memory(MemoryDb::seeded(DEMO_ARTICLES)));
        }

        RedisDb::open(url, connect_timeout).map(Self::Redis)
    }

    pub async fn connect(&self) -> Result<Connection, StoreError> {
        let connection = match self {
            Database::Redis(db) => Connection::Redis(db.connect().await?),
            Database::Memory(db) => Connection::Memory(db.connect()?),
        };

        debug!("Database connection opened");
        Ok(connection)
    }
}

/// Live handle handed to a unit of work. Dropping it releases the connection.
pub enum Connection {
    Redis(RedisConnection),
    Memory(MemoryConnection),
}

impl Connection {
    pub async fn find_article(&mut self, name: &str) -> Result<Option<Article>, StoreError> {
        match self {
            Connection::Redis(connection) => connection.find_article(name).await,
            Connection::Memory(connection) => connection.find_article(name),
        }
    }

    /// Returns `false` when the article does not exist; nothing is written in that case.
    pub async fn increment_upvotes(&mut self, name: &str) -> Result<bool, StoreError> {
        match self {
            Connection::Redis(connection) => connection.increment_upvotes(name).await,
            Connection::Memory(connection) => connection.increment_upvotes(name),
        }
    }

    /// Returns `false` when the article does not exist; nothing is written in that case.
    pub async fn append_comment(
        &mut self,
        name: &str,
        comment: &Comment,
    ) -> Result<bool, StoreError> {
        match self {
            Connection::Redis(connection) => connection.append_comment(name, comment).await,
            Connection::Memory(connection) => connection.append_comment(name, comment),
        }
    }

    /// Seeding only. Leaves an existing article alone unless `overwrite` is set.
    pub async fn insert_article(
        &mut self,
        article: &Article,
        overwrite: bool,
    ) -> Result<bool, StoreError> {
        match self {
            Connection::Redis(connection) => connection.insert_article(article, overwrite).await,
            Connection::Memory(connection) => connection.insert_article(article, overwrite),
        }
    }
}

/// Opens a connection, runs `operations` on it and releases it once the work completes.
///
/// Any failure, while connecting or inside `operations`, comes back as
/// [`AppError::Database`], which renders as the generic database error response.
pub async fn with_db<T, F, Fut>(database: &Database, operations: F) -> Result<T, AppError>
where
    F: FnOnce(Connection) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let connection = database.connect().await.map_err(fail)?;

    let result = operations(connection).await;
    debug!("Database connection released");

    result.map_err(fail)
}

fn fail(e: StoreError) -> AppError {
    error!("Database operation failed: {e}");

    AppError::Database(e)
}
