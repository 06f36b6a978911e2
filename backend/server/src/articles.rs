//! # Articles
//!
//! The three operations behind the API. Each one is a unit of work for [`with_db`].
//!
//! Upvote and comment used to be read, modify, write back. Two requests racing on the same
//! article would both read the same state and one update was lost. Now the write is a single
//! atomic instruction that also checks existence, followed by a read of the result.
//!
//! Nothing here creates articles. Unknown names are `None` for a fetch and an error for the
//! two mutations.
use tracing::info;

use crate::{
    database::{Database, StoreError, with_db},
    error::AppError,
    models::{Article, Comment},
};

pub async fn fetch_article(database: &Database, name: String) -> Result<Option<Article>, AppError> {
    with_db(database, |mut conn| async move { conn.find_article(&name).await }).await
}

pub async fn upvote_article(database: &Database, name: String) -> Result<Article, AppError> {
    with_db(database, |mut conn| async move {
        if !conn.increment_upvotes(&name).await? {
            return Err(StoreError::MissingArticle(name));
        }

        let found = conn.find_article(&name).await?;
        let article = found.ok_or(StoreError::MissingArticle(name))?;
        info!("Upvoted {}, now at {}", article.name, article.upvotes);

        Ok(article)
    })
    .await
}

pub async fn add_comment(
    database: &Database,
    name: String,
    comment: Comment,
) -> Result<Article, AppError> {
    with_db(database, |mut conn| async move {
        if !conn.append_comment(&name, &comment).await? {
            return Err(StoreError::MissingArticle(name));
        }

        let found = conn.find_article(&name).await?;
        let article = found.ok_or(StoreError::MissingArticle(name))?;
        info!("{} commented on {}", comment.username, article.name);

        Ok(article)
    })
    .await
}
