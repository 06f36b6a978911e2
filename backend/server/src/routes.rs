use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{self, Path},
    http::{HeaderMap, header::CONTENT_TYPE},
};

use crate::{
    articles::{add_comment, fetch_article, upvote_article},
    error::AppError,
    models::{Article, Comment},
    state::State,
};

/// `null` with a 200 when the article does not exist.
pub async fn article_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(name): Path<String>,
) -> Result<Json<Option<Article>>, AppError> {
    fetch_article(&state.database, name).await.map(Json)
}

pub async fn upvote_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(name): Path<String>,
) -> Result<Json<Article>, AppError> {
    upvote_article(&state.database, name).await.map(Json)
}

pub async fn comment_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Article>, AppError> {
    let comment = get_comment(&headers, &body)?;

    add_comment(&state.database, name, comment).await.map(Json)
}

/// Bodies that are not declared as JSON, or are empty, count as an empty comment.
/// Only a JSON body that fails to parse is rejected.
fn get_comment(headers: &HeaderMap, body: &[u8]) -> Result<Comment, AppError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Comment::default());
    }

    serde_json::from_slice(body).map_err(|_| AppError::MalformedPayload)
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}
