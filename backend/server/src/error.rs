use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::database::StoreError;

pub const DB_ERROR_MESSAGE: &str = "Error connecting to db";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Database error: {0}")]
    Database(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MalformedPayload => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            // Missing articles land here too, clients only ever see the generic message
            AppError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": DB_ERROR_MESSAGE,
                    "error": e.to_string(),
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use super::AppError;
    use crate::database::StoreError;

    #[tokio::test]
    async fn test_database_error_body() {
        let response =
            AppError::from(StoreError::MissingArticle("ghost".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "message": "Error connecting to db",
                "error": "article ghost does not exist",
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_status() {
        let response = AppError::MalformedPayload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
