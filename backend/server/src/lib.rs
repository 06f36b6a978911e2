//! Backend for the blog's article interactions: upvotes and comments.
//!
//! The front-end bundle is served from the same process; everything under `/api` is JSON.
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |---|---|---|---|
//! | GET | `/api/articles/{name}` | | article, or `null` if unknown |
//! | POST | `/api/articles/{name}/upvote` | | updated article |
//! | POST | `/api/articles/{name}/add-comment` | `{ username, text }` | updated article |
//! | GET | anything else | | static file, falling back to `index.html` |
//!
//! Any database failure, unknown article on the two POSTs included, answers 500 with
//! `{ "message": "Error connecting to db", "error": "..." }`.
//!
//!
//!
//! # Article
//! ```json
//! { "name": "learn-react", "upvotes": 1, "comments": [{ "username": "ada", "text": "nice" }] }
//! ```
//!
//! Articles are never created by the API. Use the `seed` binary.
//!
//!
//!
//! # Environment
//!
//! - `RUST_PORT`: listening port, default `8000`
//! - `DATABASE_URL`: default `redis://127.0.0.1:6379/0`, or `memory://` for a throwaway store
//! - `DB_CONNECT_TIMEOUT_MS`: default `1000`
//! - `STATIC_DIR`: front-end bundle, default `build`
//! - `RUST_LOG`: tracing filter, e.g. `info` or `server=debug`
//!
//!
//!
//! # Commands
//!
//! Run against a local Redis.
//! ```sh
//! docker run -p 6379:6379 redis
//! cargo run -p seed
//! RUST_LOG=info cargo run -p blog
//! ```
//!
//! Run without Redis.
//! ```sh
//! DATABASE_URL=memory:// RUST_LOG=debug cargo run -p blog
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use tokio::{net::TcpListener, signal::ctrl_c};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod articles;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

use routes::{article_handler, comment_handler, upvote_handler};
use state::State;

pub fn init_logging() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let static_dir = &state.config.static_dir;
    let front_end =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/articles/{name}", get(article_handler))
        .route("/api/articles/{name}/upvote", post(upvote_handler))
        .route("/api/articles/{name}/add-comment", post(comment_handler))
        .fallback_service(front_end)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    init_logging();

    info!("Initializing state...");
    let state = State::new()?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let router = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
