// crates/geoloc-api/src/lib.rs

//! HTTP surface over [`geoloc_core::QueryService`].
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/health` | liveness |
//! | GET | `/location/:municipio` | lookup by name, optional `estado` |
//! | GET | `/nearby` | `lat`, `lon`, optional `distance` (km) |
//! | GET | `/search` | `q`, optional `limit` |
//!
//! Every response carries permissive CORS headers; `OPTIONS` on any path is
//! answered with an empty 200. Errors, including unknown paths and rejected
//! path or query strings, use the `{"error","message"}` body.

use axum::routing::get;
use axum::{middleware, Router};
use geoloc_core::QueryService;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod cors;
pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody};

#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
}

pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/health", get(handlers::health).fallback(handlers::method_not_allowed))
        .route(
            "/location/:municipio",
            get(handlers::location_by_name).fallback(handlers::method_not_allowed),
        )
        .route("/nearby", get(handlers::nearby).fallback(handlers::method_not_allowed))
        .route("/search", get(handlers::search).fallback(handlers::method_not_allowed))
        .fallback(handlers::not_found)
        .with_state(AppState { service })
        .layer(middleware::from_fn(cors::cors))
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(service: QueryService, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}
