//! # joinopt-server: HTTP Service for the Join-Order Optimizer
//!
//! This binary exposes the join enumerator as a JSON service. A query front-end posts
//! the relations of a query together with their column statistics and the parsed
//! predicate list; the service answers with the predicates in execution order.
//!
//! ```text
//! Query front-end
//!   |
//!   | HTTP POST /optimize/predicates (JSON)
//!   v
//! joinopt-server (this binary)
//!   |
//!   +-> catalog built from the request statistics
//!   +-> connected-subset enumeration + memoized DP
//!   |
//!   | HTTP response (reordered predicates, cost)
//!   v
//! Query front-end
//! ```
//!
//! ## Endpoints
//!
//! - `GET  /health`               - Health check
//! - `GET  /config`               - Active search limits
//! - `POST /optimize/predicates`  - Reorder the predicates of one query
//!
//! ## Configuration
//!
//! The listen address comes from `JOINOPT_ADDR` (default `0.0.0.0:3000`); search
//! limits from `JOINOPT_MAX_RELATIONS` and `JOINOPT_MAX_SUBSETS`. Logging is
//! controlled by `RUST_LOG` (defaults to `joinopt=debug`).

mod optimize;
mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("joinopt=debug".parse()?))
        .init();

    let config = state::ServerConfig::from_env();
    let addr = config.addr.clone();
    let state = Arc::new(state::AppState::new(config));

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/config", get(routes::show_config))
        .route("/optimize/predicates", post(optimize::optimize_predicates))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("joinopt-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
