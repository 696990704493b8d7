//! Shift scheduling server.
//!
//! Run with: cargo run
//! `PORT` overrides the default port 10000; `RUST_LOG` tunes log filtering.

use std::net::SocketAddr;

use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use shift_scheduling::api;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router().layer(cors);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(10000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
