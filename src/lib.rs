use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod adapter;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod mcp;

use adapter::Adapter;
use mcp::server::RpcServer;

#[derive(Clone)]
pub struct AppState {
    pub adapter: Adapter,
}

impl AppState {
    pub fn new(server: Arc<dyn RpcServer>) -> Self {
        Self {
            adapter: Adapter::new(server),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
