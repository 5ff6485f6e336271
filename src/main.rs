use std::sync::Arc;

use mcp_http_adapter::{build_app, config::Config, logging, mcp::server::McpServer, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let server = Arc::new(McpServer::new(
        config.server_name.clone(),
        config.server_version.clone(),
    ));
    let bind_socket = config.bind_socket()?;
    let app = build_app(AppState::new(server));
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        server_name = %config.server_name,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
