use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::info;
use tokio::net::TcpListener;

use super::{Dispatch, McpServer};
use crate::error::Result;
use crate::providers::gitlab::GitLabApi;

/// Path every JSON-RPC message is posted to.
pub const MCP_PATH: &str = "/mcp";

/// Serves MCP over HTTP on `addr` until interrupted.
///
/// An address with no host, such as `:8000`, listens on every interface.
pub async fn serve_http<A: GitLabApi + 'static>(
    server: Arc<McpServer<A>>,
    addr: &str,
) -> Result<()> {
    let listener = TcpListener::bind(listen_addr(addr)).await?;
    info!(
        "{} listening on http://{}{MCP_PATH}",
        server.name(),
        listener.local_addr()?
    );

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Interrupted, shutting down HTTP server");
        })
        .await?;
    Ok(())
}

pub fn router<A: GitLabApi + 'static>(server: Arc<McpServer<A>>) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_message::<A>))
        .with_state(server)
}

fn listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// One JSON-RPC message per request. Tool calls answer once they finish.
async fn handle_message<A: GitLabApi + 'static>(
    State(server): State<Arc<McpServer<A>>>,
    body: String,
) -> Response {
    match server.dispatch(body.trim()) {
        Dispatch::Reply(response) => Json(response).into_response(),
        Dispatch::Call(call) => Json(server.run_call(call).await).into_response(),
        Dispatch::Ignore => StatusCode::ACCEPTED.into_response(),
    }
}
