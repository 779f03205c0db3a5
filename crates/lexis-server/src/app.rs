//! Router construction and serving.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::handlers;
use crate::ServerState;

/// Routes for the multi-task service: `/summarize`, `/translate`, `/qa`, `/health`.
pub fn nlp_router(state: Arc<ServerState>, cors: bool) -> Router {
    let logged_routes = Router::new()
        .route("/summarize", post(handlers::nlp::summarize))
        .route("/translate", post(handlers::nlp::translate))
        .route("/qa", post(handlers::nlp::qa));

    finish(logged_routes, get(handlers::nlp::health), state, cors)
}

/// Routes for the standalone summarizer: `/summarize`, `/health`.
pub fn summarizer_router(state: Arc<ServerState>, cors: bool) -> Router {
    let logged_routes = Router::new().route("/summarize", post(handlers::summarizer::summarize));

    finish(logged_routes, get(handlers::summarizer::health), state, cors)
}

fn finish(
    logged_routes: Router<Arc<ServerState>>,
    health: axum::routing::MethodRouter<Arc<ServerState>>,
    state: Arc<ServerState>,
    cors: bool,
) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let mut app = Router::new()
        .merge(logged_routes.layer(trace_layer))
        .route("/health", health);

    if cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app.with_state(state)
}

/// Binds `addr` and serves `app` until ctrl-c.
pub async fn serve(app: Router, addr: &str) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
