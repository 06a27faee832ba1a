//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: WebSocket endpoint plus a catch-all dispatch
//! - Wire up middleware (tracing, timeout, body limit, request ID, headers)
//! - Buffer request bodies and hand them to the dispatcher
//! - Serve until the shutdown signal fires

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::broadcast::Fanout;
use crate::config::AppConfig;
use crate::http::request::{IncomingRequest, UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiResponse;
use crate::http::websocket;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::Dispatch;
use crate::security;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn Dispatch>,
    pub fanout: Arc<Fanout>,
    pub max_body_size: usize,
}

/// HTTP server for the forum.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &AppConfig, dispatcher: Arc<dyn Dispatch>, fanout: Arc<Fanout>) -> Self {
        let state = AppState {
            dispatcher,
            fanout,
            max_body_size: config.security.max_body_size,
        };

        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(
                &config.forum.websocket_path,
                get(websocket::upgrade).fallback(dispatch_handler),
            )
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        if config.security.enable_headers {
            router = router.layer(security::nosniff_layer());
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer the body and run the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %method,
                path = %parts.uri.path(),
                error = %e,
                "Failed to read request body"
            );
            metrics::record_request(&method, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start);
            return ApiResponse::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_response();
        }
    };

    let incoming = IncomingRequest::from_parts(&parts, body);
    let request_id = incoming.request_id().unwrap_or("unknown").to_string();
    tracing::info!(
        request_id = %request_id,
        method = %method,
        url = %incoming.url(),
        "Dispatching request"
    );

    // Handlers are synchronous and may touch the filesystem.
    let dispatcher = state.dispatcher.clone();
    let response = match tokio::task::spawn_blocking(move || dispatcher.dispatch(incoming)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };

    tracing::debug!(
        request_id = %request_id,
        status = response.status.as_u16(),
        "Request dispatched"
    );
    metrics::record_request(&method, response.status.as_u16(), start);
    response.into_response()
}
