use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::signal::unix::{SignalKind, signal};
use tower_http::timeout::TimeoutLayer;

use crate::error::{Error, Result};
use crate::security::{AccessGate, Denial};
use crate::vitals::VitalsResponder;

mod models;

pub use models::{TITLE, VERSION, VitalsResponse};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Upper bound on the lifetime of a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct AppState {
    gate: Arc<AccessGate>,
    responder: Arc<VitalsResponder>,
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = match self {
            Denial::Forbidden => StatusCode::FORBIDDEN,
            Denial::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Denial::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        (status, self.to_string()).into_response()
    }
}

/// Runs the [`AccessGate`] before any vitals are sampled.
async fn access_gate(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.as_bytes());

    match state.gate.check(peer.ip(), api_key) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            log::debug!("denied request from {}: {denial}", peer.ip());
            denial.into_response()
        }
    }
}

async fn serve_vitals(State(state): State<AppState>) -> Response {
    let responder = Arc::clone(&state.responder);
    match tokio::task::spawn_blocking(move || responder.respond()).await {
        Ok(snapshot) => (StatusCode::OK, Json(VitalsResponse::from(&snapshot))).into_response(),
        Err(err) => {
            log::error!("vitals sampling task failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to sample vitals",
            )
                .into_response()
        }
    }
}

/// Builds the router serving `GET /` and `GET /vitals` behind the access gate.
///
/// The router reads the peer address from [`ConnectInfo`], so it must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(gate: Arc<AccessGate>, responder: Arc<VitalsResponder>) -> axum::Router {
    router_with_timeout(gate, responder, REQUEST_TIMEOUT)
}

/// Like [`router`], answering `408 Request Timeout` once `timeout` elapses.
pub fn router_with_timeout(
    gate: Arc<AccessGate>,
    responder: Arc<VitalsResponder>,
    timeout: Duration,
) -> axum::Router {
    let state = AppState { gate, responder };
    axum::Router::new()
        .route("/", get(serve_vitals))
        .route("/vitals", get(serve_vitals))
        .route_layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(gate: AccessGate, responder: VitalsResponder) -> Self {
        Self {
            router: router(Arc::new(gate), Arc::new(responder)),
        }
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// * [`Error::Bind`] if the address cannot be bound.
    /// * [`Error::Serve`] if the server fails while running.
    pub async fn listen(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Serve)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                log::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    log::info!("shutdown signal received");
}
