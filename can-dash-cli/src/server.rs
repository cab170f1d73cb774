//! Read-only dashboard server
//!
//! Serves the dashboard page on `/` and the current vehicle state as JSON on
//! `/data`. Request handling only ever takes a snapshot of the state, so it
//! never waits on the dispatcher for longer than one state update.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use can_dash_decoder::{StopSignal, VehicleState};
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Answers dashboard queries from read-only state snapshots
#[derive(Debug, Clone)]
pub struct QueryHandler {
    state: VehicleState,
}

impl QueryHandler {
    pub fn new(state: VehicleState) -> Self {
        Self { state }
    }

    /// Current presentation record as JSON
    pub fn respond(&self) -> can_dash_decoder::Result<String> {
        self.state.snapshot().presentation().to_json()
    }
}

/// Create the dashboard router
pub fn create_router(state: VehicleState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/index.html", get(dashboard_page))
        .route("/data", get(vehicle_data))
        .with_state(QueryHandler::new(state))
}

async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn vehicle_data(State(handler): State<QueryHandler>) -> Response {
    match handler.respond() {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            log::error!("Failed to serialize vehicle state: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn wait_for_stop(stop: StopSignal) {
    while !stop.is_stopped() {
        tokio::time::sleep(STOP_POLL_INTERVAL).await;
    }
    log::debug!("Dashboard server shutting down");
}

/// Serve `router` on a current-thread runtime until `stop` is raised
fn serve(listener: std::net::TcpListener, router: Router, stop: StopSignal) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build dashboard runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::from_std(listener)
            .context("Failed to register dashboard listener")?;
        axum::serve(listener, router)
            .with_graceful_shutdown(wait_for_stop(stop))
            .await
            .context("Dashboard server error")
    })
}

/// Bind `addr` and serve on a background thread
pub fn spawn(addr: &str, state: VehicleState, stop: StopSignal) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = std::net::TcpListener::bind(addr)
        .with_context(|| format!("Failed to bind dashboard server to {}", addr))?;
    listener.set_nonblocking(true)?;
    let local = listener.local_addr()?;
    let router = create_router(state);

    let handle = thread::Builder::new()
        .name("dashboard-server".to_string())
        .spawn(move || {
            if let Err(e) = serve(listener, router, stop) {
                log::error!("Dashboard server failed: {:#}", e);
            }
        })
        .context("Failed to start dashboard server thread")?;

    log::info!("Web server running at http://{}", local);
    Ok((local, handle))
}
