use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{generate, health, network, session, waits};
use super::rpc::rpc_handler;
use super::state::AppState;
use super::websocket::ws_handler;

pub fn create_router(state: Arc<AppState>) -> Router {
    // The service is only reachable from local tooling and the browser extension host
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:1420"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:1420"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(health::health_check))
        // Operation-keyed protocol
        .route("/rpc", post(rpc_handler))
        // Session endpoints
        .route("/session/start", post(session::start_session))
        .route("/session/pause", post(session::pause_session))
        .route("/session/resume", post(session::resume_session))
        .route("/session/stop", post(session::stop_session))
        .route("/session/actions", post(session::append_actions))
        .route("/session/active", get(session::get_active_session))
        .route("/sessions", get(session::get_history))
        .route("/sessions/:session_id", get(session::get_session))
        // Tab lifecycle reported by the host
        .route("/tabs/closed", post(session::on_tab_closed))
        .route("/tabs/navigated", post(session::on_tab_navigated))
        // Generation
        .route("/generate", post(generate::generate_script))
        .route("/waits/analyze", post(waits::analyze_waits))
        // Network capture
        .route("/network/events", post(network::ingest_events))
        .route("/network/summary", get(network::get_summary))
        .route("/network/export", post(network::export_data))
        .route("/network", axum::routing::delete(network::clear_data))
        // WebSocket
        .route("/ws/:client_id", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
