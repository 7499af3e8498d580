use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    ExportNetworkRequest, ExportNetworkResponse, GenericResponse, IngestNetworkRequest,
    IngestNetworkResponse, NetworkSummaryResponse,
};
use crate::network::ExportFormat;

use super::super::state::AppState;

/// Feed a batch of lifecycle events, then expire stale in-flight requests
/// against the newest timestamp in the batch.
pub async fn ingest(state: &AppState, request: IngestNetworkRequest) -> Result<IngestNetworkResponse> {
    let now = request
        .events
        .iter()
        .filter_map(|event| event.timestamp())
        .fold(None, |latest: Option<f64>, ts| Some(latest.map_or(ts, |l| l.max(ts))));

    let mut monitor = state.network.lock().await;
    let accepted = monitor.ingest_all(request.events);
    if let Some(now) = now {
        let expired = monitor.sweep(now);
        if expired > 0 {
            tracing::debug!("Expired {} stale in-flight requests", expired);
        }
    }

    Ok(IngestNetworkResponse {
        accepted,
        inflight: monitor.inflight_count(),
        finalized: monitor.requests().len(),
    })
}

pub async fn summary(state: &AppState) -> NetworkSummaryResponse {
    NetworkSummaryResponse {
        summary: state.network.lock().await.summary(),
    }
}

pub async fn export(state: &AppState, request: ExportNetworkRequest) -> Result<ExportNetworkResponse> {
    let format: ExportFormat = request.format.parse()?;
    let content = state.network.lock().await.export(format)?;
    Ok(ExportNetworkResponse {
        format: request.format.trim().to_lowercase(),
        content,
    })
}

pub async fn clear(state: &AppState) -> GenericResponse {
    state.network.lock().await.clear();
    GenericResponse::ok()
}

// HTTP handlers

pub async fn ingest_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestNetworkRequest>,
) -> Result<Json<IngestNetworkResponse>> {
    ingest(&state, request).await.map(Json)
}

pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<NetworkSummaryResponse> {
    Json(summary(&state).await)
}

pub async fn export_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportNetworkRequest>,
) -> Result<Json<ExportNetworkResponse>> {
    export(&state, request).await.map(Json)
}

pub async fn clear_data(State(state): State<Arc<AppState>>) -> Json<GenericResponse> {
    Json(clear(&state).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::NetworkEvent;

    fn batch() -> Vec<NetworkEvent> {
        serde_json::from_value(serde_json::json!([
            {"event": "started", "request_id": "1", "url": "https://app.test/api/users",
             "resource_type": "fetch", "timestamp": 10.0},
            {"event": "response_headers", "request_id": "1", "status_code": 200,
             "headers": {"content-type": "application/json"}},
            {"event": "completed", "request_id": "1", "timestamp": 55.0},
            {"event": "started", "request_id": "2", "url": "https://app.test/logo.png",
             "resource_type": "image", "timestamp": 12.0},
            {"event": "started", "request_id": "3", "url": "https://app.test/api/slow",
             "resource_type": "xhr", "timestamp": 20.0}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_counts() {
        let state = AppState::default();
        let response = ingest(&state, IngestNetworkRequest { events: batch() }).await.unwrap();
        assert_eq!(response.accepted, 4);
        assert_eq!(response.inflight, 1);
        assert_eq!(response.finalized, 1);

        let summary = summary(&state).await.summary;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.inflight, 1);
    }

    #[tokio::test]
    async fn test_export_formats() {
        let state = AppState::default();
        ingest(&state, IngestNetworkRequest { events: batch() }).await.unwrap();

        let har = export(&state, ExportNetworkRequest { format: "HAR".to_string() })
            .await
            .unwrap();
        assert_eq!(har.format, "har");
        assert!(har.content.contains("\"entries\""));

        let json = export(&state, ExportNetworkRequest::default()).await.unwrap();
        assert!(json.content.contains("api/users"));

        assert!(matches!(
            export(&state, ExportNetworkRequest { format: "csv".to_string() }).await,
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_resets_monitor() {
        let state = AppState::default();
        ingest(&state, IngestNetworkRequest { events: batch() }).await.unwrap();
        clear(&state).await;
        assert_eq!(summary(&state).await.summary.total, 0);
        assert_eq!(state.network.lock().await.inflight_count(), 0);
    }
}
