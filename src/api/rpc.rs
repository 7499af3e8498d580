use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    AnalyzeWaitsRequest, AppendActionsRequest, ExportNetworkRequest, GenerateScriptRequest,
    GetSessionRequest, IngestNetworkRequest, StartSessionRequest, TabClosedRequest,
    TabNavigatedRequest,
};

use super::handlers::{generate, network, session, waits};
use super::state::AppState;

/// A single operation on the `/rpc` endpoint, keyed by its `operation` field
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum RpcRequest {
    StartSession(StartSessionRequest),
    PauseSession,
    ResumeSession,
    StopSession,
    AppendActions(AppendActionsRequest),
    TabClosed(TabClosedRequest),
    TabNavigated(TabNavigatedRequest),
    GetActiveSession,
    SessionHistory,
    GetSession(GetSessionRequest),
    GenerateScript(GenerateScriptRequest),
    AnalyzeWaits(AnalyzeWaitsRequest),
    IngestNetworkEvents(IngestNetworkRequest),
    NetworkSummary,
    ExportNetworkData(ExportNetworkRequest),
    ClearNetworkData,
}

impl RpcRequest {
    pub fn name(&self) -> &'static str {
        match self {
            RpcRequest::StartSession(_) => "startSession",
            RpcRequest::PauseSession => "pauseSession",
            RpcRequest::ResumeSession => "resumeSession",
            RpcRequest::StopSession => "stopSession",
            RpcRequest::AppendActions(_) => "appendActions",
            RpcRequest::TabClosed(_) => "tabClosed",
            RpcRequest::TabNavigated(_) => "tabNavigated",
            RpcRequest::GetActiveSession => "getActiveSession",
            RpcRequest::SessionHistory => "sessionHistory",
            RpcRequest::GetSession(_) => "getSession",
            RpcRequest::GenerateScript(_) => "generateScript",
            RpcRequest::AnalyzeWaits(_) => "analyzeWaits",
            RpcRequest::IngestNetworkEvents(_) => "ingestNetworkEvents",
            RpcRequest::NetworkSummary => "networkSummary",
            RpcRequest::ExportNetworkData(_) => "exportNetworkData",
            RpcRequest::ClearNetworkData => "clearNetworkData",
        }
    }
}

pub async fn dispatch(state: Arc<AppState>, request: RpcRequest) -> Result<Value> {
    tracing::debug!("rpc {}", request.name());
    match request {
        RpcRequest::StartSession(req) => to_value(session::start(&state, req).await?),
        RpcRequest::PauseSession => to_value(session::pause(&state).await?),
        RpcRequest::ResumeSession => to_value(session::resume(&state).await?),
        RpcRequest::StopSession => to_value(session::stop(&state).await?),
        RpcRequest::AppendActions(req) => to_value(session::append(&state, req).await?),
        RpcRequest::TabClosed(req) => to_value(session::tab_closed(&state, req).await?),
        RpcRequest::TabNavigated(req) => to_value(session::tab_navigated(state, req).await?),
        RpcRequest::GetActiveSession => to_value(session::active(&state).await),
        RpcRequest::SessionHistory => to_value(session::history(&state).await),
        RpcRequest::GetSession(req) => to_value(session::find(&state, &req.session_id).await?),
        RpcRequest::GenerateScript(req) => to_value(generate::generate(&state, req).await?),
        RpcRequest::AnalyzeWaits(req) => to_value(waits::analyze(req)),
        RpcRequest::IngestNetworkEvents(req) => to_value(network::ingest(&state, req).await?),
        RpcRequest::NetworkSummary => to_value(network::summary(&state).await),
        RpcRequest::ExportNetworkData(req) => to_value(network::export(&state, req).await?),
        RpcRequest::ClearNetworkData => to_value(network::clear(&state).await),
    }
}

fn to_value<T: Serialize>(response: T) -> Result<Value> {
    serde_json::to_value(response).map_err(|e| AppError::Internal(e.into()))
}

pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Value>,
) -> Result<Json<Value>> {
    let request: RpcRequest = serde_json::from_value(request)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    dispatch(state, request).await.map(Json)
}
