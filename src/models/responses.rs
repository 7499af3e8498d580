use serde::Serialize;

use super::action::Action;
use super::session::{RecordingSession, SessionStatus};
use crate::codegen::GeneratedScript;
use crate::network::NetworkSummary;
use crate::waits::StepWaits;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: RecordingSession,
}

#[derive(Debug, Serialize)]
pub struct ActiveSessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<RecordingSession>,
}

#[derive(Debug, Serialize)]
pub struct AppendActionsResponse {
    pub appended: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct TabNavigatedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub sessions: Vec<RecordingSession>,
}

#[derive(Debug, Serialize)]
pub struct GenerateScriptResponse {
    #[serde(flatten)]
    pub script: GeneratedScript,
    pub action_count: usize,
}

#[derive(Debug, Serialize)]
pub struct IngestNetworkResponse {
    pub accepted: usize,
    pub inflight: usize,
    pub finalized: usize,
}

#[derive(Debug, Serialize)]
pub struct NetworkSummaryResponse {
    pub summary: NetworkSummary,
}

#[derive(Debug, Serialize)]
pub struct ExportNetworkResponse {
    pub format: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeWaitsResponse {
    pub steps: Vec<StepWaits>,
}

#[derive(Debug, Serialize)]
pub struct GenericResponse {
    pub status: String,
}

impl GenericResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
