use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::{AnalyzeWaitsRequest, AnalyzeWaitsResponse};
use crate::waits;

use super::super::state::AppState;

pub fn analyze(request: AnalyzeWaitsRequest) -> AnalyzeWaitsResponse {
    AnalyzeWaitsResponse {
        steps: waits::analyze(&request.actions),
    }
}

pub async fn analyze_waits(
    State(_state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeWaitsRequest>,
) -> Json<AnalyzeWaitsResponse> {
    Json(analyze(request))
}
