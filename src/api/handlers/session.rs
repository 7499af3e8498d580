use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    ActiveSessionResponse, AppendActionsRequest, AppendActionsResponse, HistoryResponse,
    SessionResponse, StartSessionRequest, StartSessionResponse, TabClosedRequest,
    TabNavigatedRequest, TabNavigatedResponse,
};
use crate::recording::rearm;

use super::super::state::{AppState, WsEvent};

pub async fn start(state: &AppState, request: StartSessionRequest) -> Result<StartSessionResponse> {
    let session = state.sessions.lock().await.start(&request.tab)?;
    state.broadcast(WsEvent::SessionStatus {
        session_id: session.id.clone(),
        status: session.status,
    });
    Ok(StartSessionResponse {
        session_id: session.id,
        status: session.status,
    })
}

pub async fn pause(state: &AppState) -> Result<SessionResponse> {
    let session = state.sessions.lock().await.pause()?;
    state.broadcast(WsEvent::SessionStatus {
        session_id: session.id.clone(),
        status: session.status,
    });
    Ok(SessionResponse { session })
}

pub async fn resume(state: &AppState) -> Result<SessionResponse> {
    let session = state.sessions.lock().await.resume()?;
    state.broadcast(WsEvent::SessionStatus {
        session_id: session.id.clone(),
        status: session.status,
    });
    Ok(SessionResponse { session })
}

pub async fn stop(state: &AppState) -> Result<SessionResponse> {
    let session = state.sessions.lock().await.stop()?;
    state.broadcast(WsEvent::SessionStatus {
        session_id: session.id.clone(),
        status: session.status,
    });
    Ok(SessionResponse { session })
}

pub async fn append(state: &AppState, request: AppendActionsRequest) -> Result<AppendActionsResponse> {
    let (appended, session_id, total) = {
        let mut sessions = state.sessions.lock().await;
        let appended = sessions.append_actions(request.actions);
        let active = sessions.active();
        (
            appended,
            active.map(|s| s.id.clone()),
            active.map(|s| s.actions.len()).unwrap_or(0),
        )
    };

    if let Some(session_id) = session_id {
        for action in &appended {
            state.broadcast(WsEvent::ActionRecorded {
                session_id: session_id.clone(),
                action: action.clone(),
            });
        }
    }
    Ok(AppendActionsResponse {
        appended: appended.len(),
        total,
    })
}

pub async fn tab_closed(state: &AppState, request: TabClosedRequest) -> Result<ActiveSessionResponse> {
    let stopped = state.sessions.lock().await.on_tab_closed(request.tab_id);
    if let Some(session) = &stopped {
        state.broadcast(WsEvent::SessionStatus {
            session_id: session.id.clone(),
            status: session.status,
        });
    }
    Ok(ActiveSessionResponse { session: stopped })
}

/// Record the navigation and re-arm the page recorder in the background
pub async fn tab_navigated(
    state: Arc<AppState>,
    request: TabNavigatedRequest,
) -> Result<TabNavigatedResponse> {
    let (action, session_id) = {
        let mut sessions = state.sessions.lock().await;
        let action = sessions.on_tab_navigated(request.tab_id, &request.url);
        (action, sessions.active().map(|s| s.id.clone()))
    };

    if let (Some(action), Some(session_id)) = (&action, session_id) {
        state.broadcast(WsEvent::ActionRecorded {
            session_id: session_id.clone(),
            action: action.clone(),
        });

        let tab_id = request.tab_id;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            match rearm(state.page_agent.as_ref(), tab_id, &state.rearm_policy).await {
                Ok(attempts) => tracing::debug!("Re-armed tab {} after {} attempt(s)", tab_id, attempts),
                Err(e) => state.broadcast(WsEvent::Error {
                    session_id: Some(session_id),
                    error: e.to_string(),
                }),
            }
        });
    }
    Ok(TabNavigatedResponse { action })
}

pub async fn active(state: &AppState) -> ActiveSessionResponse {
    ActiveSessionResponse {
        session: state.sessions.lock().await.active().cloned(),
    }
}

pub async fn history(state: &AppState) -> HistoryResponse {
    HistoryResponse {
        sessions: state.sessions.lock().await.history(),
    }
}

pub async fn find(state: &AppState, session_id: &str) -> Result<SessionResponse> {
    let session = state.sessions.lock().await.find(session_id)?;
    Ok(SessionResponse { session })
}

// HTTP handlers

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>> {
    start(&state, request).await.map(Json)
}

pub async fn pause_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>> {
    pause(&state).await.map(Json)
}

pub async fn resume_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>> {
    resume(&state).await.map(Json)
}

pub async fn stop_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>> {
    stop(&state).await.map(Json)
}

pub async fn append_actions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AppendActionsRequest>,
) -> Result<Json<AppendActionsResponse>> {
    append(&state, request).await.map(Json)
}

pub async fn on_tab_closed(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TabClosedRequest>,
) -> Result<Json<ActiveSessionResponse>> {
    tab_closed(&state, request).await.map(Json)
}

pub async fn on_tab_navigated(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TabNavigatedRequest>,
) -> Result<Json<TabNavigatedResponse>> {
    tab_navigated(state, request).await.map(Json)
}

pub async fn get_active_session(State(state): State<Arc<AppState>>) -> Json<ActiveSessionResponse> {
    Json(active(&state).await)
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(history(&state).await)
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    if session_id.trim().is_empty() {
        return Err(AppError::ValidationError("session id is empty".to_string()));
    }
    find(&state, &session_id).await.map(Json)
}
