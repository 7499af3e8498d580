use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::codegen::{self, ApiExpectation, Target};
use crate::error::{AppError, Result};
use crate::models::{Action, GenerateScriptRequest, GenerateScriptResponse, TestContext};
use crate::recording::{derive_context, optimize};

use super::super::state::AppState;

/// Render a test script for the requested framework.
///
/// Inline actions are taken verbatim. Otherwise the actions come from the
/// named session, or the latest completed session, or the active one, and
/// are deduplicated first.
pub async fn generate(state: &AppState, request: GenerateScriptRequest) -> Result<GenerateScriptResponse> {
    let target: Target = request.framework.parse()?;
    let (actions, context) = source_actions(state, &request).await?;

    let mut options = request.options;
    if options.network_assertions && options.api_calls.is_empty() {
        options.api_calls = ApiExpectation::from_requests(state.network.lock().await.requests());
    }

    let script = codegen::generate(target, &actions, &context, &options)?;
    tracing::info!(
        "Generated {} for {} actions ({})",
        script.file_name,
        actions.len(),
        target
    );

    Ok(GenerateScriptResponse {
        script,
        action_count: actions.len(),
    })
}

async fn source_actions(
    state: &AppState,
    request: &GenerateScriptRequest,
) -> Result<(Vec<Action>, TestContext)> {
    if let Some(actions) = &request.actions {
        let context = derive_context(actions, Utc::now().date_naive());
        return Ok((actions.clone(), context));
    }

    let sessions = state.sessions.lock().await;
    let session = match &request.session_id {
        Some(id) => sessions.find(id)?,
        None => sessions
            .history()
            .into_iter()
            .next()
            .or_else(|| sessions.active().cloned())
            .ok_or_else(|| {
                AppError::ValidationError("no actions given and no recorded session".to_string())
            })?,
    };

    let optimized = optimize(&session.actions);
    let context = session
        .context
        .unwrap_or(optimized.context)
        .starting_at(&session.url);
    Ok((optimized.actions, context))
}

pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateScriptRequest>,
) -> Result<Json<GenerateScriptResponse>> {
    generate(&state, request).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenerateOptions;
    use crate::models::{AppendActionsRequest, ElementDescriptor, StartSessionRequest, TabContext};
    use crate::api::handlers::session;

    fn request(framework: &str, actions: Option<Vec<Action>>) -> GenerateScriptRequest {
        GenerateScriptRequest {
            framework: framework.to_string(),
            actions,
            session_id: None,
            options: GenerateOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_generate_from_inline_actions() {
        let state = AppState::default();
        let actions = vec![
            Action::navigation("https://app.test/login", 0),
            Action::input(ElementDescriptor::new("input").with_id("email"), "a@b.test", 100),
        ];
        let response = generate(&state, request("playwright", Some(actions))).await.unwrap();
        assert_eq!(response.action_count, 2);
        assert_eq!(response.script.target, Target::Playwright);
        assert!(response.script.code.contains("#email"));
    }

    #[tokio::test]
    async fn test_unknown_framework_rejected() {
        let state = AppState::default();
        let result = generate(&state, request("watir", Some(Vec::new()))).await;
        assert!(matches!(result, Err(AppError::UnsupportedTarget(_))));
    }

    #[tokio::test]
    async fn test_nothing_to_generate_from() {
        let state = AppState::default();
        let result = generate(&state, request("cypress", None)).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_generate_from_latest_session() {
        let state = AppState::default();
        session::start(
            &state,
            StartSessionRequest {
                tab: TabContext {
                    tab_id: Some(1),
                    url: Some("https://app.test/".to_string()),
                    title: None,
                },
            },
        )
        .await
        .unwrap();
        let button = ElementDescriptor::new("button").with_id("save");
        session::append(
            &state,
            AppendActionsRequest {
                actions: vec![
                    Action::click(button.clone(), 1_000).with_url("https://app.test/"),
                    Action::click(button, 1_100).with_url("https://app.test/"),
                ],
            },
        )
        .await
        .unwrap();
        session::stop(&state).await.unwrap();

        let response = generate(&state, request("selenium", None)).await.unwrap();
        assert_eq!(response.action_count, 1);
        assert!(response.script.code.contains("save"));
    }
}
