//! End-to-end tests for the recording → generation pipeline.
//!
//! These drive the operation-keyed protocol the way the browser host does:
//! start a session, stream captured actions, stop, then generate scripts.

use serde_json::{json, Value};
use std::sync::Arc;

use scriptsmith_sidecar::api::rpc::{dispatch, RpcRequest};
use scriptsmith_sidecar::api::state::AppState;
use scriptsmith_sidecar::error::AppError;

async fn call(state: &Arc<AppState>, request: Value) -> Result<Value, AppError> {
    let request: RpcRequest = serde_json::from_value(request).expect("valid rpc request");
    dispatch(Arc::clone(state), request).await
}

fn login_actions() -> Value {
    json!([
        {"id": "a1", "type": "navigation", "timestamp": 0, "url": "https://app.test/login"},
        {"id": "a2", "type": "click", "timestamp": 1000, "url": "https://app.test/login",
         "element": {"tag_name": "input", "id": "email", "type": "email"}},
        {"id": "a3", "type": "input", "timestamp": 2000, "url": "https://app.test/login",
         "value": "user@example.com",
         "element": {"tag_name": "input", "id": "email", "type": "email"}},
        {"id": "a4", "type": "input", "timestamp": 3000, "url": "https://app.test/login",
         "value": "hunter2",
         "element": {"tag_name": "input", "id": "password", "type": "password"}},
        {"id": "a5", "type": "click", "timestamp": 4000, "url": "https://app.test/login",
         "element": {"tag_name": "button", "type": "submit", "text": "Sign in",
                     "attributes": {"data-testid": "login-submit"},
                     "test_attributes": {"data-testid": "login-submit"}}}
    ])
}

// ============================================================================
// Recording session → script
// ============================================================================

#[tokio::test]
async fn test_recorded_login_generates_every_target() {
    let state = Arc::new(AppState::default());

    call(&state, json!({"operation": "startSession", "tab_id": 12, "url": "https://app.test/login"}))
        .await
        .unwrap();
    let appended = call(&state, json!({"operation": "appendActions", "actions": login_actions()}))
        .await
        .unwrap();
    assert_eq!(appended["appended"], 5);

    // Replayed batch from the page script is ignored
    let replayed = call(&state, json!({"operation": "appendActions", "actions": login_actions()}))
        .await
        .unwrap();
    assert_eq!(replayed["appended"], 0);

    let stopped = call(&state, json!({"operation": "stopSession"})).await.unwrap();
    assert_eq!(stopped["session"]["status"], "completed");
    assert_eq!(stopped["session"]["context"]["requires_auth"], true);

    for framework in ["playwright", "puppeteer", "cypress", "selenium"] {
        let script = call(&state, json!({"operation": "generateScript", "framework": framework}))
            .await
            .unwrap();
        let code = script["code"].as_str().unwrap_or_default();

        let goto = code.find("app.test/login").expect("navigation step");
        let email = code.find("user@example.com").expect("email fill");
        let password = code.find("hunter2").expect("password fill");
        let submit = code.find("login-submit").expect("submit click");
        assert!(goto < email && email < password && password < submit, "{}", framework);
        assert_eq!(code.matches("hunter2").count(), 1, "{}", framework);
    }
}

#[tokio::test]
async fn test_session_start_url_anchors_the_script() {
    let state = Arc::new(AppState::default());

    call(&state, json!({"operation": "startSession", "tab_id": 3, "url": "https://app.test/home"}))
        .await
        .unwrap();
    call(
        &state,
        json!({"operation": "appendActions", "actions": [
            {"id": "s1", "type": "click", "timestamp": 0,
             "element": {"tag_name": "a", "id": "settings"}},
            {"id": "s2", "type": "navigation", "timestamp": 900,
             "url": "https://app.test/settings"},
            {"id": "s3", "type": "click", "timestamp": 1800, "url": "https://app.test/settings",
             "element": {"tag_name": "button", "id": "save"}}
        ]}),
    )
    .await
    .unwrap();
    let stopped = call(&state, json!({"operation": "stopSession"})).await.unwrap();
    assert_eq!(stopped["session"]["context"]["start_url"], "https://app.test/home");

    let script = call(&state, json!({"operation": "generateScript", "framework": "playwright"}))
        .await
        .unwrap();
    let code = script["code"].as_str().unwrap_or_default();

    let open_home = code.find("page.goto('https://app.test/home')").expect("start page opened");
    let first_click = code.find("page.locator('#settings').click()").expect("settings click");
    let open_settings = code.find("page.goto('https://app.test/settings')").expect("second page");
    let final_check = code
        .find("toHaveURL('https://app.test/settings')")
        .expect("final url asserted");
    assert!(open_home < first_click && first_click < open_settings && open_settings < final_check);
}

#[tokio::test]
async fn test_generate_rejects_unknown_framework() {
    let state = Arc::new(AppState::default());
    let err = call(
        &state,
        json!({"operation": "generateScript", "framework": "watir", "actions": []}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::UnsupportedTarget(_)));
}

// ============================================================================
// Network capture → assertions
// ============================================================================

#[tokio::test]
async fn test_captured_api_calls_become_assertions() {
    let state = Arc::new(AppState::default());

    call(
        &state,
        json!({"operation": "ingestNetworkEvents", "events": [
            {"event": "started", "request_id": "r1", "url": "https://app.test/api/session",
             "method": "POST", "resource_type": "fetch", "timestamp": 100.0},
            {"event": "response_headers", "request_id": "r1", "status_code": 201,
             "headers": {"content-type": "application/json"}},
            {"event": "completed", "request_id": "r1", "timestamp": 180.0}
        ]}),
    )
    .await
    .unwrap();

    let summary = call(&state, json!({"operation": "networkSummary"})).await.unwrap();
    assert_eq!(summary["summary"]["total"], 1);

    let har = call(&state, json!({"operation": "exportNetworkData", "format": "har"}))
        .await
        .unwrap();
    let document: Value = serde_json::from_str(har["content"].as_str().unwrap_or("{}")).unwrap();
    let entries = document["log"]["entries"].as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["request"]["method"], "POST");
    assert_eq!(entries[0]["response"]["status"], 201);

    let script = call(
        &state,
        json!({"operation": "generateScript", "framework": "playwright",
               "actions": login_actions(),
               "options": {"network_assertions": true}}),
    )
    .await
    .unwrap();
    let code = script["code"].as_str().unwrap_or_default();
    assert!(code.contains("/api/session"));
    assert!(code.contains("201"));
}
