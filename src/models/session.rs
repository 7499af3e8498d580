use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Recording,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionStatus::Completed)
    }
}

/// Tab the recording is attached to, as reported by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabContext {
    #[serde(default)]
    pub tab_id: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Facts derived from an action list that shape the generated test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestContext {
    pub test_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    /// Distinct URLs in visit order
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub has_form_submission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSession {
    pub id: String,
    pub tab_id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: SessionStatus,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<TestContext>,
}

impl TestContext {
    /// Anchor the context on the page the recording started from
    pub fn starting_at(mut self, url: &str) -> Self {
        if url.is_empty() {
            return self;
        }
        self.start_url = Some(url.to_string());
        if !self.urls.iter().any(|u| u == url) {
            self.urls.insert(0, url.to_string());
        }
        self
    }
}

impl RecordingSession {
    pub fn new(tab_id: i64, url: String, title: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tab_id,
            url,
            title,
            status: SessionStatus::Recording,
            actions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            context: None,
        }
    }

    pub fn pause(&mut self) {
        self.status = SessionStatus::Paused;
    }

    pub fn resume(&mut self) {
        self.status = SessionStatus::Recording;
    }

    pub fn complete(&mut self, context: TestContext) {
        let ended_at = Utc::now();
        self.status = SessionStatus::Completed;
        self.duration_ms = Some((ended_at - self.started_at).num_milliseconds());
        self.ended_at = Some(ended_at);
        self.context = Some(context);
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }
}
