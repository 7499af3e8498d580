use serde::Deserialize;

use super::action::Action;
use super::network::NetworkEvent;
use super::session::TabContext;
use crate::codegen::GenerateOptions;

#[derive(Debug, Deserialize, Default)]
pub struct StartSessionRequest {
    #[serde(flatten)]
    pub tab: TabContext,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppendActionsRequest {
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct TabClosedRequest {
    pub tab_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TabNavigatedRequest {
    pub tab_id: i64,
    pub url: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct IngestNetworkRequest {
    #[serde(default)]
    pub events: Vec<NetworkEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ExportNetworkRequest {
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_format() -> String {
    "json".to_string()
}

impl Default for ExportNetworkRequest {
    fn default() -> Self {
        Self {
            format: default_export_format(),
        }
    }
}

/// Request to generate a test script.
///
/// Actions given inline are used in the order supplied; otherwise the
/// optimized actions of `session_id`, or of the latest session, are used.
#[derive(Debug, Deserialize)]
pub struct GenerateScriptRequest {
    #[serde(alias = "target")]
    pub framework: String,
    #[serde(default)]
    pub actions: Option<Vec<Action>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub options: GenerateOptions,
}

#[derive(Debug, Deserialize, Default)]
pub struct AnalyzeWaitsRequest {
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct GetSessionRequest {
    pub session_id: String,
}
