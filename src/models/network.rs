use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Completed => "completed",
            RequestStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
    Unknown,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
            OperationType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlOperation {
    pub operation_type: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

/// Derived protocol flags for a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestClassification {
    pub is_api: bool,
    pub is_graphql: bool,
    pub is_websocket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql: Option<GraphQlOperation>,
}

/// Consolidated record of one request across its lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub id: String,
    pub url: String,
    pub method: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    pub status: RequestStatus,
    /// Epoch milliseconds
    pub start_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default)]
    pub request_headers: Headers,
    #[serde(default)]
    pub response_headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Cached once the request is finalized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<RequestClassification>,
}

impl NetworkRequest {
    pub fn new(id: &str, url: &str, method: &str, resource_type: &str, start_time: f64) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            method: method.to_uppercase(),
            resource_type: resource_type.to_lowercase(),
            tab_id: None,
            frame_id: None,
            status: RequestStatus::Pending,
            start_time,
            end_time: None,
            duration_ms: None,
            status_code: None,
            status_text: None,
            request_headers: Headers::new(),
            response_headers: Headers::new(),
            request_body: None,
            response_body: None,
            mime_type: None,
            error: None,
            classification: None,
        }
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        find_header(&self.request_headers, name)
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_header(&self.response_headers, name)
    }

    pub fn is_error(&self) -> bool {
        self.status == RequestStatus::Error || self.status_code.map(|c| c >= 400).unwrap_or(false)
    }
}

/// Case-insensitive header lookup
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Raw lifecycle event reported by the host's network observer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NetworkEvent {
    Started {
        request_id: String,
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default = "default_resource_type")]
        resource_type: String,
        timestamp: f64,
        #[serde(default)]
        tab_id: Option<i64>,
        #[serde(default)]
        frame_id: Option<String>,
        #[serde(default)]
        body: Option<String>,
    },
    RequestHeaders {
        request_id: String,
        headers: Headers,
    },
    ResponseHeaders {
        request_id: String,
        status_code: u16,
        #[serde(default)]
        status_text: Option<String>,
        #[serde(default)]
        headers: Headers,
    },
    Completed {
        request_id: String,
        timestamp: f64,
        #[serde(default)]
        status_code: Option<u16>,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        mime_type: Option<String>,
    },
    Failed {
        request_id: String,
        timestamp: f64,
        #[serde(default)]
        error: Option<String>,
    },
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_resource_type() -> String {
    "other".to_string()
}

impl NetworkEvent {
    pub fn request_id(&self) -> &str {
        match self {
            NetworkEvent::Started { request_id, .. }
            | NetworkEvent::RequestHeaders { request_id, .. }
            | NetworkEvent::ResponseHeaders { request_id, .. }
            | NetworkEvent::Completed { request_id, .. }
            | NetworkEvent::Failed { request_id, .. } => request_id,
        }
    }

    /// Event time for events that carry one
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            NetworkEvent::Started { timestamp, .. }
            | NetworkEvent::Completed { timestamp, .. }
            | NetworkEvent::Failed { timestamp, .. } => Some(*timestamp),
            NetworkEvent::RequestHeaders { .. } | NetworkEvent::ResponseHeaders { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NetworkEvent::Completed { .. } | NetworkEvent::Failed { .. }
        )
    }
}
