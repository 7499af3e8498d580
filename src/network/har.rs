use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

use super::summary::NetworkSummary;
use crate::models::{Headers, NetworkRequest};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to serialize export: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Har,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "har" => Ok(ExportFormat::Har),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub fn export(
    format: ExportFormat,
    requests: &[NetworkRequest],
    summary: &NetworkSummary,
) -> Result<String, ExportError> {
    let document = match format {
        ExportFormat::Json => json!({
            "exported_at": Utc::now().to_rfc3339(),
            "summary": summary,
            "requests": requests,
        }),
        ExportFormat::Har => to_har(requests),
    };
    serde_json::to_string_pretty(&document).map_err(|e| ExportError::Serialize(e.to_string()))
}

/// HAR 1.2 document with one entry per finalized request
pub fn to_har(requests: &[NetworkRequest]) -> Value {
    json!({
        "log": {
            "version": "1.2",
            "creator": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "pages": [],
            "entries": requests.iter().map(har_entry).collect::<Vec<_>>(),
        }
    })
}

fn har_entry(request: &NetworkRequest) -> Value {
    let duration = request.duration_ms.unwrap_or(0.0).max(0.0);
    let request_content_type = request
        .request_header("content-type")
        .unwrap_or("application/octet-stream");
    let mime_type = request
        .mime_type
        .as_deref()
        .or_else(|| request.response_header("content-type"))
        .unwrap_or("");

    let mut har_request = json!({
        "method": request.method,
        "url": request.url,
        "httpVersion": "HTTP/1.1",
        "headers": har_headers(&request.request_headers),
        "queryString": query_string(&request.url),
        "cookies": [],
        "headersSize": -1,
        "bodySize": request.request_body.as_ref().map(|b| b.len() as i64).unwrap_or(0),
    });
    if let Some(body) = &request.request_body {
        har_request["postData"] = json!({
            "mimeType": request_content_type,
            "text": body,
        });
    }

    let mut content = json!({
        "size": request.response_body.as_ref().map(|b| b.len() as i64).unwrap_or(0),
        "mimeType": mime_type,
    });
    if let Some(body) = &request.response_body {
        content["text"] = json!(body);
    }

    let mut entry = json!({
        "startedDateTime": started_date_time(request.start_time),
        "time": duration,
        "request": har_request,
        "response": {
            "status": request.status_code.unwrap_or(0),
            "statusText": request.status_text.clone().unwrap_or_default(),
            "httpVersion": "HTTP/1.1",
            "headers": har_headers(&request.response_headers),
            "cookies": [],
            "content": content,
            "redirectURL": request.response_header("location").unwrap_or(""),
            "headersSize": -1,
            "bodySize": -1,
        },
        "cache": {},
        "timings": {
            "send": 0,
            "wait": duration,
            "receive": 0,
        },
        "_resourceType": request.resource_type,
    });
    if let Some(error) = &request.error {
        entry["_error"] = json!(error);
    }
    entry
}

fn har_headers(headers: &Headers) -> Vec<Value> {
    headers
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect()
}

fn query_string(url: &str) -> Vec<Value> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    let query = query.split('#').next().unwrap_or("");
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            json!({ "name": decode(name), "value": decode(value) })
        })
        .collect()
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|d| d.into_owned())
        .unwrap_or(spaced)
}

fn started_date_time(epoch_ms: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_default()
        .to_rfc3339()
}
