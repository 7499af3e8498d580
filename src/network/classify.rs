//! Protocol classification for captured requests.
//!
//! Everything here is computed from the request snapshot; a body that fails to
//! parse only means "not GraphQL", never an error.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::{GraphQlOperation, NetworkRequest, OperationType, RequestClassification};

pub const API_PATH_FRAGMENTS: &[&str] = &[
    "/api/", "/api?", "/v1/", "/v2/", "/v3/", "/rest/", "/graphql", "/rpc", ".json",
];

static OPERATION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(query|mutation|subscription)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid regex")
});

pub fn classify(request: &NetworkRequest) -> RequestClassification {
    let is_graphql = is_graphql_request(request);
    RequestClassification {
        is_api: is_api_request(request),
        is_graphql,
        is_websocket: is_websocket_request(request),
        graphql: if is_graphql {
            graphql_operation(request)
        } else {
            None
        },
    }
}

pub fn is_api_request(request: &NetworkRequest) -> bool {
    if matches!(request.resource_type.as_str(), "fetch" | "xhr") {
        return true;
    }
    let url = request.url.to_lowercase();
    API_PATH_FRAGMENTS.iter().any(|f| url.contains(f))
}

pub fn is_graphql_request(request: &NetworkRequest) -> bool {
    if request.url.to_lowercase().contains("/graphql") {
        return true;
    }
    let content_type = request
        .request_header("content-type")
        .map(|c| c.to_lowercase())
        .unwrap_or_default();
    if content_type.contains("application/graphql") {
        return true;
    }
    if request.method != "POST" {
        return false;
    }
    request
        .request_body
        .as_deref()
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .map(|payload| looks_like_graphql(&payload))
        .unwrap_or(false)
}

fn looks_like_graphql(payload: &Value) -> bool {
    match payload {
        Value::Object(map) => ["query", "mutation", "operationName"]
            .iter()
            .any(|k| map.contains_key(*k)),
        // batched operations
        Value::Array(items) => items.first().map(looks_like_graphql).unwrap_or(false),
        _ => false,
    }
}

pub fn is_websocket_request(request: &NetworkRequest) -> bool {
    let url = request.url.to_lowercase();
    if url.starts_with("ws://") || url.starts_with("wss://") || request.resource_type == "websocket" {
        return true;
    }

    let upgrade_pair = |upgrade: Option<&str>, connection: Option<&str>| {
        upgrade.map(|u| u.eq_ignore_ascii_case("websocket")).unwrap_or(false)
            && connection
                .map(|c| c.to_lowercase().contains("upgrade"))
                .unwrap_or(false)
    };
    upgrade_pair(
        request.request_header("upgrade"),
        request.request_header("connection"),
    ) || upgrade_pair(
        request.response_header("upgrade"),
        request.response_header("connection"),
    )
}

/// Parse the GraphQL operation from a request body or, for GET, the query string
pub fn graphql_operation(request: &NetworkRequest) -> Option<GraphQlOperation> {
    let payload = request
        .request_body
        .as_deref()
        .and_then(|body| serde_json::from_str::<Value>(body).ok())
        .map(|payload| match payload {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        });

    match payload {
        Some(Value::Object(map)) => {
            let query = map.get("query").and_then(Value::as_str).unwrap_or("");
            let fallback_name = map.get("operationName").and_then(Value::as_str);
            Some(parse_operation(query, fallback_name, map.get("variables").cloned()))
        }
        _ => {
            // raw application/graphql bodies and GET ?query= requests
            let query = request
                .request_body
                .clone()
                .or_else(|| query_param(&request.url, "query"))?;
            let name = query_param(&request.url, "operationName");
            Some(parse_operation(&query, name.as_deref(), None))
        }
    }
}

/// Operation type from the leading keyword, name from the operation header
pub fn parse_operation(
    query: &str,
    operation_name: Option<&str>,
    variables: Option<Value>,
) -> GraphQlOperation {
    let normalized = query.trim().to_lowercase();
    let operation_type = if normalized.starts_with("query") {
        OperationType::Query
    } else if normalized.starts_with("mutation") {
        OperationType::Mutation
    } else if normalized.starts_with("subscription") {
        OperationType::Subscription
    } else if normalized.starts_with('{') {
        OperationType::Query
    } else {
        OperationType::Unknown
    };

    let operation_name = OPERATION_NAME
        .captures(query)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            operation_name
                .filter(|n| !n.is_empty())
                .map(|n| n.to_string())
        });

    GraphQlOperation {
        operation_type,
        operation_name,
        variables: variables.filter(|v| !v.is_null()),
    }
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or("");
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| {
            urlencoding::decode(&v.replace('+', " "))
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}
