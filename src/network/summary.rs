use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{NetworkRequest, RequestStatus};

/// Aggregate view over captured requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub total: usize,
    pub inflight: usize,
    pub by_type: BTreeMap<String, usize>,
    /// Keyed by status class (`200`, `400`, ...) or `pending` / `error`
    pub by_status: BTreeMap<String, usize>,
    pub average_duration_ms: f64,
    pub error_count: usize,
    pub api_count: usize,
    pub graphql_count: usize,
    pub websocket_count: usize,
}

/// Status bucket for a request: HTTP status truncated to hundreds when known
pub fn status_class(request: &NetworkRequest) -> String {
    match (request.status, request.status_code) {
        (RequestStatus::Error, _) => RequestStatus::Error.as_str().to_string(),
        (_, Some(code)) => ((code / 100) * 100).to_string(),
        (status, None) => status.as_str().to_string(),
    }
}

pub fn summarize<'a>(
    finalized: &'a [NetworkRequest],
    inflight: impl Iterator<Item = &'a NetworkRequest>,
) -> NetworkSummary {
    let mut summary = NetworkSummary::default();
    let mut duration_total = 0.0;
    let mut duration_count = 0usize;

    let all = finalized.iter().chain(inflight);
    for request in all {
        summary.total += 1;
        if request.status == RequestStatus::Pending {
            summary.inflight += 1;
        }
        *summary
            .by_type
            .entry(request.resource_type.clone())
            .or_insert(0) += 1;
        *summary.by_status.entry(status_class(request)).or_insert(0) += 1;

        if let Some(duration) = request.duration_ms {
            duration_total += duration;
            duration_count += 1;
        }
        if request.is_error() {
            summary.error_count += 1;
        }

        let classification = request
            .classification
            .clone()
            .unwrap_or_else(|| super::classify(request));
        summary.api_count += classification.is_api as usize;
        summary.graphql_count += classification.is_graphql as usize;
        summary.websocket_count += classification.is_websocket as usize;
    }

    if duration_count > 0 {
        summary.average_duration_ms = duration_total / duration_count as f64;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(id: &str, code: u16, duration: f64) -> NetworkRequest {
        let mut request = NetworkRequest::new(id, "https://app.test/api/x", "GET", "xhr", 0.0);
        request.status = RequestStatus::Completed;
        request.status_code = Some(code);
        request.duration_ms = Some(duration);
        request
    }

    #[test]
    fn test_summary_counts() {
        let finalized = vec![
            finished("1", 200, 100.0),
            finished("2", 204, 300.0),
            finished("3", 404, 200.0),
        ];
        let mut failed = NetworkRequest::new("4", "https://app.test/", "GET", "document", 0.0);
        failed.status = RequestStatus::Error;
        let pending = NetworkRequest::new("5", "https://app.test/api/y", "GET", "fetch", 0.0);

        let mut all = finalized.clone();
        all.push(failed);
        let summary = summarize(&all, std::iter::once(&pending));

        assert_eq!(summary.total, 5);
        assert_eq!(summary.inflight, 1);
        assert_eq!(summary.by_status.get("200"), Some(&2));
        assert_eq!(summary.by_status.get("400"), Some(&1));
        assert_eq!(summary.by_status.get("error"), Some(&1));
        assert_eq!(summary.by_status.get("pending"), Some(&1));
        assert_eq!(summary.by_type.get("xhr"), Some(&3));
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.average_duration_ms, 200.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], std::iter::empty());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_duration_ms, 0.0);
    }
}
