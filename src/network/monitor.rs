use std::collections::{HashMap, HashSet};

use super::classify::classify;
use super::filter::NetworkFilter;
use super::har::{self, ExportError, ExportFormat};
use super::summary::{summarize, NetworkSummary};
use crate::models::{NetworkEvent, NetworkRequest, RequestStatus};

pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub filter: NetworkFilter,
    /// Bodies longer than this are truncated
    pub max_body_bytes: usize,
    /// In-flight requests older than this are finalized as errors by `sweep`;
    /// `None` keeps them until a terminal event arrives
    pub inflight_ttl_ms: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            filter: NetworkFilter::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            inflight_ttl_ms: None,
        }
    }
}

/// What happened to an ingested event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Tracked,
    Updated,
    Finalized,
    Filtered,
    Ignored,
}

/// Correlates lifecycle events into request records.
///
/// In-flight snapshots live in one arena keyed by request id; each event
/// produces a new snapshot through `reduce`. Terminal events move the record
/// to the append-only finalized list.
pub struct NetworkMonitor {
    config: MonitorConfig,
    inflight: HashMap<String, NetworkRequest>,
    finalized: Vec<NetworkRequest>,
    finalized_ids: HashSet<String>,
}

impl NetworkMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            inflight: HashMap::new(),
            finalized: Vec::new(),
            finalized_ids: HashSet::new(),
        }
    }

    pub fn ingest(&mut self, event: NetworkEvent) -> IngestOutcome {
        let request_id = event.request_id().to_string();

        if let NetworkEvent::Started {
            url, resource_type, ..
        } = &event
        {
            if self.finalized_ids.contains(&request_id) {
                return IngestOutcome::Ignored;
            }
            if !self.config.filter.accepts(url, resource_type) {
                tracing::trace!("Filtered {} request {}", resource_type, url);
                return IngestOutcome::Filtered;
            }
            // a repeated start for an in-flight id is a redirect hop and restarts the record
            let request = start_snapshot(&event, self.config.max_body_bytes);
            self.inflight.insert(request_id, request);
            return IngestOutcome::Tracked;
        }

        let Some(current) = self.inflight.get(&request_id) else {
            return IngestOutcome::Ignored;
        };
        let next = reduce(current, &event, self.config.max_body_bytes);

        if event.is_terminal() {
            self.inflight.remove(&request_id);
            self.finalize(next);
            IngestOutcome::Finalized
        } else {
            self.inflight.insert(request_id, next);
            IngestOutcome::Updated
        }
    }

    pub fn ingest_all(&mut self, events: impl IntoIterator<Item = NetworkEvent>) -> usize {
        events
            .into_iter()
            .map(|event| self.ingest(event))
            .filter(|outcome| !matches!(outcome, IngestOutcome::Filtered | IngestOutcome::Ignored))
            .count()
    }

    /// Finalize in-flight requests older than the configured TTL
    pub fn sweep(&mut self, now_ms: f64) -> usize {
        let Some(ttl) = self.config.inflight_ttl_ms else {
            return 0;
        };
        let stale: Vec<String> = self
            .inflight
            .iter()
            .filter(|(_, r)| now_ms - r.start_time > ttl as f64)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(request) = self.inflight.remove(id) {
                let timed_out = reduce(
                    &request,
                    &NetworkEvent::Failed {
                        request_id: id.clone(),
                        timestamp: now_ms,
                        error: Some("timed out".to_string()),
                    },
                    self.config.max_body_bytes,
                );
                self.finalize(timed_out);
            }
        }
        if !stale.is_empty() {
            tracing::debug!("Evicted {} stale in-flight requests", stale.len());
        }
        stale.len()
    }

    fn finalize(&mut self, mut request: NetworkRequest) {
        if !self.finalized_ids.insert(request.id.clone()) {
            return;
        }
        request.classification = Some(classify(&request));
        self.finalized.push(request);
    }

    /// Finalized requests in completion order
    pub fn requests(&self) -> &[NetworkRequest] {
        &self.finalized
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }

    pub fn summary(&self) -> NetworkSummary {
        summarize(&self.finalized, self.inflight.values())
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        har::export(format, &self.finalized, &self.summary())
    }

    pub fn clear(&mut self) {
        self.inflight.clear();
        self.finalized.clear();
        self.finalized_ids.clear();
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

fn start_snapshot(event: &NetworkEvent, max_body: usize) -> NetworkRequest {
    match event {
        NetworkEvent::Started {
            request_id,
            url,
            method,
            resource_type,
            timestamp,
            tab_id,
            frame_id,
            body,
        } => {
            let mut request = NetworkRequest::new(request_id, url, method, resource_type, *timestamp);
            request.tab_id = *tab_id;
            request.frame_id = frame_id.clone();
            request.request_body = body.as_deref().map(|b| truncate_body(b, max_body));
            request
        }
        other => NetworkRequest::new(other.request_id(), "", "GET", "other", 0.0),
    }
}

/// Apply one lifecycle event to a snapshot, producing the next snapshot
pub fn reduce(current: &NetworkRequest, event: &NetworkEvent, max_body: usize) -> NetworkRequest {
    let mut next = current.clone();
    match event {
        NetworkEvent::Started { .. } => return start_snapshot(event, max_body),
        NetworkEvent::RequestHeaders { headers, .. } => {
            next.request_headers
                .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        NetworkEvent::ResponseHeaders {
            status_code,
            status_text,
            headers,
            ..
        } => {
            next.status_code = Some(*status_code);
            if status_text.is_some() {
                next.status_text = status_text.clone();
            }
            next.response_headers
                .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        NetworkEvent::Completed {
            timestamp,
            status_code,
            body,
            mime_type,
            ..
        } => {
            next.status = RequestStatus::Completed;
            if status_code.is_some() {
                next.status_code = *status_code;
            }
            if let Some(body) = body {
                next.response_body = Some(truncate_body(body, max_body));
            }
            if mime_type.is_some() {
                next.mime_type = mime_type.clone();
            }
            stamp_end(&mut next, *timestamp);
        }
        NetworkEvent::Failed {
            timestamp, error, ..
        } => {
            next.status = RequestStatus::Error;
            next.error = Some(error.clone().unwrap_or_else(|| "failed".to_string()));
            stamp_end(&mut next, *timestamp);
        }
    }
    next
}

fn stamp_end(request: &mut NetworkRequest, end_time: f64) {
    request.end_time = Some(end_time);
    request.duration_ms = Some((end_time - request.start_time).max(0.0));
}

/// Cut a body to at most `max_bytes`, respecting char boundaries
fn truncate_body(body: &str, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
