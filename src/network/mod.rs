pub mod classify;
pub mod filter;
pub mod har;
pub mod monitor;
pub mod summary;

pub use classify::{
    classify, graphql_operation, is_api_request, is_graphql_request, is_websocket_request,
    parse_operation,
};
pub use filter::NetworkFilter;
pub use har::{export, to_har, ExportError, ExportFormat};
pub use monitor::{reduce, IngestOutcome, MonitorConfig, NetworkMonitor, DEFAULT_MAX_BODY_BYTES};
pub use summary::{status_class, summarize, NetworkSummary};
