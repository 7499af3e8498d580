pub mod collaborator;
pub mod manager;
pub mod optimizer;

pub use collaborator::{rearm, CollaboratorError, PageAgent, RearmPolicy};
pub use manager::{SessionError, SessionManager, SessionResult, DEFAULT_HISTORY_LIMIT};
pub use optimizer::{deduplicate, derive_context, optimize, optimize_on, OptimizedActions};
