use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// The in-page script that reports interactions for a tab.
///
/// After a navigation the page loses its listeners, so the recorder asks the
/// agent to arm the new document again.
#[async_trait]
pub trait PageAgent: Send + Sync {
    async fn arm(&self, tab_id: i64) -> anyhow::Result<()>;
}

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("in-page recorder unavailable for tab {tab_id} after {attempts} attempts: {last_error}")]
    Unavailable {
        tab_id: i64,
        attempts: usize,
        last_error: String,
    },
}

/// Delays between re-arm attempts after the first immediate one
#[derive(Debug, Clone)]
pub struct RearmPolicy {
    pub retry_delays: Vec<Duration>,
}

impl Default for RearmPolicy {
    fn default() -> Self {
        Self {
            retry_delays: vec![Duration::from_millis(500), Duration::from_millis(1500)],
        }
    }
}

/// Arm the page now, retrying once per configured delay.
///
/// A final failure is logged and returned; the recording session is left as is.
pub async fn rearm(
    agent: &dyn PageAgent,
    tab_id: i64,
    policy: &RearmPolicy,
) -> Result<usize, CollaboratorError> {
    let mut last_error = match agent.arm(tab_id).await {
        Ok(()) => return Ok(1),
        Err(e) => e,
    };

    for (retry, delay) in policy.retry_delays.iter().enumerate() {
        tracing::debug!(
            "Re-arm of tab {} failed ({}), retrying in {:?}",
            tab_id,
            last_error,
            delay
        );
        tokio::time::sleep(*delay).await;
        match agent.arm(tab_id).await {
            Ok(()) => return Ok(retry + 2),
            Err(e) => last_error = e,
        }
    }

    let error = CollaboratorError::Unavailable {
        tab_id,
        attempts: policy.retry_delays.len() + 1,
        last_error: last_error.to_string(),
    };
    tracing::warn!("{}; recording continues without page events", error);
    Err(error)
}
