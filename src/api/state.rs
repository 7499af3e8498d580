use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};

use crate::config::Config;
use crate::models::{Action, SessionStatus};
use crate::network::NetworkMonitor;
use crate::recording::{PageAgent, RearmPolicy, SessionManager};

/// WebSocket event types broadcast to clients
#[derive(Debug, Clone)]
pub enum WsEvent {
    ActionRecorded {
        session_id: String,
        action: Action,
    },
    SessionStatus {
        session_id: String,
        status: SessionStatus,
    },
    /// The in-page recorder for `tab_id` must attach to the new document
    RearmRequested {
        tab_id: i64,
    },
    Error {
        session_id: Option<String>,
        error: String,
    },
    Pong,
}

/// Connected WebSocket client info
#[derive(Debug)]
pub struct ConnectedClient {
    pub connected_at: Instant,
}

/// Page agent reached through the WebSocket broadcast.
///
/// A re-arm request is broadcast to every client, but only the in-page
/// collaborator answers it with an `armed` message for the tab. Arming
/// succeeds once that acknowledgement arrives within `ack_timeout`; a UI
/// client that merely listens does not count.
pub struct BroadcastAgent {
    sender: broadcast::Sender<WsEvent>,
    acks: broadcast::Sender<i64>,
    ack_timeout: Duration,
}

impl BroadcastAgent {
    pub fn new(
        sender: broadcast::Sender<WsEvent>,
        acks: broadcast::Sender<i64>,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            acks,
            ack_timeout,
        }
    }
}

#[async_trait]
impl PageAgent for BroadcastAgent {
    async fn arm(&self, tab_id: i64) -> anyhow::Result<()> {
        // subscribe before sending so a fast acknowledgement is not missed
        let mut acks = self.acks.subscribe();
        self.sender
            .send(WsEvent::RearmRequested { tab_id })
            .map_err(|_| anyhow::anyhow!("no connected page agent"))?;

        let acknowledged = async {
            loop {
                match acks.recv().await {
                    Ok(id) if id == tab_id => return Ok(()),
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        anyhow::bail!("acknowledgement channel closed")
                    }
                }
            }
        };
        tokio::time::timeout(self.ack_timeout, acknowledged)
            .await
            .map_err(|_| anyhow::anyhow!("tab {} did not acknowledge within {:?}", tab_id, self.ack_timeout))?
    }
}

/// Shared application state
pub struct AppState {
    pub config: Config,

    /// Single-session recorder and completed history
    pub sessions: Mutex<SessionManager>,

    /// Network lifecycle correlation
    pub network: Mutex<NetworkMonitor>,

    /// Connected WebSocket clients: client_id -> client info
    pub connected_clients: DashMap<String, ConnectedClient>,

    /// Total connection count (for metrics)
    connection_count: AtomicUsize,

    /// Broadcast channel for WebSocket events
    pub ws_broadcast: broadcast::Sender<WsEvent>,

    /// Tab ids whose in-page recorder reported itself armed
    arm_acks: broadcast::Sender<i64>,

    pub page_agent: Arc<dyn PageAgent>,

    pub rearm_policy: RearmPolicy,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (tx, _) = broadcast::channel(1024);
        let (acks, _) = broadcast::channel(64);
        let agent = Arc::new(BroadcastAgent::new(
            tx.clone(),
            acks.clone(),
            Duration::from_millis(config.rearm_ack_timeout_ms),
        ));
        Self::with_channels(config, tx, acks, agent)
    }

    /// State with a custom page agent, sharing `tx` for client broadcasts
    pub fn with_agent(
        config: Config,
        tx: broadcast::Sender<WsEvent>,
        page_agent: Arc<dyn PageAgent>,
    ) -> Self {
        let (acks, _) = broadcast::channel(64);
        Self::with_channels(config, tx, acks, page_agent)
    }

    fn with_channels(
        config: Config,
        tx: broadcast::Sender<WsEvent>,
        acks: broadcast::Sender<i64>,
        page_agent: Arc<dyn PageAgent>,
    ) -> Self {
        tracing::debug!("Application state initialized with {:?}", config);
        Self {
            sessions: Mutex::new(SessionManager::new(config.history_limit)),
            network: Mutex::new(NetworkMonitor::new(config.monitor_config())),
            connected_clients: DashMap::new(),
            connection_count: AtomicUsize::new(0),
            ws_broadcast: tx,
            arm_acks: acks,
            page_agent,
            rearm_policy: config.rearm_policy(),
            config,
        }
    }

    pub fn broadcast(&self, event: WsEvent) {
        // Ignore send errors (no receivers)
        let _ = self.ws_broadcast.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.ws_broadcast.subscribe()
    }

    /// The in-page recorder for `tab_id` attached to the current document
    pub fn acknowledge_armed(&self, tab_id: i64) {
        tracing::debug!("Tab {} acknowledged re-arm", tab_id);
        let _ = self.arm_acks.send(tab_id);
    }

    /// Register a WebSocket client connection
    pub fn client_connected(&self, client_id: &str) {
        self.connected_clients.insert(
            client_id.to_string(),
            ConnectedClient {
                connected_at: Instant::now(),
            },
        );
        let count = self.connection_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "Client {} connected (total: {}, active: {})",
            client_id,
            count,
            self.connected_clients.len()
        );
    }

    /// Unregister a WebSocket client connection
    pub fn client_disconnected(&self, client_id: &str) {
        if let Some((_, client)) = self.connected_clients.remove(client_id) {
            tracing::debug!(
                "Client {} disconnected after {:?} (active: {})",
                client_id,
                client.connected_at.elapsed(),
                self.connected_clients.len()
            );
        }
    }

    pub fn active_connection_count(&self) -> usize {
        self.connected_clients.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
