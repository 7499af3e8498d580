use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

use super::optimizer;
use crate::models::{Action, RecordingSession, SessionStatus, TabContext};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No tab available to record")]
    NoTab,

    #[error("A recording session is already active: {0}")]
    AlreadyActive(String),

    #[error("No active recording session")]
    NoActiveSession,

    #[error("Session not found: {0}")]
    NotFound(String),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Owns the single recording session and the history of completed ones.
///
/// At most one session is non-completed at any time; every transition checks
/// the current state before it mutates anything.
pub struct SessionManager {
    active: Option<RecordingSession>,
    history: VecDeque<RecordingSession>,
    history_limit: usize,
    buffered_ids: HashSet<String>,
}

impl SessionManager {
    pub fn new(history_limit: usize) -> Self {
        Self {
            active: None,
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
            buffered_ids: HashSet::new(),
        }
    }

    /// Start recording a tab
    pub fn start(&mut self, tab: &TabContext) -> SessionResult<RecordingSession> {
        if let Some(active) = &self.active {
            if active.status.is_active() {
                tracing::warn!("Rejected start: session {} is still {:?}", active.id, active.status);
                return Err(SessionError::AlreadyActive(active.id.clone()));
            }
        }
        let tab_id = tab.tab_id.ok_or(SessionError::NoTab)?;

        let session = RecordingSession::new(
            tab_id,
            tab.url.clone().unwrap_or_default(),
            tab.title.clone(),
        );
        tracing::info!("Recording started: {} on tab {} ({})", session.id, tab_id, session.url);

        self.buffered_ids.clear();
        self.active = Some(session.clone());
        Ok(session)
    }

    pub fn pause(&mut self) -> SessionResult<RecordingSession> {
        let session = self.active_with_status(SessionStatus::Recording)?;
        session.pause();
        tracing::info!("Recording paused: {}", session.id);
        Ok(session.clone())
    }

    pub fn resume(&mut self) -> SessionResult<RecordingSession> {
        let session = self.active_with_status(SessionStatus::Paused)?;
        session.resume();
        tracing::info!("Recording resumed: {}", session.id);
        Ok(session.clone())
    }

    /// Complete the active session, derive its context and fold it into history
    pub fn stop(&mut self) -> SessionResult<RecordingSession> {
        let mut session = match self.active.take() {
            Some(session) if session.status.is_active() => session,
            other => {
                self.active = other;
                return Err(SessionError::NoActiveSession);
            }
        };

        let optimized = optimizer::optimize(&session.actions);
        let context = optimized.context.starting_at(&session.url);
        session.complete(context);
        tracing::info!(
            "Recording stopped: {} ({} actions, {} after dedup)",
            session.id,
            session.actions.len(),
            optimized.actions.len()
        );

        self.buffered_ids.clear();
        self.history.push_front(session.clone());
        self.history.truncate(self.history_limit);
        Ok(session)
    }

    /// Append captured actions to the recording session.
    ///
    /// Without a recording session, or while paused, this does nothing.
    /// Actions whose id is already buffered are skipped.
    pub fn append_actions(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let Some(session) = self.active.as_mut().filter(|s| s.is_recording()) else {
            tracing::debug!("Ignoring {} actions: no recording session", actions.len());
            return Vec::new();
        };

        let mut appended = Vec::with_capacity(actions.len());
        for action in actions {
            if !self.buffered_ids.insert(action.id.clone()) {
                continue;
            }
            session.add_action(action.clone());
            appended.push(action);
        }
        appended
    }

    /// The owning tab went away; stop the session implicitly
    pub fn on_tab_closed(&mut self, tab_id: i64) -> Option<RecordingSession> {
        let owns_tab = self
            .active
            .as_ref()
            .map(|s| s.tab_id == tab_id && s.status.is_active())
            .unwrap_or(false);
        if !owns_tab {
            return None;
        }
        tracing::info!("Tab {} closed, stopping recording", tab_id);
        self.stop().ok()
    }

    /// The owning tab navigated; record a navigation step.
    ///
    /// Returns the synthetic action when one was appended, which means the
    /// in-page recorder must be armed again.
    pub fn on_tab_navigated(&mut self, tab_id: i64, url: &str) -> Option<Action> {
        let recording = self
            .active
            .as_ref()
            .map(|s| s.tab_id == tab_id && s.is_recording())
            .unwrap_or(false);
        if !recording {
            return None;
        }

        let action = Action::navigation(url, Utc::now().timestamp_millis()).with_tab(tab_id);
        let appended = self.append_actions(vec![action]);
        tracing::debug!("Tab {} navigated to {}", tab_id, url);
        appended.into_iter().next()
    }

    pub fn active(&self) -> Option<&RecordingSession> {
        self.active.as_ref()
    }

    /// Completed sessions, most recent first
    pub fn history(&self) -> Vec<RecordingSession> {
        self.history.iter().cloned().collect()
    }

    /// Look up the active session or a completed one by id
    pub fn find(&self, session_id: &str) -> SessionResult<RecordingSession> {
        self.active
            .iter()
            .chain(self.history.iter())
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    fn active_with_status(&mut self, status: SessionStatus) -> SessionResult<&mut RecordingSession> {
        self.active
            .as_mut()
            .filter(|s| s.status == status)
            .ok_or(SessionError::NoActiveSession)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, ElementDescriptor};

    fn tab(id: i64) -> TabContext {
        TabContext {
            tab_id: Some(id),
            url: Some("https://shop.test".to_string()),
            title: Some("Shop".to_string()),
        }
    }

    fn click(id: &str) -> Action {
        Action::click(ElementDescriptor::new("button").with_id(id), 0)
    }

    #[test]
    fn test_resume_before_start_fails() {
        let mut manager = SessionManager::default();
        assert_eq!(manager.resume().unwrap_err(), SessionError::NoActiveSession);
    }

    #[test]
    fn test_pause_twice_fails() {
        let mut manager = SessionManager::default();
        manager.start(&tab(1)).unwrap();
        assert_eq!(manager.pause().unwrap().status, SessionStatus::Paused);
        assert_eq!(manager.pause().unwrap_err(), SessionError::NoActiveSession);
    }

    #[test]
    fn test_stop_twice_fails() {
        let mut manager = SessionManager::default();
        manager.start(&tab(1)).unwrap();
        let completed = manager.stop().unwrap();
        assert_eq!(completed.status, SessionStatus::Completed);
        assert!(completed.ended_at.is_some());
        assert!(completed.context.is_some());
        assert_eq!(manager.stop().unwrap_err(), SessionError::NoActiveSession);
    }

    #[test]
    fn test_second_start_rejected_while_active() {
        let mut manager = SessionManager::default();
        let first = manager.start(&tab(1)).unwrap();
        manager.pause().unwrap();
        assert_eq!(
            manager.start(&tab(2)).unwrap_err(),
            SessionError::AlreadyActive(first.id)
        );

        manager.stop().unwrap();
        assert!(manager.start(&tab(2)).is_ok());
    }

    #[test]
    fn test_start_without_tab_fails() {
        let mut manager = SessionManager::default();
        assert_eq!(
            manager.start(&TabContext::default()).unwrap_err(),
            SessionError::NoTab
        );
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_append_requires_recording_and_skips_known_ids() {
        let mut manager = SessionManager::default();
        assert!(manager.append_actions(vec![click("a")]).is_empty());

        manager.start(&tab(1)).unwrap();
        let action = click("a");
        assert_eq!(manager.append_actions(vec![action.clone()]).len(), 1);
        assert!(manager.append_actions(vec![action]).is_empty());

        manager.pause().unwrap();
        assert!(manager.append_actions(vec![click("b")]).is_empty());
        manager.resume().unwrap();
        manager.append_actions(vec![click("c")]);

        assert_eq!(manager.active().unwrap().actions.len(), 2);
    }

    #[test]
    fn test_history_is_bounded_and_most_recent_first() {
        let mut manager = SessionManager::new(2);
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(manager.start(&tab(i)).unwrap().id);
            manager.stop().unwrap();
        }
        let history = manager.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, ids[2]);
        assert_eq!(history[1].id, ids[1]);
        assert!(manager.find(&ids[2]).is_ok());
        assert_eq!(
            manager.find(&ids[0]).unwrap_err(),
            SessionError::NotFound(ids[0].clone())
        );
    }

    #[test]
    fn test_tab_closed_stops_owning_session_only() {
        let mut manager = SessionManager::default();
        manager.start(&tab(5)).unwrap();
        assert!(manager.on_tab_closed(6).is_none());
        let stopped = manager.on_tab_closed(5).unwrap();
        assert_eq!(stopped.status, SessionStatus::Completed);
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_navigation_appends_synthetic_action() {
        let mut manager = SessionManager::default();
        manager.start(&tab(3)).unwrap();
        let action = manager.on_tab_navigated(3, "https://shop.test/cart").unwrap();
        assert_eq!(action.action_type, ActionType::Navigation);
        assert_eq!(action.tab_id, 3);
        assert!(manager.on_tab_navigated(9, "https://elsewhere.test").is_none());

        manager.pause().unwrap();
        assert!(manager.on_tab_navigated(3, "https://shop.test/x").is_none());
        assert_eq!(manager.active().unwrap().actions.len(), 1);
    }
}
