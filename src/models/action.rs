use serde::{Deserialize, Serialize};
use std::fmt;

use super::element::ElementDescriptor;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    Input,
    Change,
    Keydown,
    Submit,
    #[serde(alias = "navigate")]
    Navigation,
    Hover,
    Scroll,
    Select,
    Upload,
    Drag,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Click => "click",
            ActionType::Input => "input",
            ActionType::Change => "change",
            ActionType::Keydown => "keydown",
            ActionType::Submit => "submit",
            ActionType::Navigation => "navigation",
            ActionType::Hover => "hover",
            ActionType::Scroll => "scroll",
            ActionType::Select => "select",
            ActionType::Upload => "upload",
            ActionType::Drag => "drag",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an action happened when it came from inside an iframe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IframeContext {
    /// Selector for the `<iframe>` element in the parent document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IframeContext {
    /// CSS selector that locates the frame element from the top document
    pub fn frame_selector(&self) -> String {
        if let Some(selector) = self.selector.as_deref().filter(|s| !s.is_empty()) {
            return selector.to_string();
        }
        if let Some(name) = self.name.as_deref().filter(|s| !s.is_empty()) {
            return format!("iframe[name=\"{}\"]", name);
        }
        if let Some(src) = self.src.as_deref().filter(|s| !s.is_empty()) {
            return format!("iframe[src=\"{}\"]", src);
        }
        "iframe".to_string()
    }
}

/// A single captured user interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Capture time in milliseconds
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub tab_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iframe: Option<IframeContext>,
}

impl Action {
    pub fn new(action_type: ActionType, timestamp: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_type,
            timestamp,
            tab_id: 0,
            element: None,
            value: None,
            url: None,
            iframe: None,
        }
    }

    /// Create a navigation action
    pub fn navigation(url: &str, timestamp: i64) -> Self {
        Self::new(ActionType::Navigation, timestamp).with_url(url)
    }

    /// Create a click action
    pub fn click(element: ElementDescriptor, timestamp: i64) -> Self {
        Self::new(ActionType::Click, timestamp).with_element(element)
    }

    /// Create an input action carrying the typed value
    pub fn input(element: ElementDescriptor, value: &str, timestamp: i64) -> Self {
        Self::new(ActionType::Input, timestamp)
            .with_element(element)
            .with_value(value)
    }

    pub fn with_element(mut self, element: ElementDescriptor) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_tab(mut self, tab_id: i64) -> Self {
        self.tab_id = tab_id;
        self
    }

    pub fn with_iframe(mut self, iframe: IframeContext) -> Self {
        self.iframe = Some(iframe);
        self
    }

    /// True for a keydown of the Enter key
    pub fn is_enter_key(&self) -> bool {
        self.action_type == ActionType::Keydown
            && self
                .value
                .as_deref()
                .map(|k| k.eq_ignore_ascii_case("enter"))
                .unwrap_or(false)
    }

    /// Short human-readable label used in logs and generated comments
    pub fn describe(&self) -> String {
        let target = self
            .element
            .as_ref()
            .and_then(|e| e.text.clone().filter(|t| !t.trim().is_empty()))
            .or_else(|| self.element.as_ref().map(|e| e.tag()))
            .unwrap_or_default();

        match self.action_type {
            ActionType::Navigation => {
                format!("Navigate to {}", self.url.as_deref().unwrap_or("page"))
            }
            _ if target.is_empty() => self.action_type.to_string(),
            _ => format!("{} {}", self.action_type, truncate(target.trim(), 30)),
        }
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
