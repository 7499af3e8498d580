use serde::{Deserialize, Serialize};
use std::fmt;

/// Synchronization condition a generated test waits on before acting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaitKind {
    ElementPresent,
    ElementVisible,
    ElementHidden,
    ElementClickable,
    ElementEnabled,
    ElementStable,
    AnimationComplete,
    NetworkIdle,
    UrlChange,
    PageLoad,
    Custom,
}

impl WaitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitKind::ElementPresent => "element_present",
            WaitKind::ElementVisible => "element_visible",
            WaitKind::ElementHidden => "element_hidden",
            WaitKind::ElementClickable => "element_clickable",
            WaitKind::ElementEnabled => "element_enabled",
            WaitKind::ElementStable => "element_stable",
            WaitKind::AnimationComplete => "animation_complete",
            WaitKind::NetworkIdle => "network_idle",
            WaitKind::UrlChange => "url_change",
            WaitKind::PageLoad => "page_load",
            WaitKind::Custom => "custom",
        }
    }

    /// Emission order: existence and visibility first, custom conditions last
    pub fn priority(&self) -> u8 {
        match self {
            WaitKind::ElementPresent => 0,
            WaitKind::ElementVisible => 1,
            WaitKind::ElementHidden => 2,
            WaitKind::ElementClickable => 3,
            WaitKind::ElementEnabled => 4,
            WaitKind::ElementStable => 10,
            WaitKind::AnimationComplete => 20,
            WaitKind::NetworkIdle => 30,
            WaitKind::UrlChange => 31,
            WaitKind::PageLoad => 40,
            WaitKind::Custom => 50,
        }
    }

    pub fn default_timeout_ms(&self) -> u64 {
        match self {
            WaitKind::ElementStable => 2000,
            WaitKind::AnimationComplete => 3000,
            WaitKind::NetworkIdle | WaitKind::UrlChange => 10_000,
            WaitKind::PageLoad => 30_000,
            _ => 5000,
        }
    }

    /// Kinds that target elements by selector
    pub fn is_element_wait(&self) -> bool {
        matches!(
            self,
            WaitKind::ElementPresent
                | WaitKind::ElementVisible
                | WaitKind::ElementHidden
                | WaitKind::ElementClickable
                | WaitKind::ElementEnabled
                | WaitKind::ElementStable
                | WaitKind::AnimationComplete
        )
    }
}

impl fmt::Display for WaitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured condition carried by `custom` and `url_change` waits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitCondition {
    /// Every required field in the form passes native validation
    FormValid,
    /// The page for `tab_id` is the one receiving input
    TabActive { tab_id: i64 },
    UrlMatches { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WaitStrategy {
    pub kind: WaitKind,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<WaitCondition>,
}

impl WaitStrategy {
    pub fn new(kind: WaitKind) -> Self {
        Self {
            kind,
            selectors: Vec::new(),
            timeout_ms: None,
            condition: None,
        }
    }

    /// Wait of `kind` on one element; an empty selector yields no target
    pub fn on(kind: WaitKind, selector: &str) -> Self {
        let mut strategy = Self::new(kind);
        if !selector.is_empty() {
            strategy.selectors.push(selector.to_string());
        }
        strategy
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_condition(mut self, condition: WaitCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn timeout(&self) -> u64 {
        self.timeout_ms
            .unwrap_or_else(|| self.kind.default_timeout_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bands() {
        assert!(WaitKind::ElementVisible.priority() < WaitKind::ElementStable.priority());
        assert!(WaitKind::ElementStable.priority() < WaitKind::AnimationComplete.priority());
        assert!(WaitKind::AnimationComplete.priority() < WaitKind::NetworkIdle.priority());
        assert!(WaitKind::NetworkIdle.priority() < WaitKind::PageLoad.priority());
        assert!(WaitKind::PageLoad.priority() < WaitKind::Custom.priority());
    }

    #[test]
    fn test_default_timeouts() {
        assert_eq!(WaitStrategy::new(WaitKind::ElementVisible).timeout(), 5000);
        assert_eq!(WaitStrategy::new(WaitKind::ElementStable).timeout(), 2000);
        assert_eq!(WaitStrategy::new(WaitKind::PageLoad).timeout(), 30_000);
        assert_eq!(
            WaitStrategy::new(WaitKind::PageLoad).with_timeout(45_000).timeout(),
            45_000
        );
    }

    #[test]
    fn test_serialized_shape() {
        let strategy = WaitStrategy::new(WaitKind::Custom)
            .with_condition(WaitCondition::TabActive { tab_id: 7 });
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["kind"], "custom");
        assert_eq!(json["condition"]["type"], "tab_active");
        assert_eq!(json["condition"]["tab_id"], 7);
        assert!(json.get("timeout_ms").is_none());
    }
}
