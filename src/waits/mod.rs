pub mod analyzers;
pub mod merge;
pub mod types;

use serde::{Deserialize, Serialize};

pub use analyzers::{by_action_type, by_element, by_transition, modal_selector};
pub use merge::{consolidate, merge};
pub use types::{WaitCondition, WaitKind, WaitStrategy};

use crate::models::Action;
use crate::selector::resolve;

/// Waits computed for one step of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepWaits {
    pub action_id: String,
    pub strategies: Vec<WaitStrategy>,
}

/// Ordered, merged wait strategies for `current`, given the step before it
pub fn synthesize(previous: Option<&Action>, current: &Action) -> Vec<WaitStrategy> {
    let selector = current.element.as_ref().map(|e| resolve(e).selector());

    let mut proposals = by_action_type(current, selector.as_deref());
    if let (Some(element), Some(selector)) = (current.element.as_ref(), selector.as_deref()) {
        proposals.extend(by_element(element, selector));
    }
    proposals.extend(by_transition(previous, current));

    consolidate(proposals)
}

pub fn analyze(actions: &[Action]) -> Vec<StepWaits> {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| StepWaits {
            action_id: action.id.clone(),
            strategies: synthesize(i.checked_sub(1).map(|p| &actions[p]), action),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, ElementDescriptor};

    #[test]
    fn test_click_on_form_control_merges_element_waits() {
        let action = Action::click(ElementDescriptor::new("button").with_id("submit"), 0);
        let strategies = synthesize(None, &action);
        let kinds: Vec<WaitKind> = strategies.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WaitKind::ElementClickable,
                WaitKind::ElementEnabled,
                WaitKind::ElementStable
            ]
        );
        assert!(strategies
            .iter()
            .all(|s| s.selectors == vec!["#submit".to_string()]));
    }

    #[test]
    fn test_submit_after_navigation() {
        let actions = vec![
            Action::navigation("https://app.test/login", 0),
            Action::new(ActionType::Submit, 100)
                .with_element(ElementDescriptor::new("form").with_id("login"))
                .with_url("https://app.test/home"),
        ];
        let steps = analyze(&actions);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].action_id, actions[0].id);

        let kinds: Vec<WaitKind> = steps[1].strategies.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![WaitKind::NetworkIdle, WaitKind::UrlChange, WaitKind::Custom]
        );
        assert!(steps[1].strategies.iter().all(|s| s.timeout_ms.is_some()));
    }

    #[test]
    fn test_action_without_element_degrades() {
        let action = Action::new(ActionType::Scroll, 0);
        assert!(synthesize(None, &action).is_empty());
    }
}
