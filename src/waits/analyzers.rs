//! Independent wait proposals for a single step.
//!
//! Each analysis looks at one facet of the step (its action type, its target
//! element, and the transition from the previous step) and proposes waits
//! without knowing what the others propose. Consolidation happens in `merge`.

use super::types::{WaitCondition, WaitKind, WaitStrategy};
use crate::models::{Action, ActionType, ElementDescriptor};
use crate::selector::{css_string, is_generated};

const DYNAMIC_ATTRIBUTES: &[&str] = &["aria-live", "aria-busy", "data-dynamic", "data-reactid"];
const DYNAMIC_CLASS_FRAGMENTS: &[&str] = &["dynamic", "updating", "realtime", "refresh"];

const LAZY_ATTRIBUTES: &[&str] = &["data-src", "data-lazy", "data-lazy-src", "data-srcset"];
const LAZY_CLASS_FRAGMENTS: &[&str] = &["lazy", "skeleton", "infinite", "loading", "spinner"];

const ANIMATION_CLASS_FRAGMENTS: &[&str] = &[
    "animate", "animated", "transition", "fade", "slide", "collapse", "spin", "bounce",
];

const MODAL_CLASSES: &[&str] = &["modal", "dialog", "popup", "overlay"];

/// Waits implied by the kind of interaction
pub fn by_action_type(action: &Action, selector: Option<&str>) -> Vec<WaitStrategy> {
    let element_waits = |kinds: &[WaitKind]| -> Vec<WaitStrategy> {
        match selector {
            Some(selector) => kinds.iter().map(|k| WaitStrategy::on(*k, selector)).collect(),
            None => Vec::new(),
        }
    };

    match action.action_type {
        ActionType::Click => element_waits(&[WaitKind::ElementClickable, WaitKind::ElementStable]),
        ActionType::Input | ActionType::Change | ActionType::Select => {
            element_waits(&[WaitKind::ElementVisible, WaitKind::ElementEnabled])
        }
        ActionType::Submit => {
            let mut form_valid = WaitStrategy::new(WaitKind::Custom).with_condition(WaitCondition::FormValid);
            if let Some(selector) = selector {
                form_valid.selectors.push(selector.to_string());
            }
            vec![form_valid, WaitStrategy::new(WaitKind::NetworkIdle)]
        }
        ActionType::Navigation => vec![
            WaitStrategy::new(WaitKind::PageLoad),
            WaitStrategy::new(WaitKind::NetworkIdle),
        ],
        ActionType::Hover => element_waits(&[WaitKind::ElementVisible, WaitKind::ElementStable]),
        ActionType::Keydown | ActionType::Upload => element_waits(&[WaitKind::ElementPresent]),
        ActionType::Scroll => element_waits(&[WaitKind::ElementStable]),
        ActionType::Drag => element_waits(&[
            WaitKind::ElementVisible,
            WaitKind::ElementStable,
            WaitKind::AnimationComplete,
        ]),
    }
}

/// Waits implied by markers on the target element
pub fn by_element(element: &ElementDescriptor, selector: &str) -> Vec<WaitStrategy> {
    let mut proposals = Vec::new();

    if is_dynamic(element) {
        proposals.push(WaitStrategy::on(WaitKind::ElementStable, selector));
    }
    if is_lazy(element) {
        proposals.push(WaitStrategy::new(WaitKind::NetworkIdle));
    }
    if is_animated(element) {
        proposals.push(WaitStrategy::on(WaitKind::AnimationComplete, selector));
    }
    if element.is_form_control() {
        proposals.push(WaitStrategy::on(WaitKind::ElementEnabled, selector));
    }
    proposals
}

/// Waits implied by what changed since the previous step
pub fn by_transition(previous: Option<&Action>, current: &Action) -> Vec<WaitStrategy> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    let mut proposals = Vec::new();

    if let (Some(before), Some(after)) = (previous.url.as_deref(), current.url.as_deref()) {
        if before != after {
            proposals.push(
                WaitStrategy::new(WaitKind::UrlChange).with_condition(WaitCondition::UrlMatches {
                    url: after.to_string(),
                }),
            );
        }
    }

    let modal_before = previous.element.as_ref().and_then(modal_selector);
    let modal_after = current.element.as_ref().and_then(modal_selector);
    match (modal_before, modal_after) {
        (None, Some(dialog)) => proposals.push(WaitStrategy::on(WaitKind::ElementVisible, &dialog)),
        (Some(dialog), None) => proposals.push(WaitStrategy::on(WaitKind::ElementHidden, &dialog)),
        _ => {}
    }

    if previous.tab_id != current.tab_id {
        proposals.push(
            WaitStrategy::new(WaitKind::Custom).with_condition(WaitCondition::TabActive {
                tab_id: current.tab_id,
            }),
        );
    }
    proposals
}

fn class_matches(element: &ElementDescriptor, fragments: &[&str]) -> bool {
    element.class_list.iter().any(|class| {
        let class = class.to_lowercase();
        fragments.iter().any(|f| class.contains(f))
    })
}

fn has_any_attribute(element: &ElementDescriptor, names: &[&str]) -> bool {
    names.iter().any(|name| element.attribute(name).is_some())
}

pub fn is_dynamic(element: &ElementDescriptor) -> bool {
    has_any_attribute(element, DYNAMIC_ATTRIBUTES)
        || class_matches(element, DYNAMIC_CLASS_FRAGMENTS)
        // framework-assigned ids change between renders
        || element.id.as_deref().map(is_generated).unwrap_or(false)
}

pub fn is_lazy(element: &ElementDescriptor) -> bool {
    element
        .attribute("loading")
        .map(|v| v.eq_ignore_ascii_case("lazy"))
        .unwrap_or(false)
        || has_any_attribute(element, LAZY_ATTRIBUTES)
        || class_matches(element, LAZY_CLASS_FRAGMENTS)
}

pub fn is_animated(element: &ElementDescriptor) -> bool {
    let inline = element
        .attribute("style")
        .map(|s| {
            let s = s.to_lowercase();
            s.contains("transition") || s.contains("animation")
        })
        .unwrap_or(false);
    inline || class_matches(element, ANIMATION_CLASS_FRAGMENTS)
}

/// Selector for the dialog an element belongs to, if it looks like one
pub fn modal_selector(element: &ElementDescriptor) -> Option<String> {
    if element.tag() == "dialog" {
        return Some("dialog".to_string());
    }
    if let Some(role) = element.attribute("role") {
        if role == "dialog" || role == "alertdialog" {
            return Some(format!("[role=\"{}\"]", role));
        }
    }
    if element.attribute("aria-modal") == Some("true") {
        return Some("[aria-modal=\"true\"]".to_string());
    }
    element
        .class_list
        .iter()
        .find(|class| MODAL_CLASSES.contains(&class.to_lowercase().as_str()))
        .map(|class| format!(".{}", css_string(class)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> ElementDescriptor {
        ElementDescriptor::new("button").with_id("save")
    }

    #[test]
    fn test_click_proposes_clickable_then_stable() {
        let action = Action::click(button(), 0);
        let kinds: Vec<WaitKind> = by_action_type(&action, Some("#save"))
            .into_iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(kinds, vec![WaitKind::ElementClickable, WaitKind::ElementStable]);
    }

    #[test]
    fn test_navigation_needs_no_selector() {
        let action = Action::navigation("https://app.test", 0);
        let proposals = by_action_type(&action, None);
        assert_eq!(proposals.len(), 2);
        assert!(proposals.iter().all(|s| s.selectors.is_empty()));
    }

    #[test]
    fn test_element_without_selector_proposes_nothing() {
        let action = Action::new(ActionType::Click, 0);
        assert!(by_action_type(&action, None).is_empty());
    }

    #[test]
    fn test_element_markers() {
        let mut element = ElementDescriptor::new("img").with_attribute("loading", "lazy");
        element.class_list = vec!["fade-in".to_string()];
        let kinds: Vec<WaitKind> = by_element(&element, "img.hero").into_iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![WaitKind::NetworkIdle, WaitKind::AnimationComplete]);

        let live = ElementDescriptor::new("div").with_attribute("aria-live", "polite");
        assert_eq!(by_element(&live, "div")[0].kind, WaitKind::ElementStable);

        let input = ElementDescriptor::new("input").with_name("email");
        assert_eq!(by_element(&input, "input")[0].kind, WaitKind::ElementEnabled);
    }

    #[test]
    fn test_transition_url_and_tab_change() {
        let previous = Action::navigation("https://app.test/a", 0).with_tab(1);
        let current = Action::navigation("https://app.test/b", 10).with_tab(2);
        let proposals = by_transition(Some(&previous), &current);
        assert_eq!(proposals[0].kind, WaitKind::UrlChange);
        assert_eq!(
            proposals[0].condition,
            Some(WaitCondition::UrlMatches {
                url: "https://app.test/b".to_string()
            })
        );
        assert_eq!(
            proposals[1].condition,
            Some(WaitCondition::TabActive { tab_id: 2 })
        );
    }

    #[test]
    fn test_transition_modal_open_and_close() {
        let outside = Action::click(button(), 0);
        let inside = Action::click(
            ElementDescriptor::new("div").with_attribute("role", "dialog"),
            10,
        );

        let opened = by_transition(Some(&outside), &inside);
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].kind, WaitKind::ElementVisible);
        assert_eq!(opened[0].selectors, vec!["[role=\"dialog\"]".to_string()]);

        let closed = by_transition(Some(&inside), &outside);
        assert_eq!(closed[0].kind, WaitKind::ElementHidden);
        assert!(by_transition(None, &inside).is_empty());
    }
}
