//! Target-independent step list shared by every emitter.
//!
//! Planning decides *what* a script does (which navigations, which element,
//! which waits); the per-target modules only decide how to spell it.

use serde::{Deserialize, Serialize};

use crate::models::{Action, ActionType, NetworkRequest, RequestStatus, TestContext};
use crate::network::classify;
use crate::selector::{resolve_optional, to_strategy, Locator, ResolvedSelector, StrategyLocator};
use crate::waits::{synthesize, WaitKind, WaitStrategy};

use super::GenerateOptions;

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Navigate { url: String },
    Click,
    /// Clear then type `value`; `verify` adds a value assertion
    Fill { value: String, verify: bool },
    SelectOption { value: String },
    PressEnter,
    Submit { is_form: bool },
    Hover,
    Upload { path: String },
    ScrollIntoView,
    ScrollTo { x: i64, y: i64 },
    Drag,
}

/// Element a step acts on
#[derive(Debug, Clone)]
pub struct StepTarget {
    pub resolved: ResolvedSelector,
    pub strategy: StrategyLocator,
    /// Selector of the enclosing iframe, when the action came from one
    pub frame: Option<String>,
}

impl StepTarget {
    fn for_action(action: &Action) -> Self {
        let resolved = resolve_optional(action.element.as_ref());
        let strategy = to_strategy(&resolved, action.element.as_ref());
        Self {
            resolved,
            strategy,
            frame: action.iframe.as_ref().map(|f| f.frame_selector()),
        }
    }

    pub fn selector(&self) -> String {
        self.resolved.selector()
    }

    pub fn locator(&self) -> &Locator {
        &self.resolved.locator
    }

    /// Locator for a wait selector: the step's own locator when it names this
    /// element, plain CSS otherwise
    pub fn locator_for(&self, selector: &str) -> Locator {
        if selector == self.selector() {
            self.resolved.locator.clone()
        } else {
            Locator::css(selector)
        }
    }

    pub fn is_own(&self, selector: &str) -> bool {
        selector == self.selector()
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    pub label: String,
    pub target: Option<StepTarget>,
    pub waits: Vec<WaitStrategy>,
}

/// Response expected from the application while the test runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiExpectation {
    pub method: String,
    pub url: String,
    pub status: u16,
}

impl ApiExpectation {
    /// Path component of the URL, without origin, query or fragment
    pub fn path(&self) -> String {
        let rest = match self.url.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
            None => self.url.as_str(),
        };
        let path = rest.split(['?', '#']).next().unwrap_or("");
        if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        }
    }

    /// One expectation per distinct method and path among completed API calls
    pub fn from_requests(requests: &[NetworkRequest]) -> Vec<Self> {
        let mut expectations: Vec<Self> = Vec::new();
        for request in requests {
            if request.status != RequestStatus::Completed {
                continue;
            }
            let Some(status) = request.status_code else {
                continue;
            };
            let is_api = request
                .classification
                .as_ref()
                .map(|c| c.is_api)
                .unwrap_or_else(|| classify(request).is_api);
            if !is_api {
                continue;
            }
            let candidate = Self {
                method: request.method.clone(),
                url: request.url.clone(),
                status,
            };
            let duplicate = expectations
                .iter()
                .any(|e| e.method == candidate.method && e.path() == candidate.path());
            if !duplicate {
                expectations.push(candidate);
            }
        }
        expectations
    }
}

#[derive(Debug, Clone)]
pub struct ScriptPlan {
    pub test_name: String,
    pub start_url: Option<String>,
    pub steps: Vec<Step>,
    /// Set when the last known URL differs from the start URL
    pub final_url: Option<String>,
    pub api_calls: Vec<ApiExpectation>,
}

impl ScriptPlan {
    pub fn uses_xpath(&self) -> bool {
        self.steps.iter().any(|s| {
            s.target
                .as_ref()
                .map(|t| matches!(t.locator(), Locator::XPath { .. }))
                .unwrap_or(false)
        })
    }

    pub fn has_kind(&self, predicate: impl Fn(&StepKind) -> bool) -> bool {
        self.steps.iter().any(|s| predicate(&s.kind))
    }
}

/// Element waits the per-step pre-check already covers
const PRECHECK_KINDS: &[WaitKind] = &[
    WaitKind::ElementPresent,
    WaitKind::ElementVisible,
    WaitKind::ElementClickable,
    WaitKind::ElementEnabled,
];

pub fn build(actions: &[Action], context: &TestContext, options: &GenerateOptions) -> ScriptPlan {
    let mut steps = Vec::new();
    let mut current_url: Option<String> = None;
    let mut start_url = context.start_url.clone().filter(|u| !u.is_empty());

    // open the start page before actions that carry no URL of their own
    if let Some(url) = &start_url {
        steps.push(navigate_step(url));
        current_url = Some(url.clone());
    }

    for (i, action) in actions.iter().enumerate() {
        if let Some(url) = action.url.as_deref().filter(|u| !u.is_empty()) {
            if current_url.as_deref() != Some(url) {
                steps.push(navigate_step(url));
                current_url = Some(url.to_string());
                start_url.get_or_insert_with(|| url.to_string());
            }
        }

        let Some(kind) = step_kind(action) else {
            continue;
        };
        let target = match kind {
            StepKind::Navigate { .. } | StepKind::ScrollTo { .. } => None,
            _ => Some(StepTarget::for_action(action)),
        };

        let waits = if options.smart_waits {
            let previous = i.checked_sub(1).map(|p| &actions[p]);
            synthesize(previous, action)
                .into_iter()
                .filter(|w| !covered_by_precheck(w, target.as_ref()))
                .collect()
        } else {
            Vec::new()
        };

        steps.push(Step {
            kind,
            label: action.describe(),
            target,
            waits,
        });
    }

    let final_url = match (&current_url, &start_url) {
        (Some(last), Some(start)) if last != start => Some(last.clone()),
        _ => None,
    };

    let test_name = options
        .test_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            if context.test_name.trim().is_empty() {
                "Recorded test".to_string()
            } else {
                context.test_name.clone()
            }
        });

    ScriptPlan {
        test_name,
        start_url,
        steps,
        final_url,
        api_calls: if options.network_assertions {
            options.api_calls.clone()
        } else {
            Vec::new()
        },
    }
}

fn navigate_step(url: &str) -> Step {
    Step {
        kind: StepKind::Navigate {
            url: url.to_string(),
        },
        label: format!("Navigate to {}", url),
        target: None,
        waits: Vec::new(),
    }
}

/// Statement kind for an action, or `None` when it emits nothing beyond navigation
fn step_kind(action: &Action) -> Option<StepKind> {
    let value = action.value.clone().unwrap_or_default();
    let element = action.element.as_ref();
    match action.action_type {
        // the URL check above already emitted the navigation
        ActionType::Navigation => None,
        ActionType::Click => Some(StepKind::Click),
        ActionType::Input | ActionType::Change => {
            if element.map(|e| e.is_select()).unwrap_or(false) {
                Some(StepKind::SelectOption { value })
            } else {
                let verify = !element.map(|e| e.is_password()).unwrap_or(false);
                Some(StepKind::Fill { value, verify })
            }
        }
        ActionType::Select => Some(StepKind::SelectOption { value }),
        ActionType::Keydown if action.is_enter_key() => Some(StepKind::PressEnter),
        ActionType::Keydown => None,
        ActionType::Submit => Some(StepKind::Submit {
            is_form: element.map(|e| e.tag() == "form").unwrap_or(false),
        }),
        ActionType::Hover => Some(StepKind::Hover),
        ActionType::Upload => Some(StepKind::Upload { path: value }),
        ActionType::Scroll if element.is_some() => Some(StepKind::ScrollIntoView),
        ActionType::Scroll => {
            let (x, y) = parse_scroll(&value);
            Some(StepKind::ScrollTo { x, y })
        }
        ActionType::Drag => Some(StepKind::Drag),
    }
}

/// Scroll offsets recorded as `"x,y"` or a bare vertical offset
fn parse_scroll(value: &str) -> (i64, i64) {
    let parse = |s: &str| s.trim().parse::<f64>().map(|v| v.round() as i64).unwrap_or(0);
    match value.split_once(',') {
        Some((x, y)) => (parse(x), parse(y)),
        None => (0, parse(value)),
    }
}

fn covered_by_precheck(wait: &WaitStrategy, target: Option<&StepTarget>) -> bool {
    let Some(target) = target else {
        return false;
    };
    PRECHECK_KINDS.contains(&wait.kind)
        && wait.selectors.len() == 1
        && target.is_own(&wait.selectors[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementDescriptor;

    fn options() -> GenerateOptions {
        GenerateOptions::default()
    }

    #[test]
    fn test_navigation_emitted_only_on_url_change() {
        let actions = vec![
            Action::navigation("https://app.test/", 0),
            Action::navigation("https://app.test/", 10),
            Action::click(ElementDescriptor::new("a").with_id("docs"), 20).with_url("https://app.test/"),
            Action::navigation("https://app.test/docs", 30),
        ];
        let plan = build(&actions, &TestContext::default(), &options());
        let kinds: Vec<&StepKind> = plan.steps.iter().map(|s| &s.kind).collect();
        assert!(matches!(kinds[0], StepKind::Navigate { url } if url == "https://app.test/"));
        assert_eq!(kinds[1], &StepKind::Click);
        assert!(matches!(kinds[2], StepKind::Navigate { url } if url == "https://app.test/docs"));
        assert_eq!(kinds.len(), 3);
        assert_eq!(plan.final_url.as_deref(), Some("https://app.test/docs"));
    }

    #[test]
    fn test_start_url_opened_before_actions_without_url() {
        let context = TestContext {
            start_url: Some("https://app.test/home".to_string()),
            ..Default::default()
        };
        let actions = vec![
            Action::click(ElementDescriptor::new("a").with_id("settings"), 0),
            Action::click(ElementDescriptor::new("button").with_id("save"), 50)
                .with_url("https://app.test/settings"),
        ];
        let plan = build(&actions, &context, &options());

        assert!(matches!(&plan.steps[0].kind, StepKind::Navigate { url } if url == "https://app.test/home"));
        assert_eq!(plan.steps[1].kind, StepKind::Click);
        assert!(matches!(&plan.steps[2].kind, StepKind::Navigate { url } if url == "https://app.test/settings"));
        assert_eq!(plan.start_url.as_deref(), Some("https://app.test/home"));
        assert_eq!(plan.final_url.as_deref(), Some("https://app.test/settings"));
    }

    #[test]
    fn test_start_url_not_repeated_by_first_navigation() {
        let context = TestContext {
            start_url: Some("https://app.test/".to_string()),
            ..Default::default()
        };
        let plan = build(&[Action::navigation("https://app.test/", 0)], &context, &options());
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.final_url, None);
    }

    #[test]
    fn test_password_fill_is_not_verified() {
        let password = ElementDescriptor::new("input").with_id("password").with_type("password");
        let plan = build(&[Action::input(password, "secret", 0)], &TestContext::default(), &options());
        assert_eq!(
            plan.steps[0].kind,
            StepKind::Fill {
                value: "secret".to_string(),
                verify: false
            }
        );
    }

    #[test]
    fn test_missing_element_falls_back_to_unknown() {
        let plan = build(&[Action::new(ActionType::Click, 0)], &TestContext::default(), &options());
        assert_eq!(plan.steps[0].target.as_ref().unwrap().selector(), "unknown");
    }

    #[test]
    fn test_smart_waits_skip_precheck_kinds() {
        let button = ElementDescriptor::new("button").with_id("go");
        let smart = GenerateOptions {
            smart_waits: true,
            ..Default::default()
        };
        let plan = build(&[Action::click(button, 0)], &TestContext::default(), &smart);
        let kinds: Vec<WaitKind> = plan.steps[0].waits.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WaitKind::ElementStable]);
    }

    #[test]
    fn test_api_expectations_deduplicated_by_path() {
        let mut first = NetworkRequest::new("1", "https://app.test/api/items?page=1", "GET", "fetch", 0.0);
        first.status = RequestStatus::Completed;
        first.status_code = Some(200);
        let mut second = first.clone();
        second.id = "2".to_string();
        second.url = "https://app.test/api/items?page=2".to_string();
        let mut page = first.clone();
        page.url = "https://app.test/about".to_string();
        page.resource_type = "document".to_string();

        let expectations = ApiExpectation::from_requests(&[first, second, page]);
        assert_eq!(expectations.len(), 1);
        assert_eq!(expectations[0].path(), "/api/items");
    }

    #[test]
    fn test_scroll_offsets() {
        assert_eq!(parse_scroll("10, 250.4"), (10, 250));
        assert_eq!(parse_scroll("600"), (0, 600));
        assert_eq!(parse_scroll(""), (0, 0));
    }
}
