use chrono::{NaiveDate, Utc};

use crate::models::{Action, ActionType, TestContext};

/// Window within which a repeated action on the same element is noise
pub const DEDUP_WINDOW_MS: i64 = 500;

/// Deduplicated actions plus the context derived from them
#[derive(Debug, Clone)]
pub struct OptimizedActions {
    pub actions: Vec<Action>,
    pub context: TestContext,
}

/// Run deduplication and context derivation using today's date for the test name
pub fn optimize(actions: &[Action]) -> OptimizedActions {
    optimize_on(actions, Utc::now().date_naive())
}

pub fn optimize_on(actions: &[Action], today: NaiveDate) -> OptimizedActions {
    let deduped = deduplicate(actions);
    let context = derive_context(&deduped, today);
    OptimizedActions {
        actions: deduped,
        context,
    }
}

/// Drop an action when the last retained action has the same type, targets the
/// same logical element and happened less than `DEDUP_WINDOW_MS` earlier.
///
/// Only the immediately preceding retained action is compared, so in a burst of
/// three or more repeats the later ones can survive once they fall outside the
/// window measured from the first.
pub fn deduplicate(actions: &[Action]) -> Vec<Action> {
    let mut retained: Vec<Action> = Vec::with_capacity(actions.len());

    for action in actions {
        if let Some(last) = retained.last() {
            if is_duplicate(last, action) {
                tracing::debug!(
                    "Dropping duplicate {} action {} ({} ms after {})",
                    action.action_type,
                    action.id,
                    (action.timestamp - last.timestamp).abs(),
                    last.id
                );
                continue;
            }
        }
        retained.push(action.clone());
    }

    retained
}

fn is_duplicate(previous: &Action, current: &Action) -> bool {
    if previous.action_type != current.action_type {
        return false;
    }
    if (current.timestamp - previous.timestamp).abs() >= DEDUP_WINDOW_MS {
        return false;
    }
    match (&previous.element, &current.element) {
        (Some(a), Some(b)) => a.same_element(b),
        _ => false,
    }
}

/// Derive URLs visited, auth and form-submission flags, and a test name
pub fn derive_context(actions: &[Action], today: NaiveDate) -> TestContext {
    let mut urls: Vec<String> = Vec::new();
    for url in actions.iter().filter_map(|a| a.url.as_deref()) {
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }

    let requires_auth = actions
        .iter()
        .filter_map(|a| a.element.as_ref())
        .any(|e| e.is_password());

    let has_form_submission = actions.iter().any(|a| match a.action_type {
        ActionType::Submit => true,
        ActionType::Click => a
            .element
            .as_ref()
            .and_then(|e| e.text.as_deref())
            .map(|t| t.to_lowercase().contains("submit"))
            .unwrap_or(false),
        _ => false,
    });

    TestContext {
        test_name: format!("Recorded test {}", today.format("%Y-%m-%d")),
        start_url: urls.first().cloned(),
        urls,
        requires_auth,
        has_form_submission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementDescriptor;

    fn click(id: &str, timestamp: i64) -> Action {
        Action::click(ElementDescriptor::new("button").with_id(id), timestamp)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_adjacent_duplicate_within_window_dropped() {
        let first = click("save", 1000);
        let second = click("save", 1300);
        let result = deduplicate(&[first.clone(), second]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, first.id);
    }

    #[test]
    fn test_duplicate_outside_window_kept() {
        let result = deduplicate(&[click("save", 1000), click("save", 1500)]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_different_type_or_element_kept() {
        let element = ElementDescriptor::new("input").with_id("q");
        let actions = vec![
            Action::click(element.clone(), 0),
            Action::input(element, "rust", 100),
            click("other", 200),
        ];
        assert_eq!(deduplicate(&actions).len(), 3);
    }

    #[test]
    fn test_burst_compares_against_last_retained() {
        let actions = vec![click("save", 0), click("save", 300), click("save", 600)];
        let result = deduplicate(&actions);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].timestamp, 0);
        assert_eq!(result[1].timestamp, 600);
    }

    #[test]
    fn test_same_name_and_tag_is_same_element() {
        let a = Action::input(ElementDescriptor::new("input").with_name("email"), "a", 0);
        let b = Action::input(ElementDescriptor::new("input").with_name("email"), "ab", 120);
        assert_eq!(deduplicate(&[a, b]).len(), 1);
    }

    #[test]
    fn test_actions_without_elements_are_kept() {
        let a = Action::new(ActionType::Scroll, 0);
        let b = Action::new(ActionType::Scroll, 10);
        assert_eq!(deduplicate(&[a, b]).len(), 2);
    }

    #[test]
    fn test_context_derivation() {
        let password = ElementDescriptor::new("input").with_id("pw").with_type("password");
        let actions = vec![
            Action::navigation("https://app.test/login", 0),
            Action::input(password, "secret", 10).with_url("https://app.test/login"),
            Action::click(ElementDescriptor::new("button").with_text("Submit Form"), 20)
                .with_url("https://app.test/login"),
            Action::navigation("https://app.test/home", 30),
        ];
        let context = derive_context(&actions, today());
        assert_eq!(
            context.urls,
            vec!["https://app.test/login", "https://app.test/home"]
        );
        assert_eq!(context.start_url.as_deref(), Some("https://app.test/login"));
        assert!(context.requires_auth);
        assert!(context.has_form_submission);
        assert_eq!(context.test_name, "Recorded test 2026-10-18");
    }

    #[test]
    fn test_empty_input_is_fine() {
        let optimized = optimize_on(&[], today());
        assert!(optimized.actions.is_empty());
        assert!(!optimized.context.requires_auth);
        assert!(optimized.context.start_url.is_none());
    }
}
