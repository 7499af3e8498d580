use serde::{Deserialize, Serialize};
use std::fmt;

use super::heuristics::is_generated;
use crate::models::ElementDescriptor;

/// Common test-automation attributes, in lookup order
pub const TEST_ATTRIBUTES: &[&str] = &[
    "data-testid",
    "data-test-id",
    "data-test",
    "data-cy",
    "data-qa",
    "data-automation-id",
    "data-e2e",
];

/// Longest visible text used as a locator
const MAX_TEXT_CHARS: usize = 30;

const TEXT_INPUT_TYPES: &[&str] = &["text", "email", "password", "search", "tel", "url", "number"];

/// Which priority rule produced a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorSource {
    Id,
    TestAttribute,
    CommonTestAttribute,
    Name,
    Placeholder,
    AriaLabel,
    StableClass,
    Css,
    Text,
    XPath,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    Css { value: String },
    XPath { value: String },
    /// Element of `tag` whose visible text contains `text`
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css {
            value: value.into(),
        }
    }

    /// XPath form of any locator, for APIs that only take XPath or CSS
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Locator::Css { .. } => None,
            Locator::XPath { value } => Some(value.clone()),
            Locator::Text { tag, text } => Some(format!(
                "//{}[contains(normalize-space(.), {})]",
                tag,
                xpath_literal(text)
            )),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { value } | Locator::XPath { value } => f.write_str(value),
            Locator::Text { tag, text } => write!(f, "{}:has-text(\"{}\")", tag, css_string(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSelector {
    pub source: SelectorSource,
    pub locator: Locator,
}

impl ResolvedSelector {
    fn css(source: SelectorSource, value: String) -> Self {
        Self {
            source,
            locator: Locator::css(value),
        }
    }

    /// Single-string form of the locator
    pub fn selector(&self) -> String {
        self.locator.to_string()
    }
}

/// Locator strategies for strategy-typed APIs such as Selenium's `By`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Id,
    Name,
    Css,
    XPath,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyLocator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

/// Pick the most stable locator for an element, first satisfied rule wins
pub fn resolve(element: &ElementDescriptor) -> ResolvedSelector {
    let tag = element.tag();

    if let Some(id) = non_empty(element.id.as_deref()) {
        if !is_generated(id) {
            return ResolvedSelector::css(SelectorSource::Id, id_selector(id));
        }
    }

    if let Some((name, value)) = element.test_attributes.first() {
        return ResolvedSelector::css(
            SelectorSource::TestAttribute,
            attribute_selector(name, value),
        );
    }

    for name in TEST_ATTRIBUTES {
        if let Some(value) = non_empty(element.attribute(name)) {
            if !is_generated(value) {
                return ResolvedSelector::css(
                    SelectorSource::CommonTestAttribute,
                    attribute_selector(name, value),
                );
            }
        }
    }

    if element.is_form_control() {
        if let Some(name) = non_empty(element.name.as_deref()) {
            return ResolvedSelector::css(
                SelectorSource::Name,
                format!("{}[name=\"{}\"]", tag, css_string(name)),
            );
        }
    }

    if tag == "input" {
        let input_type = element
            .element_type
            .as_deref()
            .unwrap_or("text")
            .to_lowercase();
        if let Some(placeholder) = non_empty(element.placeholder.as_deref()) {
            if TEXT_INPUT_TYPES.contains(&input_type.as_str()) {
                return ResolvedSelector::css(
                    SelectorSource::Placeholder,
                    format!(
                        "input[type=\"{}\"][placeholder=\"{}\"]",
                        input_type,
                        css_string(placeholder)
                    ),
                );
            }
        }
    }

    if let Some(label) = non_empty(element.attribute("aria-label")) {
        if !is_generated(label) {
            return ResolvedSelector::css(
                SelectorSource::AriaLabel,
                attribute_selector("aria-label", label),
            );
        }
    }

    let classes: Vec<&str> = element
        .stable_classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .take(2)
        .collect();
    if !classes.is_empty() {
        let tag_prefix = if tag.is_empty() { String::new() } else { tag.clone() };
        return ResolvedSelector::css(
            SelectorSource::StableClass,
            format!("{}.{}", tag_prefix, classes.join(".")),
        );
    }

    if let Some(css) = non_empty(element.css_selector.as_deref()) {
        if !is_positional(css) {
            return ResolvedSelector::css(SelectorSource::Css, css.to_string());
        }
    }

    if tag == "button" || tag == "a" {
        if let Some(text) = non_empty(element.text.as_deref()) {
            let capped: String = text.chars().take(MAX_TEXT_CHARS).collect();
            let capped = capped.trim().to_string();
            if !is_generated(&capped) {
                return ResolvedSelector {
                    source: SelectorSource::Text,
                    locator: Locator::Text { tag, text: capped },
                };
            }
        }
    }

    if let Some(xpath) = non_empty(element.xpath.as_deref()) {
        return ResolvedSelector {
            source: SelectorSource::XPath,
            locator: Locator::XPath {
                value: xpath.to_string(),
            },
        };
    }

    let fallback = if tag.is_empty() { "unknown".to_string() } else { tag };
    ResolvedSelector::css(SelectorSource::Tag, fallback)
}

/// Resolve an optional element; actions without one fall back to `unknown`
pub fn resolve_optional(element: Option<&ElementDescriptor>) -> ResolvedSelector {
    match element {
        Some(element) => resolve(element),
        None => ResolvedSelector::css(SelectorSource::Tag, "unknown".to_string()),
    }
}

/// Single locator string for an element
pub fn resolve_selector(element: &ElementDescriptor) -> String {
    resolve(element).selector()
}

/// Strategy-typed locator, same relative priority collapsed to five strategies
pub fn resolve_strategy(element: Option<&ElementDescriptor>) -> StrategyLocator {
    let resolved = resolve_optional(element);
    to_strategy(&resolved, element)
}

/// Map an already resolved selector onto the strategy-typed form
pub fn to_strategy(
    resolved: &ResolvedSelector,
    element: Option<&ElementDescriptor>,
) -> StrategyLocator {
    let raw = |value: Option<&String>| value.cloned().unwrap_or_default();
    match resolved.source {
        SelectorSource::Id => StrategyLocator {
            strategy: LocatorStrategy::Id,
            value: raw(element.and_then(|e| e.id.as_ref())),
        },
        SelectorSource::Name => StrategyLocator {
            strategy: LocatorStrategy::Name,
            value: raw(element.and_then(|e| e.name.as_ref())),
        },
        SelectorSource::Text | SelectorSource::XPath => StrategyLocator {
            strategy: LocatorStrategy::XPath,
            value: resolved.locator.to_xpath().unwrap_or_default(),
        },
        SelectorSource::Tag => StrategyLocator {
            strategy: LocatorStrategy::Tag,
            value: resolved.selector(),
        },
        _ => StrategyLocator {
            strategy: LocatorStrategy::Css,
            value: resolved.selector(),
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_positional(css: &str) -> bool {
    css.contains("nth-child") || css.contains("nth-of-type")
}

fn id_selector(id: &str) -> String {
    let simple = id.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false)
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if simple {
        format!("#{}", id)
    } else {
        attribute_selector("id", id)
    }
}

fn attribute_selector(name: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", name, css_string(value))
}

/// Escape a value for use inside a double-quoted CSS string
pub fn css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string as an XPath literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}
