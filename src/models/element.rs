use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structural snapshot of a DOM node taken when the interaction was captured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Lower-case tag name (button, input, a, etc.)
    #[serde(default)]
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The `type` attribute for inputs and buttons
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Visible text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_list: Vec<String>,
    /// All attributes present on the node
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    /// Test-automation attributes picked out by the page script, in document order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub test_attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    /// Classes the page script considered stable (not hashed or state-driven)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stable_classes: Vec<String>,
}

impl ElementDescriptor {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// Tag name normalized to lower case
    pub fn tag(&self) -> String {
        self.tag_name.to_lowercase()
    }

    pub fn is_form_control(&self) -> bool {
        matches!(
            self.tag().as_str(),
            "input" | "select" | "textarea" | "button"
        )
    }

    pub fn is_password(&self) -> bool {
        self.element_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("password"))
            .unwrap_or(false)
    }

    /// True for `<select>` elements
    pub fn is_select(&self) -> bool {
        self.tag() == "select"
    }

    /// Whether two descriptors point at the same logical element:
    /// same id, or same name on the same tag, or same precomputed CSS selector.
    pub fn same_element(&self, other: &ElementDescriptor) -> bool {
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            if !a.is_empty() && a == b {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (&self.name, &other.name) {
            if !a.is_empty() && a == b && self.tag() == other.tag() {
                return true;
            }
        }
        matches!(
            (&self.css_selector, &other.css_selector),
            (Some(a), Some(b)) if !a.is_empty() && a == b
        )
    }
}
