/// Resource types that are always captured
pub const ALLOWED_TYPES: &[&str] = &["fetch", "xhr", "document", "script"];

/// Resource types dropped unless allowed above
pub const DENIED_TYPES: &[&str] = &["stylesheet", "style", "font", "image", "media"];

/// Tracker and analytics endpoints, dropped regardless of type
pub const TRACKER_PATTERNS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "analytics.google.com",
    "doubleclick.net",
    "googlesyndication.com",
    "facebook.com/tr",
    "connect.facebook.net",
    "hotjar.com",
    "segment.io",
    "api.segment.io",
    "mixpanel.com",
    "amplitude.com",
    "fullstory.com",
    "clarity.ms",
    "newrelic.com",
    "nr-data.net",
    "/collect?",
    "/beacon",
];

/// Admission policy applied when a request starts
#[derive(Debug, Clone)]
pub struct NetworkFilter {
    pub allowed_types: Vec<String>,
    pub denied_types: Vec<String>,
    pub tracker_patterns: Vec<String>,
}

impl Default for NetworkFilter {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            allowed_types: owned(ALLOWED_TYPES),
            denied_types: owned(DENIED_TYPES),
            tracker_patterns: owned(TRACKER_PATTERNS),
        }
    }
}

impl NetworkFilter {
    pub fn accepts(&self, url: &str, resource_type: &str) -> bool {
        let resource_type = resource_type.to_lowercase();
        let type_allowed = self.allowed_types.iter().any(|t| *t == resource_type)
            || !self.denied_types.iter().any(|t| *t == resource_type);
        if !type_allowed {
            return false;
        }

        let url = url.to_lowercase();
        !self.tracker_patterns.iter().any(|p| url.contains(p.as_str()))
    }
}
