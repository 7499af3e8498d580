//! Predicate for attribute values that look machine-generated.
//!
//! Framework-generated ids and class names change between builds or renders, so a
//! locator built from them breaks on the next run. Kept free of selector priority
//! logic so the pattern bank can be tuned and tested on its own.

use regex::Regex;
use std::sync::LazyLock;

/// Shortest run of mixed letters and digits treated as random
const RANDOM_RUN_MIN: usize = 12;

static GENERATED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // timestamp-shaped digit runs
        r"\d{6,}",
        // uuid fragments
        r"(?i)[0-9a-f]{4,}-[0-9a-f]{4,}-[0-9a-f]{4,}",
        // id generator and CSS-in-JS prefixes
        r"^ember\d+$",
        r"^react-select-\d+",
        r"^(mui|radix|headlessui|downshift|aria)-[\w:-]*\d",
        r"^:r[0-9a-z]+:$",
        r"^(css|sc|jsx|emotion|svelte)-[a-zA-Z0-9]+$",
        r"^(uid|id|el|gen|auto)[-_]?\d+",
        r"^ext-(gen|comp)\d+",
        r"^yui_",
        r"^ng-\d+",
        // CSS modules hashed suffixes
        r"__[\w-]*\d[\w-]*$",
        r"_[a-z0-9]{5,}-\d+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid regex"));

static HEX_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[0-9a-f]{8,}").expect("valid regex"));

/// Whether `value` looks auto-generated and should not anchor a locator
pub fn is_generated(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    if GENERATED_PATTERNS.iter().any(|re| re.is_match(value)) {
        return true;
    }

    has_hash_run(value) || has_random_run(value)
}

/// Hex run of 8+ characters where letters and digits interleave, like
/// `5f3a2b1c`. Dictionary words spelled in hex (`deadbeef`) or a word with a
/// numeric suffix (`facade00`) switch between letters and digits at most once.
fn has_hash_run(value: &str) -> bool {
    HEX_RUN.find_iter(value).any(|m| {
        let classes: Vec<bool> = m.as_str().chars().map(|c| c.is_ascii_digit()).collect();
        let switches = classes.windows(2).filter(|w| w[0] != w[1]).count();
        classes.contains(&true) && switches >= 2
    })
}

/// Long alphanumeric run mixing letters and digits, like `a1b2c3d4e5f6g7h8`
fn has_random_run(value: &str) -> bool {
    ALNUM_RUN.find_iter(value).any(|m| {
        let run = m.as_str();
        run.len() >= RANDOM_RUN_MIN
            && run.chars().any(|c| c.is_ascii_digit())
            && run.chars().any(|c| c.is_ascii_alphabetic())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_values_pass() {
        for value in [
            "login-btn",
            "email",
            "Submit order",
            "main-navigation",
            "user_profile",
            "checkout-step-2",
            "search",
            "card__title",
            "deadbeef",
            "facade00",
            "acceptance",
        ] {
            assert!(!is_generated(value), "{} flagged as generated", value);
        }
    }

    #[test]
    fn test_generated_values_rejected() {
        for value in [
            "a1b2c3d4e5f6g7h8",
            "9f86d081884c",
            "item-5f3a2b1c",
            "input-1697040123456",
            "ember1234",
            "react-select-3-input",
            "mui-42",
            ":r1f:",
            "css-1x2y3z",
            "sc-bdVaJa",
            "Button_primary__3xYz1",
            "uid-17",
            "550e8400-e29b-41d4",
        ] {
            assert!(is_generated(value), "{} not flagged", value);
        }
    }

    #[test]
    fn test_empty_is_not_generated() {
        assert!(!is_generated(""));
        assert!(!is_generated("   "));
    }
}
