//! Multi-target script generation.
//!
//! Actions are first planned into target-independent steps (`plan`), then
//! handed to exactly one emitter chosen by matching on `Target`.

pub mod cypress;
pub mod escape;
pub mod plan;
pub mod playwright;
pub mod puppeteer;
pub mod script;
pub mod selenium;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Action, TestContext};

pub use plan::{ApiExpectation, ScriptPlan, Step, StepKind, StepTarget};

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Unsupported target framework: {0}")]
    UnsupportedTarget(String),

    #[error("Failed to write script: {0}")]
    Write(#[from] fmt::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Playwright,
    Puppeteer,
    Cypress,
    Selenium,
}

impl Target {
    pub const ALL: [Target; 4] = [
        Target::Playwright,
        Target::Puppeteer,
        Target::Cypress,
        Target::Selenium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Playwright => "playwright",
            Target::Puppeteer => "puppeteer",
            Target::Cypress => "cypress",
            Target::Selenium => "selenium",
        }
    }

    pub fn language(&self) -> &'static str {
        match self {
            Target::Playwright => "typescript",
            Target::Puppeteer | Target::Cypress => "javascript",
            Target::Selenium => "python",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Target::Playwright => "spec.ts",
            Target::Puppeteer => "test.js",
            Target::Cypress => "cy.js",
            Target::Selenium => "py",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "playwright" | "playwright-ts" => Ok(Target::Playwright),
            "puppeteer" => Ok(Target::Puppeteer),
            "cypress" => Ok(Target::Cypress),
            "selenium" | "selenium-python" => Ok(Target::Selenium),
            _ => Err(CodegenError::UnsupportedTarget(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Render synthesized wait strategies before each step
    #[serde(default)]
    pub smart_waits: bool,
    #[serde(default)]
    pub test_name: Option<String>,
    /// Append response assertions for `api_calls`
    #[serde(default)]
    pub network_assertions: bool,
    #[serde(default)]
    pub api_calls: Vec<ApiExpectation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub target: Target,
    pub language: String,
    pub file_name: String,
    pub code: String,
}

pub fn generate(
    target: Target,
    actions: &[Action],
    context: &TestContext,
    options: &GenerateOptions,
) -> Result<GeneratedScript, CodegenError> {
    let plan = plan::build(actions, context, options);
    let code = match target {
        Target::Playwright => playwright::emit(&plan)?,
        Target::Puppeteer => puppeteer::emit(&plan)?,
        Target::Cypress => cypress::emit(&plan)?,
        Target::Selenium => selenium::emit(&plan)?,
    };

    tracing::debug!(
        "Generated {} script with {} steps from {} actions",
        target,
        plan.steps.len(),
        actions.len()
    );

    Ok(GeneratedScript {
        target,
        language: target.language().to_string(),
        file_name: format!(
            "{}.{}",
            script::snake_case(&plan.test_name),
            target.file_extension()
        ),
        code,
    })
}

/// `generate` with the target given by name
pub fn generate_named(
    target: &str,
    actions: &[Action],
    context: &TestContext,
    options: &GenerateOptions,
) -> Result<GeneratedScript, CodegenError> {
    generate(target.parse()?, actions, context, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, ElementDescriptor, IframeContext};
    use crate::waits::WaitKind;

    fn login_actions() -> Vec<Action> {
        vec![
            Action::navigation("https://app.test/", 0),
            Action::click(ElementDescriptor::new("button").with_id("login-btn"), 1000),
            Action::input(
                ElementDescriptor::new("input").with_id("email").with_type("email"),
                "a@b.com",
                2000,
            ),
            Action::input(
                ElementDescriptor::new("input")
                    .with_id("password")
                    .with_type("password"),
                "secret",
                3000,
            ),
            Action::click(ElementDescriptor::new("button").with_id("submit"), 4000),
        ]
    }

    fn context() -> TestContext {
        TestContext {
            test_name: "Login flow".to_string(),
            start_url: Some("https://app.test/".to_string()),
            urls: vec!["https://app.test/".to_string()],
            requires_auth: true,
            has_form_submission: false,
        }
    }

    /// Position of each needle in `haystack`, each searched after the previous one
    fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
        let mut from = 0;
        needles
            .iter()
            .map(|needle| {
                let found = haystack[from..]
                    .find(needle)
                    .unwrap_or_else(|| panic!("missing `{}` after offset {} in:\n{}", needle, from, haystack));
                from += found + needle.len();
                from
            })
            .collect()
    }

    #[test]
    fn test_login_scenario_for_every_target() {
        let expectations: [(Target, [&str; 5], &str, &str); 4] = [
            (
                Target::Playwright,
                [
                    "page.goto('https://app.test/')",
                    "page.locator('#login-btn').click()",
                    ".fill('a@b.com')",
                    ".fill('secret')",
                    "page.locator('#submit').click()",
                ],
                "page.goto(",
                "toHaveValue('secret')",
            ),
            (
                Target::Puppeteer,
                [
                    "page.goto('https://app.test/'",
                    "page.click('#login-btn')",
                    "page.type('#email', 'a@b.com')",
                    "page.type('#password', 'secret')",
                    "page.click('#submit')",
                ],
                "page.goto(",
                "toBe('secret')",
            ),
            (
                Target::Cypress,
                [
                    "cy.visit('https://app.test/')",
                    "cy.get('#login-btn').should('be.visible').click()",
                    ".type('a@b.com'",
                    ".type('secret'",
                    "cy.get('#submit').should('be.visible').click()",
                ],
                "cy.visit(",
                "have.value', 'secret'",
            ),
            (
                Target::Selenium,
                [
                    "driver.get(\"https://app.test/\")",
                    "(By.ID, \"login-btn\")",
                    "send_keys(\"a@b.com\")",
                    "send_keys(\"secret\")",
                    "(By.ID, \"submit\")",
                ],
                "driver.get(",
                "== \"secret\"",
            ),
        ];

        for (target, ordered, navigation, password_assertion) in expectations {
            let script = generate(target, &login_actions(), &context(), &GenerateOptions::default()).unwrap();
            let code = &script.code;

            let found = positions(code, &ordered);
            assert!(found.windows(2).all(|w| w[0] < w[1]), "{} out of order", target);
            assert_eq!(code.matches(navigation).count(), 1, "{} navigations", target);
            assert!(!code.contains(password_assertion), "{} asserted password", target);
            assert_eq!(code.matches("a@b.com").count(), 2, "{} email fill + assertion", target);
        }
    }

    #[test]
    fn test_each_step_emitted_once() {
        let script = generate(
            Target::Playwright,
            &login_actions(),
            &context(),
            &GenerateOptions::default(),
        )
        .unwrap();
        assert_eq!(script.code.matches("page.locator('#login-btn').click()").count(), 1);
        assert_eq!(script.code.matches("page.locator('#submit').click()").count(), 1);
        assert_eq!(script.code.matches(".fill(").count(), 2);
        assert!(!script.code.contains("toHaveURL"));
    }

    #[test]
    fn test_unsupported_target_names_target() {
        let err = generate_named("watir", &login_actions(), &context(), &GenerateOptions::default())
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedTarget(ref t) if t == "watir"));
        assert!(err.to_string().contains("watir"));
    }

    #[test]
    fn test_values_are_escaped() {
        let actions = vec![Action::input(
            ElementDescriptor::new("textarea").with_id("bio"),
            "it's \"quoted\"\nnext",
            0,
        )];
        let script = generate(Target::Playwright, &actions, &context(), &GenerateOptions::default()).unwrap();
        assert!(script.code.contains(r#".fill('it\'s \"quoted\"\nnext')"#));

        let script = generate(Target::Selenium, &actions, &context(), &GenerateOptions::default()).unwrap();
        assert!(script.code.contains(r#"send_keys("it\'s \"quoted\"\nnext")"#));
    }

    #[test]
    fn test_missing_element_does_not_abort() {
        let actions = vec![Action::new(ActionType::Click, 0)];
        for target in Target::ALL {
            let script = generate(target, &actions, &TestContext::default(), &GenerateOptions::default()).unwrap();
            assert!(script.code.contains("unknown"), "{}", target);
        }
    }

    #[test]
    fn test_iframe_scoping() {
        let actions = vec![Action::click(ElementDescriptor::new("button").with_id("pay"), 0)
            .with_iframe(IframeContext {
                name: Some("checkout".to_string()),
                ..Default::default()
            })];
        let options = GenerateOptions::default();

        let playwright = generate(Target::Playwright, &actions, &context(), &options).unwrap();
        assert!(playwright
            .code
            .contains(r#"page.frameLocator('iframe[name=\"checkout\"]').locator('#pay').click()"#));

        let selenium = generate(Target::Selenium, &actions, &context(), &options).unwrap();
        let code = &selenium.code;
        let switch = code.find("driver.switch_to.frame(").unwrap();
        let click = code.find("element.click()").unwrap();
        let back = code.find("driver.switch_to.default_content()").unwrap();
        assert!(switch < click && click < back);
    }

    #[test]
    fn test_final_url_assertion() {
        let mut actions = login_actions();
        actions.push(Action::navigation("https://app.test/dashboard", 5000));
        let script = generate(Target::Cypress, &actions, &context(), &GenerateOptions::default()).unwrap();
        assert!(script
            .code
            .contains("cy.url().should('eq', 'https://app.test/dashboard');"));
    }

    #[test]
    fn test_merged_wait_renders_one_statement() {
        let step = Step {
            kind: StepKind::Click,
            label: "click".to_string(),
            target: None,
            waits: crate::waits::consolidate(vec![
                crate::waits::WaitStrategy::on(WaitKind::ElementVisible, "#a"),
                crate::waits::WaitStrategy::on(WaitKind::ElementVisible, "#b"),
            ]),
        };
        let plan = ScriptPlan {
            test_name: "waits".to_string(),
            start_url: None,
            steps: vec![step],
            final_url: None,
            api_calls: Vec::new(),
        };
        let code = playwright::emit(&plan).unwrap();
        assert_eq!(code.matches("await Promise.all([").count(), 1);
        assert!(code.contains("page.locator('#a').waitFor({ state: 'visible', timeout: 5000 }),"));
        assert!(code.contains("page.locator('#b').waitFor({ state: 'visible', timeout: 5000 }),"));

        let code = selenium::emit(&plan).unwrap();
        assert_eq!(code.matches("EC.all_of(").count(), 1);
    }

    #[test]
    fn test_form_valid_wait_targets_one_form() {
        let form_valid = crate::waits::WaitStrategy::new(WaitKind::Custom)
            .with_condition(crate::waits::WaitCondition::FormValid);
        let plan = ScriptPlan {
            test_name: "submit".to_string(),
            start_url: None,
            steps: vec![Step {
                kind: StepKind::Click,
                label: "submit".to_string(),
                target: None,
                waits: vec![form_valid.clone()],
            }],
            final_url: None,
            api_calls: Vec::new(),
        };
        let code = playwright::emit(&plan).unwrap();
        assert!(code.contains("page.locator('form').first().evaluate("));

        let mut scoped = plan.clone();
        scoped.steps[0].waits = vec![crate::waits::WaitStrategy::on(WaitKind::Custom, "#save")
            .with_condition(crate::waits::WaitCondition::FormValid)];
        let code = playwright::emit(&scoped).unwrap();
        assert!(code.contains("page.locator('#save').evaluate("));
        assert!(code.contains("el.closest('form')"));
    }

    #[test]
    fn test_selenium_docstring_escapes_test_name() {
        let actions = vec![Action::click(ElementDescriptor::new("button").with_id("go"), 0)];
        let options = GenerateOptions {
            test_name: Some("Ends with \"\"\" and \\".to_string()),
            ..Default::default()
        };
        let script = generate(Target::Selenium, &actions, &TestContext::default(), &options).unwrap();
        assert!(script.code.contains(r#"    "Ends with \"\"\" and \\""#));
        assert!(!script.code.contains("\"\"\""));
    }

    #[test]
    fn test_network_assertions() {
        let options = GenerateOptions {
            network_assertions: true,
            api_calls: vec![ApiExpectation {
                method: "POST".to_string(),
                url: "https://app.test/api/session?x=1".to_string(),
                status: 201,
            }],
            ..Default::default()
        };
        let cypress = generate(Target::Cypress, &login_actions(), &context(), &options).unwrap();
        assert!(cypress.code.contains("cy.intercept('POST', '**/api/session*').as('api0');"));
        assert!(cypress
            .code
            .contains("cy.wait('@api0').its('response.statusCode').should('eq', 201);"));

        let playwright = generate(Target::Playwright, &login_actions(), &context(), &options).unwrap();
        assert!(playwright.code.contains("page.on('response'"));
        assert!(playwright.code.contains("r.status === 201"));

        let selenium = generate(Target::Selenium, &login_actions(), &context(), &options).unwrap();
        assert!(selenium.code.contains("#   POST /api/session -> 201"));
    }

    #[test]
    fn test_target_parsing() {
        for target in Target::ALL {
            assert_eq!(target.as_str().parse::<Target>().unwrap(), target);
        }
        assert_eq!(" Selenium-Python ".parse::<Target>().unwrap(), Target::Selenium);
    }
}
