use std::fmt;

use super::escape::{comment_text, js_str};
use super::plan::{ScriptPlan, Step, StepKind, StepTarget};
use super::script::{
    ScriptWriter, ANIMATION_PREDICATE, FORM_VALID_PREDICATE, NETWORK_IDLE_CHECK, STABLE_PREDICATE,
};
use crate::selector::Locator;
use crate::waits::{WaitCondition, WaitKind, WaitStrategy};

/// Cypress spec in JavaScript
pub fn emit(plan: &ScriptPlan) -> Result<String, fmt::Error> {
    let mut out = ScriptWriter::new("  ");
    if plan.uses_xpath() {
        out.line("// XPath locators need the cypress-xpath plugin")?;
        out.blank()?;
    }
    out.open(format!("describe({}, () => {{", js_str(&plan.test_name)))?;
    out.open(format!("it({}, () => {{", js_str(&plan.test_name)))?;

    for (i, call) in plan.api_calls.iter().enumerate() {
        out.line(format!(
            "cy.intercept({}, {}).as('api{}');",
            js_str(&call.method),
            js_str(&format!("**{}*", call.path())),
            i
        ))?;
    }
    if !plan.api_calls.is_empty() {
        out.blank()?;
    }

    for (i, step) in plan.steps.iter().enumerate() {
        if i > 0 {
            out.blank()?;
        }
        write_step(&mut out, step)?;
    }

    if let Some(url) = &plan.final_url {
        out.blank()?;
        out.line(format!("cy.url().should('eq', {});", js_str(url)))?;
    }
    if !plan.api_calls.is_empty() {
        out.blank()?;
        for (i, call) in plan.api_calls.iter().enumerate() {
            out.line(format!(
                "cy.wait('@api{}').its('response.statusCode').should('eq', {});",
                i, call.status
            ))?;
        }
    }

    out.close("});")?;
    out.close("});")?;
    Ok(out.finish())
}

/// Query command for a locator; `options` is an extra argument such as `{ timeout: 5000 }`
fn query(target: Option<&StepTarget>, locator: &Locator, options: Option<&str>) -> String {
    let extra = options.map(|o| format!(", {}", o)).unwrap_or_default();
    let (root, get) = match target.and_then(|t| t.frame.as_deref()) {
        Some(frame) => (
            format!(
                "cy.get({}).its('0.contentDocument.body').should('not.be.empty').then(cy.wrap).",
                js_str(frame)
            ),
            "find",
        ),
        None => ("cy.".to_string(), "get"),
    };
    match locator {
        Locator::Css { value } => format!("{}{}({}{})", root, get, js_str(value), extra),
        Locator::XPath { value } => format!("{}xpath({}{})", root, js_str(value), extra),
        Locator::Text { tag, text } => {
            format!("{}contains({}, {}{})", root, js_str(tag), js_str(text), extra)
        }
    }
}

fn write_step(out: &mut ScriptWriter, step: &Step) -> fmt::Result {
    out.line(format!("// {}", comment_text(&step.label)))?;
    for wait in &step.waits {
        write_wait(out, step.target.as_ref(), wait)?;
    }

    if let StepKind::Navigate { url } = &step.kind {
        return out.line(format!("cy.visit({});", js_str(url)));
    }
    if let StepKind::ScrollTo { x, y } = &step.kind {
        return out.line(format!("cy.scrollTo({}, {});", x, y));
    }

    let Some(target) = &step.target else {
        return Ok(());
    };
    let get = query(Some(target), target.locator(), None);

    match &step.kind {
        StepKind::Click => out.line(format!("{}.should('be.visible').click();", get)),
        StepKind::Fill { value, verify } => {
            if value.is_empty() {
                out.line(format!("{}.should('be.enabled').clear();", get))?;
            } else {
                out.line(format!(
                    "{}.should('be.enabled').clear().type({}, {{ parseSpecialCharSequences: false }});",
                    get,
                    js_str(value)
                ))?;
            }
            if *verify {
                out.line(format!("{}.should('have.value', {});", get, js_str(value)))?;
            }
            Ok(())
        }
        StepKind::SelectOption { value } => out.line(format!(
            "{}.should('be.enabled').select({});",
            get,
            js_str(value)
        )),
        StepKind::PressEnter => out.line(format!("{}.should('be.visible').type('{{enter}}');", get)),
        StepKind::Submit { is_form: true } => out.line(format!("{}.submit();", get)),
        StepKind::Submit { is_form: false } => {
            out.line(format!("{}.should('be.enabled').click();", get))
        }
        StepKind::Hover => out.line(format!("{}.should('be.visible').trigger('mouseover');", get)),
        StepKind::Upload { path } => out.line(format!("{}.selectFile({});", get, js_str(path))),
        StepKind::ScrollIntoView => out.line(format!("{}.scrollIntoView();", get)),
        StepKind::Drag => out.line(format!(
            "// drag on {} was recorded but is not replayed",
            comment_text(&target.selector())
        )),
        StepKind::Navigate { .. } | StepKind::ScrollTo { .. } => Ok(()),
    }
}

fn write_wait(out: &mut ScriptWriter, target: Option<&StepTarget>, wait: &WaitStrategy) -> fmt::Result {
    let commands = wait_commands(target, wait);
    match commands.as_slice() {
        [] => Ok(()),
        [single] => out.line(format!("{};", single)),
        many => {
            // commands enqueue in array order
            out.open("[")?;
            for command in many {
                out.line(format!("() => {},", command))?;
            }
            out.close("].forEach((wait) => wait());")
        }
    }
}

fn wait_commands(target: Option<&StepTarget>, wait: &WaitStrategy) -> Vec<String> {
    let options = format!("{{ timeout: {} }}", wait.timeout());
    let get = |selector: &str| -> String {
        let locator = target
            .map(|t| t.locator_for(selector))
            .unwrap_or_else(|| Locator::css(selector));
        query(target, &locator, Some(&options))
    };
    let assert_each = |chain: &str| -> Vec<String> {
        wait.selectors
            .iter()
            .map(|s| format!("{}{}", get(s), chain))
            .collect()
    };
    let predicate = |predicate: &str| format!(".should(($el) => {{ expect(({})($el[0])).to.be.true; }})", predicate);

    match wait.kind {
        WaitKind::ElementPresent => assert_each(".should('exist')"),
        WaitKind::ElementVisible => assert_each(".should('be.visible')"),
        WaitKind::ElementHidden => assert_each(".should('not.be.visible')"),
        WaitKind::ElementClickable => assert_each(".should('be.visible').and('be.enabled')"),
        WaitKind::ElementEnabled => assert_each(".should('be.enabled')"),
        WaitKind::ElementStable => assert_each(&predicate(STABLE_PREDICATE)),
        WaitKind::AnimationComplete => assert_each(&predicate(ANIMATION_PREDICATE)),
        WaitKind::NetworkIdle => vec![format!(
            "cy.window({}).should((win) => {{ expect(win.{}).to.be.true; }})",
            options, NETWORK_IDLE_CHECK
        )],
        WaitKind::PageLoad => vec![format!(
            "cy.document({}).its('readyState').should('eq', 'complete')",
            options
        )],
        WaitKind::UrlChange | WaitKind::Custom => match &wait.condition {
            Some(WaitCondition::UrlMatches { url }) => {
                vec![format!("cy.url({}).should('eq', {})", options, js_str(url))]
            }
            Some(WaitCondition::FormValid) if wait.selectors.is_empty() => {
                vec![format!("{}{}", get("form"), predicate(FORM_VALID_PREDICATE))]
            }
            Some(WaitCondition::FormValid) => assert_each(&predicate(FORM_VALID_PREDICATE)),
            Some(WaitCondition::TabActive { .. }) => vec![format!(
                "cy.document({}).its('visibilityState').should('eq', 'visible')",
                options
            )],
            None => Vec::new(),
        },
    }
}
