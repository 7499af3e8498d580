use std::fmt;

use super::escape::{comment_text, js_str};
use super::plan::{ScriptPlan, Step, StepKind, StepTarget};
use super::script::{ScriptWriter, ANIMATION_PREDICATE, FORM_VALID_PREDICATE, STABLE_PREDICATE};
use crate::selector::Locator;
use crate::waits::{WaitCondition, WaitKind, WaitStrategy};

/// Playwright Test script in TypeScript
pub fn emit(plan: &ScriptPlan) -> Result<String, fmt::Error> {
    let mut out = ScriptWriter::new("  ");
    out.line("import { test, expect } from '@playwright/test';")?;
    out.blank()?;
    out.open(format!("test({}, async ({{ page }}) => {{", js_str(&plan.test_name)))?;

    if !plan.api_calls.is_empty() {
        out.line("const responses: { url: string; method: string; status: number }[] = [];")?;
        out.open("page.on('response', (response) => {")?;
        out.line("responses.push({ url: response.url(), method: response.request().method(), status: response.status() });")?;
        out.close("});")?;
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
        out.line(format!("await expect(page).toHaveURL({});", js_str(url)))?;
    }

    if !plan.api_calls.is_empty() {
        out.blank()?;
        for call in &plan.api_calls {
            out.line(format!(
                "expect(responses.some((r) => r.method === {} && r.url.includes({}) && r.status === {})).toBeTruthy();",
                js_str(&call.method),
                js_str(&call.path()),
                call.status
            ))?;
        }
    }

    out.close("});")?;
    Ok(out.finish())
}

fn base(target: Option<&StepTarget>) -> String {
    match target.and_then(|t| t.frame.as_deref()) {
        Some(frame) => format!("page.frameLocator({})", js_str(frame)),
        None => "page".to_string(),
    }
}

fn locator_expr(base: &str, locator: &Locator) -> String {
    match locator {
        Locator::Css { value } => format!("{}.locator({})", base, js_str(value)),
        Locator::XPath { value } => {
            format!("{}.locator({})", base, js_str(&format!("xpath={}", value)))
        }
        Locator::Text { tag, text } => format!(
            "{}.locator({}, {{ hasText: {} }})",
            base,
            js_str(tag),
            js_str(text)
        ),
    }
}

fn write_step(out: &mut ScriptWriter, step: &Step) -> fmt::Result {
    out.line(format!("// {}", comment_text(&step.label)))?;
    for wait in &step.waits {
        write_wait(out, step, wait)?;
    }

    if let StepKind::Navigate { url } = &step.kind {
        return out.line(format!("await page.goto({});", js_str(url)));
    }
    if let StepKind::ScrollTo { x, y } = &step.kind {
        return out.line(format!("await page.evaluate(() => window.scrollTo({}, {}));", x, y));
    }

    let Some(target) = &step.target else {
        return Ok(());
    };
    let loc = locator_expr(&base(Some(target)), target.locator());

    match &step.kind {
        StepKind::Click => {
            out.line(format!("await expect({}).toBeVisible();", loc))?;
            out.line(format!("await {}.click();", loc))
        }
        StepKind::Fill { value, verify } => {
            out.line(format!("await expect({}).toBeEnabled();", loc))?;
            out.line(format!("await {}.clear();", loc))?;
            out.line(format!("await {}.fill({});", loc, js_str(value)))?;
            if *verify {
                out.line(format!("await expect({}).toHaveValue({});", loc, js_str(value)))?;
            }
            Ok(())
        }
        StepKind::SelectOption { value } => {
            out.line(format!("await expect({}).toBeEnabled();", loc))?;
            out.line(format!("await {}.selectOption({});", loc, js_str(value)))
        }
        StepKind::PressEnter => {
            out.line(format!("await expect({}).toBeVisible();", loc))?;
            out.line(format!("await {}.press('Enter');", loc))
        }
        StepKind::Submit { is_form: true } => out.line(format!(
            "await {}.evaluate((form) => (form as HTMLFormElement).requestSubmit());",
            loc
        )),
        StepKind::Submit { is_form: false } => {
            out.line(format!("await expect({}).toBeEnabled();", loc))?;
            out.line(format!("await {}.click();", loc))
        }
        StepKind::Hover => {
            out.line(format!("await expect({}).toBeVisible();", loc))?;
            out.line(format!("await {}.hover();", loc))
        }
        StepKind::Upload { path } => {
            out.line(format!("await {}.setInputFiles({});", loc, js_str(path)))
        }
        StepKind::ScrollIntoView => out.line(format!("await {}.scrollIntoViewIfNeeded();", loc)),
        StepKind::Drag => out.line(format!(
            "// drag on {} was recorded but is not replayed",
            comment_text(&target.selector())
        )),
        StepKind::Navigate { .. } | StepKind::ScrollTo { .. } => Ok(()),
    }
}

fn write_wait(out: &mut ScriptWriter, step: &Step, wait: &WaitStrategy) -> fmt::Result {
    let expressions = wait_expressions(step, wait);
    match expressions.as_slice() {
        [] => Ok(()),
        [single] => out.line(format!("await {};", single)),
        many => {
            out.open("await Promise.all([")?;
            for expression in many {
                out.line(format!("{},", expression))?;
            }
            out.close("]);")
        }
    }
}

fn wait_expressions(step: &Step, wait: &WaitStrategy) -> Vec<String> {
    let timeout = wait.timeout();
    let target = step.target.as_ref();
    let element = |selector: &str| -> String {
        let locator = target
            .map(|t| t.locator_for(selector))
            .unwrap_or_else(|| Locator::css(selector));
        locator_expr(&base(target), &locator)
    };
    let per_selector = |render: &dyn Fn(String) -> String| -> Vec<String> {
        wait.selectors.iter().map(|s| render(element(s))).collect()
    };
    let poll = |predicate: &'static str| {
        move |loc: String| {
            format!(
                "expect.poll(() => {}.evaluate({}), {{ timeout: {} }}).toBe(true)",
                loc, predicate, timeout
            )
        }
    };

    match wait.kind {
        WaitKind::ElementPresent => per_selector(&|loc| {
            format!("{}.waitFor({{ state: 'attached', timeout: {} }})", loc, timeout)
        }),
        WaitKind::ElementVisible => per_selector(&|loc| {
            format!("{}.waitFor({{ state: 'visible', timeout: {} }})", loc, timeout)
        }),
        WaitKind::ElementHidden => per_selector(&|loc| {
            format!("{}.waitFor({{ state: 'hidden', timeout: {} }})", loc, timeout)
        }),
        WaitKind::ElementClickable | WaitKind::ElementEnabled => {
            per_selector(&|loc| format!("expect({}).toBeEnabled({{ timeout: {} }})", loc, timeout))
        }
        WaitKind::ElementStable => per_selector(&poll(STABLE_PREDICATE)),
        WaitKind::AnimationComplete => per_selector(&poll(ANIMATION_PREDICATE)),
        WaitKind::NetworkIdle => vec![format!(
            "page.waitForLoadState('networkidle', {{ timeout: {} }})",
            timeout
        )],
        WaitKind::PageLoad => vec![format!(
            "page.waitForLoadState('load', {{ timeout: {} }})",
            timeout
        )],
        WaitKind::UrlChange => match &wait.condition {
            Some(WaitCondition::UrlMatches { url }) => vec![format!(
                "page.waitForURL({}, {{ timeout: {} }})",
                js_str(url),
                timeout
            )],
            _ => Vec::new(),
        },
        WaitKind::Custom => match &wait.condition {
            Some(WaitCondition::FormValid) if wait.selectors.is_empty() => {
                // strict mode rejects a bare `form` locator on pages with several forms
                vec![poll(FORM_VALID_PREDICATE)(format!("{}.first()", element("form")))]
            }
            Some(WaitCondition::FormValid) => per_selector(&poll(FORM_VALID_PREDICATE)),
            Some(WaitCondition::TabActive { .. }) => vec!["page.bringToFront()".to_string()],
            Some(WaitCondition::UrlMatches { url }) => vec![format!(
                "page.waitForURL({}, {{ timeout: {} }})",
                js_str(url),
                timeout
            )],
            None => Vec::new(),
        },
    }
}
