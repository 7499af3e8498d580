use std::fmt;

use super::escape::{comment_text, js_str};
use super::plan::{ScriptPlan, Step, StepKind, StepTarget};
use super::script::{
    ScriptWriter, ANIMATION_PREDICATE, ENABLED_PREDICATE, FORM_VALID_PREDICATE, STABLE_PREDICATE,
};
use crate::selector::{css_string, Locator};
use crate::waits::{WaitCondition, WaitKind, WaitStrategy};

/// Jest test driving Puppeteer, in JavaScript
pub fn emit(plan: &ScriptPlan) -> Result<String, fmt::Error> {
    let mut out = ScriptWriter::new("  ");
    out.line("const puppeteer = require('puppeteer');")?;
    out.blank()?;
    out.open(format!("describe({}, () => {{", js_str(&plan.test_name)))?;
    out.line("let browser;")?;
    out.line("let page;")?;
    out.blank()?;
    out.open("beforeAll(async () => {")?;
    out.line("browser = await puppeteer.launch();")?;
    out.line("page = await browser.newPage();")?;
    out.close("});")?;
    out.blank()?;
    out.open("afterAll(async () => {")?;
    out.line("await browser.close();")?;
    out.close("});")?;
    out.blank()?;

    out.open(format!("test({}, async () => {{", js_str(&plan.test_name)))?;
    if !plan.api_calls.is_empty() {
        out.line("const responses = [];")?;
        out.open("page.on('response', (response) => {")?;
        out.line("responses.push({ url: response.url(), method: response.request().method(), status: response.status() });")?;
        out.close("});")?;
        out.blank()?;
    }

    for (i, step) in plan.steps.iter().enumerate() {
        if i > 0 {
            out.blank()?;
        }
        write_step(&mut out, step, i)?;
    }

    if let Some(url) = &plan.final_url {
        out.blank()?;
        out.line(format!("expect(page.url()).toBe({});", js_str(url)))?;
    }
    if !plan.api_calls.is_empty() {
        out.blank()?;
        for call in &plan.api_calls {
            out.line(format!(
                "expect(responses.some((r) => r.method === {} && r.url.includes({}) && r.status === {})).toBe(true);",
                js_str(&call.method),
                js_str(&call.path()),
                call.status
            ))?;
        }
    }
    out.close("}, 60000);")?;
    out.close("});")?;
    Ok(out.finish())
}

/// Selector string in Puppeteer's query syntax, including its `-p-` extensions
fn query(locator: &Locator) -> String {
    match locator {
        Locator::Css { value } => value.clone(),
        Locator::XPath { value } => format!("::-p-xpath({})", value),
        Locator::Text { tag, text } => format!("{}::-p-text(\"{}\")", tag, css_string(text)),
    }
}

fn write_step(out: &mut ScriptWriter, step: &Step, index: usize) -> fmt::Result {
    out.line(format!("// {}", comment_text(&step.label)))?;

    let scope = match step.target.as_ref().and_then(|t| t.frame.as_deref()) {
        Some(frame) => {
            let name = format!("frame{}", index);
            out.line(format!(
                "const {} = await (await page.waitForSelector({})).contentFrame();",
                name,
                js_str(frame)
            ))?;
            name
        }
        None => "page".to_string(),
    };

    for wait in &step.waits {
        write_wait(out, &scope, step.target.as_ref(), wait)?;
    }

    if let StepKind::Navigate { url } = &step.kind {
        return out.line(format!(
            "await page.goto({}, {{ waitUntil: 'load' }});",
            js_str(url)
        ));
    }
    if let StepKind::ScrollTo { x, y } = &step.kind {
        return out.line(format!("await page.evaluate(() => window.scrollTo({}, {}));", x, y));
    }

    let Some(target) = &step.target else {
        return Ok(());
    };
    let sel = js_str(&query(target.locator()));
    let visible = format!("await {}.waitForSelector({}, {{ visible: true }});", scope, sel);

    match &step.kind {
        StepKind::Click => {
            out.line(&visible)?;
            out.line(format!("await {}.click({});", scope, sel))
        }
        StepKind::Fill { value, verify } => {
            out.line(&visible)?;
            out.line(format!("await {}.$eval({}, (el) => {{ el.value = ''; }});", scope, sel))?;
            out.line(format!("await {}.type({}, {});", scope, sel, js_str(value)))?;
            if *verify {
                out.line(format!(
                    "expect(await {}.$eval({}, (el) => el.value)).toBe({});",
                    scope,
                    sel,
                    js_str(value)
                ))?;
            }
            Ok(())
        }
        StepKind::SelectOption { value } => {
            out.line(&visible)?;
            out.line(format!("await {}.select({}, {});", scope, sel, js_str(value)))
        }
        StepKind::PressEnter => {
            out.line(&visible)?;
            out.line(format!("await {}.focus({});", scope, sel))?;
            out.line("await page.keyboard.press('Enter');")
        }
        StepKind::Submit { is_form: true } => out.line(format!(
            "await {}.$eval({}, (form) => form.requestSubmit());",
            scope, sel
        )),
        StepKind::Submit { is_form: false } => {
            out.line(&visible)?;
            out.line(format!("await {}.click({});", scope, sel))
        }
        StepKind::Hover => {
            out.line(&visible)?;
            out.line(format!("await {}.hover({});", scope, sel))
        }
        StepKind::Upload { path } => out.line(format!(
            "await (await {}.waitForSelector({})).uploadFile({});",
            scope,
            sel,
            js_str(path)
        )),
        StepKind::ScrollIntoView => out.line(format!(
            "await {}.$eval({}, (el) => el.scrollIntoView());",
            scope, sel
        )),
        StepKind::Drag => out.line(format!(
            "// drag on {} was recorded but is not replayed",
            comment_text(&target.selector())
        )),
        StepKind::Navigate { .. } | StepKind::ScrollTo { .. } => Ok(()),
    }
}

fn write_wait(
    out: &mut ScriptWriter,
    scope: &str,
    target: Option<&StepTarget>,
    wait: &WaitStrategy,
) -> fmt::Result {
    let expressions = wait_expressions(scope, target, wait);
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

fn wait_expressions(scope: &str, target: Option<&StepTarget>, wait: &WaitStrategy) -> Vec<String> {
    let timeout = wait.timeout();
    let sel = |selector: &str| -> String {
        let locator = target
            .map(|t| t.locator_for(selector))
            .unwrap_or_else(|| Locator::css(selector));
        js_str(&query(&locator))
    };
    let predicate = |predicate: &'static str, selector: &str| -> String {
        format!(
            "{scope}.waitForSelector({sel}).then((el) => {scope}.waitForFunction({predicate}, {{ timeout: {timeout} }}, el))",
            scope = scope,
            sel = sel(selector),
            predicate = predicate,
            timeout = timeout
        )
    };
    let selectors = &wait.selectors;

    match wait.kind {
        WaitKind::ElementPresent => selectors
            .iter()
            .map(|s| format!("{}.waitForSelector({}, {{ timeout: {} }})", scope, sel(s), timeout))
            .collect(),
        WaitKind::ElementVisible => selectors
            .iter()
            .map(|s| {
                format!(
                    "{}.waitForSelector({}, {{ visible: true, timeout: {} }})",
                    scope,
                    sel(s),
                    timeout
                )
            })
            .collect(),
        WaitKind::ElementHidden => selectors
            .iter()
            .map(|s| {
                format!(
                    "{}.waitForSelector({}, {{ hidden: true, timeout: {} }})",
                    scope,
                    sel(s),
                    timeout
                )
            })
            .collect(),
        WaitKind::ElementClickable | WaitKind::ElementEnabled => selectors
            .iter()
            .map(|s| predicate(ENABLED_PREDICATE, s))
            .collect(),
        WaitKind::ElementStable => selectors
            .iter()
            .map(|s| predicate(STABLE_PREDICATE, s))
            .collect(),
        WaitKind::AnimationComplete => selectors
            .iter()
            .map(|s| predicate(ANIMATION_PREDICATE, s))
            .collect(),
        WaitKind::NetworkIdle => vec![format!("page.waitForNetworkIdle({{ timeout: {} }})", timeout)],
        WaitKind::PageLoad => vec![format!(
            "page.waitForFunction(() => document.readyState === 'complete', {{ timeout: {} }})",
            timeout
        )],
        WaitKind::UrlChange | WaitKind::Custom => match &wait.condition {
            Some(WaitCondition::UrlMatches { url }) => vec![format!(
                "page.waitForFunction((url) => window.location.href === url, {{ timeout: {} }}, {})",
                timeout,
                js_str(url)
            )],
            Some(WaitCondition::FormValid) if selectors.is_empty() => {
                vec![predicate(FORM_VALID_PREDICATE, "form")]
            }
            Some(WaitCondition::FormValid) => selectors
                .iter()
                .map(|s| predicate(FORM_VALID_PREDICATE, s))
                .collect(),
            Some(WaitCondition::TabActive { .. }) => vec!["page.bringToFront()".to_string()],
            None => Vec::new(),
        },
    }
}
