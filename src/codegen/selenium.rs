use std::fmt;

use super::escape::{comment_text, py_str};
use super::plan::{ScriptPlan, Step, StepKind, StepTarget};
use super::script::{
    seconds, snake_case, ScriptWriter, ANIMATION_PREDICATE, FORM_VALID_PREDICATE,
    NETWORK_IDLE_CHECK, STABLE_PREDICATE,
};
use crate::selector::{Locator, LocatorStrategy, StrategyLocator};
use crate::waits::{WaitCondition, WaitKind, WaitStrategy};

const PRECHECK_TIMEOUT_SECS: u64 = 10;

/// pytest module driving Selenium WebDriver, in Python
pub fn emit(plan: &ScriptPlan) -> Result<String, fmt::Error> {
    let mut out = ScriptWriter::new("    ");
    out.line("import pytest")?;
    out.line("from selenium import webdriver")?;
    if plan.has_kind(|k| matches!(k, StepKind::Hover)) {
        out.line("from selenium.webdriver.common.action_chains import ActionChains")?;
    }
    out.line("from selenium.webdriver.common.by import By")?;
    if plan.has_kind(|k| matches!(k, StepKind::PressEnter)) {
        out.line("from selenium.webdriver.common.keys import Keys")?;
    }
    out.line("from selenium.webdriver.support import expected_conditions as EC")?;
    if plan.has_kind(|k| matches!(k, StepKind::SelectOption { .. })) {
        out.line("from selenium.webdriver.support.ui import Select, WebDriverWait")?;
    } else {
        out.line("from selenium.webdriver.support.ui import WebDriverWait")?;
    }
    out.blank()?;
    out.blank()?;

    out.line("@pytest.fixture")?;
    out.open("def driver():")?;
    out.line("driver = webdriver.Chrome()")?;
    out.line("yield driver")?;
    out.line("driver.quit()")?;
    out.dedent();
    out.blank()?;
    out.blank()?;

    out.open(format!("def test_{}(driver):", snake_case(&plan.test_name)))?;
    out.line(py_str(&comment_text(&plan.test_name)))?;

    for step in &plan.steps {
        out.blank()?;
        write_step(&mut out, step)?;
    }

    if let Some(url) = &plan.final_url {
        out.blank()?;
        out.line(format!(
            "WebDriverWait(driver, {}).until(EC.url_to_be({}))",
            PRECHECK_TIMEOUT_SECS,
            py_str(url)
        ))?;
        out.line(format!("assert driver.current_url == {}", py_str(url)))?;
    }

    if !plan.api_calls.is_empty() {
        out.blank()?;
        out.line("# WebDriver cannot observe network responses; expected API calls:")?;
        for call in &plan.api_calls {
            out.line(format!(
                "#   {} {} -> {}",
                call.method,
                comment_text(&call.path()),
                call.status
            ))?;
        }
    }
    out.dedent();
    Ok(out.finish())
}

fn by(strategy: &StrategyLocator) -> String {
    let by = match strategy.strategy {
        LocatorStrategy::Id => "By.ID",
        LocatorStrategy::Name => "By.NAME",
        LocatorStrategy::Css => "By.CSS_SELECTOR",
        LocatorStrategy::XPath => "By.XPATH",
        LocatorStrategy::Tag => "By.TAG_NAME",
    };
    format!("{}, {}", by, py_str(&strategy.value))
}

/// `By` pair for a wait selector, reusing the step's strategy for its own element
fn by_for(target: Option<&StepTarget>, selector: &str) -> String {
    if let Some(target) = target.filter(|t| t.is_own(selector)) {
        return by(&target.strategy);
    }
    let locator = target
        .map(|t| t.locator_for(selector))
        .unwrap_or_else(|| Locator::css(selector));
    match &locator {
        Locator::Css { value } => format!("By.CSS_SELECTOR, {}", py_str(value)),
        other => format!("By.XPATH, {}", py_str(&other.to_xpath().unwrap_or_default())),
    }
}

fn write_step(out: &mut ScriptWriter, step: &Step) -> fmt::Result {
    out.line(format!("# {}", comment_text(&step.label)))?;

    let frame = step.target.as_ref().and_then(|t| t.frame.as_deref());
    if let Some(frame) = frame {
        out.line(format!(
            "driver.switch_to.frame(driver.find_element(By.CSS_SELECTOR, {}))",
            py_str(frame)
        ))?;
    }
    for wait in &step.waits {
        write_wait(out, step.target.as_ref(), wait)?;
    }
    write_action(out, step)?;
    if frame.is_some() {
        out.line("driver.switch_to.default_content()")?;
    }
    Ok(())
}

fn write_action(out: &mut ScriptWriter, step: &Step) -> fmt::Result {
    if let StepKind::Navigate { url } = &step.kind {
        return out.line(format!("driver.get({})", py_str(url)));
    }
    if let StepKind::ScrollTo { x, y } = &step.kind {
        return out.line(format!("driver.execute_script(\"window.scrollTo({}, {})\")", x, y));
    }
    let Some(target) = &step.target else {
        return Ok(());
    };
    let locator = by(&target.strategy);
    let acquire = |condition: &str| {
        format!(
            "element = WebDriverWait(driver, {}).until(EC.{}(({})))",
            PRECHECK_TIMEOUT_SECS, condition, locator
        )
    };

    match &step.kind {
        StepKind::Click | StepKind::Submit { is_form: false } => {
            out.line(acquire("element_to_be_clickable"))?;
            out.line("element.click()")
        }
        StepKind::Fill { value, verify } => {
            out.line(acquire("visibility_of_element_located"))?;
            out.line("element.clear()")?;
            out.line(format!("element.send_keys({})", py_str(value)))?;
            if *verify {
                out.line(format!(
                    "assert element.get_attribute(\"value\") == {}",
                    py_str(value)
                ))?;
            }
            Ok(())
        }
        StepKind::SelectOption { value } => {
            out.line(acquire("element_to_be_clickable"))?;
            out.line(format!("Select(element).select_by_value({})", py_str(value)))
        }
        StepKind::PressEnter => {
            out.line(acquire("visibility_of_element_located"))?;
            out.line("element.send_keys(Keys.ENTER)")
        }
        StepKind::Submit { is_form: true } => {
            out.line(acquire("presence_of_element_located"))?;
            out.line("element.submit()")
        }
        StepKind::Hover => {
            out.line(acquire("visibility_of_element_located"))?;
            out.line("ActionChains(driver).move_to_element(element).perform()")
        }
        StepKind::Upload { path } => {
            out.line(acquire("presence_of_element_located"))?;
            out.line(format!("element.send_keys({})", py_str(path)))
        }
        StepKind::ScrollIntoView => {
            out.line(acquire("presence_of_element_located"))?;
            out.line("driver.execute_script(\"arguments[0].scrollIntoView()\", element)")
        }
        StepKind::Drag => out.line(format!(
            "# drag on {} was recorded but is not replayed",
            comment_text(&target.selector())
        )),
        StepKind::Navigate { .. } | StepKind::ScrollTo { .. } => Ok(()),
    }
}

fn write_wait(out: &mut ScriptWriter, target: Option<&StepTarget>, wait: &WaitStrategy) -> fmt::Result {
    let conditions = wait_conditions(target, wait);
    let timeout = seconds(wait.timeout());
    match conditions.as_slice() {
        [] => Ok(()),
        [single] => out.line(format!("WebDriverWait(driver, {}).until({})", timeout, single)),
        many => {
            out.open(format!("WebDriverWait(driver, {}).until(EC.all_of(", timeout))?;
            for condition in many {
                out.line(format!("{},", condition))?;
            }
            out.close("))")
        }
    }
}

fn wait_conditions(target: Option<&StepTarget>, wait: &WaitStrategy) -> Vec<String> {
    let located = |condition: &str| -> Vec<String> {
        wait.selectors
            .iter()
            .map(|s| format!("EC.{}(({}))", condition, by_for(target, s)))
            .collect()
    };
    let script = |predicate: &str, selector: &str| -> String {
        format!(
            "lambda d: d.execute_script({}, d.find_element({}))",
            py_str(&format!("return ({})(arguments[0])", predicate)),
            by_for(target, selector)
        )
    };
    let scripted = |predicate: &str| -> Vec<String> {
        wait.selectors.iter().map(|s| script(predicate, s)).collect()
    };

    match wait.kind {
        WaitKind::ElementPresent => located("presence_of_element_located"),
        WaitKind::ElementVisible => located("visibility_of_element_located"),
        WaitKind::ElementHidden => located("invisibility_of_element_located"),
        WaitKind::ElementClickable => located("element_to_be_clickable"),
        WaitKind::ElementEnabled => wait
            .selectors
            .iter()
            .map(|s| format!("lambda d: d.find_element({}).is_enabled()", by_for(target, s)))
            .collect(),
        WaitKind::ElementStable => scripted(STABLE_PREDICATE),
        WaitKind::AnimationComplete => scripted(ANIMATION_PREDICATE),
        WaitKind::NetworkIdle => vec![format!(
            "lambda d: d.execute_script({})",
            py_str(&format!("return {}", NETWORK_IDLE_CHECK))
        )],
        WaitKind::PageLoad => vec![
            "lambda d: d.execute_script(\"return document.readyState\") == \"complete\"".to_string(),
        ],
        WaitKind::UrlChange | WaitKind::Custom => match &wait.condition {
            Some(WaitCondition::UrlMatches { url }) => vec![format!("EC.url_to_be({})", py_str(url))],
            Some(WaitCondition::FormValid) if wait.selectors.is_empty() => {
                vec![script(FORM_VALID_PREDICATE, "form")]
            }
            Some(WaitCondition::FormValid) => scripted(FORM_VALID_PREDICATE),
            Some(WaitCondition::TabActive { .. }) => vec![
                "lambda d: d.execute_script(\"return document.visibilityState\") == \"visible\""
                    .to_string(),
            ],
            None => Vec::new(),
        },
    }
}
