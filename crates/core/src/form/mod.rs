//! Form interaction helpers: plain inputs, type-ahead inputs, selects and
//! checkboxes.

use tracing::debug;

use crate::dom::NodeId;
use crate::driver::Driver;
use crate::error::{HarnessError, HarnessResult};
use crate::page::Page;
use crate::selector::Locator;
use crate::wait::{self, WaitPolicy};

/// Type `text` into exactly one input or textarea.
pub fn fill_in(driver: &mut dyn Driver, locator: &Locator, text: &str) -> HarnessResult<()> {
    let page = driver.page()?;
    let id = page.find_one(locator)?;
    let tag = page.document.node(id).tag.as_str();
    if tag != "input" && tag != "textarea" {
        return Err(HarnessError::Action(format!(
            "{} resolved to <{}>, not a text input",
            locator, tag
        )));
    }
    driver.fill(&page.handle(id), text)?;
    driver.settle()
}

/// Fill a type-ahead widget and pick the suggestion matching `text`.
///
/// The widget is addressed by its container; the input is the container's
/// `.tt-input`. Suggestions render asynchronously after a debounce, so this
/// waits for a `.tt-suggestion` with the right text before clicking it, then
/// waits for the suggestion menu to close.
pub fn type_ahead_fill_in(
    driver: &mut dyn Driver,
    container: &Locator,
    text: &str,
    policy: &WaitPolicy,
) -> HarnessResult<()> {
    let input = Locator::css(".tt-input")?.within(container);
    let page = driver.page()?;
    let handle = page.handle(page.find_one(&input)?);

    driver.focus(&handle)?;
    driver.fill(&handle, text)?;
    driver.settle()?;

    let suggestions = Locator::css(".tt-suggestion")?.within(container);
    let description = format!("suggestion {:?} in {}", text, container);
    let page = wait::wait_until(driver, &description, policy, |page| {
        pick_suggestion(page, &suggestions, text).is_some()
    })?;
    let chosen = pick_suggestion(&page, &suggestions, text).ok_or_else(|| {
        HarnessError::NoMatch {
            locator: description.clone(),
        }
    })?;
    debug!(container = %container, %text, "picking suggestion");
    driver.click(&page.handle(chosen))?;
    driver.settle()?;

    let menu = Locator::css(".tt-menu")?.within(container);
    wait::wait_to_disappear(driver, &menu, policy)?;
    Ok(())
}

/// Exact text wins; otherwise a case-insensitive match.
fn pick_suggestion(page: &Page, suggestions: &Locator, text: &str) -> Option<NodeId> {
    let wanted = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let candidates = page.find_all(suggestions);
    candidates
        .iter()
        .copied()
        .find(|id| page.text(*id) == wanted)
        .or_else(|| {
            let lower = wanted.to_lowercase();
            candidates
                .iter()
                .copied()
                .find(|id| page.text(*id).to_lowercase() == lower)
        })
}

/// Choose an option of a `<select>` by visible text or value. The driver
/// fires the change notification; callers wait on whatever depends on it.
pub fn select(driver: &mut dyn Driver, locator: &Locator, option: &str) -> HarnessResult<()> {
    let page = driver.page()?;
    let id = page.find_one(locator)?;
    if page.document.node(id).tag != "select" {
        return Err(HarnessError::Action(format!("{} is not a select", locator)));
    }

    let known = page.document.descendants(id).any(|o| {
        let node = page.document.node(o);
        node.tag == "option" && (node.get_attr("value") == Some(option) || page.text(o) == option)
    });
    if !known {
        return Err(HarnessError::NoMatch {
            locator: format!("{} option {:?}", locator, option),
        });
    }

    driver.choose(&page.handle(id), option)?;
    driver.settle()
}

/// Click a checkbox or radio input.
pub fn toggle(driver: &mut dyn Driver, locator: &Locator) -> HarnessResult<()> {
    let page = driver.page()?;
    let id = page.find_one(locator)?;
    let node = page.document.node(id);
    let checkable = node.tag == "input"
        && matches!(node.get_attr("type"), Some("checkbox") | Some("radio"));
    if !checkable {
        return Err(HarnessError::Action(format!(
            "{} is not a checkbox or radio",
            locator
        )));
    }
    driver.click(&page.handle(id))?;
    driver.settle()
}
