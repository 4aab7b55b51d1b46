//! The step vocabulary scenarios are written in.
//!
//! Every action settles the driver before returning, so tracked work (route
//! transitions, dialogs) is done by the time the next step runs. Untracked
//! work needs an explicit wait. Each operation is recorded as a [`Step`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::NodeId;
use crate::driver::Driver;
use crate::error::{HarnessError, HarnessResult};
use crate::form;
use crate::page::Page;
use crate::selector::{IntoLocator, Locator};
use crate::wait::{self, WaitPolicy};

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    /// Driver clock when the step finished.
    pub elapsed_ms: u64,
}

pub struct Harness<'d> {
    driver: &'d mut dyn Driver,
    policy: WaitPolicy,
    steps: Vec<Step>,
}

impl<'d> Harness<'d> {
    pub fn new(driver: &'d mut dyn Driver, policy: WaitPolicy) -> Self {
        Self {
            driver,
            policy,
            steps: Vec::new(),
        }
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Direct access for operations the vocabulary does not cover.
    pub fn driver(&mut self) -> &mut dyn Driver {
        &mut *self.driver
    }

    fn record(&mut self, description: String) {
        let elapsed_ms = self.driver.elapsed().as_millis() as u64;
        debug!(step = %description, elapsed_ms, "step");
        self.steps.push(Step {
            description,
            elapsed_ms,
        });
    }

    fn locate<L: IntoLocator>(target: L) -> HarnessResult<Locator> {
        target.into_locator()
    }

    // --- actions ---------------------------------------------------------

    pub fn authenticate(&mut self, username: &str) -> HarnessResult<()> {
        self.driver.authenticate(username)?;
        self.driver.settle()?;
        self.record(format!("authenticate as {}", username));
        Ok(())
    }

    pub fn visit(&mut self, route: &str) -> HarnessResult<()> {
        self.driver.visit(route)?;
        self.driver.settle()?;
        self.record(format!("visit {}", route));
        Ok(())
    }

    /// Click exactly one element.
    pub fn click<L: IntoLocator>(&mut self, target: L) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        let page = self.driver.page()?;
        let id = page.find_one(&locator)?;
        self.driver.click(&page.handle(id))?;
        self.driver.settle()?;
        self.record(format!("click {}", locator));
        Ok(())
    }

    pub fn fill_in<L: IntoLocator>(&mut self, target: L, text: &str) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        form::fill_in(&mut *self.driver, &locator, text)?;
        self.record(format!("fill {} with {:?}", locator, text));
        Ok(())
    }

    /// Fill the type-ahead inside `container` and pick the suggestion.
    pub fn type_ahead<L: IntoLocator>(&mut self, container: L, text: &str) -> HarnessResult<()> {
        let locator = Self::locate(container)?;
        form::type_ahead_fill_in(&mut *self.driver, &locator, text, &self.policy)?;
        self.record(format!("type ahead {:?} in {}", text, locator));
        Ok(())
    }

    pub fn select<L: IntoLocator>(&mut self, target: L, option: &str) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        form::select(&mut *self.driver, &locator, option)?;
        self.record(format!("select {:?} in {}", option, locator));
        Ok(())
    }

    pub fn toggle<L: IntoLocator>(&mut self, target: L) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        form::toggle(&mut *self.driver, &locator)?;
        self.record(format!("toggle {}", locator));
        Ok(())
    }

    // --- waits -----------------------------------------------------------

    pub fn wait_to_appear<L: IntoLocator>(&mut self, target: L) -> HarnessResult<Page> {
        let locator = Self::locate(target)?;
        let page = wait::wait_to_appear(&mut *self.driver, &locator, &self.policy)?;
        self.record(format!("wait for {} to appear", locator));
        Ok(page)
    }

    pub fn wait_to_disappear<L: IntoLocator>(&mut self, target: L) -> HarnessResult<Page> {
        let locator = Self::locate(target)?;
        let page = wait::wait_to_disappear(&mut *self.driver, &locator, &self.policy)?;
        self.record(format!("wait for {} to disappear", locator));
        Ok(page)
    }

    pub fn wait_for_url(&mut self, url: &str) -> HarnessResult<Page> {
        let page = wait::wait_for_url(&mut *self.driver, url, &self.policy)?;
        self.record(format!("wait for URL {}", url));
        Ok(page)
    }

    pub fn wait_for_url_containing(&mut self, fragment: &str) -> HarnessResult<Page> {
        let page = wait::wait_for_url_containing(&mut *self.driver, fragment, &self.policy)?;
        self.record(format!("wait for URL containing {}", fragment));
        Ok(page)
    }

    /// Wait on an arbitrary condition over the page.
    pub fn wait_until<F>(&mut self, description: &str, check: F) -> HarnessResult<Page>
    where
        F: FnMut(&Page) -> bool,
    {
        let page = wait::wait_until(&mut *self.driver, description, &self.policy, check)?;
        self.record(format!("wait until {}", description));
        Ok(page)
    }

    /// Settle, then let one poll interval pass.
    pub fn settled(&mut self) -> HarnessResult<()> {
        self.driver.settle()?;
        self.driver.advance(self.policy.poll_interval)?;
        self.driver.settle()?;
        self.record("settled".to_string());
        Ok(())
    }

    /// Let `by` pass on the application clock.
    pub fn pause(&mut self, by: Duration) -> HarnessResult<()> {
        self.driver.advance(by)?;
        self.driver.settle()?;
        self.record(format!("pause {} ms", by.as_millis()));
        Ok(())
    }

    // --- queries and assertions -------------------------------------------

    pub fn page(&mut self) -> HarnessResult<Page> {
        self.driver.page()
    }

    /// Resolve exactly one element on the current page.
    pub fn find<L: IntoLocator>(&mut self, target: L) -> HarnessResult<(Page, NodeId)> {
        let locator = Self::locate(target)?;
        let page = self.driver.page()?;
        let id = page.find_one(&locator)?;
        Ok((page, id))
    }

    pub fn assert_url(&mut self, expected: &str, message: &str) -> HarnessResult<()> {
        let actual = self.driver.current_url()?;
        if actual != expected {
            return Err(HarnessError::assertion(message, expected, actual));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_url_contains(&mut self, fragment: &str, message: &str) -> HarnessResult<()> {
        let actual = self.driver.current_url()?;
        if !actual.contains(fragment) {
            return Err(HarnessError::assertion(
                message,
                format!("URL containing {}", fragment),
                actual,
            ));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    /// Whitespace-collapsed text of exactly one element equals `expected`.
    pub fn assert_text<L: IntoLocator>(
        &mut self,
        target: L,
        expected: &str,
        message: &str,
    ) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        let actual = page.text(id);
        if actual != expected {
            return Err(HarnessError::assertion(message, expected, actual));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_contains_text<L: IntoLocator>(
        &mut self,
        target: L,
        expected: &str,
        message: &str,
    ) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        let actual = page.text(id);
        if !actual.contains(expected) {
            return Err(HarnessError::assertion(
                message,
                format!("text containing {:?}", expected),
                actual,
            ));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_count<L: IntoLocator>(
        &mut self,
        target: L,
        expected: usize,
        message: &str,
    ) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        let actual = self.driver.page()?.count(&locator);
        if actual != expected {
            return Err(HarnessError::assertion(
                message,
                expected.to_string(),
                actual.to_string(),
            ));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    /// At least one element matches.
    pub fn assert_exists<L: IntoLocator>(&mut self, target: L, message: &str) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        if !self.driver.page()?.exists(&locator) {
            return Err(HarnessError::assertion(
                message,
                format!("{} present", locator),
                "absent",
            ));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_absent<L: IntoLocator>(&mut self, target: L, message: &str) -> HarnessResult<()> {
        let locator = Self::locate(target)?;
        let count = self.driver.page()?.count(&locator);
        if count > 0 {
            return Err(HarnessError::assertion(
                message,
                format!("{} absent", locator),
                format!("{} present", count),
            ));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_visible<L: IntoLocator>(&mut self, target: L, message: &str) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        if !page.is_visible(id) {
            return Err(HarnessError::assertion(message, "visible", "hidden"));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    /// Exactly one element whose text is not empty.
    pub fn assert_not_empty<L: IntoLocator>(
        &mut self,
        target: L,
        message: &str,
    ) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        if page.text(id).is_empty() {
            return Err(HarnessError::assertion(message, "non-empty text", ""));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_value<L: IntoLocator>(
        &mut self,
        target: L,
        expected: &str,
        message: &str,
    ) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        let actual = page.value(id).unwrap_or_default();
        if actual != expected {
            return Err(HarnessError::assertion(message, expected, actual));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }

    pub fn assert_disabled<L: IntoLocator>(
        &mut self,
        target: L,
        message: &str,
    ) -> HarnessResult<()> {
        let (page, id) = self.find(target)?;
        if page.attr(id, "disabled").is_none() {
            return Err(HarnessError::assertion(message, "disabled", "enabled"));
        }
        self.record(format!("assert {}", message));
        Ok(())
    }
}
