//! Wait predicates.
//!
//! A wait polls the driver's snapshot until a predicate holds, advancing the
//! application's clock by the poll interval between attempts. The page
//! handed back is the snapshot the predicate was evaluated on, so a caller
//! that asserts on it sees exactly the state that satisfied the wait.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use crate::driver::Driver;
use crate::error::{HarnessError, HarnessResult};
use crate::page::Page;
use crate::selector::Locator;

/// Default upper bound for a wait (5 seconds).
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (25 ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 25;

/// A zero interval would never move the driver's clock.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// The conditions scenarios wait on.
#[derive(Debug, Clone)]
pub enum Predicate {
    ElementExists(Locator),
    ElementAbsent(Locator),
    UrlEquals(String),
    UrlContains(String),
}

impl Predicate {
    pub fn holds(&self, page: &Page) -> bool {
        match self {
            Predicate::ElementExists(locator) => page.exists(locator),
            Predicate::ElementAbsent(locator) => !page.exists(locator),
            Predicate::UrlEquals(url) => page.url == *url,
            Predicate::UrlContains(fragment) => page.url.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::ElementExists(l) => write!(f, "{} to appear", l),
            Predicate::ElementAbsent(l) => write!(f, "{} to disappear", l),
            Predicate::UrlEquals(u) => write!(f, "URL to equal {}", u),
            Predicate::UrlContains(u) => write!(f, "URL to contain {}", u),
        }
    }
}

pub fn wait_for(
    driver: &mut dyn Driver,
    predicate: &Predicate,
    policy: &WaitPolicy,
) -> HarnessResult<Page> {
    wait_until(driver, &predicate.to_string(), policy, |page| {
        predicate.holds(page)
    })
}

/// Poll `check` until it returns true or the policy's timeout passes on the
/// driver's clock.
pub fn wait_until<F>(
    driver: &mut dyn Driver,
    description: &str,
    policy: &WaitPolicy,
    mut check: F,
) -> HarnessResult<Page>
where
    F: FnMut(&Page) -> bool,
{
    let start = driver.elapsed();
    let step = policy.poll_interval.max(MIN_POLL_INTERVAL);
    let mut polls = 0u32;

    loop {
        let page = driver.page()?;
        polls += 1;
        if check(&page) {
            debug!(%description, polls, "wait satisfied");
            return Ok(page);
        }

        let waited = driver.elapsed().saturating_sub(start);
        if waited >= policy.timeout {
            return Err(HarnessError::Timeout {
                description: description.to_string(),
                waited_ms: waited.as_millis() as u64,
            });
        }
        trace!(%description, waited_ms = waited.as_millis() as u64, "still waiting");
        driver.advance(step)?;
    }
}

pub fn wait_to_appear(
    driver: &mut dyn Driver,
    locator: &Locator,
    policy: &WaitPolicy,
) -> HarnessResult<Page> {
    wait_for(driver, &Predicate::ElementExists(locator.clone()), policy)
}

pub fn wait_to_disappear(
    driver: &mut dyn Driver,
    locator: &Locator,
    policy: &WaitPolicy,
) -> HarnessResult<Page> {
    wait_for(driver, &Predicate::ElementAbsent(locator.clone()), policy)
}

pub fn wait_for_url(
    driver: &mut dyn Driver,
    url: &str,
    policy: &WaitPolicy,
) -> HarnessResult<Page> {
    wait_for(driver, &Predicate::UrlEquals(url.to_string()), policy)
}

pub fn wait_for_url_containing(
    driver: &mut dyn Driver,
    fragment: &str,
    policy: &WaitPolicy,
) -> HarnessResult<Page> {
    wait_for(driver, &Predicate::UrlContains(fragment.to_string()), policy)
}
