use std::time::Duration;

use pretty_assertions::assert_eq;
use rounds_core::wait::{self, Predicate};
use rounds_core::{
    Driver, ElementHandle, HarnessError, HarnessResult, Harness, Locator, Page, WaitPolicy,
};

/// A page whose banner shows up at `appear_at` and whose spinner goes away
/// at `loaded_at`, on a clock only `advance` moves.
struct Clocked {
    now_ms: u64,
    appear_at: u64,
    loaded_at: u64,
    pages: usize,
}

impl Clocked {
    fn new(appear_at: u64, loaded_at: u64) -> Self {
        Self {
            now_ms: 0,
            appear_at,
            loaded_at,
            pages: 0,
        }
    }

    fn url(&self) -> String {
        if self.now_ms >= self.appear_at {
            "/visits/edit/42".to_string()
        } else {
            "/visits/edit/new".to_string()
        }
    }
}

impl Driver for Clocked {
    fn reset_fixture(&mut self, _name: &str) -> HarnessResult<()> {
        Ok(())
    }

    fn authenticate(&mut self, _username: &str) -> HarnessResult<()> {
        Ok(())
    }

    fn visit(&mut self, _route: &str) -> HarnessResult<()> {
        Ok(())
    }

    fn current_url(&mut self) -> HarnessResult<String> {
        Ok(self.url())
    }

    fn page(&mut self) -> HarnessResult<Page> {
        self.pages += 1;
        let mut html = String::from("<body>");
        if self.now_ms >= self.appear_at {
            html.push_str("<div class=\"alert\">Visit Saved</div>");
        }
        if self.now_ms < self.loaded_at {
            html.push_str("<div class=\"spinner\">Loading</div>");
        }
        html.push_str("</body>");
        Page::parse(&self.url(), &html)
    }

    fn click(&mut self, _target: &ElementHandle) -> HarnessResult<()> {
        Ok(())
    }

    fn focus(&mut self, _target: &ElementHandle) -> HarnessResult<()> {
        Ok(())
    }

    fn fill(&mut self, _target: &ElementHandle, _text: &str) -> HarnessResult<()> {
        Ok(())
    }

    fn choose(&mut self, _target: &ElementHandle, _option: &str) -> HarnessResult<()> {
        Ok(())
    }

    fn settle(&mut self) -> HarnessResult<()> {
        Ok(())
    }

    fn advance(&mut self, by: Duration) -> HarnessResult<()> {
        self.now_ms += by.as_millis() as u64;
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }
}

fn policy() -> WaitPolicy {
    WaitPolicy::default()
        .with_timeout(Duration::from_millis(500))
        .with_poll_interval(Duration::from_millis(25))
}

#[test]
fn appear_returns_the_snapshot_that_satisfied_it() {
    let mut driver = Clocked::new(110, 0);
    let alert = Locator::css(".alert:contains(Visit Saved)").unwrap();
    let page = wait::wait_to_appear(&mut driver, &alert, &policy()).unwrap();

    assert!(page.exists(&alert));
    // First poll at or after 110 ms on a 25 ms grid.
    assert_eq!(driver.elapsed(), Duration::from_millis(125));
    assert_eq!(driver.pages, 6);
}

#[test]
fn already_true_predicate_does_not_advance() {
    let mut driver = Clocked::new(0, 0);
    let alert = Locator::css(".alert").unwrap();
    wait::wait_to_appear(&mut driver, &alert, &policy()).unwrap();
    assert_eq!(driver.elapsed(), Duration::ZERO);
    assert_eq!(driver.pages, 1);
}

#[test]
fn disappear_waits_for_absence() {
    let mut driver = Clocked::new(0, 60);
    let spinner = Locator::css(".spinner").unwrap();
    let page = wait::wait_to_disappear(&mut driver, &spinner, &policy()).unwrap();
    assert!(!page.exists(&spinner));
    assert_eq!(driver.elapsed(), Duration::from_millis(75));
}

#[test]
fn url_predicates() {
    let mut driver = Clocked::new(40, 0);
    let page = wait::wait_for_url(&mut driver, "/visits/edit/42", &policy()).unwrap();
    assert_eq!(page.url, "/visits/edit/42");

    let mut driver = Clocked::new(40, 0);
    let page = wait::wait_for_url_containing(&mut driver, "/edit/4", &policy()).unwrap();
    assert_eq!(page.url, "/visits/edit/42");
}

#[test]
fn never_true_predicate_times_out_with_its_description() {
    let mut driver = Clocked::new(u64::MAX, 0);
    let never = Locator::css("#never").unwrap();
    let err = wait::wait_to_appear(&mut driver, &never, &policy()).unwrap_err();

    match err {
        HarnessError::Timeout {
            ref description,
            waited_ms,
        } => {
            assert_eq!(description, "#never to appear");
            assert_eq!(waited_ms, 500);
        }
        ref other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(err.is_timeout());
    assert_eq!(
        err.to_string(),
        "timed out after 500 ms waiting for #never to appear"
    );
}

#[test]
fn zero_poll_interval_still_reaches_the_timeout() {
    let mut driver = Clocked::new(u64::MAX, 0);
    let policy = WaitPolicy::default()
        .with_timeout(Duration::from_millis(10))
        .with_poll_interval(Duration::ZERO);
    let never = Locator::css(".never").unwrap();
    let err = wait::wait_to_appear(&mut driver, &never, &policy).unwrap_err();

    assert!(matches!(err, HarnessError::Timeout { waited_ms: 10, .. }));
    // One snapshot per millisecond, plus the first.
    assert_eq!(driver.pages, 11);
}

#[test]
fn custom_conditions() {
    let mut driver = Clocked::new(200, 0);
    let page = wait::wait_until(&mut driver, "the saved visit URL", &policy(), |page| {
        page.url.ends_with("/42")
    })
    .unwrap();
    assert_eq!(page.url, "/visits/edit/42");
    assert_eq!(driver.elapsed(), Duration::from_millis(200));
}

#[test]
fn predicate_descriptions() {
    let loc = Locator::css(".modal-dialog").unwrap();
    assert_eq!(
        Predicate::ElementExists(loc.clone()).to_string(),
        ".modal-dialog to appear"
    );
    assert_eq!(
        Predicate::ElementAbsent(loc).to_string(),
        ".modal-dialog to disappear"
    );
    assert_eq!(
        Predicate::UrlEquals("/patients".into()).to_string(),
        "URL to equal /patients"
    );
}

#[test]
fn harness_waits_are_recorded() {
    let mut driver = Clocked::new(50, 0);
    let mut harness = Harness::new(&mut driver, policy());
    harness.wait_to_appear(".alert").unwrap();
    harness
        .assert_text(".alert", "Visit Saved", "Visit Saved displays")
        .unwrap();
    harness.pause(Duration::from_millis(100)).unwrap();

    let steps: Vec<&str> = harness
        .steps()
        .iter()
        .map(|s| s.description.as_str())
        .collect();
    assert_eq!(
        steps,
        vec![
            "wait for .alert to appear",
            "assert Visit Saved displays",
            "pause 100 ms",
        ]
    );
    assert_eq!(harness.steps()[2].elapsed_ms, 150);
}

#[test]
fn harness_assertion_failure_carries_the_message() {
    let mut driver = Clocked::new(0, 0);
    let mut harness = Harness::new(&mut driver, policy());
    let err = harness
        .assert_text(".alert", "Visit Updated", "Visit Updated displays")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Visit Updated displays: expected \"Visit Updated\", actual \"Visit Saved\""
    );
    assert!(!err.is_timeout());
}
