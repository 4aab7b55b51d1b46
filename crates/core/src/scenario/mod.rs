//! Scenarios and the runner that executes them with fixture isolation.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::Driver;
use crate::error::{FailureKind, HarnessError, HarnessResult};
use crate::harness::{Harness, Step};
use crate::wait::WaitPolicy;

pub type ScenarioBody = dyn Fn(&mut Harness<'_>) -> HarnessResult<()> + Send + Sync;

/// One complete user journey. The body runs after the fixture has been
/// loaded and the user signed in; the first error aborts it.
#[derive(Clone)]
pub struct Scenario {
    pub name: String,
    pub fixture: String,
    pub tags: Vec<String>,
    body: Arc<ScenarioBody>,
}

impl Scenario {
    pub fn new<F>(name: &str, fixture: &str, body: F) -> Self
    where
        F: Fn(&mut Harness<'_>) -> HarnessResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            fixture: fixture.to_string(),
            tags: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn run(&self, harness: &mut Harness<'_>) -> HarnessResult<()> {
        (self.body)(harness)
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("fixture", &self.fixture)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Pick scenarios by exact name and/or tag. No names and no tag selects
/// everything. An unknown name is an error.
pub fn filter<'a>(
    scenarios: &'a [Scenario],
    names: &[String],
    tag: Option<&str>,
) -> HarnessResult<Vec<&'a Scenario>> {
    for name in names {
        if !scenarios.iter().any(|s| &s.name == name) {
            return Err(HarnessError::Config(format!("unknown scenario: {}", name)));
        }
    }
    Ok(scenarios
        .iter()
        .filter(|s| names.is_empty() || names.contains(&s.name))
        .filter(|s| tag.map(|t| s.has_tag(t)).unwrap_or(true))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&HarnessError> for Failure {
    fn from(err: &HarnessError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of running a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub fixture: String,
    pub passed: bool,
    pub steps: Vec<Step>,
    /// Time on the driver's clock.
    pub elapsed_ms: u64,
    pub failure: Option<Failure>,
}

/// Result of running a list of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Wall-clock time of the whole run.
    pub duration_ms: u64,
    pub results: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.results.iter().filter(|r| !r.passed)
    }
}

pub struct Runner {
    policy: WaitPolicy,
    username: String,
}

impl Runner {
    pub fn new(policy: WaitPolicy, username: &str) -> Self {
        Self {
            policy,
            username: username.to_string(),
        }
    }

    /// Run each scenario against a freshly loaded fixture. A failing
    /// scenario is reported and the run moves on.
    pub fn run<'a, I>(&self, driver: &mut dyn Driver, scenarios: I) -> SuiteReport
    where
        I: IntoIterator<Item = &'a Scenario>,
    {
        let start = Instant::now();
        let mut results = Vec::new();
        for scenario in scenarios {
            results.push(self.run_one(&mut *driver, scenario));
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let report = SuiteReport {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms: start.elapsed().as_millis() as u64,
            results,
        };
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "suite finished"
        );
        report
    }

    pub fn run_one(&self, driver: &mut dyn Driver, scenario: &Scenario) -> ScenarioReport {
        info!(scenario = %scenario.name, fixture = %scenario.fixture, "scenario started");

        let outcome = driver.reset_fixture(&scenario.fixture);
        let started = driver.elapsed();
        let mut harness = Harness::new(driver, self.policy);
        let outcome = outcome
            .and_then(|_| harness.authenticate(&self.username))
            .and_then(|_| scenario.run(&mut harness));
        let steps = harness.into_steps();
        let elapsed_ms = driver.elapsed().saturating_sub(started).as_millis() as u64;

        let failure = match &outcome {
            Ok(()) => {
                info!(scenario = %scenario.name, steps = steps.len(), elapsed_ms, "scenario passed");
                None
            }
            Err(err) => {
                warn!(
                    scenario = %scenario.name,
                    after_step = steps.last().map(|s| s.description.as_str()).unwrap_or("start"),
                    error = %err,
                    "scenario failed"
                );
                Some(Failure::from(err))
            }
        };

        ScenarioReport {
            name: scenario.name.clone(),
            fixture: scenario.fixture.clone(),
            passed: failure.is_none(),
            steps,
            elapsed_ms,
            failure,
        }
    }
}
