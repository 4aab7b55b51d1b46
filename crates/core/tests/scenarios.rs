use std::time::Duration;

use pretty_assertions::assert_eq;
use rounds_core::error::FailureKind;
use rounds_core::scenario;
use rounds_core::visits::{self, FIXTURE, PATIENT};
use rounds_core::{HarnessConfig, HarnessError, Runner, Scenario, WaitPolicy, WardApp};

fn runner() -> Runner {
    let config = HarnessConfig::default();
    Runner::new(config.wait_policy(), &config.username)
}

#[test]
fn catalog_passes_in_process() {
    let mut app = WardApp::new().unwrap();
    let catalog = visits::catalog();
    let report = runner().run(&mut app, &catalog);

    for failed in report.failures() {
        eprintln!("{}: {:?}", failed.name, failed.failure);
    }
    assert!(report.success());
    assert_eq!(report.total, 7);
    assert_eq!(report.passed, 7);
    assert!(report.results.iter().all(|r| !r.steps.is_empty()));
}

#[test]
fn catalog_names_and_tags() {
    let catalog = visits::catalog();
    let names: Vec<&str> = catalog.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names.len(), 7);
    assert!(names.contains(&"Add admission visit"));
    assert!(names.contains(&"Edit visit"));
    assert!(names.contains(&"Delete visit"));
    assert!(catalog.iter().all(|s| s.fixture == FIXTURE && s.has_tag("visits")));
    assert_eq!(catalog.iter().filter(|s| s.has_tag("opd")).count(), 4);
}

#[test]
fn filter_by_name_and_tag() {
    let catalog = visits::catalog();

    let all = scenario::filter(&catalog, &[], None).unwrap();
    assert_eq!(all.len(), catalog.len());

    let delete = scenario::filter(&catalog, &["Delete visit".to_string()], None).unwrap();
    assert_eq!(delete.len(), 1);

    let edit = scenario::filter(&catalog, &[], Some("edit")).unwrap();
    assert_eq!(edit.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Edit visit"]);

    let err = scenario::filter(&catalog, &["Discharge everyone".to_string()], None).unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}

#[test]
fn seeded_patient_is_displayed() {
    let check = Scenario::new("patient name", FIXTURE, |h| {
        h.visit("/patients")?;
        h.click("button:contains(Edit)")?;
        h.assert_text(".patient-name .ps-info-data", PATIENT, "patient displays")
    });
    let mut app = WardApp::new().unwrap();
    let report = runner().run_one(&mut app, &check);
    assert!(report.passed, "{:?}", report.failure);
}

#[test]
fn clinic_visit_gets_its_own_url() {
    let check = Scenario::new("clinic visit", FIXTURE, |h| {
        visits::add_visit(h, Some("Clinic"))?;
        h.assert_url_contains("/visits/edit/", "visit url")
    });
    let mut app = WardApp::new().unwrap();
    let report = runner().run_one(&mut app, &check);
    assert!(report.passed, "{:?}", report.failure);

    let url = rounds_core::Driver::current_url(&mut app).unwrap();
    let id = url.trim_start_matches("/visits/edit/");
    assert!(!id.is_empty() && id != "new", "unexpected url {url}");
    assert!(report
        .steps
        .iter()
        .any(|s| s.description == "assert Visit Saved dialog displays"));
}

#[test]
fn deleting_the_only_visit_leaves_the_header_row() {
    let mut app = WardApp::new().unwrap();
    let catalog = visits::catalog();
    let delete = catalog.iter().find(|s| s.name == "Delete visit").unwrap();
    let report = runner().run_one(&mut app, delete);
    assert!(report.passed, "{:?}", report.failure);

    let page = rounds_core::Driver::page(&mut app).unwrap();
    assert_eq!(page.count(&"#visits tr".parse().unwrap()), 1);
}

#[test]
fn never_true_wait_fails_with_timeout() {
    let check = Scenario::new("waits forever", FIXTURE, |h| {
        h.visit("/patients")?;
        h.wait_to_appear(".discharge-summary")?;
        Ok(())
    });
    let mut app = WardApp::new().unwrap();
    let policy = WaitPolicy::default().with_timeout(Duration::from_millis(200));
    let report = Runner::new(policy, "hradmin").run_one(&mut app, &check);

    assert!(!report.passed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(
        failure.message,
        "timed out after 200 ms waiting for .discharge-summary to appear"
    );
    assert_eq!(report.steps.last().unwrap().description, "visit /patients");
}

#[test]
fn ambiguous_click_is_an_assertion_failure() {
    let check = Scenario::new("ambiguous", FIXTURE, |h| {
        h.visit("/patients")?;
        h.click("th")
    });
    let mut app = WardApp::new().unwrap();
    let report = runner().run_one(&mut app, &check);

    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(failure.message, "4 elements match th, expected exactly one");
}

#[test]
fn failing_scenario_does_not_stop_the_suite() {
    let broken = Scenario::new("broken", FIXTURE, |h| {
        h.visit("/patients")?;
        h.assert_count("button:contains(Edit)", 3, "three patients listed")
    });
    let fine = Scenario::new("fine", FIXTURE, |h| h.visit("/patients"));

    let mut app = WardApp::new().unwrap();
    let report = runner().run(&mut app, [&broken, &fine]);

    assert_eq!(report.total, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["broken"]);
    assert!(report.results[1].passed);
}

#[test]
fn reports_serialise() {
    let fine = Scenario::new("fine", FIXTURE, |h| h.visit("/patients")).tagged("smoke");
    let mut app = WardApp::new().unwrap();
    let report = runner().run(&mut app, [&fine]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["results"][0]["name"], "fine");
    assert_eq!(json["results"][0]["steps"][0]["description"], "authenticate as hradmin");
    assert_eq!(json["results"][0]["failure"], serde_json::Value::Null);
}
