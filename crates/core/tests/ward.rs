use std::time::Duration;

use pretty_assertions::assert_eq;
use rounds_core::fixture::DocStore;
use rounds_core::visits::{self, PATIENT, SEEDED_VISIT};
use rounds_core::ward::event_loop::EventLoop;
use rounds_core::ward::TYPEAHEAD_DEBOUNCE_MS;
use rounds_core::{Driver, Harness, HarnessError, Runner, WaitPolicy, WardApp};

fn signed_in() -> WardApp {
    let mut app = WardApp::new().unwrap();
    app.reset_fixture(visits::FIXTURE).unwrap();
    app.authenticate("hradmin").unwrap();
    app
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn unauthenticated_navigation_redirects_to_login() {
    let mut app = WardApp::new().unwrap();
    app.reset_fixture(visits::FIXTURE).unwrap();
    app.visit("/patients").unwrap();
    app.settle().unwrap();
    assert_eq!(app.current_url().unwrap(), "/login");
}

#[test]
fn unknown_fixture_is_rejected() {
    let mut app = WardApp::new().unwrap();
    let err = app.reset_fixture("maternity").unwrap_err();
    assert!(matches!(err, HarnessError::UnknownFixture(ref name) if name == "maternity"));
}

#[test]
fn empty_username_is_rejected() {
    let mut app = WardApp::new().unwrap();
    let err = app.authenticate("   ").unwrap_err();
    assert!(matches!(err, HarnessError::Action(_)));
}

#[test]
fn zero_step_limit_is_a_config_error() {
    let mut app = WardApp::new().unwrap();
    assert!(matches!(
        app.set_step_limit(0).unwrap_err(),
        HarnessError::Config(_)
    ));
    app.set_step_limit(10_000).unwrap();
}

#[test]
fn settle_stops_at_the_step_limit() {
    let mut app = signed_in();
    app.set_step_limit(2).unwrap();
    app.visit("/patients").unwrap();
    app.visit("/patients").unwrap();
    app.visit("/patients").unwrap();

    let err = app.settle().unwrap_err();
    assert!(
        matches!(err, HarnessError::Driver(ref m) if m.starts_with("task queue exceeded 2 steps")),
        "{err:?}"
    );
}

#[test]
fn self_rescheduling_task_hits_the_step_limit() {
    let mut events: EventLoop<u32> = EventLoop::new();
    events.set_step_limit(50).unwrap();
    events.schedule(0, true, 0);

    events.begin_run();
    let mut ran = 0;
    let err = loop {
        match events.next_for_settle() {
            Ok(Some(task)) => {
                ran += 1;
                events.schedule(1, true, task.effect + 1);
            }
            Ok(None) => panic!("runaway loop settled after {ran} tasks"),
            Err(err) => break err,
        }
    };
    assert_eq!(ran, 50);
    assert!(matches!(err, HarnessError::Driver(_)));
    assert_eq!(events.now_ms(), 49);

    // The counter starts over on the next run.
    events.begin_run();
    assert!(events.next_for_settle().unwrap().is_some());
}

#[test]
fn patient_listing_links_to_the_seeded_patient() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit("/patients").unwrap();
    h.assert_url("/patients", "listing url").unwrap();
    h.click("button:contains(Edit)").unwrap();
    h.assert_text(".patient-name .ps-info-data", PATIENT, "patient name")
        .unwrap();
    h.assert_url_contains("/patients/edit/", "patient url").unwrap();
}

#[test]
fn visits_load_only_when_time_passes() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit("/patients").unwrap();
    h.click("button:contains(Edit)").unwrap();
    h.click(rounds_core::Locator::test_selector("visits-tab"))
        .unwrap();

    // Settled, but the visit list is an untracked load.
    h.assert_absent("#visits button:contains(Edit)", "not loaded yet")
        .unwrap();
    h.wait_to_appear("#visits button:contains(Edit)").unwrap();
    h.assert_count("#visits tr", 2, "header and the seeded visit")
        .unwrap();
}

#[test]
fn suggestions_wait_for_the_debounce() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit(&format!("/visits/edit/{}", SEEDED_VISIT)).unwrap();
    h.wait_to_appear(".visit-examiner .tt-input").unwrap();

    h.fill_in(".visit-examiner .tt-input", "Kear").unwrap();
    h.pause(ms(TYPEAHEAD_DEBOUNCE_MS - 1)).unwrap();
    h.assert_absent(".tt-suggestion", "no suggestions before the debounce")
        .unwrap();
    h.pause(ms(1)).unwrap();
    h.assert_text(
        ".visit-examiner .tt-suggestion",
        "Sarah Kearney",
        "suggestion after the debounce",
    )
    .unwrap();
}

#[test]
fn typing_again_restarts_the_debounce() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit(&format!("/visits/edit/{}", SEEDED_VISIT)).unwrap();
    h.wait_to_appear(".visit-examiner .tt-input").unwrap();

    h.fill_in(".visit-examiner .tt-input", "Hib").unwrap();
    h.pause(ms(200)).unwrap();
    h.fill_in(".visit-examiner .tt-input", "Hibb").unwrap();
    h.pause(ms(200)).unwrap();
    h.assert_absent(".tt-suggestion", "first query was cancelled")
        .unwrap();
    h.pause(ms(100)).unwrap();
    h.assert_count(".tt-suggestion", 1, "one suggestion for the last query")
        .unwrap();
}

#[test]
fn type_ahead_picks_the_suggestion() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit(&format!("/visits/edit/{}", SEEDED_VISIT)).unwrap();
    h.wait_to_appear(".visit-examiner .tt-input").unwrap();

    let before = h.driver().elapsed();
    h.type_ahead(".visit-examiner", "Julius Hibbert").unwrap();
    let waited = h.driver().elapsed() - before;

    assert!(waited >= ms(TYPEAHEAD_DEBOUNCE_MS));
    h.assert_value(".visit-examiner .tt-input", "Julius Hibbert", "picked")
        .unwrap();
    h.assert_absent(".tt-menu", "menu closed").unwrap();
}

#[test]
fn filling_a_button_is_an_action_error() {
    let mut app = signed_in();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.visit("/patients").unwrap();
    let err = h.fill_in("button:contains(Edit)", "text").unwrap_err();
    assert!(matches!(err, HarnessError::Action(_)));
}

#[test]
fn leaving_a_page_drops_its_pending_loads() {
    let mut app = signed_in();
    app.visit(&format!("/visits/edit/{}", SEEDED_VISIT)).unwrap();
    app.settle().unwrap();
    app.visit("/patients").unwrap();
    app.settle().unwrap();
    app.advance(ms(1_000)).unwrap();

    assert_eq!(app.current_url().unwrap(), "/patients");
    assert_eq!(app.pending_tasks(), 0);
    assert!(app.html().unwrap().contains(PATIENT));
}

#[test]
fn fixture_reset_is_byte_identical() {
    let fresh = signed_in();
    let expected = fresh.store().canonical_bytes().unwrap();

    let mut app = signed_in();
    let catalog = visits::catalog();
    let delete = catalog.iter().filter(|s| s.name == "Delete visit");
    let report = Runner::new(WaitPolicy::default(), "hradmin").run(&mut app, delete);
    assert!(report.success());
    assert_ne!(app.store().canonical_bytes().unwrap(), expected);

    app.reset_fixture(visits::FIXTURE).unwrap();
    assert_eq!(app.store().canonical_bytes().unwrap(), expected);
    assert_eq!(app.current_url().unwrap(), "/");
    assert_eq!(app.pending_tasks(), 0);
}

#[test]
fn fingerprint_matches_a_bare_store() {
    let app = signed_in();
    let mut store = DocStore::new();
    store.reset(app.fixtures().get(visits::FIXTURE).unwrap());
    assert_eq!(
        store.fingerprint().unwrap(),
        app.store().fingerprint().unwrap()
    );
    assert_eq!(store.fingerprint().unwrap().len(), 64);
}
