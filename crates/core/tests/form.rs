use rounds_core::visits::FIXTURE;
use rounds_core::{Driver, Harness, HarnessError, WaitPolicy, WardApp};

const EDITOR: &str = "/admin/custom-forms/edit/new";

fn editor() -> WardApp {
    let mut app = WardApp::new().unwrap();
    app.reset_fixture(FIXTURE).unwrap();
    app.authenticate("hradmin").unwrap();
    app.visit(EDITOR).unwrap();
    app.settle().unwrap();
    app
}

#[test]
fn fill_in_sets_the_rendered_value() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.fill_in(".custom-form-name input", "Intake questions").unwrap();
    h.assert_value(".custom-form-name input", "Intake questions", "name kept")
        .unwrap();
}

#[test]
fn fill_in_rejects_non_text_controls() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    let err = h.fill_in(".custom-form-type select", "Lab").unwrap_err();
    assert!(matches!(err, HarnessError::Action(ref m) if m.contains("not a text input")));
}

#[test]
fn select_by_visible_text() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.select(".custom-form-type select", "Operative Plan").unwrap();
    h.assert_value(".custom-form-type select", "Operative Plan", "type chosen")
        .unwrap();
}

#[test]
fn select_unknown_option_is_no_match() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    let err = h.select(".custom-form-type select", "Billing").unwrap_err();
    match err {
        HarnessError::NoMatch { locator } => {
            assert_eq!(locator, ".custom-form-type select option \"Billing\"");
        }
        other => panic!("expected NoMatch, got {other:?}"),
    }
}

#[test]
fn select_requires_a_select() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    let err = h.select(".custom-form-name input", "Lab").unwrap_err();
    assert!(matches!(err, HarnessError::Action(_)));
}

#[test]
fn toggle_flips_a_checkbox() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    let checkbox = ".custom-form-always-include input";

    let (page, id) = h.find(checkbox).unwrap();
    assert!(page.attr(id, "checked").is_none());

    h.toggle(checkbox).unwrap();
    let (page, id) = h.find(checkbox).unwrap();
    assert!(page.attr(id, "checked").is_some());

    h.toggle(checkbox).unwrap();
    let (page, id) = h.find(checkbox).unwrap();
    assert!(page.attr(id, "checked").is_none());
}

#[test]
fn toggle_requires_a_checkbox() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    let err = h.toggle(".custom-form-name input").unwrap_err();
    assert!(matches!(err, HarnessError::Action(ref m) if m.contains("not a checkbox")));
}

#[test]
fn actions_on_missing_elements_are_no_match() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    assert!(matches!(
        h.fill_in(".custom-form-description textarea", "x").unwrap_err(),
        HarnessError::NoMatch { .. }
    ));
    assert!(matches!(
        h.type_ahead(".visit-location", "Springfield").unwrap_err(),
        HarnessError::NoMatch { .. }
    ));
}

#[test]
fn steps_record_each_interaction() {
    let mut app = editor();
    let mut h = Harness::new(&mut app, WaitPolicy::default());
    h.fill_in(".custom-form-name input", "Intake").unwrap();
    h.select(".custom-form-type select", "Lab").unwrap();
    h.toggle(".custom-form-always-include input").unwrap();

    let steps: Vec<String> = h.steps().iter().map(|s| s.description.clone()).collect();
    pretty_assertions::assert_eq!(
        steps,
        vec![
            "fill .custom-form-name input with \"Intake\"".to_string(),
            "select \"Lab\" in .custom-form-type select".to_string(),
            "toggle .custom-form-always-include input".to_string(),
        ]
    );
}
