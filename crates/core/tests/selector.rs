use pretty_assertions::assert_eq;
use rounds_core::{HarnessError, Locator, Page};

const VISITS: &str = r#"
<html>
<body>
  <div class="panel">
    <h4 class="view-current-title">Edit Visit</h4>
    <table id="visits">
      <thead><tr><th>Date</th><th>Type</th><th>Actions</th></tr></thead>
      <tbody>
        <tr><td>1/1/2026</td><td>Clinic</td><td><button class="btn">Edit</button> <button class="btn btn-danger">Delete</button></td></tr>
        <tr><td>1/2/2026</td><td>Admission</td><td><button class="btn">Edit</button> <button class="btn btn-danger">Delete</button></td></tr>
      </tbody>
    </table>
    <table id="visit-vitals">
      <tr><td>36.6</td><td>120/80</td></tr>
      <tr><td>34.56</td><td>110/70</td></tr>
    </table>
    <div class="modal-footer">
      <button class="btn" data-test-selector="ok-btn">Ok</button>
      <button class="btn hidden">Cancel</button>
      <span style="display: none">secret</span>
    </div>
    <input class="tt-input" name="diagnosis" value="Broken Arm">
    <a href="/patients/edit/12" data-test-selector="patient-link">Joe
       Bagadonuts</a>
  </div>
</body>
</html>
"#;

fn page() -> Page {
    Page::parse("/visits/edit/1", VISITS).unwrap()
}

fn texts(page: &Page, selector: &str) -> Vec<String> {
    let locator = Locator::css(selector).unwrap();
    page.find_all(&locator)
        .into_iter()
        .map(|id| page.text(id))
        .collect()
}

#[test]
fn tag_class_and_id() {
    let page = page();
    assert_eq!(texts(&page, "h4.view-current-title"), vec!["Edit Visit"]);
    assert_eq!(texts(&page, "#visits tbody tr").len(), 2);
    assert_eq!(texts(&page, "#visits > thead th"), vec!["Date", "Type", "Actions"]);
    assert_eq!(texts(&page, ".btn-danger").len(), 2);
}

#[test]
fn attribute_operators() {
    let page = page();
    assert_eq!(texts(&page, "[data-test-selector=ok-btn]"), vec!["Ok"]);
    assert_eq!(texts(&page, "[data-test-selector=\"ok-btn\"]"), vec!["Ok"]);
    assert_eq!(texts(&page, "a[href^='/patients/']").len(), 1);
    assert_eq!(texts(&page, "a[href$='/12']").len(), 1);
    assert_eq!(texts(&page, "a[href*=edit]").len(), 1);
    assert_eq!(texts(&page, "button[class~=btn-danger]").len(), 2);
    assert_eq!(texts(&page, "input[name]").len(), 1);
}

#[test]
fn contains_matches_collapsed_text() {
    let page = page();
    assert_eq!(
        texts(&page, "a:contains(Joe Bagadonuts)"),
        vec!["Joe Bagadonuts"]
    );
    assert_eq!(texts(&page, "#visits tr:contains(Admission) td:first"), vec!["1/2/2026"]);
    assert!(texts(&page, "td:contains(Emergency)").is_empty());
}

#[test]
fn positional_filters_apply_to_the_matched_set() {
    let page = page();
    assert_eq!(texts(&page, "#visit-vitals tr:last td"), vec!["34.56", "110/70"]);
    assert_eq!(texts(&page, "#visit-vitals tr:first td:last"), vec!["120/80"]);
    assert_eq!(texts(&page, "#visits tbody tr:eq(1) td:eq(1)"), vec!["Admission"]);
    assert!(texts(&page, "#visits tbody tr:eq(5)").is_empty());
}

#[test]
fn positional_and_filters_apply_in_written_order() {
    let page = Page::parse("/", "<ul><li>a</li><li>b</li></ul>").unwrap();
    let count = |s: &str| page.count(&Locator::css(s).unwrap());

    assert_eq!(count("li:last:contains(a)"), 0);
    assert_eq!(count("li:contains(a):last"), 1);
    assert_eq!(count("li:first:contains(a)"), 1);
    assert_eq!(count("li:eq(1):contains(b)"), 1);

    // A text filter added to a positional locator narrows what it picked.
    let last = Locator::css("li:last").unwrap();
    assert_eq!(page.count(&last.clone().containing("a")), 0);
    assert_eq!(page.count(&last.containing("b")), 1);
}

#[test]
fn groups_are_merged_in_document_order() {
    let page = page();
    assert_eq!(
        texts(&page, "a[data-test-selector], h4, [data-test-selector=ok-btn]"),
        vec!["Edit Visit", "Ok", "Joe Bagadonuts"]
    );
    // The same element reached twice is reported once.
    assert_eq!(texts(&page, "h4, .view-current-title").len(), 1);
}

#[test]
fn commas_inside_contains_do_not_split_groups() {
    let html = "<ul><li>Doe, Jane</li><li>Jane</li></ul>";
    let page = Page::parse("/", html).unwrap();
    assert_eq!(texts(&page, "li:contains(Doe, Jane)"), vec!["Doe, Jane"]);
}

#[test]
fn visibility() {
    let page = page();
    assert_eq!(texts(&page, ".modal-footer button:visible"), vec!["Ok"]);
    assert_eq!(texts(&page, ".modal-footer :hidden"), vec!["Cancel", "secret"]);
}

#[test]
fn resolution_is_deterministic() {
    let page = page();
    let locator = Locator::css("#visits td, button.btn").unwrap();
    let first = page.find_all(&locator);
    for _ in 0..5 {
        assert_eq!(page.find_all(&locator), first);
    }
    let reparsed = Page::parse("/visits/edit/1", VISITS).unwrap();
    assert_eq!(reparsed.find_all(&locator), first);
}

#[test]
fn strict_resolution_reports_ambiguity() {
    let page = page();
    let err = page
        .find_one(&Locator::css("#visits button:contains(Delete)").unwrap())
        .unwrap_err();
    match err {
        HarnessError::Ambiguous { locator, count } => {
            assert_eq!(locator, "#visits button:contains(Delete)");
            assert_eq!(count, 2);
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn strict_resolution_reports_no_match() {
    let page = page();
    let err = page
        .find_one(&Locator::css(".modal-title").unwrap())
        .unwrap_err();
    assert!(matches!(err, HarnessError::NoMatch { ref locator } if locator == ".modal-title"));
}

#[test]
fn first_opts_out_of_strictness() {
    let page = page();
    let locator = Locator::css("#visits button:contains(Delete)").unwrap().first();
    let id = page.find_one(&locator).unwrap();
    assert_eq!(page.text(id), "Delete");
    let row = page.find_all(&Locator::css("#visits tbody tr").unwrap())[0];
    assert!(page.document.is_descendant_of(id, row));
}

#[test]
fn locator_builders() {
    let page = page();
    let ok = Locator::test_selector("ok-btn");
    assert_eq!(ok.to_string(), "[data-test-selector=ok-btn]");
    assert_eq!(page.count(&ok), 1);

    let edit = Locator::css("button")
        .unwrap()
        .containing("Edit")
        .within(&Locator::css("#visits tbody tr:last").unwrap());
    assert_eq!(page.count(&edit), 1);
    assert_eq!(edit.to_string(), "#visits tbody tr:last button:contains(Edit)");
}

#[test]
fn input_value() {
    let page = page();
    let id = page.find_one(&Locator::css(".tt-input").unwrap()).unwrap();
    assert_eq!(page.value(id).as_deref(), Some("Broken Arm"));
}

#[test]
fn invalid_selectors_are_rejected() {
    for bad in ["", "div >", "li + li", "[name", ":contains(", "a:bogus"] {
        let err = Locator::css(bad).unwrap_err();
        assert!(
            matches!(err, HarnessError::InvalidSelector { .. }),
            "{bad:?} should be invalid, got {err:?}"
        );
    }
}

#[test]
fn query_helper() {
    let (doc, nodes) = rounds_core::query(VISITS, "#visits td:contains(Clinic)").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(doc.text_content(nodes[0]), "Clinic");
}
