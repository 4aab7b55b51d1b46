//! The visit workflow suite: adding admission and outpatient visits, filling
//! their clinical data, generating reports, editing and deleting visits.
//!
//! Every scenario runs against the `patient` fixture, which seeds Joe
//! Bagadonuts with a single admission visit.

pub mod custom_forms;

use chrono::{Duration, Local};

use crate::error::{HarnessError, HarnessResult};
use crate::harness::Harness;
use crate::scenario::Scenario;
use crate::selector::Locator;

use self::custom_forms::{
    attach_custom_form, check_custom_form_is_filled_and_readonly, create_custom_form_for_type,
    custom_form_name, fill_custom_form,
};

pub const FIXTURE: &str = "patient";

pub const PATIENT: &str = "Joe Bagadonuts";
pub const PATIENT_ID: &str = "P00001";
pub const SEEDED_VISIT: &str = "03C7BF8B-04E0-DD9E-9469-96A5604F5340";
pub const SEEDED_DIAGNOSIS: &str = "Fall from in-line roller-skates, initial encounter";

const LOCATION: &str = "Springfield Hospital";
const EXAMINER: &str = "Sarah Kearney";
const PRIMARY_DIAGNOSIS: &str = "ACL deficient knee, right";
const SECONDARY_DIAGNOSIS: &str = "ACL deficient knee, left";
const OPERATION_DESCRIPTION: &str = "Describe Operation here";
const PROCEDURE_SPLINT: &str = "application of long arm post splint";
const ADMISSION_INSTRUCTIONS: &str = "Admission Instructions here";
const OPD_PROCEDURE_DESCRIPTION: &str = "Bilateral knee Release";
const OPD_PROCEDURE_PHYSICIAN: &str = "Sarah Kearney";
const LAB_TYPE: &str = "Cholesterol";
const IMAGING_TYPE: &str = "Cervical Spine AP-L";
const NOTE_CONTENT: &str = "OPD notes are entered here";
const VITALS_VALUE: &str = "34.56";

const VITALS_INPUTS: [&str; 7] = [
    ".temperature-text input",
    ".weight-text input",
    ".height-text input",
    ".sbp-text input",
    ".dbp-text input",
    ".heart-rate-text input",
    ".respiratory-rate-text input",
];

/// A custom form an outpatient case creates before adding its visit.
#[derive(Debug, Clone, Copy)]
pub struct CustomFormCase {
    pub form_type: &'static str,
    pub always_included: bool,
}

impl CustomFormCase {
    pub fn name(&self) -> String {
        custom_form_name(self.form_type, self.always_included)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpdCase {
    pub name: &'static str,
    pub custom_forms: &'static [CustomFormCase],
}

const INCLUDED: CustomFormCase = CustomFormCase {
    form_type: "Lab",
    always_included: true,
};

const NOT_INCLUDED: CustomFormCase = CustomFormCase {
    form_type: "Lab",
    always_included: false,
};

pub const OPD_CASES: &[OpdCase] = &[
    OpdCase {
        name: "Add OPD visit",
        custom_forms: &[],
    },
    OpdCase {
        name: "OPD report with always included custom form",
        custom_forms: &[INCLUDED],
    },
    OpdCase {
        name: "OPD report with a custom form",
        custom_forms: &[NOT_INCLUDED],
    },
    OpdCase {
        name: "OPD report with always included and regular custom forms",
        custom_forms: &[INCLUDED, NOT_INCLUDED],
    },
];

/// All scenarios of the suite, in run order.
pub fn catalog() -> Vec<Scenario> {
    let mut scenarios = vec![Scenario::new("Add admission visit", FIXTURE, |h| {
        add_visit(h, None)?;
        add_admission_data(h)?;
        new_report(h, "Discharge")?;
        check_discharge_report(h)?;
        save_report(h, "Discharge")?;
        view_report(h, "Discharge", &[])
    })
    .tagged("visits")
    .tagged("admission")
    .tagged("report")];

    for case in OPD_CASES {
        let case = *case;
        let mut scenario = Scenario::new(case.name, FIXTURE, move |h| {
            for form in case.custom_forms {
                create_custom_form_for_type(h, form.form_type, form.always_included)?;
            }
            add_visit(h, Some("Clinic"))?;
            add_outpatient_data(h, &case)?;
            new_report(h, "OPD")?;
            check_opd_report(h)?;
            save_report(h, "OPD")?;
            view_report(h, "OPD", case.custom_forms)
        })
        .tagged("visits")
        .tagged("opd")
        .tagged("report");
        if !case.custom_forms.is_empty() {
            scenario = scenario.tagged("custom-forms");
        }
        scenarios.push(scenario);
    }

    scenarios.push(
        Scenario::new("Edit visit", FIXTURE, edit_visit)
            .tagged("visits")
            .tagged("edit"),
    );
    scenarios.push(
        Scenario::new("Delete visit", FIXTURE, delete_visit)
            .tagged("visits")
            .tagged("delete"),
    );
    scenarios
}

/// Appointment start and end, a week out, as the date picker formats them.
pub fn appointment_dates() -> (String, String) {
    let format = "%-m/%-d/%Y %-I:%M %p";
    let now = Local::now();
    (
        (now + Duration::days(7)).format(format).to_string(),
        (now + Duration::days(8)).format(format).to_string(),
    )
}

/// Open the seeded patient from the listing and show its visits.
fn open_patient_visits(h: &mut Harness<'_>, ready: &str) -> HarnessResult<()> {
    h.visit("/patients")?;
    h.assert_url("/patients", "Patient url is correct")?;

    h.click("button:contains(Edit)")?;
    h.assert_text(
        ".patient-name .ps-info-data",
        PATIENT,
        &format!("{} patient record displays", PATIENT),
    )?;

    h.click(Locator::test_selector("visits-tab"))?;
    h.wait_to_appear(ready)?;
    Ok(())
}

/// Create a visit for the seeded patient. `visit_type` of `None` keeps the
/// form's default (Admission).
pub fn add_visit(h: &mut Harness<'_>, visit_type: Option<&str>) -> HarnessResult<()> {
    open_patient_visits(h, "#visits button:contains(Edit)")?;

    h.click("#visits button:contains(New Visit)")?;
    h.wait_to_appear("#visit-info")?;
    h.assert_text(
        ".patient-name .ps-info-data",
        PATIENT,
        &format!("{} displays as patient for visit", PATIENT),
    )?;

    update_visit(h, "Add", visit_type)?;

    let url = h.driver().current_url()?;
    h.assert_url_contains("/visits/edit/", "New visit url is correct")?;
    if url.ends_with("/new") || url.contains("/new?") {
        return Err(HarnessError::assertion(
            "Saved visit has its own url",
            "/visits/edit/<id>",
            url,
        ));
    }
    Ok(())
}

pub fn add_outpatient_data(h: &mut Harness<'_>, case: &OpdCase) -> HarnessResult<()> {
    h.type_ahead(".visit-location", LOCATION)?;
    h.type_ahead(".visit-examiner", EXAMINER)?;

    h.click("a:contains(Add Diagnosis)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Diagnosis", "Add Diagnosis dialog displays")?;
    h.fill_in(".diagnosis-text input", PRIMARY_DIAGNOSIS)?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;

    h.click("a:contains(Add Diagnosis)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Diagnosis", "Add Diagnosis dialog displays")?;
    h.fill_in(".diagnosis-text input", SECONDARY_DIAGNOSIS)?;
    h.toggle(".secondary-diagnosis input")?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.wait_to_appear(format!("a.secondary-diagnosis:contains({})", SECONDARY_DIAGNOSIS))?;

    h.click("a:contains(Add Operative Plan)")?;
    h.wait_for_url_containing("/patients/operative-plan/new?forVisitId")?;
    h.assert_url_contains(
        "/patients/operative-plan/new?forVisitId",
        "New operative plan URL is visited",
    )?;
    h.assert_text(
        ".patient-name .ps-info-data",
        PATIENT,
        &format!("{} patient header displays", PATIENT),
    )?;
    h.assert_text(
        ".view-current-title",
        "New Operative Plan",
        "New operative plan title is correct",
    )?;

    h.fill_in(".operation-description textarea", OPERATION_DESCRIPTION)?;
    h.type_ahead(".procedure-description", PROCEDURE_SPLINT)?;
    h.click("button:contains(Add Procedure)")?;
    h.wait_to_appear(".procedure-listing td.procedure-description")?;
    h.fill_in(".admission-instructions textarea", ADMISSION_INSTRUCTIONS)?;
    update_visit_data(h, "Plan Saved")?;

    h.click(Locator::test_selector("procedures-tab"))?;
    h.wait_to_appear(Locator::test_selector("new-procedure-btn"))?;
    h.assert_text(
        Locator::test_selector("new-procedure-btn"),
        "New Procedure",
        "New Procedure button displayed",
    )?;
    h.click(Locator::test_selector("new-procedure-btn"))?;
    h.wait_for_url_containing("/visits/procedures/edit/new?forVisitId")?;
    h.assert_url_contains(
        "/visits/procedures/edit/new?forVisitId",
        "New Procedures URL is visited",
    )?;
    h.type_ahead(".procedure-description", OPD_PROCEDURE_DESCRIPTION)?;
    h.type_ahead(".procedure-physician", OPD_PROCEDURE_PHYSICIAN)?;
    update_visit_data(h, "Procedure Saved")?;

    h.click("button:contains(New Lab)")?;
    h.wait_for_url_containing("/labs/edit/new?forVisitId")?;
    h.assert_url_contains("/labs/edit/new?forVisitId", "New Lab URL is visited")?;
    h.type_ahead(".test-lab-type", LAB_TYPE)?;
    for form in case.custom_forms {
        let name = form.name();
        if !form.always_included {
            attach_custom_form(h, &name)?;
        }
        fill_custom_form(h, &name)?;
    }
    update_visit_data(h, "Lab Request Saved")?;

    h.click("button:contains(New Imaging)")?;
    h.wait_for_url_containing("/imaging/edit/new?forVisitId")?;
    h.assert_url_contains("/imaging/edit/new?forVisitId", "New Imaging URL is visited")?;
    h.type_ahead(".imaging-type-input", IMAGING_TYPE)?;
    update_visit_data(h, "Imaging Request Saved")?;

    h.click("button:contains(New Appointment)")?;
    h.wait_for_url_containing("/appointments/edit/new?forVisitId")?;
    h.assert_url_contains(
        "/appointments/edit/new?forVisitId",
        "New Appointment URL is visited",
    )?;
    let (start, end) = appointment_dates();
    h.toggle(".appointment-all-day input")?;
    h.fill_in(".test-appointment-start input", &start)?;
    h.fill_in(".test-appointment-end input", &end)?;
    update_visit_data(h, "Appointment Saved")?;

    add_note(h)?;
    h.wait_for_url_containing("/visits/edit/")?;
    h.assert_url_contains("/visits/edit/", "Returns back to visit URL")
}

pub fn add_admission_data(h: &mut Harness<'_>) -> HarnessResult<()> {
    h.type_ahead(".visit-examiner", EXAMINER)?;
    add_note(h)?;
    h.assert_url_contains("visits/edit/", "Returns back to visit URL")
}

fn add_note(h: &mut Harness<'_>) -> HarnessResult<()> {
    h.click(Locator::test_selector("notes-tab"))?;
    h.wait_to_appear(Locator::test_selector("new-note-btn"))?;
    h.click(Locator::test_selector("new-note-btn"))?;
    h.assert_text(
        ".modal-title",
        &format!("New Note for {}", PATIENT),
        "New Note dialog displays",
    )?;
    h.fill_in(".test-note-content textarea", NOTE_CONTENT)?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    Ok(())
}

/// Open a new report of `report_type` ("Discharge" or "OPD") from the
/// reports tab.
pub fn new_report(h: &mut Harness<'_>, report_type: &str) -> HarnessResult<()> {
    let title = format!("New {} Report", report_type);
    h.click(Locator::test_selector("reports-tab"))?;
    h.wait_to_appear(Locator::test_selector("report-btn"))?;
    h.assert_text(
        Locator::test_selector("report-btn"),
        &title,
        &format!("{} report can be created for this type of visit", report_type),
    )?;

    h.click(Locator::test_selector("report-btn"))?;
    h.wait_for_url_containing("visits/reports/edit/new")?;
    h.assert_url_contains("visits/reports/edit/new", "Report url is correct")?;
    h.assert_text(
        ".view-current-title",
        &title,
        &format!("{} report title displayed correctly", report_type),
    )?;
    h.assert_text(".patient-name .ps-info-data", PATIENT, "Patient record displays")
}

pub fn check_opd_report(h: &mut Harness<'_>) -> HarnessResult<()> {
    h.assert_text(".patient-id .ps-info-data", PATIENT_ID, "Patient ID is displayed")?;
    h.assert_text(
        ".patient-name .ps-info-data",
        PATIENT,
        "Patient First Name & Last Name is displayed",
    )?;
    h.assert_text(
        ".test-visit-date .test-visit-date-label",
        "Date of Visit:",
        "Visit date label displayed",
    )?;
    h.assert_not_empty(".test-visit-date .test-visit-date-data", "Visit date is displayed")?;

    h.assert_exists(
        ".test-visit-type .test-visit-type-label:contains(Visit Type)",
        "Visit type label displayed",
    )?;
    h.assert_text(".test-visit-type .test-visit-type-data", "Clinic", "Visit Type is displayed")?;
    h.assert_exists(
        ".test-examiner .test-examiner-label:contains(Examiner)",
        "Examiner label displayed",
    )?;
    h.assert_text(".test-examiner .test-examiner-data", EXAMINER, "Visit Examiner is displayed")?;
    h.assert_exists(
        ".test-location .test-location-label:contains(Visit Location)",
        "Visit location label displayed",
    )?;
    h.assert_text(".test-location .test-location-data", LOCATION, "Visit Location is displayed")?;

    h.assert_exists(
        format!(".primary-diagnosis:contains({})", PRIMARY_DIAGNOSIS),
        "Primary diagnosis is displayed",
    )?;
    h.assert_exists(
        format!(".secondary-diagnosis:contains({})", SECONDARY_DIAGNOSIS),
        "Secondary diagnosis is displayed",
    )?;

    h.assert_exists(
        ".test-opd-procedure .test-opd-procedure-label:contains(Procedures)",
        "Procedures label displayed",
    )?;
    h.assert_contains_text(
        ".test-opd-procedure .test-opd-procedure-data",
        OPD_PROCEDURE_DESCRIPTION,
        "OPD Procedure is displayed",
    )?;
    h.assert_exists(".test-labs .test-labs-label:contains(Labs)", "Labs label displayed")?;
    h.assert_contains_text(".test-labs .test-labs-data", LAB_TYPE, "Lab request is displayed")?;
    h.assert_exists(".test-images .test-images-label:contains(Images)", "Images label displayed")?;
    h.assert_contains_text(
        ".test-images .test-images-data",
        IMAGING_TYPE,
        "Image request is displayed",
    )?;

    h.assert_exists(
        ".test-operative-plan .test-operative-plan-label:contains(Operative Plan)",
        "Operative plan label displayed",
    )?;
    h.assert_exists(
        ".test-operative-plan .test-operative-plan-description-label:contains(Operation Description:)",
        "Operation description label displayed",
    )?;
    h.assert_text(
        ".test-operative-plan .test-operative-plan-description-data",
        OPERATION_DESCRIPTION,
        "Operation description is displayed",
    )?;
    h.assert_exists(
        ".test-operative-plan .test-operative-plan-procedures-label:contains(Planned Procedures:)",
        "Planned procedures label displayed",
    )?;
    h.assert_text(
        ".test-operative-plan .test-operative-plan-procedures-description",
        PROCEDURE_SPLINT,
        "Planned procedure is displayed",
    )?;
    h.assert_exists(
        ".test-operative-plan .test-operative-plan-instructions-label:contains(Instructions upon Admission:)",
        "Admission instructions label displayed",
    )?;
    h.assert_text(
        ".test-operative-plan .test-operative-plan-instructions-data",
        ADMISSION_INSTRUCTIONS,
        "Admission Instruction is displayed",
    )
}

pub fn check_discharge_report(h: &mut Harness<'_>) -> HarnessResult<()> {
    h.assert_exists(
        ".test-examiner .test-examiner-label:contains(Examiner)",
        "Examiner label displayed",
    )?;
    h.assert_text(".test-examiner .test-examiner-data", EXAMINER, "Examiner is displayed")?;
    h.assert_text(
        ".test-visit-date .test-visit-date-label",
        "Admission Date:",
        "Visit date label displays as admission",
    )?;
    h.assert_text(
        ".test-visit-date .test-visit-discharge-date-label",
        "Discharge Date:",
        "Discharge date label displays",
    )?;
    h.assert_exists(".test-notes .test-notes-label:contains(Notes)", "Notes label displayed")?;
    h.assert_contains_text(".test-notes .test-notes-data", NOTE_CONTENT, "Notes are displayed")
}

pub fn save_report(h: &mut Harness<'_>, report_type: &str) -> HarnessResult<()> {
    h.click(".panel-footer button:contains(Add)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(
        ".modal-title",
        "Report saved",
        &format!("{} report saved successfully", report_type),
    )?;

    h.click("button:contains(Ok)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.assert_text(
        ".view-current-title",
        &format!("{} Report", report_type),
        "Report title updated correctly",
    )?;
    h.assert_visible(
        ".panel-footer button:contains(Print)",
        "Print button is now visible",
    )?;

    h.click("button:contains(Return)")?;
    h.wait_for_url_containing("/visits/edit")?;
    h.assert_url_contains("/visits/edit", "Visit url is correct")
}

/// Reopen the saved report from the reports tab and check any custom forms
/// filled on its lab requests.
pub fn view_report(
    h: &mut Harness<'_>,
    report_type: &str,
    custom_forms: &[CustomFormCase],
) -> HarnessResult<()> {
    h.click(Locator::test_selector("reports-tab"))?;
    h.wait_to_appear(Locator::test_selector("view-report-btn"))?;
    h.click(Locator::test_selector("view-report-btn"))?;

    h.assert_url_contains("visits/reports/edit", "Edit report url is correct")?;
    h.assert_text(".patient-name .ps-info-data", PATIENT, "Patient record displays")?;
    h.assert_text(
        ".view-current-title",
        &format!("{} Report", report_type),
        "Report title displayed correctly",
    )?;
    h.assert_visible(".panel-footer button:contains(Print)", "Print button is visible")?;

    for form in custom_forms {
        check_custom_form_is_filled_and_readonly(h, &form.name())?;
    }
    h.settled()
}

/// Save a request page, dismiss the confirmation and return to the visit.
pub fn update_visit_data(h: &mut Harness<'_>, modal_title: &str) -> HarnessResult<()> {
    h.click(".panel-footer button:contains(Add)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(
        ".modal-title",
        modal_title,
        &format!("{} modal displays", modal_title),
    )?;

    h.click(".modal-footer button:contains(Ok)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.click("button:contains(Return)")?;
    h.wait_for_url_containing("/visits/edit")?;
    h.assert_url_contains("/visits/edit/", "Returns back to visit URL")
}

/// Save the visit form with the footer button labelled `button`, optionally
/// switching the visit type first.
pub fn update_visit(
    h: &mut Harness<'_>,
    button: &str,
    visit_type: Option<&str>,
) -> HarnessResult<()> {
    if let Some(visit_type) = visit_type {
        h.select("select[id*=\"visitType\"]", visit_type)?;
        h.wait_to_disappear("label[for*=\"display_endDate\"]")?;
    }
    h.click(format!(".panel-footer button:contains({})", button))?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Visit Saved", "Visit Saved dialog displays")?;
    h.click("button:contains(Ok)")
}

fn edit_visit(h: &mut Harness<'_>) -> HarnessResult<()> {
    let visit_url = format!("/visits/edit/{}", SEEDED_VISIT);

    open_patient_visits(h, "#visits button:contains(Edit)")?;
    h.click("#visits button:contains(Edit)")?;
    h.wait_for_url(&visit_url)?;
    h.assert_url(&visit_url, "Visit url is correct")?;

    h.click("a:contains(Add Allergy)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Allergy", "Add Allergy dialog displays")?;
    h.fill_in(".test-allergy input", "Oatmeal")?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.assert_count("a.allergy-button:contains(Oatmeal)", 1, "New allergy appears")?;

    h.click("a:contains(Add Diagnosis)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Diagnosis", "Add Diagnosis dialog displays")?;
    h.fill_in(".diagnosis-text input", "Broken Arm")?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_appear("a.primary-diagnosis")?;
    h.assert_count(
        "a.primary-diagnosis:contains(Broken Arm)",
        1,
        "New primary diagnosis appears",
    )?;

    for (button, path, what) in [
        ("New Medication", "medication", "medication"),
        ("New Lab", "labs", "lab"),
        ("New Imaging", "imaging", "imaging"),
    ] {
        let url = format!("/{}/edit/new?forVisitId={}", path, SEEDED_VISIT);
        h.click(format!("button:contains({})", button))?;
        h.wait_for_url(&url)?;
        h.assert_url(&url, &format!("New {} url is correct", what))?;
        h.assert_text(
            ".patient-name .ps-info-data",
            PATIENT,
            &format!("New {} prepopulates with patient", what),
        )?;
        h.click("button:contains(Cancel)")?;
        h.wait_for_url(&visit_url)?;
    }

    h.click("button:contains(New Vitals)")?;
    h.wait_to_appear(".modal-dialog")?;
    for input in VITALS_INPUTS {
        h.fill_in(input, VITALS_VALUE)?;
    }
    h.click(".modal-footer button:contains(Add)")?;
    let new_vitals = format!("#visit-vitals tr:last td:contains({})", VITALS_VALUE);
    h.wait_to_appear(&new_vitals)?;
    h.assert_count(&new_vitals, 7, "New vitals appears")?;

    h.click("button:contains(Add Item)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.type_ahead(".charge-item-name", "Gauze pad")?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.wait_to_appear("td.charge-item-name")?;
    h.assert_text("td.charge-item-name", "Gauze pad", "New charge item appears")?;

    update_visit(h, "Update", None)?;

    h.click("a.primary-diagnosis:contains(Broken Arm)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Edit Diagnosis", "Edit Diagnosis modal appears")?;
    h.assert_count(".modal-footer button:contains(Delete)", 1, "Delete button appears")?;
    h.click(".modal-footer button:contains(Delete)")?;
    h.wait_to_disappear(".modal-dialog")?;

    h.click("#visit-vitals tr:last button:contains(Delete)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Delete Vitals", "Delete Vitals dialog displays")?;
    h.click(".modal-footer button:contains(Delete)")?;

    h.click(Locator::test_selector("charges-tab"))?;
    h.click(".charge-items tr:last button:contains(Delete)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Delete Charge Item", "Delete Charge Item dialog displays")?;
    h.click(".modal-footer button:contains(Ok)")?;
    h.wait_to_disappear(".modal-dialog")?;

    h.assert_count(
        "a.primary-diagnosis:contains(Broken Arm)",
        0,
        "New primary diagnosis is deleted",
    )?;
    h.assert_count(&new_vitals, 0, "Vital is deleted")?;
    h.assert_absent("td.charge-item-name", "Charge item is deleted")
}

fn delete_visit(h: &mut Harness<'_>) -> HarnessResult<()> {
    open_patient_visits(h, "#visits button:contains(Delete)")?;
    h.assert_count("#visits tr", 2, "One visit is displayed to delete")?;

    h.click("#visits button:contains(Delete)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Delete Visit", "Delete Visit confirmation displays")?;
    h.click(".modal-footer button:contains(Delete)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.wait_to_disappear(format!("#visits td:contains({})", SEEDED_DIAGNOSIS))?;
    h.assert_count("#visits tr", 1, "Visit is deleted")
}
