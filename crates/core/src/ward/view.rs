//! Markup for every route. Class names and `data-test-selector` hooks are
//! the contract the scenarios are written against.

use super::action::ModalKind;
use super::records::{
    self, CustomForm, Imaging, Lab, OperativePlan, Patient, Procedure, Report, Visit, Vitals,
};
use super::route::Route;
use super::{custom_field_name, Form, Menu, Scope, WardApp, CUSTOM_FORM_TYPES, VISIT_TYPES};
use crate::error::HarnessResult;

pub fn render(app: &WardApp) -> HarnessResult<String> {
    let (title, body) = match &app.route {
        Route::Index | Route::Login => login(app),
        Route::Patients => patients(app)?,
        Route::Patient { id } => patient(app, id)?,
        Route::NewVisit { patient_id } => visit(app, patient_id, None)?,
        Route::Visit { id } => match records::load::<Visit>(&app.store, id)? {
            Some(record) => visit(app, &record.patient, Some((id.as_str(), &record)))?,
            None => not_found(&app.url),
        },
        Route::NewMedication { visit_id } => medication(app, visit_id)?,
        Route::NewLab { visit_id } => lab(app, visit_id)?,
        Route::NewImaging { visit_id } => imaging(app, visit_id)?,
        Route::NewAppointment { visit_id } => appointment(app, visit_id)?,
        Route::NewOperativePlan { visit_id } => operative_plan(app, visit_id)?,
        Route::NewProcedure { visit_id } => procedure(app, visit_id)?,
        Route::NewReport { visit_id } => report(app, visit_id, false)?,
        Route::Report { id } => match records::load::<Report>(&app.store, id)? {
            Some(saved) => report(app, &saved.visit, true)?,
            None => not_found(&app.url),
        },
        Route::NewCustomForm => custom_form_editor(app)?,
        Route::NotFound(path) => not_found(path),
    };

    let mut html = String::from("<!DOCTYPE html><html><head><title>HospitalRun</title></head><body>");
    html.push_str("<nav class=\"navbar\"><span class=\"navbar-brand\">HospitalRun</span>");
    if let Some(user) = &app.user {
        html.push_str(&format!("<span class=\"current-user\">{}</span>", esc(user)));
    }
    html.push_str("</nav><section class=\"view\">");
    html.push_str(&format!("<h1 class=\"view-current-title\">{}</h1>", esc(&title)));
    html.push_str(&body);
    html.push_str("</section>");
    if let Some(modal) = &app.modal {
        html.push_str(&dialog(app, &modal.kind, &modal.form)?);
    }
    html.push_str("</body></html>");
    Ok(html)
}

/// "OPD" or "Discharge", depending on the visit.
pub fn report_type(visit: &Visit) -> &'static str {
    if visit.is_admission() {
        "Discharge"
    } else {
        "OPD"
    }
}

fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A button dispatching `action`. An empty `arg` is left off.
fn button(label: &str, action: &str, arg: &str, class: &str) -> String {
    let arg = if arg.is_empty() {
        String::new()
    } else {
        format!(" data-arg=\"{}\"", esc(arg))
    };
    format!(
        "<button type=\"button\" class=\"btn {}\" data-action=\"{}\"{}>{}</button>",
        class,
        action,
        arg,
        esc(label)
    )
}

fn test_button(hook: &str, label: &str, action: &str, arg: &str) -> String {
    format!(
        "<button type=\"button\" class=\"btn btn-primary\" data-test-selector=\"{}\" data-action=\"{}\" data-arg=\"{}\">{}</button>",
        hook,
        action,
        esc(arg),
        esc(label)
    )
}

fn link(label: &str, class: &str, action: &str, arg: &str) -> String {
    format!(
        "<a href=\"#\" class=\"{}\" data-action=\"{}\" data-arg=\"{}\">{}</a>",
        class,
        action,
        esc(arg),
        esc(label)
    )
}

fn focus_attr(app: &WardApp, name: &str) -> &'static str {
    if app.screen.focused.as_deref() == Some(name) {
        " autofocus"
    } else {
        ""
    }
}

fn text_input(app: &WardApp, class: &str, label: &str, name: &str, form: &Form) -> String {
    format!(
        "<div class=\"form-group {}\"><label>{}</label><input type=\"text\" class=\"form-control\" name=\"{}\" value=\"{}\"{}></div>",
        class,
        esc(label),
        name,
        esc(form.value(name)),
        focus_attr(app, name)
    )
}

fn textarea(app: &WardApp, class: &str, label: &str, name: &str, form: &Form) -> String {
    format!(
        "<div class=\"form-group {}\"><label>{}</label><textarea class=\"form-control\" name=\"{}\"{}>{}</textarea></div>",
        class,
        esc(label),
        name,
        focus_attr(app, name),
        esc(form.value(name))
    )
}

fn checkbox(class: &str, label: &str, name: &str, form: &Form) -> String {
    let checked = if form.is_checked(name) { " checked" } else { "" };
    format!(
        "<div class=\"checkbox {}\"><label><input type=\"checkbox\" name=\"{}\"{}> {}</label></div>",
        class,
        name,
        checked,
        esc(label)
    )
}

fn select(attrs: &str, name: &str, options: &[&str], selected: &str) -> String {
    let mut out = format!("<select class=\"form-control\" {} name=\"{}\">", attrs, name);
    for option in options {
        let mark = if *option == selected { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            esc(option),
            mark,
            esc(option)
        ));
    }
    out.push_str("</select>");
    out
}

/// A type-ahead input, with its suggestion menu when one is open for it.
fn typeahead(
    app: &WardApp,
    class: &str,
    label: &str,
    name: &str,
    scope: Scope,
    form: &Form,
) -> String {
    let mut out = format!(
        "<div class=\"form-group {}\"><label>{}</label><span class=\"twitter-typeahead\">",
        class,
        esc(label)
    );
    out.push_str(&format!(
        "<input type=\"text\" class=\"form-control tt-input\" name=\"{}\" value=\"{}\" autocomplete=\"off\"{}>",
        name,
        esc(form.value(name)),
        focus_attr(app, name)
    ));
    if let Some(Menu {
        field,
        scope: menu_scope,
        suggestions,
    }) = &app.menu
    {
        if field == name && *menu_scope == scope {
            out.push_str("<div class=\"tt-menu tt-open\"><div class=\"tt-dataset\">");
            for suggestion in suggestions {
                out.push_str(&format!(
                    "<div class=\"tt-suggestion tt-selectable\" data-action=\"pick\" data-arg=\"{}\">{}</div>",
                    esc(suggestion),
                    esc(suggestion)
                ));
            }
            out.push_str("</div></div>");
        }
    }
    out.push_str("</span></div>");
    out
}

fn patient_header(patient: &Patient) -> String {
    format!(
        "<div class=\"panel patient-summary\">\
         <div class=\"patient-name\"><label class=\"ps-info-label\">Name</label><span class=\"ps-info-data\">{}</span></div>\
         <div class=\"patient-id\"><label class=\"ps-info-label\">Patient Id</label><span class=\"ps-info-data\">{}</span></div>\
         </div>",
        esc(&patient.display_name()),
        esc(&patient.friendly_id)
    )
}

fn loading() -> String {
    "<div class=\"loading-message\">Loading...</div>".to_string()
}

/// Patient for a page that belongs to a visit.
fn visit_patient(app: &WardApp, visit_id: &str) -> HarnessResult<Option<(Visit, Patient)>> {
    let Some(visit) = records::load::<Visit>(&app.store, visit_id)? else {
        return Ok(None);
    };
    Ok(records::load::<Patient>(&app.store, &visit.patient)?.map(|p| (visit, p)))
}

fn panel_footer(app: &WardApp, back: &str) -> String {
    let mut out = String::from("<div class=\"panel-footer\">");
    if app.screen.saved.is_some() {
        out.push_str(&button("Return", "navigate", back, "btn-default"));
        out.push_str(&button("Update", "save", "", "btn-primary"));
    } else {
        out.push_str(&button("Cancel", "navigate", back, "btn-default"));
        out.push_str(&button("Add", "save", "", "btn-primary"));
    }
    out.push_str("</div>");
    out
}

fn not_found(path: &str) -> (String, String) {
    (
        "Not Found".to_string(),
        format!("<p class=\"not-found\">Nothing lives at {}</p>", esc(path)),
    )
}

fn login(app: &WardApp) -> (String, String) {
    let body = if app.user.is_some() {
        "<p class=\"signed-in\">You are signed in.</p>".to_string()
    } else {
        "<form class=\"login-form\"><p>Please sign in</p>\
         <input type=\"text\" name=\"identification\"><input type=\"password\" name=\"password\"></form>"
            .to_string()
    };
    ("Login".to_string(), body)
}

fn patients(app: &WardApp) -> HarnessResult<(String, String)> {
    let mut body = String::from(
        "<table class=\"table patient-list\"><thead><tr><th>Id</th><th>Name</th><th>Sex</th><th>Actions</th></tr></thead><tbody>",
    );
    for (key, patient) in records::all::<Patient>(&app.store)? {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(&patient.friendly_id),
            esc(&patient.display_name()),
            esc(&patient.sex),
            button("Edit", "navigate", &format!("/patients/edit/{}", key), "btn-default")
        ));
    }
    body.push_str("</tbody></table>");
    Ok(("Patient Listing".to_string(), body))
}

fn tabs(active: &str, names: &[(&str, &str)]) -> String {
    let mut out = String::from("<ul class=\"nav nav-tabs\">");
    for (name, label) in names {
        let class = if *name == active { " class=\"active\"" } else { "" };
        out.push_str(&format!(
            "<li{}><a href=\"#\" data-test-selector=\"{}-tab\" data-action=\"tab\" data-arg=\"{}\">{}</a></li>",
            class, name, name, label
        ));
    }
    out.push_str("</ul>");
    out
}

fn patient(app: &WardApp, id: &str) -> HarnessResult<(String, String)> {
    let Some(patient) = records::load::<Patient>(&app.store, id)? else {
        return Ok(not_found(&app.url));
    };

    let mut body = patient_header(&patient);
    body.push_str(&tabs(
        &app.screen.tab,
        &[("general", "General"), ("visits", "Visits")],
    ));
    body.push_str("<div class=\"tab-content\">");
    if app.screen.tab == "visits" {
        if app.screen.loaded {
            body.push_str(&visit_list(app, id)?);
        } else {
            body.push_str(&loading());
        }
    } else if app.screen.pane_ready {
        body.push_str(&format!(
            "<div class=\"patient-general\"><p class=\"patient-sex\">{}</p><p class=\"patient-dob\">{}</p></div>",
            esc(&patient.sex),
            esc(&patient.date_of_birth)
        ));
    }
    body.push_str("</div>");
    Ok(("Edit Patient".to_string(), body))
}

fn visit_list(app: &WardApp, patient_id: &str) -> HarnessResult<String> {
    let mut out = String::from("<div id=\"visits\">");
    out.push_str(&button(
        "New Visit",
        "navigate",
        &format!("/visits/edit/new?forPatientId={}", patient_id),
        "btn-primary",
    ));
    out.push_str(
        "<table class=\"table\"><thead><tr><th>Date</th><th>Type</th><th>Location</th><th>Diagnosis</th><th>Actions</th></tr></thead><tbody>",
    );
    for (key, visit) in records::all::<Visit>(&app.store)? {
        if visit.patient != patient_id {
            continue;
        }
        let dates = if visit.end_date.is_empty() {
            visit.start_date.clone()
        } else {
            format!("{} - {}", visit.start_date, visit.end_date)
        };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}{}</td></tr>",
            esc(&dates),
            esc(&visit.visit_type),
            esc(&visit.location),
            esc(&visit.diagnosis_summary()),
            button("Edit", "navigate", &format!("/visits/edit/{}", key), "btn-default"),
            button("Delete", "modal", &format!("delete-visit:{}", key), "btn-danger")
        ));
    }
    out.push_str("</tbody></table></div>");
    Ok(out)
}

fn visit(
    app: &WardApp,
    patient_id: &str,
    saved: Option<(&str, &Visit)>,
) -> HarnessResult<(String, String)> {
    let title = if saved.is_some() { "Edit Visit" } else { "New Visit" };
    let Some(patient) = records::load::<Patient>(&app.store, patient_id)? else {
        return Ok(not_found(&app.url));
    };

    let mut body = patient_header(&patient);
    if !app.screen.loaded {
        body.push_str(&loading());
        return Ok((title.to_string(), body));
    }

    let form = &app.screen.form;
    body.push_str("<div id=\"visit-info\" class=\"panel\">");
    body.push_str(&format!(
        "<div class=\"form-group\"><label for=\"visit-visitType\">Visit Type</label>{}</div>",
        select("id=\"visit-visitType\"", "visitType", VISIT_TYPES, form.value("visitType"))
    ));
    body.push_str(&format!(
        "<div class=\"form-group\"><label for=\"display_startDate\">Check In</label><input type=\"text\" id=\"display_startDate\" class=\"form-control\" name=\"startDate\" value=\"{}\"></div>",
        esc(form.value("startDate"))
    ));
    if app.screen.end_date_shown {
        body.push_str(&format!(
            "<div class=\"form-group\"><label for=\"display_endDate\">Check Out</label><input type=\"text\" id=\"display_endDate\" class=\"form-control\" name=\"endDate\" value=\"{}\"></div>",
            esc(form.value("endDate"))
        ));
    }
    body.push_str(&typeahead(app, "visit-location", "Location", "location", Scope::Page, form));
    body.push_str(&typeahead(app, "visit-examiner", "Examiner", "examiner", Scope::Page, form));
    body.push_str("</div>");

    let back = format!("/patients/edit/{}", patient_id);
    let Some((key, record)) = saved else {
        body.push_str(&panel_footer(app, &back));
        return Ok((title.to_string(), body));
    };

    body.push_str("<div class=\"patient-allergies\"><label>Allergies</label>");
    for allergy in &patient.allergies {
        body.push_str(&format!(
            "<a href=\"#\" class=\"allergy-button\">{}</a>",
            esc(allergy)
        ));
    }
    body.push_str(&link("Add Allergy", "add-allergy", "modal", "allergy"));
    body.push_str("</div>");

    body.push_str("<div class=\"visit-diagnoses\"><label>Diagnoses</label>");
    for (index, diagnosis) in record.diagnoses.iter().enumerate() {
        let class = if diagnosis.secondary {
            "secondary-diagnosis"
        } else {
            "primary-diagnosis"
        };
        body.push_str(&link(
            &diagnosis.description,
            class,
            "modal",
            &format!("edit-diagnosis:{}", index),
        ));
    }
    body.push_str(&link("Add Diagnosis", "add-diagnosis", "modal", "diagnosis"));
    body.push_str("</div>");

    body.push_str("<div class=\"visit-operative-plan\">");
    body.push_str(&link(
        "Add Operative Plan",
        "add-operative-plan",
        "navigate",
        &format!("/patients/operative-plan/new?forVisitId={}", key),
    ));
    body.push_str("</div>");

    body.push_str("<div class=\"visit-actions\">");
    for (label, path) in [
        ("New Medication", "medication/edit/new"),
        ("New Lab", "labs/edit/new"),
        ("New Imaging", "imaging/edit/new"),
        ("New Appointment", "appointments/edit/new"),
    ] {
        let route = format!("/{}?forVisitId={}", path, key);
        body.push_str(&button(label, "navigate", &route, "btn-default"));
    }
    body.push_str(&button("New Vitals", "modal", "vitals", "btn-default"));
    body.push_str("</div>");

    body.push_str("<table id=\"visit-vitals\" class=\"table\"><thead><tr>");
    for (_, heading, _) in Vitals::FIELDS {
        body.push_str(&format!("<th>{}</th>", heading));
    }
    body.push_str("<th>Actions</th></tr></thead><tbody>");
    for (index, vitals) in record.vitals.iter().enumerate() {
        body.push_str("<tr>");
        for value in vitals.values() {
            body.push_str(&format!("<td>{}</td>", esc(value)));
        }
        body.push_str(&format!(
            "<td>{}</td></tr>",
            button("Delete", "modal", &format!("delete-vitals:{}", index), "btn-danger")
        ));
    }
    body.push_str("</tbody></table>");

    body.push_str(&tabs(
        &app.screen.tab,
        &[
            ("charges", "Charges"),
            ("procedures", "Procedures"),
            ("notes", "Notes"),
            ("reports", "Reports"),
        ],
    ));
    body.push_str("<div class=\"tab-content\">");
    if app.screen.pane_ready {
        body.push_str(&visit_pane(app, key, record)?);
    } else {
        body.push_str(&loading());
    }
    body.push_str("</div>");

    body.push_str(&panel_footer_saved(&back));
    Ok((title.to_string(), body))
}

/// A saved visit always offers Return/Update.
fn panel_footer_saved(back: &str) -> String {
    format!(
        "<div class=\"panel-footer\">{}{}</div>",
        button("Return", "navigate", back, "btn-default"),
        button("Update", "save", "", "btn-primary")
    )
}

fn visit_pane(app: &WardApp, key: &str, record: &Visit) -> HarnessResult<String> {
    let mut out = String::new();
    match app.screen.tab.as_str() {
        "procedures" => {
            out.push_str(&test_button(
                "new-procedure-btn",
                "New Procedure",
                "navigate",
                &format!("/visits/procedures/edit/new?forVisitId={}", key),
            ));
            out.push_str("<table class=\"table procedure-list\"><tbody>");
            for (_, procedure) in records::all::<Procedure>(&app.store)? {
                if procedure.visit == key {
                    out.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td></tr>",
                        esc(&procedure.description),
                        esc(&procedure.physician)
                    ));
                }
            }
            out.push_str("</tbody></table>");
        }
        "notes" => {
            out.push_str(&test_button("new-note-btn", "New Note", "modal", "note"));
            out.push_str("<div class=\"visit-notes\">");
            for note in &record.notes {
                out.push_str(&format!("<p class=\"note-content\">{}</p>", esc(note)));
            }
            out.push_str("</div>");
        }
        "reports" => {
            let existing = records::all::<Report>(&app.store)?
                .into_iter()
                .find(|(_, report)| report.visit == key);
            match existing {
                Some((report_key, _)) => out.push_str(&test_button(
                    "view-report-btn",
                    "View Report",
                    "navigate",
                    &format!("/visits/reports/edit/{}", report_key),
                )),
                None => out.push_str(&test_button(
                    "report-btn",
                    &format!("New {} Report", report_type(record)),
                    "navigate",
                    &format!("/visits/reports/edit/new?forVisitId={}", key),
                )),
            }
        }
        _ => {
            out.push_str(&button("Add Item", "modal", "charge", "btn-default"));
            out.push_str(
                "<table class=\"table charge-items\"><thead><tr><th>Item</th><th>Quantity</th><th>Actions</th></tr></thead><tbody>",
            );
            for (index, charge) in record.charges.iter().enumerate() {
                out.push_str(&format!(
                    "<tr><td class=\"charge-item-name\">{}</td><td class=\"charge-item-quantity\">{}</td><td>{}</td></tr>",
                    esc(&charge.name),
                    charge.quantity,
                    button("Delete", "modal", &format!("delete-charge:{}", index), "btn-danger")
                ));
            }
            out.push_str("</tbody></table>");
        }
    }
    Ok(out)
}

/// Shared frame of the pages that add something to a visit.
fn visit_child(
    app: &WardApp,
    visit_id: &str,
    title: &str,
    content: impl FnOnce(&mut String) -> HarnessResult<()>,
) -> HarnessResult<(String, String)> {
    let Some((_, patient)) = visit_patient(app, visit_id)? else {
        return Ok(not_found(&app.url));
    };
    let mut body = patient_header(&patient);
    body.push_str("<div class=\"panel panel-body\">");
    content(&mut body)?;
    body.push_str("</div>");
    body.push_str(&panel_footer(app, &format!("/visits/edit/{}", visit_id)));
    Ok((title.to_string(), body))
}

fn medication(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    visit_child(app, visit_id, "New Medication Request", |body| {
        body.push_str(&text_input(app, "test-medication-input", "Medication", "medication", form));
        body.push_str(&textarea(app, "test-medication-prescription", "Prescription", "prescription", form));
        Ok(())
    })
}

fn lab(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    visit_child(app, visit_id, "New Lab Request", |body| {
        body.push_str(&typeahead(app, "test-lab-type", "Lab Type", "labType", Scope::Page, form));
        body.push_str("<div class=\"custom-forms\">");
        for name in &app.screen.custom_forms {
            let fields = records::all::<CustomForm>(&app.store)?
                .into_iter()
                .map(|(_, f)| f)
                .find(|f| &f.name == name)
                .map(|f| f.fields)
                .unwrap_or_default();
            let values: Vec<(String, String)> = fields
                .into_iter()
                .map(|label| {
                    let value = form.value(&custom_field_name(name, &label)).to_string();
                    (label, value)
                })
                .collect();
            body.push_str(&custom_form_block(name, &values, false));
        }
        body.push_str(&button("Add Form", "modal", "custom-form", "btn-default"));
        body.push_str("</div>");
        Ok(())
    })
}

/// A custom form's fields. Read-only blocks render disabled inputs.
fn custom_form_block(name: &str, values: &[(String, String)], read_only: bool) -> String {
    let mut out = format!(
        "<div class=\"custom-form\" data-test-custom-form=\"{}\"><h4>{}</h4>",
        esc(name),
        esc(name)
    );
    for (label, value) in values {
        let input_name = custom_field_name(name, label);
        out.push_str(&format!(
            "<div class=\"form-group custom-form-field\"><label>{}</label><input type=\"text\" class=\"form-control\" name=\"{}\" value=\"{}\"{}></div>",
            esc(label),
            esc(&input_name),
            esc(value),
            if read_only { " disabled" } else { "" }
        ));
    }
    out.push_str("</div>");
    out
}

fn imaging(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    visit_child(app, visit_id, "New Imaging Request", |body| {
        body.push_str(&typeahead(
            app,
            "imaging-type-input",
            "Imaging Type",
            "imagingType",
            Scope::Page,
            form,
        ));
        Ok(())
    })
}

fn appointment(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    visit_child(app, visit_id, "New Appointment", |body| {
        body.push_str(&checkbox("appointment-all-day", "All Day", "allDay", form));
        body.push_str(&text_input(app, "test-appointment-start", "Start Date", "startDate", form));
        body.push_str(&text_input(app, "test-appointment-end", "End Date", "endDate", form));
        Ok(())
    })
}

fn operative_plan(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    let title = if app.screen.saved.is_some() {
        "Edit Operative Plan"
    } else {
        "New Operative Plan"
    };
    visit_child(app, visit_id, title, |body| {
        body.push_str(&textarea(
            app,
            "operation-description",
            "Operation Description",
            "operationDescription",
            form,
        ));
        body.push_str(&typeahead(
            app,
            "procedure-description",
            "Planned Procedure",
            "plannedProcedure",
            Scope::Page,
            form,
        ));
        body.push_str(&button("Add Procedure", "add-procedure", "", "btn-default"));
        body.push_str("<table class=\"table procedure-listing\"><tbody>");
        for procedure in &app.screen.items {
            body.push_str(&format!(
                "<tr><td class=\"procedure-description\">{}</td></tr>",
                esc(procedure)
            ));
        }
        body.push_str("</tbody></table>");
        body.push_str(&textarea(
            app,
            "admission-instructions",
            "Instructions upon Admission",
            "admissionInstructions",
            form,
        ));
        Ok(())
    })
}

fn procedure(app: &WardApp, visit_id: &str) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    visit_child(app, visit_id, "New Procedure", |body| {
        body.push_str(&typeahead(
            app,
            "procedure-description",
            "Procedure",
            "procedureDescription",
            Scope::Page,
            form,
        ));
        body.push_str(&typeahead(
            app,
            "procedure-physician",
            "Physician",
            "procedurePhysician",
            Scope::Page,
            form,
        ));
        Ok(())
    })
}

fn labelled(section: &str, label: &str, data: &str) -> String {
    format!(
        "<div class=\"{0}\"><label class=\"{0}-label\">{1}</label><span class=\"{0}-data\">{2}</span></div>",
        section,
        esc(label),
        esc(data)
    )
}

fn report(app: &WardApp, visit_id: &str, saved: bool) -> HarnessResult<(String, String)> {
    let Some((visit, patient)) = visit_patient(app, visit_id)? else {
        return Ok(not_found(&app.url));
    };
    let kind = report_type(&visit);
    let title = if saved {
        format!("{} Report", kind)
    } else {
        format!("New {} Report", kind)
    };

    let mut body = patient_header(&patient);
    body.push_str("<div class=\"panel report-body\">");

    if visit.is_admission() {
        body.push_str(&format!(
            "<div class=\"test-visit-date\"><label class=\"test-visit-date-label\">Admission Date:</label><span class=\"test-visit-date-data\">{}</span><label class=\"test-visit-discharge-date-label\">Discharge Date:</label><span class=\"test-visit-discharge-date-data\">{}</span></div>",
            esc(&visit.start_date),
            esc(&visit.end_date)
        ));
    } else {
        body.push_str(&labelled("test-visit-date", "Date of Visit:", &visit.start_date));
        body.push_str(&labelled("test-visit-type", "Visit Type:", &visit.visit_type));
    }
    body.push_str(&labelled("test-examiner", "Examiner:", &visit.examiner));
    body.push_str(&labelled("test-location", "Visit Location:", &visit.location));

    body.push_str("<div class=\"test-diagnoses\"><label class=\"test-diagnoses-label\">Diagnoses:</label>");
    for diagnosis in &visit.diagnoses {
        let class = if diagnosis.secondary {
            "secondary-diagnosis"
        } else {
            "primary-diagnosis"
        };
        body.push_str(&format!(
            "<span class=\"{}\">{}</span>",
            class,
            esc(&diagnosis.description)
        ));
    }
    body.push_str("</div>");

    if visit.is_admission() {
        body.push_str("<div class=\"test-notes\"><label class=\"test-notes-label\">Notes:</label><div class=\"test-notes-data\">");
        for note in &visit.notes {
            body.push_str(&format!("<p>{}</p>", esc(note)));
        }
        body.push_str("</div></div>");
    } else {
        let procedures: Vec<String> = records::all::<Procedure>(&app.store)?
            .into_iter()
            .filter(|(_, p)| p.visit == visit_id)
            .map(|(_, p)| p.description)
            .collect();
        body.push_str(&labelled("test-opd-procedure", "Procedures:", &procedures.join(", ")));

        let labs: Vec<Lab> = records::all::<Lab>(&app.store)?
            .into_iter()
            .filter(|(_, l)| l.visit == visit_id)
            .map(|(_, l)| l)
            .collect();
        let lab_types: Vec<&str> = labs.iter().map(|l| l.lab_type.as_str()).collect();
        body.push_str(&labelled("test-labs", "Labs:", &lab_types.join(", ")));

        let images: Vec<String> = records::all::<Imaging>(&app.store)?
            .into_iter()
            .filter(|(_, i)| i.visit == visit_id)
            .map(|(_, i)| i.imaging_type)
            .collect();
        body.push_str(&labelled("test-images", "Images:", &images.join(", ")));

        let plan = records::all::<OperativePlan>(&app.store)?
            .into_iter()
            .map(|(_, p)| p)
            .find(|p| p.visit == visit_id);
        if let Some(plan) = plan {
            body.push_str(&format!(
                "<div class=\"test-operative-plan\"><label class=\"test-operative-plan-label\">Operative Plan</label>\
                 <label class=\"test-operative-plan-description-label\">Operation Description:</label><span class=\"test-operative-plan-description-data\">{}</span>\
                 <label class=\"test-operative-plan-procedures-label\">Planned Procedures:</label><span class=\"test-operative-plan-procedures-description\">{}</span>\
                 <label class=\"test-operative-plan-instructions-label\">Instructions upon Admission:</label><span class=\"test-operative-plan-instructions-data\">{}</span></div>",
                esc(&plan.operation_description),
                esc(&plan.procedures.join(", ")),
                esc(&plan.admission_instructions)
            ));
        }

        body.push_str("<div class=\"custom-forms\">");
        for filled in labs.iter().flat_map(|l| l.custom_forms.iter()) {
            body.push_str(&custom_form_block(&filled.name, &filled.values, true));
        }
        body.push_str("</div>");
    }
    body.push_str("</div>");

    let back = format!("/visits/edit/{}", visit_id);
    body.push_str("<div class=\"panel-footer\">");
    if saved {
        body.push_str(&button("Return", "navigate", &back, "btn-default"));
        body.push_str(&button("Update", "save", "", "btn-primary"));
        body.push_str(&button("Print", "print", "", "btn-default"));
    } else {
        body.push_str(&button("Cancel", "navigate", &back, "btn-default"));
        body.push_str(&button("Add", "save", "", "btn-primary"));
        body.push_str(&button("Print", "print", "", "btn-default hidden"));
    }
    body.push_str("</div>");
    Ok((title, body))
}

fn custom_form_editor(app: &WardApp) -> HarnessResult<(String, String)> {
    let form = &app.screen.form;
    let title = if app.screen.saved.is_some() {
        "Edit Custom Form"
    } else {
        "New Custom Form"
    };

    let mut body = String::from("<div class=\"panel panel-body\">");
    body.push_str(&text_input(app, "custom-form-name", "Form Name", "formName", form));
    body.push_str(&format!(
        "<div class=\"form-group custom-form-type\"><label>Form Type</label>{}</div>",
        select("", "formType", CUSTOM_FORM_TYPES, form.value("formType"))
    ));
    body.push_str(&checkbox(
        "custom-form-always-include",
        "Always Include",
        "alwaysInclude",
        form,
    ));
    body.push_str("<table class=\"table custom-form-fields\"><tbody>");
    for label in &app.screen.items {
        body.push_str(&format!(
            "<tr><td class=\"custom-field-name\">{}</td></tr>",
            esc(label)
        ));
    }
    body.push_str("</tbody></table>");
    body.push_str(&button("Add Field", "modal", "add-field", "btn-default"));
    body.push_str("</div>");
    body.push_str(&panel_footer(app, "/patients"));
    Ok((title.to_string(), body))
}

fn footer(buttons: Buttons) -> String {
    let mut out = String::from("<div class=\"modal-footer\">");
    for (label, action) in buttons {
        let class = if *action == "modal-close" {
            "btn-default"
        } else {
            "btn-primary"
        };
        out.push_str(&button(label, action, "", class));
    }
    out.push_str("</div>");
    out
}

type Buttons = &'static [(&'static str, &'static str)];

const ADD: Buttons = &[("Cancel", "modal-close"), ("Add", "modal-add")];
const EDIT: Buttons = &[
    ("Cancel", "modal-close"),
    ("Delete", "modal-confirm"),
    ("Update", "modal-add"),
];
const DELETE: Buttons = &[("Cancel", "modal-close"), ("Delete", "modal-confirm")];
const DELETE_OK: Buttons = &[("Cancel", "modal-close"), ("Ok", "modal-confirm")];
const OK: Buttons = &[("Ok", "modal-close")];

fn dialog(app: &WardApp, kind: &ModalKind, form: &Form) -> HarnessResult<String> {
    let (title, body, buttons): (String, String, Buttons) = match kind {
        ModalKind::Allergy => (
            "Add Allergy".to_string(),
            text_input(app, "test-allergy", "Name", "allergy", form),
            ADD,
        ),
        ModalKind::AddDiagnosis | ModalKind::EditDiagnosis(_) => {
            let mut body = text_input(app, "diagnosis-text", "Diagnosis", "diagnosis", form);
            body.push_str(&checkbox(
                "secondary-diagnosis",
                "Secondary Diagnosis",
                "secondary",
                form,
            ));
            if matches!(kind, ModalKind::AddDiagnosis) {
                ("Add Diagnosis".to_string(), body, ADD)
            } else {
                (
                    "Edit Diagnosis".to_string(),
                    body,
                    EDIT,
                )
            }
        }
        ModalKind::Vitals => {
            let mut body = String::new();
            for (name, heading, class) in Vitals::FIELDS {
                body.push_str(&text_input(app, class, heading, name, form));
            }
            ("Add Vitals".to_string(), body, ADD)
        }
        ModalKind::DeleteVitals(_) => (
            "Delete Vitals".to_string(),
            "<p>Are you sure you wish to delete these vitals?</p>".to_string(),
            DELETE,
        ),
        ModalKind::Charge => {
            let mut body = typeahead(app, "charge-item-name", "Item", "chargeItem", Scope::Modal, form);
            body.push_str(&text_input(app, "charge-item-quantity", "Quantity", "quantity", form));
            ("Add Charge Item".to_string(), body, ADD)
        }
        ModalKind::DeleteCharge(_) => (
            "Delete Charge Item".to_string(),
            "<p>Are you sure you wish to delete this charge item?</p>".to_string(),
            DELETE_OK,
        ),
        ModalKind::DeleteVisit(_) => (
            "Delete Visit".to_string(),
            "<p>Are you sure you wish to delete this visit?</p>".to_string(),
            DELETE,
        ),
        ModalKind::Note => {
            let name = match app.route.visit_id() {
                Some(visit_id) => visit_patient(app, visit_id)?
                    .map(|(_, patient)| patient.display_name())
                    .unwrap_or_default(),
                None => String::new(),
            };
            (
                format!("New Note for {}", name),
                textarea(app, "test-note-content", "Note", "noteContent", form),
                ADD,
            )
        }
        ModalKind::AddField => (
            "Add Field".to_string(),
            text_input(app, "custom-field-label", "Label", "label", form),
            ADD,
        ),
        ModalKind::AttachCustomForm => {
            let options = app.attachable_forms()?;
            let options: Vec<&str> = options.iter().map(|s| s.as_str()).collect();
            let body = format!(
                "<div class=\"form-group custom-form-select\"><label>Form</label>{}</div>",
                select("", "customForm", &options, form.value("customForm"))
            );
            ("Add Custom Form".to_string(), body, ADD)
        }
        ModalKind::Saved(title) => (
            title.clone(),
            "<p>The record has been saved.</p>".to_string(),
            OK,
        ),
    };

    Ok(format!(
        "<div class=\"modal-backdrop in\"></div><div class=\"modal fade in\" role=\"dialog\"><div class=\"modal-dialog\"><div class=\"modal-content\">\
         <div class=\"modal-header\"><h4 class=\"modal-title\">{}</h4></div>\
         <div class=\"modal-body\">{}</div>{}</div></div></div>",
        esc(&title),
        body,
        footer(buttons)
    ))
}
