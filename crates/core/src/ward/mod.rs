//! Reference ward application.
//!
//! An in-process stand-in for the hospital records front end. It renders
//! the routes and markup the visit scenarios rely on and keeps its data in a
//! [`DocStore`]. Work triggered by a click runs on a virtual clock: route
//! transitions, dialog open/close and deletes are tracked and finish on
//! [`Driver::settle`]; data loads, saves, debounced suggestions and
//! dependent form fields are untracked and only land once time advances.

pub mod action;
pub mod event_loop;
pub mod records;
pub mod route;
mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tracing::{debug, info, trace};

use self::action::{Action, ModalKind};
use self::event_loop::EventLoop;
use self::records::{
    Appointment, CustomForm, Diagnosis, FilledForm, Imaging, Lab, Lookup, Medication,
    OperativePlan, Patient, PricingItem, Procedure, Report, Visit, Vitals,
};
use self::route::Route;
use crate::dom::{self, Document, NodeId};
use crate::driver::Driver;
use crate::error::{HarnessError, HarnessResult};
use crate::fixture::{DocStore, FixtureSet};
use crate::page::{ElementHandle, Page};

/// Patient page visit list load.
pub const VISITS_LOAD_MS: u64 = 100;
/// Render of the new-visit form.
pub const VISIT_FORM_MS: u64 = 40;
/// Fields depending on the visit type.
pub const VISIT_TYPE_MS: u64 = 20;
pub const TYPEAHEAD_DEBOUNCE_MS: u64 = 300;
/// Content of a freshly selected tab.
pub const TAB_PANE_MS: u64 = 30;
pub const SAVE_MS: u64 = 50;
/// Add/Update inside a dialog.
pub const MODAL_COMMIT_MS: u64 = 50;

pub const VISIT_TYPES: &[&str] = &[
    "Admission",
    "Clinic",
    "Emergency",
    "Followup",
    "Imaging",
    "Lab",
    "Pharmacy",
];

pub const CUSTOM_FORM_TYPES: &[&str] = &["Visit", "Lab", "Imaging", "Operative Plan", "Patient"];

/// Fields the visit page saves as soon as they change.
const VISIT_FIELDS: &[&str] = &["visitType", "startDate", "endDate", "location", "examiner"];

#[derive(Debug, Clone, PartialEq)]
enum Effect {
    Navigate(String),
    LoadVisits,
    ShowVisitForm,
    ApplyVisitType,
    PaneReady,
    Suggest { field: String, scope: Scope },
    Pick { field: String, scope: Scope, value: String },
    OpenModal(ModalKind),
    CloseModal,
    CommitModal,
    ConfirmModal,
    Save,
    AddProcedure,
}

/// A queued effect and the page it was queued on. Effects queued on a page
/// the app has since navigated away from are dropped.
#[derive(Debug)]
struct Scheduled {
    generation: u64,
    effect: Effect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Page,
    Modal,
}

/// Values of the inputs on a page or in a dialog, keyed by input name.
#[derive(Debug, Default)]
struct Form {
    values: BTreeMap<String, String>,
    checked: BTreeSet<String>,
}

impl Form {
    fn value(&self, name: &str) -> &str {
        self.values.get(name).map(|v| v.as_str()).unwrap_or("")
    }

    fn trimmed(&self, name: &str) -> String {
        self.value(name).trim().to_string()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    fn is_checked(&self, name: &str) -> bool {
        self.checked.contains(name)
    }

    fn toggle(&mut self, name: &str) {
        if !self.checked.remove(name) {
            self.checked.insert(name.to_string());
        }
    }
}

/// Per-page state, dropped on navigation.
#[derive(Debug, Default)]
struct Screen {
    form: Form,
    /// Delayed content (visit list, new-visit form) has rendered.
    loaded: bool,
    tab: String,
    pane_ready: bool,
    end_date_shown: bool,
    /// Key of the record this page saved, once it has.
    saved: Option<String>,
    /// Planned procedures or custom form fields added on the page.
    items: Vec<String>,
    /// Custom forms shown on a lab request.
    custom_forms: Vec<String>,
    focused: Option<String>,
}

#[derive(Debug)]
struct Modal {
    kind: ModalKind,
    form: Form,
}

/// An open type-ahead suggestion menu.
#[derive(Debug)]
struct Menu {
    field: String,
    scope: Scope,
    suggestions: Vec<String>,
}

enum Source {
    Lookup(&'static str),
    Pricing,
}

fn suggestion_source(field: &str) -> Option<Source> {
    match field {
        "location" => Some(Source::Lookup("visit_location_list")),
        "examiner" | "procedurePhysician" => Some(Source::Lookup("physician_list")),
        "plannedProcedure" | "procedureDescription" => Some(Source::Lookup("procedure_list")),
        "labType" => Some(Source::Lookup("lab_types")),
        "imagingType" => Some(Source::Lookup("imaging_types")),
        "chargeItem" => Some(Source::Pricing),
        _ => None,
    }
}

/// Input name of a custom form field.
fn custom_field_name(form: &str, label: &str) -> String {
    format!("custom:{}:{}", form, label)
}

fn today() -> String {
    chrono::Local::now().format("%-m/%-d/%Y").to_string()
}

pub struct WardApp {
    store: DocStore,
    fixtures: FixtureSet,
    events: EventLoop<Scheduled>,
    generation: u64,
    user: Option<String>,
    route: Route,
    url: String,
    screen: Screen,
    modal: Option<Modal>,
    menu: Option<Menu>,
}

impl WardApp {
    /// An app that knows the built-in fixtures.
    pub fn new() -> HarnessResult<Self> {
        Ok(Self::with_fixtures(FixtureSet::builtin()?))
    }

    pub fn with_fixtures(fixtures: FixtureSet) -> Self {
        Self {
            store: DocStore::new(),
            fixtures,
            events: EventLoop::new(),
            generation: 0,
            user: None,
            route: Route::Index,
            url: Route::Index.to_string(),
            screen: Screen::default(),
            modal: None,
            menu: None,
        }
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    pub fn fixtures(&self) -> &FixtureSet {
        &self.fixtures
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current markup.
    pub fn html(&self) -> HarnessResult<String> {
        view::render(self)
    }

    pub fn pending_tasks(&self) -> usize {
        self.events.pending()
    }

    pub fn set_step_limit(&mut self, max_steps: usize) -> HarnessResult<()> {
        self.events.set_step_limit(max_steps)
    }

    fn schedule(&mut self, delay_ms: u64, tracked: bool, effect: Effect) {
        trace!(?effect, delay_ms, tracked, "schedule");
        let task = Scheduled {
            generation: self.generation,
            effect,
        };
        self.events.schedule(delay_ms, tracked, task);
    }

    fn run(&mut self, task: Scheduled) -> HarnessResult<()> {
        if task.generation != self.generation {
            trace!(effect = ?task.effect, "dropping effect from a previous page");
            return Ok(());
        }
        self.apply(task.effect)
    }

    fn apply(&mut self, effect: Effect) -> HarnessResult<()> {
        match effect {
            Effect::Navigate(route) => self.navigate(&route)?,
            Effect::LoadVisits => {
                self.screen.loaded = true;
                self.screen.pane_ready = true;
            }
            Effect::ShowVisitForm => self.screen.loaded = true,
            Effect::ApplyVisitType => {
                self.screen.end_date_shown = self.screen.form.value("visitType") == "Admission";
            }
            Effect::PaneReady => self.screen.pane_ready = true,
            Effect::Suggest { field, scope } => self.suggest(&field, scope)?,
            Effect::Pick {
                field,
                scope,
                value,
            } => self.pick(&field, scope, &value)?,
            Effect::OpenModal(kind) => self.open_modal(kind)?,
            Effect::CloseModal => {
                self.modal = None;
                self.menu = None;
            }
            Effect::CommitModal => self.commit_modal()?,
            Effect::ConfirmModal => self.confirm_modal()?,
            Effect::Save => self.save()?,
            Effect::AddProcedure => {
                let procedure = self.screen.form.trimmed("plannedProcedure");
                if !procedure.is_empty() {
                    self.screen.items.push(procedure);
                    self.screen.form.set("plannedProcedure", "");
                }
            }
        }
        Ok(())
    }

    fn navigate(&mut self, target: &str) -> HarnessResult<()> {
        let route = match Route::parse(target)? {
            r if r.requires_login() && self.user.is_none() => {
                debug!(%target, "not signed in, redirecting to login");
                Route::Login
            }
            Route::Index => Route::Patients,
            r => r,
        };

        self.generation += 1;
        self.url = route.to_string();
        self.route = route;
        self.screen = Screen::default();
        self.modal = None;
        self.menu = None;
        debug!(url = %self.url, "route entered");
        self.enter()
    }

    /// Set up the state a route starts with.
    fn enter(&mut self) -> HarnessResult<()> {
        match self.route.clone() {
            Route::Patient { .. } => {
                self.screen.tab = "general".to_string();
                self.screen.pane_ready = true;
            }
            Route::NewVisit { .. } => {
                self.screen.form.set("visitType", "Admission");
                self.screen.form.set("startDate", &today());
                self.screen.end_date_shown = true;
                self.schedule(VISIT_FORM_MS, false, Effect::ShowVisitForm);
            }
            Route::Visit { id } => {
                if let Some(visit) = records::load::<Visit>(&self.store, &id)? {
                    let form = &mut self.screen.form;
                    form.set("visitType", &visit.visit_type);
                    form.set("startDate", &visit.start_date);
                    form.set("endDate", &visit.end_date);
                    form.set("location", &visit.location);
                    form.set("examiner", &visit.examiner);
                    self.screen.end_date_shown = visit.is_admission();
                }
                self.screen.loaded = true;
                self.screen.tab = "charges".to_string();
                self.screen.pane_ready = true;
            }
            Route::NewLab { .. } => {
                for (_, form) in records::all::<CustomForm>(&self.store)? {
                    if form.form_type == "Lab" && form.always_include {
                        self.screen.custom_forms.push(form.name);
                    }
                }
                self.screen.loaded = true;
            }
            Route::NewCustomForm => {
                self.screen.form.set("formType", CUSTOM_FORM_TYPES[0]);
                self.screen.loaded = true;
            }
            _ => self.screen.loaded = true,
        }
        Ok(())
    }

    /// Find the element a handle points at in the current markup.
    fn resolve(&self, target: &ElementHandle) -> HarnessResult<(Document, NodeId)> {
        let doc = dom::parse_html(&view::render(self)?)?;
        let id = doc
            .node_at_path(&target.path)
            .filter(|id| doc.node(*id).tag == target.tag)
            .ok_or_else(|| {
                HarnessError::Action(format!("{} is no longer on the page", target.label))
            })?;
        Ok((doc, id))
    }

    fn scope_of(doc: &Document, id: NodeId) -> Scope {
        if doc
            .ancestors(id)
            .any(|a| doc.node(a).has_class("modal-dialog"))
        {
            Scope::Modal
        } else {
            Scope::Page
        }
    }

    /// Name of an enabled form control with one of the given tags.
    fn control_name(doc: &Document, id: NodeId, tags: &[&str]) -> HarnessResult<String> {
        let node = doc.node(id);
        if !tags.contains(&node.tag.as_str()) {
            return Err(HarnessError::Action(format!(
                "{} is not a {}",
                doc.describe(id),
                tags.join("/")
            )));
        }
        if node.attributes.contains_key("disabled") {
            return Err(HarnessError::Action(format!("{} is disabled", doc.describe(id))));
        }
        node.get_attr("name")
            .map(String::from)
            .ok_or_else(|| HarnessError::Action(format!("{} has no name", doc.describe(id))))
    }

    fn form(&self, scope: Scope) -> Option<&Form> {
        match scope {
            Scope::Page => Some(&self.screen.form),
            Scope::Modal => self.modal.as_ref().map(|m| &m.form),
        }
    }

    fn form_mut(&mut self, scope: Scope) -> HarnessResult<&mut Form> {
        match scope {
            Scope::Page => Ok(&mut self.screen.form),
            Scope::Modal => self
                .modal
                .as_mut()
                .map(|m| &mut m.form)
                .ok_or_else(|| HarnessError::Action("no dialog is open".to_string())),
        }
    }

    fn dispatch(&mut self, action: Action) -> HarnessResult<()> {
        debug!(?action, "dispatch");
        match action {
            Action::Navigate(route) => self.schedule(0, true, Effect::Navigate(route)),
            Action::Tab(tab) => self.switch_tab(&tab),
            Action::OpenModal(kind) => self.schedule(0, true, Effect::OpenModal(kind)),
            Action::ModalAdd => self.schedule(MODAL_COMMIT_MS, false, Effect::CommitModal),
            Action::ModalClose => self.schedule(0, true, Effect::CloseModal),
            Action::ModalConfirm => self.schedule(0, true, Effect::ConfirmModal),
            Action::Save => self.schedule(SAVE_MS, false, Effect::Save),
            Action::Pick(value) => {
                let menu = self.menu.as_ref().ok_or_else(|| {
                    HarnessError::Action("no suggestion menu is open".to_string())
                })?;
                let effect = Effect::Pick {
                    field: menu.field.clone(),
                    scope: menu.scope,
                    value,
                };
                self.schedule(0, true, effect);
            }
            Action::AddProcedure => self.schedule(0, true, Effect::AddProcedure),
            Action::Print => debug!("print requested"),
        }
        Ok(())
    }

    fn switch_tab(&mut self, tab: &str) {
        if self.screen.tab == tab {
            return;
        }
        self.events.cancel(|task| {
            matches!(task.effect, Effect::PaneReady | Effect::LoadVisits)
        });
        self.screen.tab = tab.to_string();
        self.screen.pane_ready = false;
        if matches!(self.route, Route::Patient { .. }) && tab == "visits" {
            self.screen.loaded = false;
            self.schedule(VISITS_LOAD_MS, false, Effect::LoadVisits);
        } else {
            self.schedule(TAB_PANE_MS, false, Effect::PaneReady);
        }
    }

    fn visit_key(&self) -> HarnessResult<String> {
        self.route
            .visit_id()
            .map(String::from)
            .ok_or_else(|| HarnessError::Action(format!("{} has no visit", self.url)))
    }

    fn update_visit<F>(&mut self, change: F) -> HarnessResult<()>
    where
        F: FnOnce(&mut Visit),
    {
        let key = self.visit_key()?;
        let mut visit: Visit = records::require(&self.store, &key)?;
        change(&mut visit);
        records::save(&mut self.store, &key, &visit)
    }

    /// Visit page fields are saved as they change.
    fn write_through(&mut self, name: &str, value: &str) -> HarnessResult<()> {
        if !matches!(self.route, Route::Visit { .. }) || !VISIT_FIELDS.contains(&name) {
            return Ok(());
        }
        self.update_visit(|visit| match name {
            "visitType" => visit.visit_type = value.to_string(),
            "startDate" => visit.start_date = value.to_string(),
            "endDate" => visit.end_date = value.to_string(),
            "location" => visit.location = value.to_string(),
            _ => visit.examiner = value.to_string(),
        })
    }

    fn suggest(&mut self, field: &str, scope: Scope) -> HarnessResult<()> {
        let query = self
            .form(scope)
            .map(|form| form.trimmed(field).to_lowercase())
            .unwrap_or_default();
        if query.is_empty() {
            self.menu = None;
            return Ok(());
        }

        let candidates = match suggestion_source(field) {
            Some(Source::Lookup(key)) => records::load::<Lookup>(&self.store, key)?
                .map(|lookup| lookup.values)
                .unwrap_or_default(),
            Some(Source::Pricing) => records::all::<PricingItem>(&self.store)?
                .into_iter()
                .map(|(_, item)| item.name)
                .collect(),
            None => Vec::new(),
        };
        let suggestions: Vec<String> = candidates
            .into_iter()
            .filter(|c| c.to_lowercase().contains(&query))
            .collect();

        debug!(%field, count = suggestions.len(), "suggestions ready");
        self.menu = if suggestions.is_empty() {
            None
        } else {
            Some(Menu {
                field: field.to_string(),
                scope,
                suggestions,
            })
        };
        Ok(())
    }

    fn pick(&mut self, field: &str, scope: Scope, value: &str) -> HarnessResult<()> {
        self.form_mut(scope)?.set(field, value);
        self.menu = None;
        if scope == Scope::Page {
            self.write_through(field, value)?;
        }
        Ok(())
    }

    /// Lab custom forms that can still be attached to the current request.
    fn attachable_forms(&self) -> HarnessResult<Vec<String>> {
        Ok(records::all::<CustomForm>(&self.store)?
            .into_iter()
            .map(|(_, form)| form)
            .filter(|form| form.form_type == "Lab")
            .filter(|form| !self.screen.custom_forms.contains(&form.name))
            .map(|form| form.name)
            .collect())
    }

    fn custom_form(&self, name: &str) -> HarnessResult<Option<CustomForm>> {
        Ok(records::all::<CustomForm>(&self.store)?
            .into_iter()
            .map(|(_, form)| form)
            .find(|form| form.name == name))
    }

    fn open_modal(&mut self, kind: ModalKind) -> HarnessResult<()> {
        let mut form = Form::default();
        match &kind {
            ModalKind::EditDiagnosis(index) => {
                let visit: Visit = records::require(&self.store, &self.visit_key()?)?;
                let diagnosis = visit.diagnoses.get(*index).ok_or_else(|| {
                    HarnessError::Action(format!("no diagnosis #{}", index))
                })?;
                form.set("diagnosis", &diagnosis.description);
                if diagnosis.secondary {
                    form.toggle("secondary");
                }
            }
            ModalKind::Charge => form.set("quantity", "1"),
            ModalKind::AttachCustomForm => {
                if let Some(first) = self.attachable_forms()?.first() {
                    form.set("customForm", first);
                }
            }
            _ => {}
        }
        debug!(modal = %kind, "dialog opened");
        self.menu = None;
        self.modal = Some(Modal { kind, form });
        Ok(())
    }

    /// Add/Update pressed in a dialog. A dialog whose required input is
    /// empty stays open.
    fn commit_modal(&mut self) -> HarnessResult<()> {
        let Some(modal) = self.modal.take() else {
            return Ok(());
        };
        let form = &modal.form;

        let keep_open = match &modal.kind {
            ModalKind::Allergy => {
                let allergy = form.trimmed("allergy");
                if allergy.is_empty() {
                    true
                } else {
                    let visit: Visit = records::require(&self.store, &self.visit_key()?)?;
                    let mut patient: Patient = records::require(&self.store, &visit.patient)?;
                    patient.allergies.push(allergy);
                    records::save(&mut self.store, &visit.patient, &patient)?;
                    false
                }
            }
            ModalKind::AddDiagnosis => {
                let description = form.trimmed("diagnosis");
                if description.is_empty() {
                    true
                } else {
                    let secondary = form.is_checked("secondary");
                    self.update_visit(|visit| {
                        visit.diagnoses.push(Diagnosis {
                            description,
                            secondary,
                        })
                    })?;
                    false
                }
            }
            ModalKind::EditDiagnosis(index) => {
                let description = form.trimmed("diagnosis");
                if description.is_empty() {
                    true
                } else {
                    let secondary = form.is_checked("secondary");
                    self.update_visit(|visit| {
                        if let Some(diagnosis) = visit.diagnoses.get_mut(*index) {
                            diagnosis.description = description;
                            diagnosis.secondary = secondary;
                        }
                    })?;
                    false
                }
            }
            ModalKind::Vitals => {
                let vitals = Vitals {
                    temperature: form.trimmed("temperature"),
                    weight: form.trimmed("weight"),
                    height: form.trimmed("height"),
                    sbp: form.trimmed("sbp"),
                    dbp: form.trimmed("dbp"),
                    heart_rate: form.trimmed("heartRate"),
                    respiratory_rate: form.trimmed("respiratoryRate"),
                };
                if vitals.values().iter().all(|v| v.is_empty()) {
                    true
                } else {
                    self.update_visit(|visit| visit.vitals.push(vitals))?;
                    false
                }
            }
            ModalKind::Charge => {
                let name = form.trimmed("chargeItem");
                if name.is_empty() {
                    true
                } else {
                    let quantity = form.trimmed("quantity").parse().unwrap_or(1);
                    self.update_visit(|visit| {
                        visit.charges.push(records::Charge { name, quantity })
                    })?;
                    false
                }
            }
            ModalKind::Note => {
                let note = form.trimmed("noteContent");
                if note.is_empty() {
                    true
                } else {
                    self.update_visit(|visit| visit.notes.push(note))?;
                    false
                }
            }
            ModalKind::AddField => {
                let label = form.trimmed("label");
                if label.is_empty() {
                    true
                } else {
                    self.screen.items.push(label);
                    false
                }
            }
            ModalKind::AttachCustomForm => {
                let name = form.trimmed("customForm");
                if name.is_empty() {
                    true
                } else {
                    if !self.screen.custom_forms.contains(&name) {
                        self.screen.custom_forms.push(name);
                    }
                    false
                }
            }
            ModalKind::DeleteVitals(_)
            | ModalKind::DeleteCharge(_)
            | ModalKind::DeleteVisit(_)
            | ModalKind::Saved(_) => false,
        };

        if keep_open {
            debug!(modal = %modal.kind, "required input missing, dialog stays open");
            self.modal = Some(modal);
        } else {
            self.menu = None;
        }
        Ok(())
    }

    /// Delete/Ok pressed in a confirmation dialog.
    fn confirm_modal(&mut self) -> HarnessResult<()> {
        let Some(modal) = self.modal.take() else {
            return Ok(());
        };
        match modal.kind {
            ModalKind::EditDiagnosis(index) => self.update_visit(|visit| {
                if index < visit.diagnoses.len() {
                    visit.diagnoses.remove(index);
                }
            })?,
            ModalKind::DeleteVitals(index) => self.update_visit(|visit| {
                if index < visit.vitals.len() {
                    visit.vitals.remove(index);
                }
            })?,
            ModalKind::DeleteCharge(index) => self.update_visit(|visit| {
                if index < visit.charges.len() {
                    visit.charges.remove(index);
                }
            })?,
            ModalKind::DeleteVisit(key) => {
                if records::remove::<Visit>(&mut self.store, &key) {
                    info!(visit = %key, "visit deleted");
                }
            }
            other => debug!(modal = %other, "confirm closes dialog"),
        }
        self.menu = None;
        Ok(())
    }

    /// Key for the record the current page saves: the one it already saved,
    /// or a fresh one.
    fn record_key(&mut self) -> String {
        let key = self.screen.saved.clone().unwrap_or_else(records::new_key);
        self.screen.saved = Some(key.clone());
        key
    }

    fn save(&mut self) -> HarnessResult<()> {
        let title = match self.route.clone() {
            Route::NewVisit { patient_id } => {
                let form = &self.screen.form;
                let start_date = match form.trimmed("startDate") {
                    date if date.is_empty() => today(),
                    date => date,
                };
                let visit = Visit {
                    patient: patient_id,
                    visit_type: form.trimmed("visitType"),
                    start_date,
                    end_date: form.trimmed("endDate"),
                    location: form.trimmed("location"),
                    examiner: form.trimmed("examiner"),
                    ..Visit::default()
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &visit)?;
                self.route = Route::Visit { id: key.clone() };
                self.url = self.route.to_string();
                self.screen.tab = "charges".to_string();
                self.screen.pane_ready = true;
                info!(visit = %key, "visit created");
                "Visit Saved"
            }
            Route::Visit { .. } => {
                let form = &self.screen.form;
                let (visit_type, start, end, location, examiner) = (
                    form.trimmed("visitType"),
                    form.trimmed("startDate"),
                    form.trimmed("endDate"),
                    form.trimmed("location"),
                    form.trimmed("examiner"),
                );
                self.update_visit(|visit| {
                    visit.visit_type = visit_type;
                    visit.start_date = start;
                    visit.end_date = end;
                    visit.location = location;
                    visit.examiner = examiner;
                })?;
                "Visit Saved"
            }
            Route::NewOperativePlan { visit_id } => {
                let plan = OperativePlan {
                    visit: visit_id,
                    operation_description: self.screen.form.trimmed("operationDescription"),
                    procedures: self.screen.items.clone(),
                    admission_instructions: self.screen.form.trimmed("admissionInstructions"),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &plan)?;
                "Plan Saved"
            }
            Route::NewProcedure { visit_id } => {
                let procedure = Procedure {
                    visit: visit_id,
                    description: self.screen.form.trimmed("procedureDescription"),
                    physician: self.screen.form.trimmed("procedurePhysician"),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &procedure)?;
                "Procedure Saved"
            }
            Route::NewMedication { visit_id } => {
                let medication = Medication {
                    visit: visit_id,
                    medication: self.screen.form.trimmed("medication"),
                    prescription: self.screen.form.trimmed("prescription"),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &medication)?;
                "Medication Request Saved"
            }
            Route::NewLab { visit_id } => {
                let mut custom_forms = Vec::new();
                for name in &self.screen.custom_forms {
                    let labels = self
                        .custom_form(name)?
                        .map(|form| form.fields)
                        .unwrap_or_default();
                    let values = labels
                        .into_iter()
                        .map(|label| {
                            let value = self.screen.form.trimmed(&custom_field_name(name, &label));
                            (label, value)
                        })
                        .collect();
                    custom_forms.push(FilledForm {
                        name: name.clone(),
                        values,
                    });
                }
                let lab = Lab {
                    visit: visit_id,
                    lab_type: self.screen.form.trimmed("labType"),
                    custom_forms,
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &lab)?;
                "Lab Request Saved"
            }
            Route::NewImaging { visit_id } => {
                let imaging = Imaging {
                    visit: visit_id,
                    imaging_type: self.screen.form.trimmed("imagingType"),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &imaging)?;
                "Imaging Request Saved"
            }
            Route::NewAppointment { visit_id } => {
                let appointment = Appointment {
                    visit: visit_id,
                    all_day: self.screen.form.is_checked("allDay"),
                    start_date: self.screen.form.trimmed("startDate"),
                    end_date: self.screen.form.trimmed("endDate"),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &appointment)?;
                "Appointment Saved"
            }
            Route::NewReport { visit_id } => {
                let visit: Visit = records::require(&self.store, &visit_id)?;
                let report = Report {
                    visit: visit_id,
                    report_type: view::report_type(&visit).to_string(),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &report)?;
                self.route = Route::Report { id: key };
                self.url = self.route.to_string();
                "Report saved"
            }
            Route::Report { .. } => "Report saved",
            Route::NewCustomForm => {
                let form = CustomForm {
                    name: self.screen.form.trimmed("formName"),
                    form_type: self.screen.form.trimmed("formType"),
                    always_include: self.screen.form.is_checked("alwaysInclude"),
                    fields: self.screen.items.clone(),
                };
                let key = self.record_key();
                records::save(&mut self.store, &key, &form)?;
                info!(form = %form.name, "custom form saved");
                "Form Saved"
            }
            other => {
                return Err(HarnessError::Action(format!("nothing to save on {}", other)));
            }
        };

        self.menu = None;
        self.modal = Some(Modal {
            kind: ModalKind::Saved(title.to_string()),
            form: Form::default(),
        });
        Ok(())
    }
}

impl Driver for WardApp {
    fn reset_fixture(&mut self, name: &str) -> HarnessResult<()> {
        let fixture = self.fixtures.get(name)?;
        self.store.reset(fixture);
        self.events.clear();
        self.generation += 1;
        self.user = None;
        self.route = Route::Index;
        self.url = self.route.to_string();
        self.screen = Screen::default();
        self.modal = None;
        self.menu = None;
        info!(fixture = %name, "fixture loaded");
        Ok(())
    }

    fn authenticate(&mut self, username: &str) -> HarnessResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(HarnessError::Action("username must not be empty".to_string()));
        }
        self.user = Some(username.to_string());
        debug!(%username, "signed in");
        Ok(())
    }

    fn visit(&mut self, route: &str) -> HarnessResult<()> {
        self.schedule(0, true, Effect::Navigate(route.to_string()));
        Ok(())
    }

    fn current_url(&mut self) -> HarnessResult<String> {
        Ok(self.url.clone())
    }

    fn page(&mut self) -> HarnessResult<Page> {
        Page::parse(&self.url, &view::render(self)?)
    }

    fn click(&mut self, target: &ElementHandle) -> HarnessResult<()> {
        let (doc, id) = self.resolve(target)?;
        let node = doc.node(id);
        if node.attributes.contains_key("disabled") {
            return Err(HarnessError::Action(format!("{} is disabled", target.label)));
        }

        let checkable = node.tag == "input"
            && matches!(node.get_attr("type"), Some("checkbox") | Some("radio"));
        if checkable {
            let name = Self::control_name(&doc, id, &["input"])?;
            let scope = Self::scope_of(&doc, id);
            self.form_mut(scope)?.toggle(&name);
            return Ok(());
        }

        let carrier = std::iter::once(id)
            .chain(doc.ancestors(id))
            .find(|n| doc.node(*n).get_attr("data-action").is_some());
        let Some(carrier) = carrier else {
            trace!(element = %target.label, "click has no action");
            return Ok(());
        };
        let node = doc.node(carrier);
        let name = node.get_attr("data-action").unwrap_or_default();
        let action = Action::parse(name, node.get_attr("data-arg"))?;
        self.dispatch(action)
    }

    fn focus(&mut self, target: &ElementHandle) -> HarnessResult<()> {
        let (doc, id) = self.resolve(target)?;
        let name = Self::control_name(&doc, id, &["input", "textarea", "select"])?;
        self.screen.focused = Some(name);
        Ok(())
    }

    fn fill(&mut self, target: &ElementHandle, text: &str) -> HarnessResult<()> {
        let (doc, id) = self.resolve(target)?;
        let name = Self::control_name(&doc, id, &["input", "textarea"])?;
        if matches!(
            doc.node(id).get_attr("type"),
            Some("checkbox") | Some("radio") | Some("button") | Some("submit")
        ) {
            return Err(HarnessError::Action(format!(
                "{} does not take text",
                target.label
            )));
        }

        let scope = Self::scope_of(&doc, id);
        self.form_mut(scope)?.set(&name, text);

        if suggestion_source(&name).is_some() {
            self.events.cancel(|task| {
                matches!(&task.effect, Effect::Suggest { field, .. } if *field == name)
            });
            if self.menu.as_ref().map(|m| m.field == name).unwrap_or(false) {
                self.menu = None;
            }
            let effect = Effect::Suggest {
                field: name.clone(),
                scope,
            };
            self.schedule(TYPEAHEAD_DEBOUNCE_MS, false, effect);
        }
        if scope == Scope::Page {
            self.write_through(&name, text)?;
        }
        Ok(())
    }

    fn choose(&mut self, target: &ElementHandle, option: &str) -> HarnessResult<()> {
        let (doc, id) = self.resolve(target)?;
        let name = Self::control_name(&doc, id, &["select"])?;
        let value = doc
            .descendants(id)
            .filter(|o| doc.node(*o).tag == "option")
            .find_map(|o| {
                let value = doc
                    .node(o)
                    .get_attr("value")
                    .map(String::from)
                    .unwrap_or_else(|| doc.text_content(o));
                (value == option || doc.text_content(o) == option).then_some(value)
            })
            .ok_or_else(|| {
                HarnessError::Action(format!("{} has no option {:?}", target.label, option))
            })?;

        let scope = Self::scope_of(&doc, id);
        self.form_mut(scope)?.set(&name, &value);
        if scope == Scope::Page && name == "visitType" {
            self.events
                .cancel(|task| task.effect == Effect::ApplyVisitType);
            self.schedule(VISIT_TYPE_MS, false, Effect::ApplyVisitType);
            self.write_through(&name, &value)?;
        }
        Ok(())
    }

    fn settle(&mut self) -> HarnessResult<()> {
        self.events.begin_run();
        while let Some(task) = self.events.next_for_settle()? {
            self.run(task.effect)?;
        }
        Ok(())
    }

    fn advance(&mut self, by: Duration) -> HarnessResult<()> {
        let target = self
            .events
            .now_ms()
            .saturating_add(by.as_millis() as u64);
        self.events.begin_run();
        while let Some(task) = self.events.next_due(target)? {
            self.run(task.effect)?;
        }
        self.events.finish_advance(target);
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.events.now_ms())
    }
}
