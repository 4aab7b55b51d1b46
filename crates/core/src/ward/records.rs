//! Typed views over the document store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::fixture::{doc_id, DocStore};

pub trait Record: Serialize + DeserializeOwned {
    const KIND: &'static str;
}

pub fn load<R: Record>(store: &DocStore, key: &str) -> HarnessResult<Option<R>> {
    match store.get(&doc_id(R::KIND, key)) {
        Some(doc) => Ok(Some(serde_json::from_value(doc.data.clone())?)),
        None => Ok(None),
    }
}

/// Like [`load`], but a missing record is an error.
pub fn require<R: Record>(store: &DocStore, key: &str) -> HarnessResult<R> {
    load(store, key)?.ok_or_else(|| {
        HarnessError::Action(format!("no {} record {}", R::KIND, key))
    })
}

pub fn save<R: Record>(store: &mut DocStore, key: &str, record: &R) -> HarnessResult<()> {
    let data = serde_json::to_value(record)?;
    store.put(R::KIND, &doc_id(R::KIND, key), data);
    Ok(())
}

pub fn remove<R: Record>(store: &mut DocStore, key: &str) -> bool {
    store.remove(&doc_id(R::KIND, key)).is_some()
}

/// Every record of a kind with its key, in key order.
pub fn all<R: Record>(store: &DocStore) -> HarnessResult<Vec<(String, R)>> {
    store
        .list(R::KIND)
        .into_iter()
        .map(|doc| -> HarnessResult<(String, R)> {
            Ok((doc.key().to_string(), serde_json::from_value(doc.data.clone())?))
        })
        .collect()
}

pub fn new_key() -> String {
    uuid::Uuid::new_v4().to_string().to_uppercase()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Patient {
    pub friendly_id: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub date_of_birth: String,
    pub allergies: Vec<String>,
}

impl Patient {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Patient {
    const KIND: &'static str = "patient";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visit {
    pub patient: String,
    pub visit_type: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub examiner: String,
    /// Free-text diagnosis from before diagnoses were itemised.
    pub reason: String,
    pub diagnoses: Vec<Diagnosis>,
    pub vitals: Vec<Vitals>,
    pub charges: Vec<Charge>,
    pub notes: Vec<String>,
}

impl Visit {
    pub fn is_admission(&self) -> bool {
        self.visit_type == "Admission"
    }

    /// What the visit list shows in its diagnosis column.
    pub fn diagnosis_summary(&self) -> String {
        let primary: Vec<&str> = self
            .diagnoses
            .iter()
            .filter(|d| !d.secondary)
            .map(|d| d.description.as_str())
            .collect();
        if primary.is_empty() {
            self.reason.clone()
        } else {
            primary.join(", ")
        }
    }
}

impl Record for Visit {
    const KIND: &'static str = "visit";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnosis {
    pub description: String,
    pub secondary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vitals {
    pub temperature: String,
    pub weight: String,
    pub height: String,
    pub sbp: String,
    pub dbp: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
}

impl Vitals {
    /// Column order of the vitals table: input name, heading, input class.
    pub const FIELDS: [(&'static str, &'static str, &'static str); 7] = [
        ("temperature", "Temperature", "temperature-text"),
        ("weight", "Weight", "weight-text"),
        ("height", "Height", "height-text"),
        ("sbp", "SBP", "sbp-text"),
        ("dbp", "DBP", "dbp-text"),
        ("heartRate", "Heart Rate", "heart-rate-text"),
        ("respiratoryRate", "Respiratory Rate", "respiratory-rate-text"),
    ];

    pub fn values(&self) -> [&str; 7] {
        [
            self.temperature.as_str(),
            self.weight.as_str(),
            self.height.as_str(),
            self.sbp.as_str(),
            self.dbp.as_str(),
            self.heart_rate.as_str(),
            self.respiratory_rate.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Charge {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperativePlan {
    pub visit: String,
    pub operation_description: String,
    pub procedures: Vec<String>,
    pub admission_instructions: String,
}

impl Record for OperativePlan {
    const KIND: &'static str = "opPlan";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Procedure {
    pub visit: String,
    pub description: String,
    pub physician: String,
}

impl Record for Procedure {
    const KIND: &'static str = "procedure";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Medication {
    pub visit: String,
    pub medication: String,
    pub prescription: String,
}

impl Record for Medication {
    const KIND: &'static str = "medication";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lab {
    pub visit: String,
    pub lab_type: String,
    pub custom_forms: Vec<FilledForm>,
}

impl Record for Lab {
    const KIND: &'static str = "lab";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Imaging {
    pub visit: String,
    pub imaging_type: String,
}

impl Record for Imaging {
    const KIND: &'static str = "imaging";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    pub visit: String,
    pub all_day: bool,
    pub start_date: String,
    pub end_date: String,
}

impl Record for Appointment {
    const KIND: &'static str = "appointment";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub visit: String,
    pub report_type: String,
}

impl Record for Report {
    const KIND: &'static str = "report";
}

/// A custom form definition created on the admin page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomForm {
    pub name: String,
    pub form_type: String,
    pub always_include: bool,
    pub fields: Vec<String>,
}

impl Record for CustomForm {
    const KIND: &'static str = "customForm";
}

/// A custom form as filled in on a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilledForm {
    pub name: String,
    pub values: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lookup {
    pub values: Vec<String>,
}

impl Record for Lookup {
    const KIND: &'static str = "lookup";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingItem {
    pub name: String,
    pub price: f64,
    pub category: String,
}

impl Record for PricingItem {
    const KIND: &'static str = "pricing";
}
