//! Click targets. Clickable markup carries `data-action` (and optionally
//! `data-arg`); a click dispatches the action of the nearest element that
//! has one.

use std::fmt;

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Allergy,
    AddDiagnosis,
    EditDiagnosis(usize),
    Vitals,
    DeleteVitals(usize),
    Charge,
    DeleteCharge(usize),
    DeleteVisit(String),
    Note,
    AddField,
    AttachCustomForm,
    /// Confirmation shown after a save, carrying its title.
    Saved(String),
}

impl ModalKind {
    pub fn parse(arg: &str) -> HarnessResult<ModalKind> {
        let (name, param) = match arg.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (arg, None),
        };
        let index = |param: Option<&str>| -> HarnessResult<usize> {
            param
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| HarnessError::Action(format!("modal {:?} needs an index", arg)))
        };

        Ok(match name {
            "allergy" => ModalKind::Allergy,
            "diagnosis" => ModalKind::AddDiagnosis,
            "edit-diagnosis" => ModalKind::EditDiagnosis(index(param)?),
            "vitals" => ModalKind::Vitals,
            "delete-vitals" => ModalKind::DeleteVitals(index(param)?),
            "charge" => ModalKind::Charge,
            "delete-charge" => ModalKind::DeleteCharge(index(param)?),
            "delete-visit" => match param {
                Some(key) if !key.is_empty() => ModalKind::DeleteVisit(key.to_string()),
                _ => {
                    return Err(HarnessError::Action(
                        "delete-visit needs a visit id".to_string(),
                    ))
                }
            },
            "note" => ModalKind::Note,
            "add-field" => ModalKind::AddField,
            "custom-form" => ModalKind::AttachCustomForm,
            other => return Err(HarnessError::Action(format!("unknown modal {:?}", other))),
        })
    }
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModalKind::Allergy => write!(f, "allergy"),
            ModalKind::AddDiagnosis => write!(f, "diagnosis"),
            ModalKind::EditDiagnosis(i) => write!(f, "edit-diagnosis:{}", i),
            ModalKind::Vitals => write!(f, "vitals"),
            ModalKind::DeleteVitals(i) => write!(f, "delete-vitals:{}", i),
            ModalKind::Charge => write!(f, "charge"),
            ModalKind::DeleteCharge(i) => write!(f, "delete-charge:{}", i),
            ModalKind::DeleteVisit(key) => write!(f, "delete-visit:{}", key),
            ModalKind::Note => write!(f, "note"),
            ModalKind::AddField => write!(f, "add-field"),
            ModalKind::AttachCustomForm => write!(f, "custom-form"),
            ModalKind::Saved(title) => write!(f, "saved:{}", title),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Tab(String),
    OpenModal(ModalKind),
    /// Add/Update in a dialog footer.
    ModalAdd,
    /// Cancel, or Ok on a save confirmation.
    ModalClose,
    /// Delete, or Ok on a delete confirmation.
    ModalConfirm,
    Save,
    Pick(String),
    AddProcedure,
    Print,
}

impl Action {
    pub fn parse(name: &str, arg: Option<&str>) -> HarnessResult<Action> {
        let required = |what: &str| -> HarnessResult<String> {
            arg.filter(|a| !a.is_empty())
                .map(String::from)
                .ok_or_else(|| HarnessError::Action(format!("{} action needs {}", name, what)))
        };

        Ok(match name {
            "navigate" => Action::Navigate(required("a route")?),
            "tab" => Action::Tab(required("a tab name")?),
            "modal" => Action::OpenModal(ModalKind::parse(&required("a dialog")?)?),
            "modal-add" => Action::ModalAdd,
            "modal-close" => Action::ModalClose,
            "modal-confirm" => Action::ModalConfirm,
            "save" => Action::Save,
            "pick" => Action::Pick(required("a value")?),
            "add-procedure" => Action::AddProcedure,
            "print" => Action::Print,
            other => return Err(HarnessError::Action(format!("unknown action {:?}", other))),
        })
    }
}
