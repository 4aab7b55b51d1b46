use std::fmt;

use url::Url;

use crate::error::{HarnessError, HarnessResult};

/// Routes the ward app answers to. Ids are record keys, not full doc ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Login,
    Patients,
    Patient { id: String },
    NewVisit { patient_id: String },
    Visit { id: String },
    NewMedication { visit_id: String },
    NewLab { visit_id: String },
    NewImaging { visit_id: String },
    NewAppointment { visit_id: String },
    NewOperativePlan { visit_id: String },
    NewProcedure { visit_id: String },
    NewReport { visit_id: String },
    Report { id: String },
    NewCustomForm,
    NotFound(String),
}

impl Route {
    /// Parse an application-relative URL such as `/labs/edit/new?forVisitId=X`.
    pub fn parse(route: &str) -> HarnessResult<Route> {
        let base = Url::parse("http://ward.local/").map_err(|e| {
            HarnessError::Action(format!("route base: {}", e))
        })?;
        let url = base
            .join(route.trim())
            .map_err(|e| HarnessError::Action(format!("invalid route {:?}: {}", route, e)))?;

        let query = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let for_visit = |make: fn(String) -> Route| {
            query("forVisitId")
                .map(make)
                .unwrap_or_else(|| Route::NotFound(route.to_string()))
        };

        let parsed = match segments.as_slice() {
            [] => Route::Index,
            ["login"] => Route::Login,
            ["patients"] => Route::Patients,
            ["patients", "edit", id] => Route::Patient { id: id.to_string() },
            ["patients", "operative-plan", "new"] => {
                for_visit(|visit_id| Route::NewOperativePlan { visit_id })
            }
            ["visits", "edit", "new"] => match query("forPatientId") {
                Some(patient_id) => Route::NewVisit { patient_id },
                None => Route::NotFound(route.to_string()),
            },
            ["visits", "edit", id] => Route::Visit { id: id.to_string() },
            ["visits", "procedures", "edit", "new"] => {
                for_visit(|visit_id| Route::NewProcedure { visit_id })
            }
            ["visits", "reports", "edit", "new"] => {
                for_visit(|visit_id| Route::NewReport { visit_id })
            }
            ["visits", "reports", "edit", id] => Route::Report { id: id.to_string() },
            ["medication", "edit", "new"] => for_visit(|visit_id| Route::NewMedication { visit_id }),
            ["labs", "edit", "new"] => for_visit(|visit_id| Route::NewLab { visit_id }),
            ["imaging", "edit", "new"] => for_visit(|visit_id| Route::NewImaging { visit_id }),
            ["appointments", "edit", "new"] => {
                for_visit(|visit_id| Route::NewAppointment { visit_id })
            }
            ["admin", "custom-forms", "edit", "new"] => Route::NewCustomForm,
            _ => Route::NotFound(route.to_string()),
        };
        Ok(parsed)
    }

    /// The visit a page belongs to, if any.
    pub fn visit_id(&self) -> Option<&str> {
        match self {
            Route::Visit { id } => Some(id),
            Route::NewMedication { visit_id }
            | Route::NewLab { visit_id }
            | Route::NewImaging { visit_id }
            | Route::NewAppointment { visit_id }
            | Route::NewOperativePlan { visit_id }
            | Route::NewProcedure { visit_id }
            | Route::NewReport { visit_id } => Some(visit_id),
            _ => None,
        }
    }

    pub fn requires_login(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Index => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Patients => write!(f, "/patients"),
            Route::Patient { id } => write!(f, "/patients/edit/{}", id),
            Route::NewVisit { patient_id } => {
                write!(f, "/visits/edit/new?forPatientId={}", patient_id)
            }
            Route::Visit { id } => write!(f, "/visits/edit/{}", id),
            Route::NewMedication { visit_id } => {
                write!(f, "/medication/edit/new?forVisitId={}", visit_id)
            }
            Route::NewLab { visit_id } => write!(f, "/labs/edit/new?forVisitId={}", visit_id),
            Route::NewImaging { visit_id } => {
                write!(f, "/imaging/edit/new?forVisitId={}", visit_id)
            }
            Route::NewAppointment { visit_id } => {
                write!(f, "/appointments/edit/new?forVisitId={}", visit_id)
            }
            Route::NewOperativePlan { visit_id } => {
                write!(f, "/patients/operative-plan/new?forVisitId={}", visit_id)
            }
            Route::NewProcedure { visit_id } => {
                write!(f, "/visits/procedures/edit/new?forVisitId={}", visit_id)
            }
            Route::NewReport { visit_id } => {
                write!(f, "/visits/reports/edit/new?forVisitId={}", visit_id)
            }
            Route::Report { id } => write!(f, "/visits/reports/edit/{}", id),
            Route::NewCustomForm => write!(f, "/admin/custom-forms/edit/new"),
            Route::NotFound(path) => write!(f, "{}", path),
        }
    }
}
