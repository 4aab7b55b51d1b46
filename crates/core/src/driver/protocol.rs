//! JSON bodies of the HTTP driver protocol, shared by `rounds-server` and
//! [`RemoteDriver`](super::remote::RemoteDriver).

use serde::{Deserialize, Serialize};

use crate::page::ElementHandle;

/// Header carrying the session token on every request and response
/// (`X-Rounds-Session`; lowercase so it can be used as a static header name).
pub const SESSION_HEADER: &str = "x-rounds-session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRequest {
    pub route: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRequest {
    pub target: ElementHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRequest {
    pub target: ElementHandle,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseRequest {
    pub target: ElementHandle,
    pub option: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub ms: u64,
}

/// Returned by every action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    pub url: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub url: String,
    pub html: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
