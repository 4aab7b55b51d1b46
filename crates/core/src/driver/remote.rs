//! Driver that talks to a `rounds-server` over HTTP.
//! Gated behind the "remote" feature flag.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::protocol::{
    AdvanceRequest, AuthenticateRequest, ChooseRequest, ErrorResponse, FillRequest,
    FixtureRequest, PageResponse, StateResponse, TargetRequest, VisitRequest, SESSION_HEADER,
};
use super::Driver;
use crate::config::RemoteConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::page::{ElementHandle, Page};

/// A driver session on a remote server. The session token is taken from the
/// first response and sent with every request after that.
pub struct RemoteDriver {
    client: Client,
    base_url: Url,
    session: Option<String>,
    elapsed_ms: u64,
}

impl RemoteDriver {
    pub fn new(config: &RemoteConfig) -> HarnessResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| HarnessError::Config(format!("invalid base URL: {}", e)))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HarnessError::Driver(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session: None,
            elapsed_ms: 0,
        })
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    fn endpoint(&self, path: &str) -> HarnessResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| HarnessError::Driver(format!("invalid endpoint {}: {}", path, e)))
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    fn post<B: Serialize>(&mut self, path: &str, body: &B) -> HarnessResult<StateResponse> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let request = self.with_session(self.client.post(url).json(body));
        let state: StateResponse = self.send(request)?;
        self.elapsed_ms = state.elapsed_ms;
        Ok(state)
    }

    fn get<T: DeserializeOwned>(&mut self, path: &str) -> HarnessResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let request = self.with_session(self.client.get(url));
        self.send(request)
    }

    fn send<T: DeserializeOwned>(&mut self, request: RequestBuilder) -> HarnessResult<T> {
        let response = request
            .send()
            .map_err(|e| HarnessError::Driver(e.to_string()))?;
        self.remember_session(&response);

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .map_err(|e| HarnessError::Driver(format!("malformed response: {}", e)));
        }

        let message = response
            .json::<ErrorResponse>()
            .map(|e| e.error)
            .unwrap_or_else(|_| status.to_string());
        if status.is_client_error() {
            Err(HarnessError::Action(message))
        } else {
            Err(HarnessError::Driver(format!("HTTP {}: {}", status.as_u16(), message)))
        }
    }

    fn remember_session(&mut self, response: &Response) {
        if let Some(token) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
        {
            self.session = Some(token.to_string());
        }
    }
}

impl Driver for RemoteDriver {
    fn reset_fixture(&mut self, name: &str) -> HarnessResult<()> {
        let body = FixtureRequest {
            name: name.to_string(),
        };
        self.post("/api/fixture", &body).map(|_| ())
    }

    fn authenticate(&mut self, username: &str) -> HarnessResult<()> {
        let body = AuthenticateRequest {
            username: username.to_string(),
        };
        self.post("/api/authenticate", &body).map(|_| ())
    }

    fn visit(&mut self, route: &str) -> HarnessResult<()> {
        let body = VisitRequest {
            route: route.to_string(),
        };
        self.post("/api/visit", &body).map(|_| ())
    }

    fn current_url(&mut self) -> HarnessResult<String> {
        let state: StateResponse = self.get("/api/url")?;
        self.elapsed_ms = state.elapsed_ms;
        Ok(state.url)
    }

    fn page(&mut self) -> HarnessResult<Page> {
        let page: PageResponse = self.get("/api/page")?;
        self.elapsed_ms = page.elapsed_ms;
        Page::parse(&page.url, &page.html)
    }

    fn click(&mut self, target: &ElementHandle) -> HarnessResult<()> {
        let body = TargetRequest {
            target: target.clone(),
        };
        self.post("/api/click", &body).map(|_| ())
    }

    fn focus(&mut self, target: &ElementHandle) -> HarnessResult<()> {
        let body = TargetRequest {
            target: target.clone(),
        };
        self.post("/api/focus", &body).map(|_| ())
    }

    fn fill(&mut self, target: &ElementHandle, text: &str) -> HarnessResult<()> {
        let body = FillRequest {
            target: target.clone(),
            text: text.to_string(),
        };
        self.post("/api/fill", &body).map(|_| ())
    }

    fn choose(&mut self, target: &ElementHandle, option: &str) -> HarnessResult<()> {
        let body = ChooseRequest {
            target: target.clone(),
            option: option.to_string(),
        };
        self.post("/api/choose", &body).map(|_| ())
    }

    fn settle(&mut self) -> HarnessResult<()> {
        self.post("/api/settle", &serde_json::json!({})).map(|_| ())
    }

    fn advance(&mut self, by: Duration) -> HarnessResult<()> {
        let body = AdvanceRequest {
            ms: by.as_millis() as u64,
        };
        self.post("/api/advance", &body).map(|_| ())
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}
