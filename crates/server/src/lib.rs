//! HTTP driver protocol server for rounds.
//!
//! Each session owns one reference ward app. `RemoteDriver` talks to this
//! server, so the scenario catalog can run against an application living in
//! another process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rounds_core::driver::protocol::{
    AdvanceRequest, AuthenticateRequest, ChooseRequest, ErrorResponse, FillRequest,
    FixtureRequest, PageResponse, StateResponse, TargetRequest, VisitRequest, SESSION_HEADER,
};
use rounds_core::fixture::FixtureSet;
use rounds_core::{Driver, HarnessError, HarnessResult, WardApp};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Session management
// ---------------------------------------------------------------------------

/// A ward app with last-access tracking.
struct SessionEntry {
    app: WardApp,
    last_access: Instant,
}

/// Shared server state.
pub struct AppState {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    fixtures: FixtureSet,
    config: ServerConfig,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub session_timeout: Duration,
    /// Extra `*.json` fixtures loaded next to the built-in ones.
    pub fixtures_dir: Option<PathBuf>,
    /// Cap on event loop steps per settle or advance, per session.
    pub step_limit: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3848,
            session_timeout: Duration::from_secs(30 * 60),
            fixtures_dir: None,
            step_limit: None,
        }
    }
}

impl AppState {
    pub fn new(config: ServerConfig) -> HarnessResult<Self> {
        let mut fixtures = FixtureSet::builtin()?;
        if let Some(dir) = &config.fixtures_dir {
            fixtures.load_dir(dir)?;
        }
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            fixtures,
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionEntry>>, StatusCode> {
        self.sessions
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get or create a session from the session header.
    /// Returns the session token.
    fn get_or_create_session(&self, headers: &HeaderMap) -> Result<String, StatusCode> {
        let token = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut sessions = self.lock()?;

        let timeout = self.config.session_timeout;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_access.elapsed() < timeout);
        if sessions.len() < before {
            debug!(purged = before - sessions.len(), "expired sessions purged");
        }

        if let Some(t) = token {
            if let Some(entry) = sessions.get_mut(&t) {
                entry.last_access = Instant::now();
                return Ok(t);
            }
        }

        let mut app = WardApp::with_fixtures(self.fixtures.clone());
        if let Some(limit) = self.config.step_limit {
            app.set_step_limit(limit)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        }
        let new_token = Uuid::new_v4().to_string();
        info!(session = %new_token, "session created");
        sessions.insert(
            new_token.clone(),
            SessionEntry {
                app,
                last_access: Instant::now(),
            },
        );
        Ok(new_token)
    }

    /// Execute a closure with the ward app of the given token.
    fn with_session<F, R>(&self, token: &str, f: F) -> Result<R, StatusCode>
    where
        F: FnOnce(&mut WardApp) -> R,
    {
        let mut sessions = self.lock()?;
        let entry = sessions.get_mut(token).ok_or(StatusCode::BAD_REQUEST)?;
        entry.last_access = Instant::now();
        Ok(f(&mut entry.app))
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn error_status(e: &HarnessError) -> StatusCode {
    match e {
        HarnessError::Action(_)
        | HarnessError::UnknownFixture(_)
        | HarnessError::NoMatch { .. }
        | HarnessError::Ambiguous { .. }
        | HarnessError::InvalidSelector { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Response builder
// ---------------------------------------------------------------------------

/// Build a JSON response with the session header attached.
fn session_response<T: Serialize>(token: &str, status: StatusCode, body: T) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(val) = HeaderValue::from_str(token) {
        headers.insert(SESSION_HEADER, val);
    }
    (status, headers, Json(body)).into_response()
}

fn state_of(app: &mut WardApp) -> HarnessResult<StateResponse> {
    Ok(StateResponse {
        url: app.current_url()?,
        elapsed_ms: app.elapsed().as_millis() as u64,
    })
}

/// Resolve the session, run `f` on its app and serialise the outcome.
async fn respond<F, T>(state: Arc<AppState>, headers: HeaderMap, f: F) -> Response
where
    F: FnOnce(&mut WardApp) -> HarnessResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    run_blocking(move || {
        let token = match state.get_or_create_session(&headers) {
            Ok(t) => t,
            Err(s) => {
                let body = ErrorResponse {
                    error: "session creation failed".into(),
                };
                return session_response("", s, body);
            }
        };

        match state.with_session(&token, f) {
            Ok(Ok(body)) => session_response(&token, StatusCode::OK, body),
            Ok(Err(e)) => {
                debug!(session = %token, error = %e, "request rejected");
                let body = ErrorResponse {
                    error: e.to_string(),
                };
                session_response(&token, error_status(&e), body)
            }
            Err(s) => {
                let body = ErrorResponse {
                    error: "session error".into(),
                };
                session_response("", s, body)
            }
        }
    })
    .await
}

/// Run an action and answer with the resulting route and clock.
async fn act<F>(state: Arc<AppState>, headers: HeaderMap, f: F) -> Response
where
    F: FnOnce(&mut WardApp) -> HarnessResult<()> + Send + 'static,
{
    respond(state, headers, move |app| {
        f(app)?;
        state_of(app)
    })
    .await
}

// ---------------------------------------------------------------------------
// Blocking helper
// ---------------------------------------------------------------------------

/// Run a closure on a blocking thread and return its response.
///
/// Rendering and parsing a page is synchronous work done while the session
/// map is locked, so it stays off the async workers.
async fn run_blocking<F>(f: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fixture", post(fixture))
        .route("/api/authenticate", post(authenticate))
        .route("/api/visit", post(visit))
        .route("/api/click", post(click))
        .route("/api/focus", post(focus))
        .route("/api/fill", post(fill))
        .route("/api/choose", post(choose))
        .route("/api/settle", post(settle))
        .route("/api/advance", post(advance))
        .route("/api/url", get(url))
        .route("/api/page", get(page))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> &'static str {
    "ok"
}

/// POST /api/fixture  { name }
async fn fixture(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<FixtureRequest>,
) -> Response {
    act(state, headers, move |app| app.reset_fixture(&params.name)).await
}

/// POST /api/authenticate  { username }
async fn authenticate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<AuthenticateRequest>,
) -> Response {
    act(state, headers, move |app| app.authenticate(&params.username)).await
}

/// POST /api/visit  { route }
async fn visit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<VisitRequest>,
) -> Response {
    act(state, headers, move |app| app.visit(&params.route)).await
}

/// POST /api/click  { target }
async fn click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<TargetRequest>,
) -> Response {
    act(state, headers, move |app| app.click(&params.target)).await
}

/// POST /api/focus  { target }
async fn focus(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<TargetRequest>,
) -> Response {
    act(state, headers, move |app| app.focus(&params.target)).await
}

/// POST /api/fill  { target, text }
async fn fill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<FillRequest>,
) -> Response {
    act(state, headers, move |app| app.fill(&params.target, &params.text)).await
}

/// POST /api/choose  { target, option }
async fn choose(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<ChooseRequest>,
) -> Response {
    act(state, headers, move |app| app.choose(&params.target, &params.option)).await
}

/// POST /api/settle
async fn settle(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    act(state, headers, |app| app.settle()).await
}

/// POST /api/advance  { ms }
async fn advance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(params): Json<AdvanceRequest>,
) -> Response {
    act(state, headers, move |app| {
        app.advance(Duration::from_millis(params.ms))
    })
    .await
}

/// GET /api/url
async fn url(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    respond(state, headers, state_of).await
}

/// GET /api/page
async fn page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    respond(state, headers, |app| {
        Ok(PageResponse {
            url: app.url().to_string(),
            html: app.html()?,
            elapsed_ms: app.elapsed().as_millis() as u64,
        })
    })
    .await
}

/// Bind `0.0.0.0:{port}` and serve until the process exits.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let port = config.port;
    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("rounds server listening on http://localhost:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
