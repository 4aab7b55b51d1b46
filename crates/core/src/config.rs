//! Harness configuration.
//!
//! Resolution order: `Default`, then an optional TOML file, then `ROUNDS_*`
//! environment variables. Command-line flags are applied last by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::wait::WaitPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Upper bound for every wait predicate, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Time allowed to pass between two polls of a wait predicate.
    pub poll_interval_ms: u64,
    /// User the scenarios authenticate as.
    pub username: String,
    /// Extra `*.json` fixtures to load next to the built-in ones.
    pub fixtures_dir: Option<PathBuf>,
    /// When set, scenarios drive a `rounds-server` instead of the
    /// in-process app.
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of a `rounds-server`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 5_000,
            poll_interval_ms: 25,
            username: "hradmin".to_string(),
            fixtures_dir: None,
            remote: None,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3848".to_string(),
            timeout_secs: 30,
            user_agent: format!("rounds/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HarnessConfig {
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Overlay `ROUNDS_*` environment variables.
    pub fn apply_env(&mut self) -> HarnessResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup (used by `apply_env`).
    pub fn apply_vars<F>(&mut self, lookup: F) -> HarnessResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ROUNDS_WAIT_TIMEOUT_MS") {
            self.wait_timeout_ms = parse_number("ROUNDS_WAIT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ROUNDS_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_number("ROUNDS_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("ROUNDS_USERNAME") {
            self.username = v;
        }
        if let Some(v) = lookup("ROUNDS_FIXTURES_DIR") {
            self.fixtures_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ROUNDS_REMOTE_URL") {
            self.use_remote(&v);
        }
        Ok(())
    }

    /// Drive the server at `base_url`, keeping any other remote settings.
    pub fn use_remote(&mut self, base_url: &str) {
        self.remote.get_or_insert_with(RemoteConfig::default).base_url = base_url.to_string();
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_millis(self.wait_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }
}

fn parse_number(key: &str, value: &str) -> HarnessResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| HarnessError::Config(format!("{} must be a number, got {:?}", key, value)))
}
