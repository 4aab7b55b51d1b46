//! Named data snapshots and the document store they are loaded into.
//!
//! A fixture is a JSON object `{ "name": ..., "docs": [...] }`. Every doc has
//! an `_id` of the form `<kind>_2_<key>`, a `type` equal to `<kind>` and an
//! arbitrary `data` payload. The store keeps docs in id order, which makes
//! its serialised form canonical.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};

/// Fixtures compiled into the binary.
const BUILTIN: &[&str] = &[include_str!("../../fixtures/patient.json")];

/// Separator between a doc's kind and its key.
pub const ID_SEPARATOR: &str = "_2_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default)]
    pub rev: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Doc {
    /// The part of the id after the kind prefix.
    pub fn key(&self) -> &str {
        self.id
            .split_once(ID_SEPARATOR)
            .map(|(_, key)| key)
            .unwrap_or(&self.id)
    }
}

pub fn doc_id(kind: &str, key: &str) -> String {
    format!("{}{}{}", kind, ID_SEPARATOR, key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub docs: Vec<Doc>,
}

impl Fixture {
    pub fn from_json(text: &str) -> HarnessResult<Self> {
        let fixture: Fixture = serde_json::from_str(text)?;
        fixture.validate()?;
        Ok(fixture)
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::Fixture("fixture has no name".to_string()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for doc in &self.docs {
            let prefix = format!("{}{}", doc.kind, ID_SEPARATOR);
            if !doc.id.starts_with(&prefix) || doc.id.len() == prefix.len() {
                return Err(HarnessError::Fixture(format!(
                    "{}: doc id {:?} does not match its type {:?}",
                    self.name, doc.id, doc.kind
                )));
            }
            if !seen.insert(doc.id.as_str()) {
                return Err(HarnessError::Fixture(format!(
                    "{}: duplicate doc id {:?}",
                    self.name, doc.id
                )));
            }
        }
        Ok(())
    }
}

/// Ordered in-memory document store.
#[derive(Debug, Clone, Default)]
pub struct DocStore {
    docs: BTreeMap<String, Doc>,
    seq: u64,
}

impl DocStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and load the fixture's docs. Resetting twice to the
    /// same fixture leaves identical stores.
    pub fn reset(&mut self, fixture: &Fixture) {
        self.docs.clear();
        self.seq = 0;
        for doc in &fixture.docs {
            let mut doc = doc.clone();
            if doc.rev.is_empty() {
                doc.rev = "1-0".to_string();
            }
            self.docs.insert(doc.id.clone(), doc);
        }
        debug!(fixture = %fixture.name, docs = self.docs.len(), "store reset");
    }

    pub fn get(&self, id: &str) -> Option<&Doc> {
        self.docs.get(id)
    }

    /// Insert or replace a doc. Returns the new revision, `<n>-<seq>` where
    /// `n` counts writes to this id and `seq` counts writes to the store.
    pub fn put(&mut self, kind: &str, id: &str, data: serde_json::Value) -> String {
        let generation = self
            .docs
            .get(id)
            .and_then(|d| d.rev.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        self.seq += 1;
        let rev = format!("{}-{}", generation, self.seq);
        self.docs.insert(
            id.to_string(),
            Doc {
                id: id.to_string(),
                rev: rev.clone(),
                kind: kind.to_string(),
                data,
            },
        );
        rev
    }

    pub fn remove(&mut self, id: &str) -> Option<Doc> {
        self.docs.remove(id)
    }

    /// Docs of one kind, in id order.
    pub fn list(&self, kind: &str) -> Vec<&Doc> {
        self.docs.values().filter(|d| d.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn canonical_bytes(&self) -> HarnessResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.docs)?)
    }

    /// SHA-256 of the canonical bytes, hex encoded.
    pub fn fingerprint(&self) -> HarnessResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes()?);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// The fixtures a driver can reset to, by name.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    fixtures: BTreeMap<String, Fixture>,
}

impl FixtureSet {
    pub fn empty() -> Self {
        Self {
            fixtures: BTreeMap::new(),
        }
    }

    pub fn builtin() -> HarnessResult<Self> {
        let mut set = Self::empty();
        for text in BUILTIN {
            set.insert(Fixture::from_json(text)?);
        }
        Ok(set)
    }

    /// Add every `*.json` file in `dir`. A fixture with the same name as an
    /// existing one replaces it. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> HarnessResult<usize> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let text = std::fs::read_to_string(path)?;
            let fixture = Fixture::from_json(&text)
                .map_err(|e| HarnessError::Fixture(format!("{}: {}", path.display(), e)))?;
            self.insert(fixture);
        }
        info!(dir = %dir.display(), count = paths.len(), "loaded fixtures");
        Ok(paths.len())
    }

    pub fn insert(&mut self, fixture: Fixture) {
        self.fixtures.insert(fixture.name.clone(), fixture);
    }

    pub fn get(&self, name: &str) -> HarnessResult<&Fixture> {
        self.fixtures
            .get(name)
            .ok_or_else(|| HarnessError::UnknownFixture(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fixtures.keys().map(|k| k.as_str())
    }
}
