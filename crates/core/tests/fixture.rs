use std::collections::HashMap;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rounds_core::fixture::{doc_id, DocStore, Fixture, FixtureSet};
use rounds_core::{HarnessConfig, HarnessError};
use serde_json::json;

fn sample() -> Fixture {
    Fixture::from_json(
        r#"{
            "name": "ward",
            "docs": [
                { "_id": "patient_2_b", "type": "patient", "data": { "firstName": "Bea" } },
                { "_id": "patient_2_a", "type": "patient", "data": { "firstName": "Al" } },
                { "_id": "lookup_2_sex", "type": "lookup", "data": { "values": ["Female", "Male"] } }
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn builtin_patient_fixture_loads() {
    let set = FixtureSet::builtin().unwrap();
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["patient"]);

    let mut store = DocStore::new();
    store.reset(set.get("patient").unwrap());
    assert!(!store.is_empty());
    assert!(!store.list("visit").is_empty());
}

#[test]
fn store_lists_by_kind_in_id_order() {
    let mut store = DocStore::new();
    store.reset(&sample());
    let keys: Vec<&str> = store.list("patient").iter().map(|d| d.key()).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get("patient_2_a").unwrap().rev, "1-0");
}

#[test]
fn reset_discards_changes() {
    let fixture = sample();
    let mut store = DocStore::new();
    store.reset(&fixture);
    let before = store.canonical_bytes().unwrap();
    let fingerprint = store.fingerprint().unwrap();

    store.put("visit", "visit_2_new", json!({ "visitType": "Clinic" }));
    store.remove("patient_2_a");
    assert_ne!(store.canonical_bytes().unwrap(), before);

    store.reset(&fixture);
    assert_eq!(store.canonical_bytes().unwrap(), before);
    assert_eq!(store.fingerprint().unwrap(), fingerprint);
}

#[test]
fn put_counts_revisions() {
    let mut store = DocStore::new();
    store.reset(&sample());

    let id = doc_id("visit", "v1");
    assert_eq!(store.put("visit", &id, json!({ "visitType": "Clinic" })), "1-1");
    assert_eq!(store.get(&id).unwrap().key(), "v1");

    let rev = store.put("patient", "patient_2_a", json!({ "firstName": "Alan" }));
    assert_eq!(rev, "2-2");
    assert_eq!(store.get("patient_2_a").unwrap().data["firstName"], "Alan");
}

#[test]
fn invalid_fixtures_are_rejected() {
    let cases = [
        r#"{ "name": "", "docs": [] }"#,
        r#"{ "name": "x", "docs": [ { "_id": "visit_2_1", "type": "patient" } ] }"#,
        r#"{ "name": "x", "docs": [ { "_id": "patient_2_", "type": "patient" } ] }"#,
        r#"{ "name": "x", "docs": [
              { "_id": "patient_2_1", "type": "patient" },
              { "_id": "patient_2_1", "type": "patient" } ] }"#,
    ];
    for text in cases {
        let err = Fixture::from_json(text).unwrap_err();
        assert!(matches!(err, HarnessError::Fixture(_)), "{text}: {err:?}");
    }
    assert!(matches!(
        Fixture::from_json("not json").unwrap_err(),
        HarnessError::Json(_)
    ));
}

#[test]
fn unknown_fixture_name() {
    let set = FixtureSet::builtin().unwrap();
    let err = set.get("maternity").unwrap_err();
    assert_eq!(err.to_string(), "unknown fixture: maternity");
}

#[test]
fn load_dir_adds_and_replaces() {
    let dir = std::env::temp_dir().join(format!("rounds-fixtures-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("ward.json"), serde_json::to_string(&sample()).unwrap()).unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let mut set = FixtureSet::builtin().unwrap();
    assert_eq!(set.load_dir(&dir).unwrap(), 1);
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["patient", "ward"]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn config_defaults() {
    let config = HarnessConfig::default();
    assert_eq!(config.username, "hradmin");
    let policy = config.wait_policy();
    assert_eq!(policy.timeout, Duration::from_millis(5_000));
    assert_eq!(policy.poll_interval, Duration::from_millis(25));
    assert_eq!(config.remote, None);
}

#[test]
fn config_from_toml_then_env() {
    let path = std::env::temp_dir().join(format!("rounds-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "wait_timeout_ms = 2000\n\n[remote]\nbase_url = \"http://ward:9000\"\n",
    )
    .unwrap();
    let mut config = HarnessConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.wait_timeout_ms, 2_000);
    assert_eq!(config.poll_interval_ms, 25);
    let remote = config.remote.clone().unwrap();
    assert_eq!(remote.base_url, "http://ward:9000");
    assert_eq!(remote.timeout_secs, 30);

    let vars: HashMap<&str, &str> = [
        ("ROUNDS_WAIT_TIMEOUT_MS", "750"),
        ("ROUNDS_USERNAME", "nurse"),
    ]
    .into_iter()
    .collect();
    config
        .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(config.wait_timeout_ms, 750);
    assert_eq!(config.username, "nurse");
}

#[test]
fn remote_url_from_env_selects_the_remote_driver() {
    let mut config = HarnessConfig::default();
    config
        .apply_vars(|key| (key == "ROUNDS_REMOTE_URL").then(|| "http://ward:9000".to_string()))
        .unwrap();
    let remote = config.remote.unwrap();
    assert_eq!(remote.base_url, "http://ward:9000");
    assert_eq!(remote.timeout_secs, 30);
}

#[test]
fn use_remote_keeps_other_remote_settings() {
    let mut config: HarnessConfig =
        toml::from_str("[remote]\nbase_url = \"http://a:1\"\ntimeout_secs = 5\n").unwrap();
    config.use_remote("http://b:2");
    let remote = config.remote.unwrap();
    assert_eq!(remote.base_url, "http://b:2");
    assert_eq!(remote.timeout_secs, 5);
}

#[test]
fn config_rejects_bad_numbers() {
    let mut config = HarnessConfig::default();
    let err = config
        .apply_vars(|key| (key == "ROUNDS_POLL_INTERVAL_MS").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(matches!(err, HarnessError::Config(_)));
}
