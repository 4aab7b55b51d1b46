//! The scenario catalog, driven over HTTP by `RemoteDriver`.

use std::sync::Arc;

use rounds_core::config::RemoteConfig;
use rounds_core::driver::remote::RemoteDriver;
use rounds_core::{visits, Driver, HarnessConfig, HarnessError, Runner};
use rounds_server::{build_router, AppState, ServerConfig};

/// Start a server on an ephemeral port in a background thread and return
/// its base URL.
fn spawn_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let state = Arc::new(AppState::new(ServerConfig::default()).unwrap());
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, build_router(state)).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

fn remote_driver(base_url: &str) -> RemoteDriver {
    let config = RemoteConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    RemoteDriver::new(&config).unwrap()
}

#[test]
fn remote_driver_keeps_its_session() {
    let base_url = spawn_server();
    let mut driver = remote_driver(&base_url);
    assert!(driver.session().is_none());

    driver.reset_fixture("patient").unwrap();
    let token = driver.session().map(String::from);
    assert!(token.is_some());

    driver.authenticate("hradmin").unwrap();
    driver.visit("/patients").unwrap();
    driver.settle().unwrap();
    assert_eq!(driver.current_url().unwrap(), "/patients");
    assert_eq!(driver.session().map(String::from), token);
}

#[test]
fn remote_rejections_are_action_errors() {
    let base_url = spawn_server();
    let mut driver = remote_driver(&base_url);
    let err = driver.reset_fixture("no-such-fixture").unwrap_err();
    assert!(matches!(err, HarnessError::Action(ref m) if m == "unknown fixture: no-such-fixture"));
}

#[test]
fn unreachable_server_is_a_driver_error() {
    let mut driver = remote_driver("http://127.0.0.1:9");
    let err = driver.current_url().unwrap_err();
    assert!(matches!(err, HarnessError::Driver(_)));
}

#[test]
fn catalog_passes_over_http() {
    let base_url = spawn_server();
    let mut driver = remote_driver(&base_url);
    let config = HarnessConfig::default();
    let runner = Runner::new(config.wait_policy(), &config.username);

    let catalog = visits::catalog();
    let report = runner.run(&mut driver, &catalog);

    for failed in report.failures() {
        eprintln!("{}: {:?}", failed.name, failed.failure);
    }
    assert!(report.success());
    assert_eq!(report.total, catalog.len());
}
