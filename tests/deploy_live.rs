//! Integration test: full deployment run against a live host.
//!
//! Requires a throwaway VPS reachable over SSH and a repository
//! the token can read. Skipped in normal `cargo test` runs
//! unless the `integration` feature is enabled.
//!
//! ```sh
//! TRABUCO_TEST_REPO=https://github.com/you/app.git \
//! TRABUCO_TEST_TOKEN=ghp_... \
//! TRABUCO_TEST_HOST=203.0.113.7 \
//! TRABUCO_TEST_USER=root \
//! TRABUCO_TEST_KEY=$HOME/.ssh/id_ed25519 \
//! cargo test --features integration --test deploy_live
//! ```

#![cfg(feature = "integration")]

use trabuco::{DeployConfig, Pipeline};

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set for integration tests"))
}

#[test]
fn full_deployment_round_trip() {
    let config = DeployConfig::new(&env("TRABUCO_TEST_REPO"), &env("TRABUCO_TEST_TOKEN"))
        .branch("main")
        .remote(&env("TRABUCO_TEST_USER"), &env("TRABUCO_TEST_HOST"))
        .key_path(&env("TRABUCO_TEST_KEY"))
        .port(3000);

    let host = config.host.clone();
    let result = Pipeline::new(config).run_deployment();

    assert!(
        result.success,
        "failed at {:?}: {:?}",
        result.failed_stage, result.diagnostic
    );
    assert_eq!(result.url.as_deref(), Some(format!("http://{host}").as_str()));

    let report = result.validation.expect("validation report present");
    assert_eq!(report.checks.len(), 4);
    assert!(report.healthy(), "{report:?}");

    // Second run exercises the reuse paths: update in place
    // instead of clone, zero installs, tolerant teardown of the
    // previous container.
    let config = DeployConfig::new(&env("TRABUCO_TEST_REPO"), &env("TRABUCO_TEST_TOKEN"))
        .branch("main")
        .remote(&env("TRABUCO_TEST_USER"), &env("TRABUCO_TEST_HOST"))
        .key_path(&env("TRABUCO_TEST_KEY"))
        .port(3000);
    let result = Pipeline::new(config).run_deployment();
    assert!(result.success);
}
