//! Whole-run behaviour: fan-out, isolation, and the one-outcome-per-contract
//! guarantee.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use kalista_contract::{load_dir, ContractSource, ExtensionFilter};
use kalista_runner::{ErrorKind, Exchange, RunnerConfig, TestRunner};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(entries: Vec<(String, String)>) -> Arc<ContractSource> {
    Arc::new(
        ContractSource::from_entries(entries.into_iter().map(|(id, text)| (id, text.into_bytes())))
            .unwrap(),
    )
}

#[tokio::test]
async fn fifty_contracts_each_report_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/items/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1}))
                .set_delay(Duration::from_millis(20)),
        )
        .expect(50)
        .mount(&server)
        .await;

    let entries = (0..50)
        .map(|i| {
            (
                format!("items/{i:02}.yaml"),
                format!(
                    "contractId: item-{i}\nurl: {}/items/{i}\nmethod: GET\nstatus: 200\n\
                     response: '{{\"type\":\"object\",\"required\":[\"id\"]}}'\n",
                    server.uri()
                ),
            )
        })
        .collect();

    let runner = TestRunner::with_exchange(Exchange::new(Duration::from_secs(5)).unwrap(), 8);
    let mut streamed = 0;
    let report = runner.run_with(source(entries), |_| streamed += 1).await;

    assert_eq!(report.total(), 50);
    assert_eq!(report.passed(), 50);
    assert_eq!(streamed, 50);
    let unique: HashSet<&str> = report.outcomes().iter().map(|o| o.identifier.as_str()).collect();
    assert_eq!(unique.len(), 50);
}

#[tokio::test]
async fn broken_schema_does_not_affect_siblings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let entries = vec![
        (
            "good.yaml".to_string(),
            format!(
                "url: {}/ok\nmethod: GET\nresponse: '{{\"type\":\"object\"}}'\n",
                server.uri()
            ),
        ),
        (
            "broken.yaml".to_string(),
            format!(
                "contractId: broken\nurl: {}/ok\nmethod: GET\nresponse: '{{\"type\": \"object\"'\n",
                server.uri()
            ),
        ),
        ("garbage.yaml".to_string(), ":\n- [".to_string()),
    ];

    let runner = TestRunner::with_exchange(Exchange::new(Duration::from_secs(5)).unwrap(), 2);
    let report = runner.run(source(entries)).await;

    assert_eq!(report.total(), 3);
    assert!(report.get("good.yaml").unwrap().is_success());

    let broken = report.get("broken.yaml").unwrap();
    assert_eq!(broken.error_kind(), Some(ErrorKind::SchemaCompile));
    assert_eq!(broken.contract_id.as_deref(), Some("broken"));

    assert_eq!(
        report.get("garbage.yaml").unwrap().error_kind(),
        Some(ErrorKind::Parse)
    );
}

#[tokio::test]
async fn cap_of_one_still_runs_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .expect(5)
        .mount(&server)
        .await;

    let entries = (0..5)
        .map(|i| {
            (
                format!("c{i}.yaml"),
                format!("url: {}/c/{i}\nmethod: GET\nstatus: 204\n", server.uri()),
            )
        })
        .collect();

    let runner = TestRunner::with_exchange(Exchange::new(Duration::from_secs(5)).unwrap(), 1);
    let report = runner.run(source(entries)).await;
    assert_eq!(report.total(), 5);
    assert!(report.all_passed());
}

#[tokio::test]
async fn run_over_loaded_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "up"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("health.yaml"),
        format!(
            "contractId: health\nurl: {}/health\nmethod: GET\nstatus: 200\n\
             response: '{{\"type\":\"object\",\"required\":[\"status\"]}}'\n",
            server.uri()
        ),
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "ignored\n").unwrap();

    let config = RunnerConfig::default();
    let loaded = load_dir(dir.path(), &config.extensions).unwrap();
    assert_eq!(loaded.len(), 1);

    let report = TestRunner::new(&config).unwrap().run(Arc::new(loaded)).await;
    assert_eq!(report.total(), 1);
    assert!(report.all_passed());

    let any = load_dir(dir.path(), &ExtensionFilter::Any).unwrap();
    let report = TestRunner::new(&config).unwrap().run(Arc::new(any)).await;
    assert_eq!(report.total(), 2);
    assert_eq!(report.passed(), 1);
}
