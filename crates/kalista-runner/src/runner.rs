//! # Test Runner
//!
//! Executes every contract in a [`ContractSource`] and collects exactly one
//! [`Outcome`] per identifier.
//!
//! Each contract runs as its own task on a [`JoinSet`]. A [`Semaphore`]
//! bounds how many are in flight. The run returns only after every task
//! has finished; a failing or panicking contract never affects the others.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use kalista_contract::{ContractParser, ContractSource};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::RunnerConfig;
use crate::error::{ContractError, RunnerError};
use crate::exchange::Exchange;
use crate::outcome::{Outcome, RunReport};

/// Runs contracts concurrently with a bounded number in flight.
#[derive(Debug, Clone)]
pub struct TestRunner {
    pipeline: Pipeline,
    max_concurrency: usize,
}

impl TestRunner {
    /// Build a runner from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] for an unusable configuration and
    /// [`RunnerError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let exchange = Exchange::new(config.timeout())?;
        Ok(Self::with_exchange(exchange, config.max_concurrency))
    }

    /// Build a runner over an existing executor. A cap of zero is raised to one.
    pub fn with_exchange(exchange: Exchange, max_concurrency: usize) -> Self {
        Self {
            pipeline: Pipeline {
                parser: ContractParser::new(),
                exchange,
            },
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Upper bound on contracts executing at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Parse and execute one contract inline.
    pub async fn test_contract(&self, identifier: &str, bytes: &[u8]) -> Outcome {
        self.pipeline.run(identifier, bytes).await
    }

    /// Execute every contract in `source`.
    pub async fn run(&self, source: Arc<ContractSource>) -> RunReport {
        self.run_with(source, |_| {}).await
    }

    /// Execute every contract in `source`, calling `on_outcome` as each one
    /// completes.
    pub async fn run_with<F>(&self, source: Arc<ContractSource>, on_outcome: F) -> RunReport
    where
        F: FnMut(&Outcome),
    {
        let pipeline = self.pipeline.clone();
        let unit = move |identifier: String, source: Arc<ContractSource>| {
            let pipeline = pipeline.clone();
            async move {
                let bytes = source.get(&identifier).unwrap_or_default();
                pipeline.run(&identifier, bytes).await
            }
        };
        supervise(source, self.max_concurrency, unit, on_outcome).await
    }
}

/// Run `unit` once per identifier in `source`, at most `max_concurrency` at
/// a time, and collect exactly one outcome per identifier.
///
/// Each unit future runs on its own task under a supervisor task. A unit
/// that panics becomes a [`Verdict::Failure`](crate::Verdict::Failure); an
/// identifier whose supervisor dies before reporting gets one after the
/// drain.
async fn supervise<U, Fut, F>(
    source: Arc<ContractSource>,
    max_concurrency: usize,
    unit: U,
    mut on_outcome: F,
) -> RunReport
where
    U: Fn(String, Arc<ContractSource>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
    F: FnMut(&Outcome),
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency));
    let mut tasks = JoinSet::new();
    let mut pending: HashSet<String> = HashSet::with_capacity(source.len());
    let started = Instant::now();

    for identifier in source.identifiers() {
        let identifier = identifier.to_string();
        pending.insert(identifier.clone());

        let semaphore = Arc::clone(&semaphore);
        let source = Arc::clone(&source);
        let unit = unit.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let handle = tokio::spawn(unit(identifier.clone(), source));
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(contract = %identifier, "contract task ended abnormally: {err}");
                    Outcome::failure(identifier, format!("contract task ended abnormally: {err}"))
                }
            }
        });
    }

    let mut outcomes = Vec::with_capacity(pending.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                pending.remove(&outcome.identifier);
                on_outcome(&outcome);
                outcomes.push(outcome);
            }
            Err(err) => tracing::error!("contract supervisor task failed: {err}"),
        }
    }

    // Any identifier whose supervisor itself died still gets an outcome.
    let mut orphans: Vec<String> = pending.into_iter().collect();
    orphans.sort();
    for identifier in orphans {
        let outcome = Outcome::failure(identifier, ORPHANED_DETAIL);
        on_outcome(&outcome);
        outcomes.push(outcome);
    }

    let report = RunReport::new(outcomes);
    tracing::info!(
        total = report.total(),
        passed = report.passed(),
        failed = report.failed(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run finished"
    );
    report
}

const ORPHANED_DETAIL: &str = "contract task ended without reporting";

/// Parse every contract in `source` without contacting any server.
///
/// Outcomes are sorted by identifier.
pub fn check_source(source: &ContractSource) -> RunReport {
    let parser = ContractParser::new();
    let mut outcomes: Vec<Outcome> = source
        .iter()
        .map(|(identifier, bytes)| {
            let started = Instant::now();
            match parser.parse(identifier, bytes) {
                Ok(definition) => Outcome::success(
                    identifier,
                    definition.contract_id().map(String::from),
                    started.elapsed(),
                ),
                Err(e) => Outcome::error(
                    identifier,
                    declared_contract_id(&parser, identifier, bytes),
                    e.into(),
                    started.elapsed(),
                ),
            }
        })
        .collect();
    outcomes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    RunReport::new(outcomes)
}

/// Parse-then-execute for a single contract.
#[derive(Debug, Clone)]
struct Pipeline {
    parser: ContractParser,
    exchange: Exchange,
}

impl Pipeline {
    async fn run(&self, identifier: &str, bytes: &[u8]) -> Outcome {
        let started = Instant::now();
        let definition = match self.parser.parse(identifier, bytes) {
            Ok(definition) => definition,
            Err(e) => {
                let error = ContractError::from(e);
                tracing::warn!(contract = identifier, kind = %error.kind(), "contract rejected: {error}");
                return Outcome::error(
                    identifier,
                    declared_contract_id(&self.parser, identifier, bytes),
                    error,
                    started.elapsed(),
                );
            }
        };

        let contract_id = definition.contract_id().map(String::from);
        match self.exchange.execute(&definition).await {
            Ok(report) => {
                tracing::info!(
                    contract = identifier,
                    status = report.status,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "contract passed"
                );
                Outcome::success(identifier, contract_id, started.elapsed())
            }
            Err(error) => {
                tracing::warn!(contract = identifier, kind = %error.kind(), "contract failed: {error}");
                Outcome::error(identifier, contract_id, error, started.elapsed())
            }
        }
    }
}

/// Best-effort `contractId` for a document that failed to parse fully.
fn declared_contract_id(parser: &ContractParser, identifier: &str, bytes: &[u8]) -> Option<String> {
    parser
        .parse_raw(identifier, bytes)
        .ok()
        .and_then(|raw| raw.contract_id().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;

    fn source(entries: &[(&str, &str)]) -> ContractSource {
        ContractSource::from_entries(
            entries
                .iter()
                .map(|(id, text)| (id.to_string(), text.as_bytes().to_vec())),
        )
        .unwrap()
    }

    #[test]
    fn check_source_reports_every_contract() {
        let source = source(&[
            ("b.yaml", "contractId: good\nurl: http://h/\nmethod: GET\n"),
            (
                "a.yaml",
                "contractId: broken\nurl: http://h/\nmethod: GET\nresponse: '{nope'\n",
            ),
            ("c.yaml", "method: GET\n"),
        ]);
        let report = check_source(&source);
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 1);

        let ids: Vec<&str> = report.outcomes().iter().map(|o| o.identifier.as_str()).collect();
        assert_eq!(ids, ["a.yaml", "b.yaml", "c.yaml"]);

        let a = report.get("a.yaml").unwrap();
        assert_eq!(a.error_kind(), Some(ErrorKind::SchemaCompile));
        assert_eq!(a.contract_id.as_deref(), Some("broken"));
        assert_eq!(report.get("c.yaml").unwrap().error_kind(), Some(ErrorKind::Parse));
    }

    #[test]
    fn zero_cap_is_raised() {
        let exchange = Exchange::new(Duration::from_secs(1)).unwrap();
        assert_eq!(TestRunner::with_exchange(exchange, 0).max_concurrency(), 1);
    }

    #[test]
    fn new_rejects_zero_timeout() {
        let config = RunnerConfig {
            timeout_secs: 0,
            ..RunnerConfig::default()
        };
        assert!(matches!(TestRunner::new(&config), Err(RunnerError::Config(_))));
    }

    #[tokio::test]
    async fn empty_source_yields_empty_report() {
        let runner = TestRunner::new(&RunnerConfig::default()).unwrap();
        let report = runner.run(Arc::new(ContractSource::default())).await;
        assert_eq!(report.total(), 0);
        assert!(report.all_passed());
    }

    fn ok_unit(identifier: String, _: Arc<ContractSource>) -> impl Future<Output = Outcome> + Send {
        async move { Outcome::success(identifier, None, Duration::ZERO) }
    }

    #[tokio::test]
    async fn panicking_unit_fails_alone() {
        let source = Arc::new(source(&[("a.yaml", ""), ("boom.yaml", ""), ("c.yaml", "")]));
        let unit = |identifier: String, source: Arc<ContractSource>| async move {
            if identifier == "boom.yaml" {
                panic!("contract blew up");
            }
            ok_unit(identifier, source).await
        };

        let mut seen = Vec::new();
        let report = supervise(source, 2, unit, |o| seen.push(o.identifier.clone())).await;

        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 2);
        assert_eq!(seen.len(), 3);
        let boom = report.get("boom.yaml").unwrap();
        assert!(matches!(boom.verdict, crate::Verdict::Failure(_)));
        assert!(
            boom.detail().unwrap().starts_with("contract task ended abnormally"),
            "got: {:?}",
            boom.detail()
        );
    }

    #[tokio::test]
    async fn dead_supervisor_still_yields_an_outcome() {
        let source = Arc::new(source(&[("a.yaml", ""), ("lost.yaml", "")]));
        // Panicking before a future exists takes the supervisor task down
        // with it, so no outcome is ever sent for that identifier.
        let unit = |identifier: String, source: Arc<ContractSource>| {
            if identifier == "lost.yaml" {
                panic!("unit could not start");
            }
            ok_unit(identifier, source)
        };

        let report = supervise(source, 4, unit, |_| {}).await;

        assert_eq!(report.total(), 2);
        assert!(report.get("a.yaml").unwrap().is_success());
        let lost = report.get("lost.yaml").unwrap();
        assert!(matches!(lost.verdict, crate::Verdict::Failure(_)));
        assert_eq!(lost.detail().as_deref(), Some(ORPHANED_DETAIL));
    }

    #[tokio::test]
    async fn parse_failure_is_reported_without_network() {
        let runner = TestRunner::new(&RunnerConfig::default()).unwrap();
        let outcome = runner.test_contract("bad.yaml", b"url: [").await;
        assert_eq!(outcome.identifier, "bad.yaml");
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Parse));
    }
}
