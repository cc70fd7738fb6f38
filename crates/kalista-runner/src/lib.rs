//! # kalista-runner — Contract Execution
//!
//! Runs parsed contracts against live HTTP services and reports one
//! outcome per contract.
//!
//! ## Components
//!
//! - [`RunnerConfig`]: timeout, concurrency cap, and extension filter,
//!   layered from defaults, a YAML file, and `KALISTA_*` variables.
//! - [`Exchange`]: one HTTP round trip plus every declared check, over a
//!   shared `reqwest::Client`.
//! - [`TestRunner`]: fans contracts out over a bounded task set and waits
//!   for all of them.
//! - [`ContractError`]: the failure taxonomy, classified by [`ErrorKind`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kalista_contract::load_dir;
//! use kalista_runner::{RunnerConfig, TestRunner};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunnerConfig::default().with_env()?;
//! let source = load_dir("contracts".as_ref(), &config.extensions)?;
//! let report = TestRunner::new(&config)?.run(Arc::new(source)).await;
//! println!("{}/{} passed", report.passed(), report.total());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod outcome;
pub mod runner;

pub use config::{ConfigError, RunnerConfig};
pub use error::{ContractError, ErrorKind, RunnerError};
pub use exchange::{validate_body, Exchange, ExchangeReport};
pub use outcome::{Outcome, RunReport, Verdict};
pub use runner::{check_source, TestRunner};
