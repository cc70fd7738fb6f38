//! Shared flags and configuration layering.
//!
//! Precedence, lowest first: built-in defaults, the `--config` file,
//! `KALISTA_*` environment variables, command-line flags.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use kalista_contract::ExtensionFilter;
use kalista_runner::RunnerConfig;

/// Flags selecting which files are contracts.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceOptions {
    /// Treat files with this extension as contracts. Repeatable.
    #[arg(long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Treat every file under the directory as a contract.
    #[arg(long, conflicts_with = "extensions")]
    pub all_files: bool,
}

impl SourceOptions {
    /// Filter requested on the command line, if any.
    pub fn filter(&self) -> Option<ExtensionFilter> {
        if self.all_files {
            Some(ExtensionFilter::Any)
        } else if self.extensions.is_empty() {
            None
        } else {
            Some(ExtensionFilter::include(&self.extensions))
        }
    }
}

/// Flags tuning execution.
#[derive(Args, Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Timeout for one HTTP round trip, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Maximum number of contracts executed at once.
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    #[command(flatten)]
    pub source: SourceOptions,
}

/// Build the effective configuration from every layer.
pub fn resolve_config(config_path: Option<&Path>, options: &RunnerOptions) -> Result<RunnerConfig> {
    resolve_config_with(config_path, options, |key| std::env::var(key).ok())
}

/// [`resolve_config`] with an explicit environment lookup.
pub fn resolve_config_with<F>(
    config_path: Option<&Path>,
    options: &RunnerOptions,
    env: F,
) -> Result<RunnerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match config_path {
        Some(path) => RunnerConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunnerConfig::default(),
    };

    let mut config = base
        .with_overrides(env)
        .context("invalid KALISTA_* environment override")?;

    if let Some(secs) = options.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(n) = options.max_concurrency {
        config.max_concurrency = n;
    }
    if let Some(filter) = options.source.filter() {
        if matches!(&filter, ExtensionFilter::Include(list) if list.is_empty()) {
            bail!("--extension values must not be empty");
        }
        config.extensions = filter;
    }

    config.validate().context("invalid runner configuration")?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_any_layer() {
        let config = resolve_config_with(None, &RunnerOptions::default(), no_env).unwrap();
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn flags_override_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kalista.yaml");
        std::fs::write(&path, "timeout_secs: 3\nmax_concurrency: 2\nextensions: 'json'\n").unwrap();

        let options = RunnerOptions {
            timeout_secs: None,
            max_concurrency: Some(9),
            source: SourceOptions {
                extensions: Vec::new(),
                all_files: true,
            },
        };
        let env = |key: &str| (key == "KALISTA_TIMEOUT_SECS").then(|| "4".to_string());
        let config = resolve_config_with(Some(&path), &options, env).unwrap();

        assert_eq!(config.timeout_secs, 4);
        assert_eq!(config.max_concurrency, 9);
        assert_eq!(config.extensions, ExtensionFilter::Any);
    }

    #[test]
    fn file_layer_applies_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kalista.yaml");
        std::fs::write(&path, "extensions: '!md'\n").unwrap();
        let config = resolve_config_with(Some(&path), &RunnerOptions::default(), no_env).unwrap();
        assert_eq!(config.extensions, ExtensionFilter::exclude(["md"]));
    }

    #[test]
    fn extension_flags_build_include_filter() {
        let options = RunnerOptions {
            source: SourceOptions {
                extensions: vec![".contract".to_string(), "YML".to_string()],
                all_files: false,
            },
            ..RunnerOptions::default()
        };
        let config = resolve_config_with(None, &options, no_env).unwrap();
        assert_eq!(config.extensions, ExtensionFilter::include(["contract", "yml"]));
    }

    #[test]
    fn zero_concurrency_flag_is_rejected() {
        let options = RunnerOptions {
            max_concurrency: Some(0),
            ..RunnerOptions::default()
        };
        assert!(resolve_config_with(None, &options, no_env).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_config_with(
            Some(&dir.path().join("absent.yaml")),
            &RunnerOptions::default(),
            no_env,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("absent.yaml"));
    }
}
