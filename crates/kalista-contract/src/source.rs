//! # Contract Source
//!
//! [`ContractSource`] is an immutable map from contract identifier to raw
//! bytes. It is built once at startup and handed to the runner, which
//! shares it read-only across tasks.
//!
//! [`load_dir`] builds a source from a directory tree. Which files count
//! as contracts is decided by an explicit [`ExtensionFilter`] rather than
//! a hard-coded extension list.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Immutable mapping from contract identifier to raw contract bytes.
#[derive(Debug, Clone, Default)]
pub struct ContractSource {
    entries: HashMap<String, Vec<u8>>,
}

impl ContractSource {
    /// Build a source from `(identifier, bytes)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DuplicateIdentifier`] if two entries share
    /// an identifier.
    pub fn from_entries<I>(entries: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut map = HashMap::new();
        for (identifier, bytes) in entries {
            if map.contains_key(&identifier) {
                return Err(SourceError::DuplicateIdentifier(identifier));
            }
            map.insert(identifier, bytes);
        }
        Ok(Self { entries: map })
    }

    /// Raw bytes for `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&[u8]> {
        self.entries.get(identifier).map(Vec::as_slice)
    }

    /// All identifiers, in no particular order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All `(identifier, bytes)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of contracts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no contracts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which files under a contract root are treated as contract documents.
///
/// Textual form (config files, environment, CLI):
/// - `*` — every file
/// - `yml,yaml` — only these extensions
/// - `!json,md` — every file except these extensions
///
/// Extensions compare case-insensitively; leading dots are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExtensionFilter {
    /// Accept every file.
    Any,
    /// Accept only files with one of these extensions.
    Include(Vec<String>),
    /// Accept every file except those with one of these extensions.
    Exclude(Vec<String>),
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::Include(vec!["yml".to_string(), "yaml".to_string()])
    }
}

impl ExtensionFilter {
    /// Filter accepting exactly `extensions`.
    pub fn include<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Include(normalize_all(extensions))
    }

    /// Filter rejecting exactly `extensions`.
    pub fn exclude<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Exclude(normalize_all(extensions))
    }

    /// Returns true if `path` should be loaded as a contract.
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize);
        match self {
            Self::Any => true,
            Self::Include(list) => ext.is_some_and(|e| list.contains(&e)),
            Self::Exclude(list) => !ext.is_some_and(|e| list.contains(&e)),
        }
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn normalize_all<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| normalize(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}

impl FromStr for ExtensionFilter {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "*" {
            return Ok(Self::Any);
        }
        let (negated, list) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let extensions = normalize_all(list.split(','));
        if extensions.is_empty() {
            return Err(SourceError::InvalidFilter(s.to_string()));
        }
        Ok(if negated {
            Self::Exclude(extensions)
        } else {
            Self::Include(extensions)
        })
    }
}

impl TryFrom<String> for ExtensionFilter {
    type Error = SourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Include(list) => f.write_str(&list.join(",")),
            Self::Exclude(list) => write!(f, "!{}", list.join(",")),
        }
    }
}

impl From<ExtensionFilter> for String {
    fn from(filter: ExtensionFilter) -> Self {
        filter.to_string()
    }
}

/// Load every contract file under `root`.
///
/// Walks `root` recursively, keeps regular files accepted by `filter`, and
/// keys each by its path. If `root` is itself a file it is loaded as the
/// only contract, regardless of the filter. Files that cannot be read, or
/// whose path is not valid UTF-8, are logged and skipped.
///
/// # Errors
///
/// Returns [`SourceError::Root`] if `root` does not exist or cannot be listed.
pub fn load_dir(root: &Path, filter: &ExtensionFilter) -> Result<ContractSource, SourceError> {
    let root_error = |reason: String| SourceError::Root {
        path: root.display().to_string(),
        reason,
    };

    let metadata = fs::metadata(root).map_err(|e| root_error(e.to_string()))?;

    let files = if metadata.is_file() {
        vec![root.to_path_buf()]
    } else {
        let mut files = Vec::new();
        let entries = fs::read_dir(root).map_err(|e| root_error(e.to_string()))?;
        collect_files(entries, &mut files);
        files.sort();
        files.retain(|path| {
            let accepted = filter.accepts(path);
            if !accepted {
                tracing::trace!(path = %path.display(), "skipping file rejected by extension filter");
            }
            accepted
        });
        files
    };

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        // Identifiers must be lossless; two non-UTF-8 names could otherwise collide.
        let Some(identifier) = path.to_str() else {
            tracing::warn!(path = %path.display(), "skipping contract file with a non-UTF-8 path");
            continue;
        };
        match fs::read(&path) {
            Ok(bytes) => entries.push((identifier.to_string(), bytes)),
            Err(e) => tracing::warn!(path = %path.display(), "cannot read contract file: {e}"),
        }
    }

    tracing::debug!(root = %root.display(), contracts = entries.len(), "loaded contract source");
    ContractSource::from_entries(entries)
}

/// Recursively collect regular files. Symlinked directories are not followed.
fn collect_files(entries: fs::ReadDir, out: &mut Vec<PathBuf>) {
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            match fs::read_dir(&path) {
                Ok(children) => collect_files(children, out),
                Err(e) => tracing::warn!(path = %path.display(), "cannot list directory: {e}"),
            }
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            out.push(path);
        }
    }
}
