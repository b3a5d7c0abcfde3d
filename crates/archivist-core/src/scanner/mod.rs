pub mod walk;

pub use walk::scan;

use crate::config::{AppConfig, OversizePolicy};
use crate::error::Error;
use glob::Pattern;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;

pub const INVALID_REQUEST: &str = "Invalid Request.";

/// Classification of one scanned entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanClass {
    Ok,
    TooLarge,
    Excluded,
    Unreadable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub size: u64,
    pub class: ScanClass,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
    pub file_count: usize,
    pub total_size: u64,
    pub is_valid: bool,
}

impl ScanReport {
    pub fn count(&self, class: ScanClass) -> usize {
        self.entries.iter().filter(|e| e.class == class).count()
    }
}

/// A validated request to scan a set of roots.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub roots: Vec<PathBuf>,
    pub recursive: bool,
}

impl ScanRequest {
    /// `recursive` is the raw request value; a missing or non-boolean value
    /// rejects the whole request before anything touches the filesystem.
    pub fn new(roots: Vec<PathBuf>, recursive: Option<&str>) -> Result<Self, Error> {
        let recursive = recursive
            .and_then(parse_bool_flag)
            .ok_or_else(|| Error::InvalidRequest(INVALID_REQUEST.to_string()))?;
        Ok(Self { roots, recursive })
    }
}

/// Lenient boolean parsing of a form value: `1/true/on/yes` and
/// `0/false/off/no/""`, case-insensitive. Anything else is `None`.
pub fn parse_bool_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Exclusion and size rules applied to each entry.
#[derive(Debug, Clone, Default)]
pub struct ScanRules {
    pub ignore_patterns: Vec<Pattern>,
    pub exclude_prefixes: Vec<PathBuf>,
    pub max_file_size: Option<u64>,
    pub oversize_policy: OversizePolicy,
}

impl ScanRules {
    pub fn from_config(config: &AppConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            ignore_patterns,
            exclude_prefixes: config.exclude_prefixes.iter().map(PathBuf::from).collect(),
            max_file_size: config.max_file_size,
            oversize_policy: config.oversize_policy,
        }
    }

    /// Globs are tried against the full path and the bare file name.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_prefixes.iter().any(|p| path.starts_with(p)) {
            return true;
        }
        let name = path.file_name().and_then(|n| n.to_str());
        self.ignore_patterns.iter().any(|pattern| {
            pattern.matches_path(path) || name.map(|n| pattern.matches(n)).unwrap_or(false)
        })
    }

    pub fn is_too_large(&self, size: u64) -> bool {
        self.max_file_size.map(|max| size > max).unwrap_or(false)
    }
}
