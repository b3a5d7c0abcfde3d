use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_FALLBACK_LIMIT_SECS: u64 = 3600;
pub const DEFAULT_LIMIT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_paths: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub oversize_policy: OversizePolicy,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

/// What an oversized file does to the validity of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Oversized files are reported but never invalidate the scan.
    #[default]
    Ignore,
    /// Any oversized file makes the scan invalid.
    Reject,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_true")]
    pub allow_unlimited: bool,
    #[serde(default)]
    pub max_limit_secs: Option<u64>,
    #[serde(default = "default_fallback_limit_secs")]
    pub fallback_limit_secs: u64,
    /// Ceiling in force before any guard changes it.
    #[serde(default = "default_limit_secs")]
    pub default_limit_secs: u64,
}

impl ExecutionConfig {
    pub fn fallback_limit(&self) -> Duration {
        Duration::from_secs(self.fallback_limit_secs)
    }

    pub fn default_limit(&self) -> Duration {
        Duration::from_secs(self.default_limit_secs)
    }

    pub fn max_limit(&self) -> Option<Duration> {
        self.max_limit_secs.map(Duration::from_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            allow_unlimited: true,
            max_limit_secs: None,
            fallback_limit_secs: DEFAULT_FALLBACK_LIMIT_SECS,
            default_limit_secs: DEFAULT_LIMIT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DestinationConfig {
    pub id: String,
    pub kind: DestinationKind,
    pub root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            exclude_prefixes: Vec::new(),
            max_file_size: None,
            oversize_policy: OversizePolicy::default(),
            db_path: default_db_path(),
            batch_size: DEFAULT_BATCH_SIZE,
            execution: ExecutionConfig::default(),
            destinations: Vec::new(),
        }
    }
}

fn default_db_path() -> String {
    "archivist.db".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_fallback_limit_secs() -> u64 {
    DEFAULT_FALLBACK_LIMIT_SECS
}

fn default_limit_secs() -> u64 {
    DEFAULT_LIMIT_SECS
}

fn default_true() -> bool {
    true
}

/// Load `Config.{toml,yaml,json}` from the working directory (optional),
/// overlaid by `ARCHIVIST__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let built = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(environment())
        .build()?;
    finish(built)
}

/// Load configuration from an explicit file, still honouring the environment overlay.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let built = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .add_source(environment())
        .build()?;
    finish(built)
}

fn environment() -> Environment {
    Environment::with_prefix("ARCHIVIST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("root_paths")
        .with_list_parse_key("ignore_patterns")
        .with_list_parse_key("exclude_prefixes")
}

fn finish(built: Config) -> Result<AppConfig, ConfigError> {
    let config = built.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Message(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.execution.fallback_limit_secs == 0 {
            return Err(ConfigError::Message(
                "execution.fallback_limit_secs must be at least 1".to_string(),
            ));
        }
        for (i, dest) in self.destinations.iter().enumerate() {
            if self.destinations[..i].iter().any(|d| d.id == dest.id) {
                return Err(ConfigError::Message(format!(
                    "duplicate destination id '{}'",
                    dest.id
                )));
            }
        }
        Ok(())
    }

    pub fn scan_roots(&self) -> Vec<PathBuf> {
        self.root_paths.iter().map(PathBuf::from).collect()
    }
}

/// Drop roots that live under another root in the list, so a recursive walk
/// never visits the same file twice. First-seen order is kept.
pub fn normalize_scan_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for root in roots {
        if result.iter().any(|kept| root.starts_with(kept)) {
            continue;
        }
        result.retain(|kept| !kept.starts_with(root));
        result.push(root.clone());
    }

    result
}

/// Drop exact repeats only. First-seen order is kept.
pub fn dedupe_scan_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        if !result.contains(root) {
            result.push(root.clone());
        }
    }
    result
}
