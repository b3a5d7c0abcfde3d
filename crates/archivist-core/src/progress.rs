/// Which kind of maintenance pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Report,
    Purge,
}

/// Trait for reporting maintenance progress.
///
/// CLI implements with indicatif spinners. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_pass_start(&self, _kind: PassKind) {}
    fn on_record_checked(&self, _visited: usize, _record_id: i64, _valid: bool) {}
    fn on_pass_complete(&self, _kind: PassKind, _visited: usize, _duration_secs: f64) {}
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _entries_seen: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _file_count: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
