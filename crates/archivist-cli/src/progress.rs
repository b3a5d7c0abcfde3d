use archivist_core::progress::PassKind;
use archivist_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif spinners.
///
/// - Maintenance passes: spinner with the number of records checked so far
/// - Scan: spinner with entries seen and the current path
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICKS));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));

        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn set_message(&self, message: String) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.as_ref() {
            pb.set_message(message);
        }
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

fn pass_label(kind: PassKind) -> &'static str {
    match kind {
        PassKind::Report => "Checking",
        PassKind::Purge => "Purging",
    }
}

impl ProgressReporter for CliReporter {
    fn on_pass_start(&self, kind: PassKind) {
        self.start_spinner(&format!("{} backup records...", pass_label(kind)));
    }

    fn on_record_checked(&self, visited: usize, record_id: i64, _valid: bool) {
        self.set_message(format!("{} records checked (last id {})", visited, record_id));
    }

    fn on_pass_complete(&self, kind: PassKind, visited: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {} complete: {} records in {:.2}s",
            pass_label(kind),
            visited,
            duration_secs
        );
    }

    fn on_scan_start(&self) {
        self.start_spinner("Scanning files...");
    }

    fn on_scan_progress(&self, entries_seen: usize, current_path: &str) {
        self.set_message(format!("Scanning... {} entries ({})", entries_seen, current_path));
    }

    fn on_scan_complete(&self, file_count: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} includable files in {:.2}s",
            file_count, duration_secs
        );
    }
}
