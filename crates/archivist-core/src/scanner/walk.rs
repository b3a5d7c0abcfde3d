use super::{ScanClass, ScanEntry, ScanReport, ScanRequest, ScanRules};
use crate::config::{dedupe_scan_roots, normalize_scan_roots, OversizePolicy};
use crate::progress::ProgressReporter;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

const PROGRESS_EVERY: usize = 256;

/// Walk every root of the request and classify what an archive would pick up.
///
/// Nothing in here fails the scan: unreadable entries are recorded and
/// skipped. Symlinked directories are recorded as excluded and never
/// descended into.
pub fn scan(request: &ScanRequest, rules: &ScanRules, reporter: &dyn ProgressReporter) -> ScanReport {
    let start = Instant::now();
    reporter.on_scan_start();

    // A shallow walk of a parent root never reaches a nested root's children.
    let roots = if request.recursive {
        normalize_scan_roots(&request.roots)
    } else {
        dedupe_scan_roots(&request.roots)
    };

    let mut report = ScanReport::default();
    for root in roots {
        scan_root(&root, request.recursive, rules, &mut report, reporter);
    }

    let rejected_oversize = rules.oversize_policy == OversizePolicy::Reject
        && report.count(ScanClass::TooLarge) > 0;
    report.is_valid = report.file_count > 0 && !rejected_oversize;

    let elapsed = start.elapsed().as_secs_f64();
    reporter.on_scan_complete(report.file_count, elapsed);
    info!(
        files = report.file_count,
        entries = report.entries.len(),
        bytes = report.total_size,
        valid = report.is_valid,
        "Scan finished in {:.2}s",
        elapsed
    );
    report
}

fn scan_root(
    root: &Path,
    recursive: bool,
    rules: &ScanRules,
    report: &mut ScanReport,
    reporter: &dyn ProgressReporter,
) {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter();

    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                debug!(path = %path.display(), error = %err, "Unreadable scan entry");
                push(report, path, 0, ScanClass::Unreadable);
                continue;
            }
        };

        let path = entry.path();
        let is_dir = entry.file_type().is_dir();

        if rules.is_excluded(path) {
            let size = if is_dir {
                0
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            };
            push(report, path.to_path_buf(), size, ScanClass::Excluded);
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        if is_dir {
            continue;
        }

        let (size, class) = classify_file(path, rules);
        if class == ScanClass::Ok {
            report.file_count += 1;
            report.total_size += size;
        }
        push(report, path.to_path_buf(), size, class);

        if report.entries.len() % PROGRESS_EVERY == 0 {
            reporter.on_scan_progress(report.entries.len(), &path.to_string_lossy());
        }
    }
}

/// Classify a non-directory walk entry. Links are resolved here, so a
/// symlink to a directory comes out as `Excluded`.
fn classify_file(path: &Path, rules: &ScanRules) -> (u64, ScanClass) {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Cannot stat scan entry");
            return (0, ScanClass::Unreadable);
        }
    };

    if metadata.is_dir() {
        debug!(path = %path.display(), "Not following symlinked directory");
        return (0, ScanClass::Excluded);
    }

    let size = metadata.len();
    if let Err(err) = File::open(path) {
        debug!(path = %path.display(), error = %err, "Cannot open scan entry");
        return (size, ScanClass::Unreadable);
    }

    if rules.is_too_large(size) {
        return (size, ScanClass::TooLarge);
    }
    (size, ScanClass::Ok)
}

fn push(report: &mut ScanReport, path: PathBuf, size: u64, class: ScanClass) {
    report.entries.push(ScanEntry { path, size, class });
}
