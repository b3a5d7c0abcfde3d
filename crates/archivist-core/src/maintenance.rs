//! Report and purge passes over completed backup records.

use crate::bulk::fold_by_status;
use crate::error::Error;
use crate::filter::StatusFilter;
use crate::progress::{PassKind, ProgressReporter};
use crate::storage::models::BackupRecord;
use crate::storage::RecordStore;
use crate::validity::StorageValidator;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Only records that finished the build pipeline are eligible.
pub const ELIGIBLE: [StatusFilter; 1] = [StatusFilter::completed()];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub total: usize,
    pub invalid: usize,
}

impl ValidationStats {
    pub fn valid(&self) -> usize {
        self.total - self.invalid
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeOutcome {
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeFailure {
    pub record_id: i64,
    pub reason: String,
}

/// What happened to one record during a purge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Kept,
    Deleted,
    DeleteFailed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidRecordsReport {
    pub message: String,
    pub stats: ValidationStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub message: String,
    pub outcome: PurgeOutcome,
    pub deleted_ids: Vec<i64>,
    pub failures: Vec<PurgeFailure>,
}

/// Per-record results collected during a purge pass.
#[derive(Debug, Default)]
struct PurgeLedger {
    visited: usize,
    outcome: PurgeOutcome,
    deleted_ids: Vec<i64>,
    failures: Vec<PurgeFailure>,
}

impl PurgeLedger {
    fn record(mut self, record_id: i64, outcome: RecordOutcome) -> Self {
        self.visited += 1;
        match outcome {
            RecordOutcome::Kept => {}
            RecordOutcome::Deleted => {
                self.outcome.deleted += 1;
                self.deleted_ids.push(record_id);
            }
            RecordOutcome::DeleteFailed(reason) => {
                self.outcome.failed += 1;
                self.failures.push(PurgeFailure { record_id, reason });
            }
        }
        self
    }
}

/// Count eligible records and how many of them have no readable copy left.
pub fn report_invalid_records<S: RecordStore + ?Sized>(
    store: &S,
    validator: &StorageValidator,
    batch_size: usize,
    reporter: &dyn ProgressReporter,
) -> Result<InvalidRecordsReport, Error> {
    let start = Instant::now();
    reporter.on_pass_start(PassKind::Report);

    let stats = fold_by_status(
        store,
        &ELIGIBLE,
        batch_size,
        ValidationStats::default(),
        |mut stats, record| {
            stats.total += 1;
            let valid = validator.is_valid(&record);
            if !valid {
                stats.invalid += 1;
            }
            reporter.on_record_checked(stats.total, record.id, valid);
            stats
        },
    )?;

    reporter.on_pass_complete(PassKind::Report, stats.total, start.elapsed().as_secs_f64());
    info!(
        total = stats.total,
        invalid = stats.invalid,
        "Backup record validation pass finished"
    );

    Ok(InvalidRecordsReport {
        message: report_message(&stats),
        stats,
    })
}

/// Delete every eligible record that has no readable copy left.
///
/// A failed delete is counted and logged; the pass carries on. Only a store
/// failure while fetching records ends it early.
pub fn purge_invalid_records<S: RecordStore + ?Sized>(
    store: &S,
    validator: &StorageValidator,
    batch_size: usize,
    reporter: &dyn ProgressReporter,
) -> Result<PurgeReport, Error> {
    let start = Instant::now();
    reporter.on_pass_start(PassKind::Purge);

    let ledger = fold_by_status(
        store,
        &ELIGIBLE,
        batch_size,
        PurgeLedger::default(),
        |ledger, record| {
            let valid = validator.is_valid(&record);
            reporter.on_record_checked(ledger.visited + 1, record.id, valid);
            let outcome = if valid {
                RecordOutcome::Kept
            } else {
                delete_record(store, &record)
            };
            ledger.record(record.id, outcome)
        },
    )?;

    reporter.on_pass_complete(PassKind::Purge, ledger.visited, start.elapsed().as_secs_f64());
    info!(
        deleted = ledger.outcome.deleted,
        failed = ledger.outcome.failed,
        "Backup record purge pass finished"
    );

    Ok(PurgeReport {
        message: purge_message(&ledger.outcome),
        outcome: ledger.outcome,
        deleted_ids: ledger.deleted_ids,
        failures: ledger.failures,
    })
}

fn delete_record<S: RecordStore + ?Sized>(store: &S, record: &BackupRecord) -> RecordOutcome {
    let reason = match store.delete(record) {
        Ok(true) => return RecordOutcome::Deleted,
        Ok(false) => "record store removed nothing".to_string(),
        Err(err) => err.to_string(),
    };
    warn!(
        record_id = record.id,
        reason = %reason,
        "Purging backup records: failed to delete package with ID {}",
        record.id
    );
    RecordOutcome::DeleteFailed(reason)
}

pub fn report_message(stats: &ValidationStats) -> String {
    format!(
        "{} of {} backup records don't exist in any of their storages.",
        stats.invalid, stats.total
    )
}

pub fn purge_message(outcome: &PurgeOutcome) -> String {
    let noun = if outcome.deleted == 1 {
        "backup record was"
    } else {
        "backup records were"
    };
    if outcome.failed > 0 {
        format!(
            "{} {} deleted. Failed to delete {}.",
            outcome.deleted, noun, outcome.failed
        )
    } else {
        format!("{} {} deleted.", outcome.deleted, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(deleted: usize, failed: usize) -> PurgeOutcome {
        PurgeOutcome { deleted, failed }
    }

    #[test]
    fn test_purge_message_singular() {
        assert_eq!(purge_message(&outcome(1, 0)), "1 backup record was deleted.");
    }

    #[test]
    fn test_purge_message_zero_is_plural() {
        assert_eq!(purge_message(&outcome(0, 0)), "0 backup records were deleted.");
    }

    #[test]
    fn test_purge_message_plural() {
        assert_eq!(purge_message(&outcome(5, 0)), "5 backup records were deleted.");
    }

    #[test]
    fn test_purge_message_with_failures_reports_both_counts() {
        assert_eq!(
            purge_message(&outcome(1, 2)),
            "1 backup record was deleted. Failed to delete 2."
        );
        assert_eq!(
            purge_message(&outcome(0, 3)),
            "0 backup records were deleted. Failed to delete 3."
        );
    }

    #[test]
    fn test_report_message() {
        let stats = ValidationStats {
            total: 12,
            invalid: 3,
        };
        assert_eq!(
            report_message(&stats),
            "3 of 12 backup records don't exist in any of their storages."
        );
        assert_eq!(stats.valid(), 9);
    }

    #[test]
    fn test_ledger_counts_each_record_once() {
        let ledger = PurgeLedger::default()
            .record(1, RecordOutcome::Kept)
            .record(2, RecordOutcome::Deleted)
            .record(3, RecordOutcome::DeleteFailed("locked".to_string()));
        assert_eq!(ledger.visited, 3);
        assert_eq!(ledger.outcome, outcome(1, 1));
        assert_eq!(ledger.deleted_ids, vec![2]);
        assert_eq!(ledger.failures[0].record_id, 3);
    }
}
