mod common;

use archivist_core::config::{AppConfig, DestinationConfig, DestinationKind};
use archivist_core::destination::DestinationRegistry;
use archivist_core::guard::HostError;
use archivist_core::storage::models::{Status, StorageReference};
use archivist_core::validity::StorageValidator;
use archivist_core::{Database, ExecutionHost, ExecutionLimit, MaintenanceService};
use common::{ScriptedHost, ORIGINAL_LIMIT};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

const HOUR: Duration = Duration::from_secs(3600);

fn config(backup_dir: &Path) -> AppConfig {
    AppConfig {
        batch_size: 2,
        destinations: vec![DestinationConfig {
            id: "default".to_string(),
            kind: DestinationKind::Local,
            root: backup_dir.to_path_buf(),
        }],
        ..AppConfig::default()
    }
}

fn service(
    config: &AppConfig,
    host: ScriptedHost,
) -> MaintenanceService<Database, ScriptedHost> {
    let db = Database::open_in_memory().unwrap();
    let validator = StorageValidator::new(DestinationRegistry::from_config(&config.destinations));
    MaintenanceService::new(config, db, validator, host)
}

fn add(svc: &MaintenanceService<Database, ScriptedHost>, name: &str, status: Status) -> i64 {
    svc.store()
        .insert_record(
            name,
            status,
            &[StorageReference::new("default", &format!("{}_archive.zip", name))],
        )
        .unwrap()
}

#[test]
fn test_report_and_purge_against_local_destination() {
    let backups = tempdir().unwrap();
    fs::write(backups.path().join("a_archive.zip"), b"PK").unwrap();
    let cfg = config(backups.path());
    let svc = service(&cfg, ScriptedHost::new(Ok(true), Ok(true)));

    let a = add(&svc, "a", Status::Complete);
    let b = add(&svc, "b", Status::Complete);
    let c = add(&svc, "c", Status::StorageProcessing);

    let report = svc.report_invalid_records().unwrap();
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.invalid, 1);

    let purge = svc.purge_invalid_records().unwrap();
    assert_eq!(purge.outcome.deleted, 1);
    assert_eq!(purge.outcome.failed, 0);
    assert_eq!(purge.deleted_ids, vec![b]);
    assert!(svc.store().get_record(a).unwrap().is_some());
    assert!(svc.store().get_record(c).unwrap().is_some());

    let json = serde_json::to_value(&purge).unwrap();
    assert_eq!(json["message"], "1 backup record was deleted.");
    assert_eq!(json["outcome"]["deleted"], 1);
    assert!(json["failures"].as_array().unwrap().is_empty());
}

#[test]
fn test_guard_falls_back_to_bounded_and_restores() {
    let backups = tempdir().unwrap();
    let cfg = config(backups.path());
    let host = ScriptedHost::new(
        Err(HostError::Failed("set_time_limit is disabled".to_string())),
        Ok(true),
    );
    let svc = service(&cfg, host);
    add(&svc, "orphan", Status::Complete);

    let purge = svc.purge_invalid_records().unwrap();
    assert_eq!(purge.outcome.deleted, 1);
    assert_eq!(
        svc.host().calls(),
        vec![
            ExecutionLimit::Unlimited,
            ExecutionLimit::Bounded(HOUR),
            ExecutionLimit::Bounded(ORIGINAL_LIMIT),
        ]
    );
    assert_eq!(svc.host().execution_limit(), ExecutionLimit::Bounded(ORIGINAL_LIMIT));
}

#[test]
fn test_denied_guard_still_completes_the_pass() {
    let backups = tempdir().unwrap();
    let cfg = config(backups.path());
    let svc = service(&cfg, ScriptedHost::new(Ok(false), Err(HostError::NotChangeable)));
    add(&svc, "orphan", Status::Complete);

    let report = svc.report_invalid_records().unwrap();
    assert_eq!(report.stats.invalid, 1);
    // nothing was granted, so nothing is restored
    assert_eq!(svc.host().calls().len(), 2);
}

#[test]
fn test_scan_request_with_invalid_flag_is_rejected_up_front() {
    let backups = tempdir().unwrap();
    let cfg = config(backups.path());
    let svc = service(&cfg, ScriptedHost::new(Ok(true), Ok(true)));

    for bad in [None, Some("perhaps")] {
        let response = svc.validate_scan_request(&[backups.path().to_path_buf()], bad);
        assert!(!response.success);
        assert_eq!(response.message, "Invalid Request.");
        assert!(response.scan_data.is_none());
    }
    // rejected before the guard was ever taken
    assert!(svc.host().calls().is_empty());
}

#[test]
fn test_scan_request_success_follows_validity() {
    let site = tempdir().unwrap();
    fs::write(site.path().join("index.php"), "<?php").unwrap();
    let empty = tempdir().unwrap();
    let cfg = config(site.path());
    let svc = service(&cfg, ScriptedHost::new(Ok(true), Ok(true)));

    let ok = svc.validate_scan_request(&[site.path().to_path_buf()], Some("true"));
    assert!(ok.success);
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["scanData"]["fileCount"], 1);
    assert_eq!(json["scanData"]["isValid"], true);
    assert_eq!(json["scanData"]["entries"][0]["class"], "OK");

    let none = svc.validate_scan_request(&[empty.path().to_path_buf()], Some("0"));
    assert!(!none.success);
    assert_eq!(none.scan_data.unwrap().file_count, 0);
}
