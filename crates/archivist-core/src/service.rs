use crate::config::AppConfig;
use crate::destination::DestinationRegistry;
use crate::error::Error;
use crate::guard::{with_execution_guard, ExecutionHost, ExecutionLimit, HostPolicy, ProcessHost};
use crate::maintenance::{self, InvalidRecordsReport, PurgeReport};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::scanner::{self, ScanReport, ScanRequest, ScanRules};
use crate::storage::{Database, RecordStore};
use crate::validity::StorageValidator;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Reply to a scan validation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub scan_data: Option<ScanReport>,
}

/// Entry points of the maintenance tools. Every call runs under an
/// execution guard and returns one structured result.
pub struct MaintenanceService<S: RecordStore, H: ExecutionHost> {
    store: S,
    validator: StorageValidator,
    host: H,
    rules: ScanRules,
    batch_size: usize,
    fallback_limit: Duration,
    reporter: Box<dyn ProgressReporter>,
}

impl MaintenanceService<Database, ProcessHost> {
    /// Open the configured record store and destinations.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let store = Database::open(&config.db_path)?;
        let validator = StorageValidator::new(DestinationRegistry::from_config(&config.destinations));
        let host = ProcessHost::new(
            ExecutionLimit::Bounded(config.execution.default_limit()),
            HostPolicy {
                allow_unlimited: config.execution.allow_unlimited,
                max_limit: config.execution.max_limit(),
            },
        );
        Ok(Self::new(config, store, validator, host))
    }
}

impl<S: RecordStore, H: ExecutionHost> MaintenanceService<S, H> {
    pub fn new(config: &AppConfig, store: S, validator: StorageValidator, host: H) -> Self {
        Self {
            store,
            validator,
            host,
            rules: ScanRules::from_config(config),
            batch_size: config.batch_size.max(1),
            fallback_limit: config.execution.fallback_limit(),
            reporter: Box::new(SilentReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Pre-archive check of `roots`. An invalid `recursive` value is answered
    /// with a failure response before any filesystem access.
    pub fn validate_scan_request(&self, roots: &[PathBuf], recursive: Option<&str>) -> ScanResponse {
        let request = match ScanRequest::new(roots.to_vec(), recursive) {
            Ok(request) => request,
            Err(err) => {
                debug!(?recursive, "Rejected scan request");
                return ScanResponse {
                    success: false,
                    message: err.to_string(),
                    scan_data: None,
                };
            }
        };

        with_execution_guard(&self.host, self.fallback_limit, |state| {
            info!(?state, recursive = request.recursive, "Running scan validator");
            let report = scanner::scan(&request, &self.rules, self.reporter.as_ref());
            ScanResponse {
                success: report.is_valid,
                message: String::new(),
                scan_data: Some(report),
            }
        })
    }

    pub fn report_invalid_records(&self) -> Result<InvalidRecordsReport, Error> {
        with_execution_guard(&self.host, self.fallback_limit, |state| {
            debug!(?state, "Counting invalid backup records");
            maintenance::report_invalid_records(
                &self.store,
                &self.validator,
                self.batch_size,
                self.reporter.as_ref(),
            )
        })
    }

    pub fn purge_invalid_records(&self) -> Result<PurgeReport, Error> {
        with_execution_guard(&self.host, self.fallback_limit, |state| {
            debug!(?state, "Purging invalid backup records");
            maintenance::purge_invalid_records(
                &self.store,
                &self.validator,
                self.batch_size,
                self.reporter.as_ref(),
            )
        })
    }
}
