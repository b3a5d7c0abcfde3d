pub mod bulk;
pub mod config;
pub mod destination;
pub mod error;
pub mod filter;
pub mod guard;
pub mod maintenance;
pub mod progress;
pub mod scanner;
pub mod service;
pub mod storage;
pub mod validity;

pub use config::AppConfig;
pub use error::Error;
pub use filter::{CompareOp, StatusFilter};
pub use guard::{ExecutionGuard, ExecutionHost, ExecutionLimit, GuardState, ProcessHost};
pub use maintenance::{InvalidRecordsReport, PurgeOutcome, PurgeReport, ValidationStats};
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{ScanReport, ScanRequest};
pub use service::{MaintenanceService, ScanResponse};
pub use storage::models::{BackupRecord, Status, StorageReference};
pub use storage::{Database, RecordStore};
