use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Lifecycle status of a backup record.
///
/// Ordered by its numeric code. Failure and cancellation states are negative,
/// so a `>= Complete` filter only ever selects records that finished the
/// build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    RequirementsFailed,
    StorageFailed,
    StorageCancelled,
    PendingCancel,
    BuildCancelled,
    Error,
    PreProcess,
    Scanning,
    ScanValidation,
    AfterScan,
    Start,
    DbStart,
    DbDone,
    ArcStart,
    ArcValidation,
    ArcDone,
    CopiedPackage,
    StorageProcessing,
    Complete,
}

impl Status {
    pub const ALL: [Status; 19] = [
        Status::RequirementsFailed,
        Status::StorageFailed,
        Status::StorageCancelled,
        Status::PendingCancel,
        Status::BuildCancelled,
        Status::Error,
        Status::PreProcess,
        Status::Scanning,
        Status::ScanValidation,
        Status::AfterScan,
        Status::Start,
        Status::DbStart,
        Status::DbDone,
        Status::ArcStart,
        Status::ArcValidation,
        Status::ArcDone,
        Status::CopiedPackage,
        Status::StorageProcessing,
        Status::Complete,
    ];

    pub fn code(self) -> i64 {
        match self {
            Status::RequirementsFailed => -6,
            Status::StorageFailed => -5,
            Status::StorageCancelled => -4,
            Status::PendingCancel => -3,
            Status::BuildCancelled => -2,
            Status::Error => -1,
            Status::PreProcess => 0,
            Status::Scanning => 3,
            Status::ScanValidation => 4,
            Status::AfterScan => 5,
            Status::Start => 10,
            Status::DbStart => 20,
            Status::DbDone => 39,
            Status::ArcStart => 40,
            Status::ArcValidation => 60,
            Status::ArcDone => 65,
            Status::CopiedPackage => 70,
            Status::StorageProcessing => 75,
            Status::Complete => 100,
        }
    }

    pub fn from_code(code: i64) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.code() == code)
    }
}

impl PartialOrd for Status {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Status {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Where one copy of a record's archive lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageReference {
    pub destination_id: String,
    pub locator: String,
}

impl StorageReference {
    pub fn new(destination_id: &str, locator: &str) -> Self {
        Self {
            destination_id: destination_id.to_string(),
            locator: locator.to_string(),
        }
    }
}

/// A backup package record as held by the record store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub id: i64,
    pub name: String,
    pub status: Status,
    pub references: Vec<StorageReference>,
    pub created_at: String,
}
