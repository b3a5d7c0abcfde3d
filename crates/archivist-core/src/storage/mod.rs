pub mod models;
pub mod queries;
pub mod sqlite;

pub use sqlite::Database;

use crate::error::Error;
use crate::filter::StatusFilter;
use models::BackupRecord;

/// The narrow view of the record store the maintenance workflow needs.
pub trait RecordStore {
    /// Up to `limit` records matching every filter with `id > after_id`,
    /// in ascending id order.
    fn find_batch(
        &self,
        filters: &[StatusFilter],
        after_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<BackupRecord>, Error>;

    /// Remove a record. `Ok(false)` means the store removed nothing.
    fn delete(&self, record: &BackupRecord) -> Result<bool, Error>;
}

impl RecordStore for Database {
    fn find_batch(
        &self,
        filters: &[StatusFilter],
        after_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<BackupRecord>, Error> {
        self.find_records(filters, after_id, limit)
    }

    fn delete(&self, record: &BackupRecord) -> Result<bool, Error> {
        Ok(self.delete_record(record.id)?)
    }
}
