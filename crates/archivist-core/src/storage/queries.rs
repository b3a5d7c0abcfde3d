use super::models::*;
use super::sqlite::Database;
use crate::error::Error;
use crate::filter::StatusFilter;
use rusqlite::{params, params_from_iter, OptionalExtension, Result};
use tracing::debug;

type RecordRow = (i64, String, i64, String);

impl Database {
    // ── Backup Records ───────────────────────────────────────────

    pub fn insert_record(
        &self,
        name: &str,
        status: Status,
        references: &[StorageReference],
    ) -> Result<i64> {
        let tx = self.connection().unchecked_transaction()?;
        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO backup_record (name, status, created_at) VALUES (?1, ?2, ?3)",
            params![name, status.code(), now],
        )?;
        let record_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO storage_reference (record_id, position, destination_id, locator) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, reference) in references.iter().enumerate() {
                stmt.execute(params![
                    record_id,
                    position as i64,
                    reference.destination_id,
                    reference.locator
                ])?;
            }
        }
        tx.commit()?;
        debug!(
            "Inserted backup record {} '{}' with {} storage references",
            record_id,
            name,
            references.len()
        );
        Ok(record_id)
    }

    pub fn get_record(&self, id: i64) -> std::result::Result<Option<BackupRecord>, Error> {
        let row: Option<RecordRow> = self
            .connection()
            .query_row(
                "SELECT id, name, status, created_at FROM backup_record WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row)?)),
            None => Ok(None),
        }
    }

    pub fn count_records(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM backup_record", [], |row| row.get(0))
    }

    /// Keyset-paginated lookup: rows strictly after `after_id`, ascending id.
    /// Deleting already-returned rows never shifts the next page.
    pub fn find_records(
        &self,
        filters: &[StatusFilter],
        after_id: Option<i64>,
        limit: usize,
    ) -> std::result::Result<Vec<BackupRecord>, Error> {
        let mut sql =
            String::from("SELECT id, name, status, created_at FROM backup_record WHERE id > ?1");
        let mut values: Vec<i64> = vec![after_id.unwrap_or(0)];
        for filter in filters {
            values.push(filter.threshold.code());
            sql.push_str(&format!(" AND status {} ?{}", filter.op.as_sql(), values.len()));
        }
        values.push(limit as i64);
        sql.push_str(&format!(" ORDER BY id LIMIT ?{}", values.len()));

        let rows: Vec<RecordRow> = {
            let mut stmt = self.connection().prepare(&sql)?;
            let mapped = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            mapped.collect::<Result<Vec<_>>>()?
        };

        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    pub fn delete_record(&self, id: i64) -> Result<bool> {
        let removed = self
            .connection()
            .execute("DELETE FROM backup_record WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    // ── Storage References ───────────────────────────────────────

    pub fn get_references(&self, record_id: i64) -> Result<Vec<StorageReference>> {
        let mut stmt = self.connection().prepare(
            "SELECT destination_id, locator FROM storage_reference \
             WHERE record_id = ?1 ORDER BY position",
        )?;
        let refs = stmt
            .query_map(params![record_id], |row| {
                Ok(StorageReference {
                    destination_id: row.get(0)?,
                    locator: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(refs)
    }

    fn hydrate(&self, (id, name, code, created_at): RecordRow) -> std::result::Result<BackupRecord, Error> {
        let status = Status::from_code(code).ok_or_else(|| {
            Error::CorruptRecord(format!("record {} has unknown status code {}", id, code))
        })?;
        Ok(BackupRecord {
            id,
            name,
            status,
            references: self.get_references(id)?,
            created_at,
        })
    }
}
