//! Status-filtered bulk iteration over the record store.
//!
//! Records are pulled in batches of bounded size, keyed on the last id seen,
//! so a consumer may delete records it has already been handed without the
//! next batch skipping or repeating anything. Store-side filtering is
//! re-checked on every record before it is handed out.

use crate::error::Error;
use crate::filter::{matches_all, StatusFilter};
use crate::storage::models::BackupRecord;
use crate::storage::RecordStore;
use std::collections::VecDeque;
use tracing::trace;

pub struct RecordBatches<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    filters: &'a [StatusFilter],
    batch_size: usize,
    buffer: VecDeque<BackupRecord>,
    last_id: Option<i64>,
    exhausted: bool,
}

impl<'a, S: RecordStore + ?Sized> RecordBatches<'a, S> {
    pub fn new(store: &'a S, filters: &'a [StatusFilter], batch_size: usize) -> Self {
        Self {
            store,
            filters,
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            last_id: None,
            exhausted: false,
        }
    }

    fn refill(&mut self) -> Result<(), Error> {
        let batch = self
            .store
            .find_batch(self.filters, self.last_id, self.batch_size)?;
        trace!(
            "Fetched batch of {} records after id {:?}",
            batch.len(),
            self.last_id
        );
        if batch.len() < self.batch_size {
            self.exhausted = true;
        }
        if let Some(last) = batch.last() {
            self.last_id = Some(last.id);
        }
        let filters = self.filters;
        self.buffer
            .extend(batch.into_iter().filter(|r| matches_all(filters, r.status)));
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> Iterator for RecordBatches<'_, S> {
    type Item = Result<BackupRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.refill() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Fold every record matching `filters` into an accumulator, in store order.
///
/// The first store error ends the pass and is returned; nothing the closure
/// does can fail the pass.
pub fn fold_by_status<S, B, F>(
    store: &S,
    filters: &[StatusFilter],
    batch_size: usize,
    init: B,
    mut f: F,
) -> Result<B, Error>
where
    S: RecordStore + ?Sized,
    F: FnMut(B, BackupRecord) -> B,
{
    let mut acc = init;
    for record in RecordBatches::new(store, filters, batch_size) {
        acc = f(acc, record?);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::Status;
    use crate::storage::Database;

    fn db_with(statuses: &[Status]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for (i, status) in statuses.iter().enumerate() {
            db.insert_record(&format!("pkg-{}", i), *status, &[]).unwrap();
        }
        db
    }

    #[test]
    fn test_visits_every_match_across_batches_in_order() {
        let db = db_with(&[Status::Complete; 7]);
        let filters = [StatusFilter::completed()];
        let names: Vec<String> = fold_by_status(&db, &filters, 3, Vec::new(), |mut acc, r| {
            acc.push(r.name);
            acc
        })
        .unwrap();
        let expected: Vec<String> = (0..7).map(|i| format!("pkg-{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let db = db_with(&[Status::Scanning, Status::Error]);
        let filters = [StatusFilter::completed()];
        let visited = fold_by_status(&db, &filters, 10, 0usize, |n, _| n + 1).unwrap();
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_deleting_visited_records_does_not_skip_or_repeat() {
        let db = db_with(&[Status::Complete; 10]);
        let filters = [StatusFilter::completed()];
        let mut seen = Vec::new();
        for record in RecordBatches::new(&db, &filters, 4) {
            let record = record.unwrap();
            if record.id % 2 == 0 {
                assert!(db.delete_record(record.id).unwrap());
            }
            seen.push(record.id);
        }
        let mut unique = seen.clone();
        unique.dedup();
        assert_eq!(seen.len(), 10);
        assert_eq!(unique, seen);
        assert_eq!(db.count_records().unwrap(), 5);
    }

    #[test]
    fn test_exact_multiple_of_batch_size_terminates() {
        let db = db_with(&[Status::Complete; 6]);
        let filters = [StatusFilter::completed()];
        let visited = fold_by_status(&db, &filters, 3, 0usize, |n, _| n + 1).unwrap();
        assert_eq!(visited, 6);
    }
}
