use crate::destination::DestinationRegistry;
use crate::storage::models::{BackupRecord, StorageReference};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Decides whether a backup record still has at least one readable copy.
pub struct StorageValidator {
    registry: DestinationRegistry,
}

impl StorageValidator {
    pub fn new(registry: DestinationRegistry) -> Self {
        Self { registry }
    }

    /// True iff any reference resolves to an existing object.
    ///
    /// Every reference is queried, even after a hit, so each failing
    /// destination gets logged. A record with no references is invalid.
    pub fn is_valid(&self, record: &BackupRecord) -> bool {
        if record.references.is_empty() {
            debug!(record_id = record.id, "Record has no storage references");
            return false;
        }

        let found: Vec<bool> = record
            .references
            .par_iter()
            .map(|reference| self.check_reference(record.id, reference))
            .collect();
        found.into_iter().any(|hit| hit)
    }

    fn check_reference(&self, record_id: i64, reference: &StorageReference) -> bool {
        let backend = match self.registry.get(&reference.destination_id) {
            Some(backend) => backend,
            None => {
                warn!(
                    record_id,
                    destination = %reference.destination_id,
                    "Storage destination is not configured, treating copy as missing"
                );
                return false;
            }
        };

        match backend.exists(&reference.locator) {
            Ok(found) => {
                debug!(
                    record_id,
                    destination = %reference.destination_id,
                    locator = %reference.locator,
                    found,
                    "Checked storage reference"
                );
                found
            }
            Err(err) => {
                warn!(
                    record_id,
                    destination = %reference.destination_id,
                    locator = %reference.locator,
                    error = %err,
                    "Storage query failed, treating copy as missing"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{BackendError, StorageBackend};
    use crate::storage::models::Status;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedBackend {
        id: &'static str,
        answer: Result<bool, &'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl StorageBackend for FixedBackend {
        fn id(&self) -> &str {
            self.id
        }

        fn exists(&self, _locator: &str) -> Result<bool, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map_err(|e| BackendError::Other(e.to_string()))
        }
    }

    fn record(refs: &[&str]) -> BackupRecord {
        BackupRecord {
            id: 7,
            name: "pkg".to_string(),
            status: Status::Complete,
            references: refs
                .iter()
                .map(|d| StorageReference::new(d, "pkg_archive.zip"))
                .collect(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn validator(calls: &Arc<AtomicUsize>) -> StorageValidator {
        let mut registry = DestinationRegistry::new();
        for (id, answer) in [
            ("present", Ok(true)),
            ("absent", Ok(false)),
            ("broken", Err("connection refused")),
        ] {
            registry.register(Box::new(FixedBackend {
                id,
                answer,
                calls: Arc::clone(calls),
            }));
        }
        StorageValidator::new(registry)
    }

    #[test]
    fn test_no_references_is_invalid() {
        let calls = Arc::new(AtomicUsize::new(0));
        assert!(!validator(&calls).is_valid(&record(&[])));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_any_present_copy_is_enough() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = validator(&calls);
        assert!(v.is_valid(&record(&["absent", "broken", "present"])));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failures_and_unknown_destinations_count_as_missing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = validator(&calls);
        assert!(!v.is_valid(&record(&["broken"])));
        assert!(!v.is_valid(&record(&["absent", "unknown"])));
    }

    #[test]
    fn test_present_first_still_queries_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let v = validator(&calls);
        assert!(v.is_valid(&record(&["present", "broken"])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
