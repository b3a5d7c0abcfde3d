#![allow(dead_code)]

use archivist_core::destination::{BackendError, DestinationRegistry, StorageBackend};
use archivist_core::guard::HostError;
use archivist_core::storage::models::{Status, StorageReference};
use archivist_core::{Database, ExecutionHost, ExecutionLimit};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

pub const ORIGINAL_LIMIT: Duration = Duration::from_secs(30);

/// Backend answering from a fixed set of present locators; locators in
/// `failing` raise an error instead.
pub struct MemoryBackend {
    pub id: String,
    pub present: HashSet<String>,
    pub failing: HashSet<String>,
}

impl MemoryBackend {
    pub fn new(id: &str, present: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            present: present.iter().map(|s| s.to_string()).collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, locators: &[&str]) -> Self {
        self.failing = locators.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl StorageBackend for MemoryBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn exists(&self, locator: &str) -> Result<bool, BackendError> {
        if self.failing.contains(locator) {
            return Err(BackendError::Other(format!("timeout querying {}", locator)));
        }
        Ok(self.present.contains(locator))
    }
}

pub fn registry(backends: Vec<MemoryBackend>) -> DestinationRegistry {
    let mut registry = DestinationRegistry::new();
    for backend in backends {
        registry.register(Box::new(backend));
    }
    registry
}

/// Insert a record whose single copy lives at `<name>.zip` on `local`.
pub fn insert(db: &Database, name: &str, status: Status) -> i64 {
    let locator = format!("{}.zip", name);
    db.insert_record(name, status, &[StorageReference::new("local", &locator)])
        .unwrap()
}

/// Host whose answers to each limit request are scripted up front.
pub struct ScriptedHost {
    pub unlimited: Result<bool, HostError>,
    pub bounded: Result<bool, HostError>,
    pub current: Mutex<ExecutionLimit>,
    pub calls: Mutex<Vec<ExecutionLimit>>,
}

impl ScriptedHost {
    pub fn new(unlimited: Result<bool, HostError>, bounded: Result<bool, HostError>) -> Self {
        Self {
            unlimited,
            bounded,
            current: Mutex::new(ExecutionLimit::Bounded(ORIGINAL_LIMIT)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ExecutionLimit> {
        self.calls.lock().unwrap().clone()
    }
}

impl ExecutionHost for ScriptedHost {
    fn execution_limit(&self) -> ExecutionLimit {
        *self.current.lock().unwrap()
    }

    fn set_execution_limit(&self, limit: ExecutionLimit) -> Result<bool, HostError> {
        self.calls.lock().unwrap().push(limit);
        let answer = match limit {
            ExecutionLimit::Unlimited => self.unlimited.clone(),
            // putting the original ceiling back always works
            ExecutionLimit::Bounded(d) if d == ORIGINAL_LIMIT => Ok(true),
            ExecutionLimit::Bounded(_) => self.bounded.clone(),
        };
        if answer == Ok(true) {
            *self.current.lock().unwrap() = limit;
        }
        answer
    }
}
