pub mod local;

pub use local::LocalBackend;

use crate::config::{DestinationConfig, DestinationKind};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Other(String),
}

/// A place that can hold one copy of a backup archive.
///
/// Implementations answer whether an object exists and is readable. Errors
/// are returned, never panicked; the caller decides what they mean.
pub trait StorageBackend: Send + Sync {
    fn id(&self) -> &str;
    fn exists(&self, locator: &str) -> Result<bool, BackendError>;
}

/// Destination id → backend.
#[derive(Default)]
pub struct DestinationRegistry {
    backends: HashMap<String, Box<dyn StorageBackend>>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(destinations: &[DestinationConfig]) -> Self {
        let mut registry = Self::new();
        for dest in destinations {
            match dest.kind {
                DestinationKind::Local => {
                    registry.register(Box::new(LocalBackend::new(&dest.id, &dest.root)))
                }
            }
        }
        debug!("Registered {} storage destinations", registry.len());
        registry
    }

    /// Replaces any backend already registered under the same id.
    pub fn register(&mut self, backend: Box<dyn StorageBackend>) {
        self.backends.insert(backend.id().to_string(), backend);
    }

    pub fn get(&self, id: &str) -> Option<&dyn StorageBackend> {
        self.backends.get(id).map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
