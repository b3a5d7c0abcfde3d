use super::{BackendError, StorageBackend};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Archives kept as plain files below a root directory.
pub struct LocalBackend {
    id: String,
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(id: &str, root: &Path) -> Self {
        Self {
            id: id.to_string(),
            root: root.to_path_buf(),
        }
    }

    /// Locators are relative to the root; anything that would climb out of
    /// it is refused.
    fn resolve(&self, locator: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(locator);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if locator.is_empty() || escapes {
            return Err(BackendError::AccessDenied(format!(
                "locator '{}' is outside destination '{}'",
                locator, self.id
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl StorageBackend for LocalBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn exists(&self, locator: &str) -> Result<bool, BackendError> {
        let path = self.resolve(locator)?;
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        if !metadata.is_file() {
            return Ok(false);
        }
        match File::open(&path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => Err(
                BackendError::AccessDenied(format!("{}: {}", path.display(), err)),
            ),
            Err(err) => Err(err.into()),
        }
    }
}
