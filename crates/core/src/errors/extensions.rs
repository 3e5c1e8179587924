//! Path context for raw I/O results

use super::types::{Error, Result};
use std::path::Path;

/// Attach the path and the operation that failed to an I/O result
pub trait IoResultExt<T> {
    fn with_path(self, path: &Path, operation: &str) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path, operation: &str) -> Result<T> {
        self.map_err(|e| Error::file_system(path, operation, e))
    }
}
