//! File-backed status location shared with detached renderer processes.

use super::token::{StatusRead, StatusSource, StatusToken};
use crate::error::{AssistantError, Result};
use std::path::{Path, PathBuf};
use tracing::trace;

/// A small world-readable file holding exactly one status token.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `token`.
    ///
    /// The token is written to a sibling temp file and renamed into place,
    /// so readers see either the old or the new token.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Status`] if the file cannot be written.
    pub fn write(&self, token: &StatusToken) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let fail = |e: std::io::Error| {
            AssistantError::Status(format!("cannot write {}: {e}", self.path.display()))
        };

        std::fs::write(&tmp, token.encode()).map_err(fail)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).map_err(fail)?;
        }

        std::fs::rename(&tmp, &self.path).map_err(fail)?;
        trace!(token = %token, path = %self.path.display(), "status written");
        Ok(())
    }

    /// Read and classify the current content.
    #[must_use]
    pub fn read(&self) -> StatusRead {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => StatusRead::from_content(&content),
            Err(_) => StatusRead::Unreadable,
        }
    }
}

impl StatusSource for StatusFile {
    fn observe(&mut self) -> StatusRead {
        self.read()
    }
}
