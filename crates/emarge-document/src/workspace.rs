// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped scratch directories for external tool invocations.
//
// Every extraction call writes its inputs and tool outputs into its own
// uniquely named directory, so concurrent calls never collide. The directory
// is removed when the `TempWorkspace` is dropped, whichever way the call
// ends: success, tool failure, `?` propagation, or the future being dropped.

use std::path::{Path, PathBuf};

use emarge_core::error::{EmargeError, Result};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A uniquely named temporary directory, removed recursively on drop.
#[derive(Debug)]
pub struct TempWorkspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl TempWorkspace {
    /// Create a directory named `<prefix><random>` under `root`, or under the
    /// system temp directory when `root` is `None`.
    pub fn acquire(prefix: &str, root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|err| {
            EmargeError::Io(std::io::Error::new(
                err.kind(),
                format!("failed to create scratch directory: {err}"),
            ))
        })?;

        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Scratch directory acquired");
        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file directly inside the workspace (not created).
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create (if needed) and return a subdirectory of the workspace.
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove the workspace now and report whether removal succeeded.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(EmargeError::Io),
            None => Ok(()),
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        // Leaking a scratch directory is tolerable; failing the call is not.
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "Scratch directory removed"),
            Err(err) => warn!(
                path = %self.path.display(),
                %err,
                "Failed to remove scratch directory"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = TempWorkspace::acquire("emarge_test_", Some(root.path())).unwrap();
            std::fs::write(ws.file("input.pdf"), b"%PDF").unwrap();
            let pages = ws.subdir("pages").unwrap();
            std::fs::write(pages.join("page_1.png"), b"png").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists(), "workspace should be deleted on drop");
    }

    #[test]
    fn removed_when_operation_fails() {
        let root = tempfile::tempdir().unwrap();
        let mut seen = None;

        let outcome: Result<()> = (|| {
            let ws = TempWorkspace::acquire("emarge_test_", Some(root.path()))?;
            seen = Some(ws.path().to_path_buf());
            std::fs::write(ws.file("partial.txt"), b"half")?;
            Err(EmargeError::ConversionFailure("engine crashed".into()))
        })();

        assert!(outcome.is_err());
        assert!(!seen.unwrap().exists());
    }

    #[test]
    fn names_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = TempWorkspace::acquire("emarge_test_", Some(root.path())).unwrap();
        let b = TempWorkspace::acquire("emarge_test_", Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(
            a.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("emarge_test_")
        );
    }

    #[test]
    fn explicit_close_reports_success() {
        let ws = TempWorkspace::acquire("emarge_test_", None).unwrap();
        let path = ws.path().to_path_buf();
        ws.close().unwrap();
        assert!(!path.exists());
    }
}
