// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Locating external tools at run time.
//
// Discovery order per tool: known absolute paths (existence check), versioned
// install directories (enumerated), then bare names checked on `PATH` with a
// short no-op invocation. Results are cached per tool; every cache hit is
// revalidated so an uninstalled tool is rediscovered rather than reused.

pub mod catalog;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Mutex;
use std::time::Duration;

use emarge_core::config::OcrSettings;
use emarge_core::types::{ToolHandle, ToolId, ToolSource};
use tracing::{debug, info, warn};

use crate::process;

pub use catalog::{ToolCatalog, ToolSpec, VersionedInstall};

/// Resolved tool locations, at most one entry per [`ToolId`].
#[derive(Debug, Default)]
pub struct ToolCache {
    entries: Mutex<HashMap<ToolId, ToolHandle>>,
}

impl ToolCache {
    pub fn get(&self, tool: ToolId) -> Option<ToolHandle> {
        self.entries.lock().ok()?.get(&tool).cloned()
    }

    pub fn store(&self, handle: ToolHandle) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(handle.tool, handle);
        }
    }

    pub fn evict(&self, tool: ToolId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&tool);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a previously resolved handle still points at something runnable.
fn still_valid(handle: &ToolHandle) -> bool {
    match handle.source {
        ToolSource::KnownPath | ToolSource::VersionedDir => handle.program().is_file(),
        ToolSource::SearchPath => which::which(handle.program()).is_ok(),
    }
}

/// Finds external tools and remembers where they are.
#[derive(Debug)]
pub struct ToolLocator {
    catalog: ToolCatalog,
    verify_timeout: Duration,
    cache: Option<ToolCache>,
}

impl ToolLocator {
    pub fn new(catalog: ToolCatalog, settings: &OcrSettings) -> Self {
        Self {
            catalog,
            verify_timeout: settings.verify_timeout(),
            cache: settings.cache_tool_paths.then(ToolCache::default),
        }
    }

    /// Locator over the platform's install conventions.
    pub fn system(settings: &OcrSettings) -> Self {
        Self::new(ToolCatalog::system(), settings)
    }

    /// Find `tool`, or `None` if it is not installed anywhere we look.
    pub async fn locate(&self, tool: ToolId) -> Option<ToolHandle> {
        if let Some(cache) = &self.cache {
            if let Some(handle) = cache.get(tool) {
                if still_valid(&handle) {
                    return Some(handle);
                }
                debug!(%tool, program = %handle.program().display(), "Cached tool location is stale");
                cache.evict(tool);
            }
        }

        let Some(spec) = self.catalog.spec(tool) else {
            warn!(%tool, "No discovery rules for tool");
            return None;
        };

        let found = self.discover(spec).await;
        match &found {
            Some(handle) => {
                info!(%tool, program = %handle.program().display(), source = ?handle.source, "Tool located");
                if let Some(cache) = &self.cache {
                    cache.store(handle.clone());
                }
            }
            None => warn!(%tool, "Tool not found"),
        }
        found
    }

    /// Locate every known tool, for diagnostics.
    pub async fn locate_all(&self) -> Vec<(ToolId, Option<ToolHandle>)> {
        let mut out = Vec::with_capacity(ToolId::ALL.len());
        for tool in ToolId::ALL {
            out.push((tool, self.locate(tool).await));
        }
        out
    }

    /// Forget the cached location of `tool`.
    pub fn invalidate(&self, tool: ToolId) {
        if let Some(cache) = &self.cache {
            cache.evict(tool);
        }
    }

    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn cache(&self) -> Option<&ToolCache> {
        self.cache.as_ref()
    }

    async fn discover(&self, spec: &ToolSpec) -> Option<ToolHandle> {
        if let Some(path) = spec.known_paths.iter().find(|p| p.is_file()) {
            return Some(ToolHandle::new(spec.tool, path.clone(), ToolSource::KnownPath));
        }

        if let Some(path) = spec.versioned.iter().find_map(VersionedInstall::scan) {
            return Some(ToolHandle::new(spec.tool, path, ToolSource::VersionedDir));
        }

        let verify_args = spec.verify_args.as_ref()?;
        let args: Vec<&str> = verify_args.iter().map(String::as_str).collect();
        for name in &spec.search_names {
            if process::responds(spec.tool, OsStr::new(name), &args, self.verify_timeout).await {
                return Some(ToolHandle::new(spec.tool, name.as_str(), ToolSource::SearchPath));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings() -> OcrSettings {
        OcrSettings::default()
    }

    fn fake_install(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    #[tokio::test]
    async fn known_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_install(dir.path(), "tesseract");
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::Tesseract)
                .known_path(dir.path().join("missing"))
                .known_path(&exe),
        ]);
        let locator = ToolLocator::new(catalog, &settings());

        let handle = locator.locate(ToolId::Tesseract).await.unwrap();
        assert_eq!(handle.program(), exe.as_path());
        assert_eq!(handle.source, ToolSource::KnownPath);
        assert_eq!(handle.install_dir(), Some(dir.path()));
    }

    #[tokio::test]
    async fn versioned_dir_used_when_no_fixed_path() {
        let root = tempfile::tempdir().unwrap();
        let versioned = root.path().join("gs10.04.0").join("bin");
        std::fs::create_dir_all(&versioned).unwrap();
        let exe = fake_install(&versioned, "gs");

        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::Ghostscript)
                .known_path(root.path().join("gs10.03.1/bin/gs"))
                .versioned(VersionedInstall::new(root.path(), "gs", "bin/gs")),
        ]);
        let locator = ToolLocator::new(catalog, &settings());

        let handle = locator.locate(ToolId::Ghostscript).await.unwrap();
        assert_eq!(handle.program(), exe.as_path());
        assert_eq!(handle.source, ToolSource::VersionedDir);
    }

    #[tokio::test]
    async fn absent_tool_is_none() {
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::ImageMagick)
                .known_path("/nonexistent/emarge/magick")
                .search("emarge-definitely-not-installed-tool")
                .verify_with(&["-version"]),
        ]);
        let locator = ToolLocator::new(catalog, &settings());
        assert!(locator.locate(ToolId::ImageMagick).await.is_none());
        // Tools without discovery rules are simply absent.
        assert!(locator.locate(ToolId::Pdfium).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn search_path_lookup() {
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::Tesseract)
                .search("emarge-definitely-not-installed-tool")
                .search("sh")
                .verify_with(&["-c", "exit 0"]),
        ]);
        let locator = ToolLocator::new(catalog, &settings());
        let handle = locator.locate(ToolId::Tesseract).await.unwrap();
        assert_eq!(handle.program(), std::path::Path::new("sh"));
        assert_eq!(handle.source, ToolSource::SearchPath);
        assert_eq!(handle.install_dir(), None);
    }

    #[tokio::test]
    async fn stale_cache_entry_is_rediscovered() {
        let dir = tempfile::tempdir().unwrap();
        let first = fake_install(dir.path(), "magick-a");
        let second = dir.path().join("magick-b");
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::ImageMagick)
                .known_path(&first)
                .known_path(&second),
        ]);
        let locator = ToolLocator::new(catalog, &settings());

        let handle = locator.locate(ToolId::ImageMagick).await.unwrap();
        assert_eq!(handle.program(), first.as_path());
        assert_eq!(locator.cache().unwrap().len(), 1);

        // Uninstall the first copy, install a second one.
        std::fs::remove_file(&first).unwrap();
        std::fs::write(&second, b"").unwrap();

        let handle = locator.locate(ToolId::ImageMagick).await.unwrap();
        assert_eq!(handle.program(), second.as_path());

        std::fs::remove_file(&second).unwrap();
        assert!(locator.locate(ToolId::ImageMagick).await.is_none());
        assert!(locator.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalidate_forgets_entry() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_install(dir.path(), "tesseract");
        let catalog =
            ToolCatalog::from_specs(vec![ToolSpec::new(ToolId::Tesseract).known_path(&exe)]);
        let locator = ToolLocator::new(catalog, &settings());

        locator.locate(ToolId::Tesseract).await.unwrap();
        assert_eq!(locator.cache().unwrap().len(), 1);
        locator.invalidate(ToolId::Tesseract);
        assert!(locator.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn caching_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_install(dir.path(), "tesseract");
        let catalog =
            ToolCatalog::from_specs(vec![ToolSpec::new(ToolId::Tesseract).known_path(&exe)]);
        let settings = OcrSettings {
            cache_tool_paths: false,
            ..OcrSettings::default()
        };
        let locator = ToolLocator::new(catalog, &settings);

        assert!(locator.locate(ToolId::Tesseract).await.is_some());
        assert!(locator.cache().is_none());
    }
}
