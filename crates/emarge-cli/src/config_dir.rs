// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware settings file resolution.

use std::path::{Path, PathBuf};

use emarge_core::OcrSettings;
use emarge_core::error::Result;
use tracing::debug;

/// Directory holding `settings.json`.
pub fn config_dir() -> PathBuf {
    config_base(|key| std::env::var(key).ok()).join("emarge")
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from `explicit` if given, else from the default location if a
/// file exists there, else defaults. The environment overlay applies in
/// every case.
pub fn load_settings(explicit: Option<&Path>) -> Result<OcrSettings> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading settings");
        return OcrSettings::load(path);
    }
    let path = default_settings_path();
    if path.is_file() {
        debug!(path = %path.display(), "Loading settings");
        OcrSettings::load(&path)
    } else {
        let settings = OcrSettings::from_env();
        settings.validate()?;
        Ok(settings)
    }
}

fn config_base(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    // XDG first, then the usual per-platform locations
    if let Some(xdg) = lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(appdata) = lookup("APPDATA").filter(|v| !v.is_empty()) {
        return PathBuf::from(appdata);
    }
    if let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}
