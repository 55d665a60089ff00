// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where each external tool is usually installed.
//
// A `ToolSpec` lists, in the order they are tried: a `<TOOL>_HOME` override,
// well-known absolute paths for the platform, versioned install directories
// (ImageMagick and Ghostscript embed their version in the directory name),
// and finally bare executable names to try on `PATH`.

use std::path::{Path, PathBuf};

use emarge_core::types::ToolId;

/// A family of versioned install directories, e.g. `<ProgramFiles>/ImageMagick-*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedInstall {
    /// Directory containing the versioned subdirectories.
    pub parent: PathBuf,
    /// Prefix every matching subdirectory name starts with.
    pub prefix: String,
    /// Executable path relative to the versioned subdirectory.
    pub relative: PathBuf,
}

impl VersionedInstall {
    pub fn new(
        parent: impl Into<PathBuf>,
        prefix: impl Into<String>,
        relative: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parent: parent.into(),
            prefix: prefix.into(),
            relative: relative.into(),
        }
    }

    /// Fixed path for one known version.
    pub fn known(&self, version: &str) -> PathBuf {
        self.parent
            .join(format!("{}{}", self.prefix, version))
            .join(&self.relative)
    }

    /// Enumerate `parent` for any matching subdirectory holding the
    /// executable. The highest-sorting directory name wins.
    pub fn scan(&self) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.parent).ok()?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(self.prefix.as_str())
            })
            .map(|entry| entry.path())
            .collect();
        dirs.sort();

        dirs.into_iter()
            .rev()
            .map(|dir| dir.join(&self.relative))
            .find(|candidate| candidate.is_file())
    }
}

/// Discovery rules for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub tool: ToolId,
    /// Absolute candidates checked by existence, in priority order.
    pub known_paths: Vec<PathBuf>,
    /// Versioned install directories enumerated when no known path exists.
    pub versioned: Vec<VersionedInstall>,
    /// Bare names checked on `PATH`.
    pub search_names: Vec<String>,
    /// Arguments of the no-op version check. `None` for libraries, which are only
    /// located by path.
    pub verify_args: Option<Vec<String>>,
}

impl ToolSpec {
    pub fn new(tool: ToolId) -> Self {
        Self {
            tool,
            known_paths: Vec::new(),
            versioned: Vec::new(),
            search_names: Vec::new(),
            verify_args: None,
        }
    }

    pub fn known_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_paths.push(path.into());
        self
    }

    pub fn versioned(mut self, install: VersionedInstall) -> Self {
        self.versioned.push(install);
        self
    }

    pub fn search(mut self, name: impl Into<String>) -> Self {
        self.search_names.push(name.into());
        self
    }

    pub fn verify_with(mut self, args: &[&str]) -> Self {
        self.verify_args = Some(args.iter().map(|a| a.to_string()).collect());
        self
    }
}

/// Environment variable naming each tool's home directory.
pub fn home_env_var(tool: ToolId) -> &'static str {
    match tool {
        ToolId::Tesseract => "TESSERACT_HOME",
        ToolId::Ghostscript => "GHOSTSCRIPT_HOME",
        ToolId::ImageMagick => "MAGICK_HOME",
        ToolId::Pdfium => "PDFIUM_HOME",
    }
}

/// The set of discovery rules the locator works from.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    pub fn from_specs(specs: Vec<ToolSpec>) -> Self {
        Self { specs }
    }

    /// Platform install conventions plus `*_HOME` overrides from the process
    /// environment.
    pub fn system() -> Self {
        Self::system_with(|key| std::env::var(key).ok())
    }

    /// Like [`ToolCatalog::system`] with an explicit environment lookup.
    pub fn system_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let specs = ToolId::ALL
            .iter()
            .map(|&tool| {
                let home = lookup(home_env_var(tool))
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from);
                platform_spec(tool, home.as_deref())
            })
            .collect();
        Self { specs }
    }

    pub fn spec(&self, tool: ToolId) -> Option<&ToolSpec> {
        self.specs.iter().find(|spec| spec.tool == tool)
    }
}

fn program_files() -> PathBuf {
    std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))
}

fn program_files_x86() -> PathBuf {
    std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"))
}

/// Library file name PDFium is shipped under on this platform.
pub fn pdfium_library_name() -> &'static str {
    if cfg!(windows) {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

fn platform_spec(tool: ToolId, home: Option<&Path>) -> ToolSpec {
    let mut spec = ToolSpec::new(tool);
    match tool {
        ToolId::Tesseract => {
            if let Some(home) = home {
                spec = spec
                    .known_path(home.join(exe("tesseract")))
                    .known_path(home.join("bin").join(exe("tesseract")));
            }
            if cfg!(windows) {
                spec = spec
                    .known_path(program_files().join("Tesseract-OCR").join("tesseract.exe"))
                    .known_path(program_files_x86().join("Tesseract-OCR").join("tesseract.exe"))
                    .search("tesseract.exe");
            } else {
                spec = spec
                    .known_path("/usr/bin/tesseract")
                    .known_path("/usr/local/bin/tesseract")
                    .known_path("/opt/homebrew/bin/tesseract");
            }
            spec.search("tesseract").verify_with(&["--version"])
        }

        ToolId::Ghostscript => {
            if let Some(home) = home {
                for name in ghostscript_names() {
                    spec = spec
                        .known_path(home.join("bin").join(name))
                        .known_path(home.join(name));
                }
            }
            if cfg!(windows) {
                let gs64 = VersionedInstall::new(program_files().join("gs"), "gs", r"bin\gswin64c.exe");
                let gs32 =
                    VersionedInstall::new(program_files_x86().join("gs"), "gs", r"bin\gswin32c.exe");
                for version in ["10.03.1", "10.02.1", "10.01.2"] {
                    spec = spec.known_path(gs64.known(version));
                }
                for version in ["10.03.1", "10.02.1", "10.01.2"] {
                    spec = spec.known_path(gs32.known(version));
                }
                spec = spec.versioned(gs64).versioned(gs32);
            } else {
                spec = spec
                    .known_path("/usr/bin/gs")
                    .known_path("/usr/local/bin/gs")
                    .known_path("/opt/homebrew/bin/gs");
            }
            for name in ghostscript_names() {
                spec = spec.search(*name);
            }
            spec.verify_with(&["--version"])
        }

        ToolId::ImageMagick => {
            if let Some(home) = home {
                spec = spec
                    .known_path(home.join(exe("magick")))
                    .known_path(home.join("bin").join(exe("magick")));
            }
            if cfg!(windows) {
                let installs = VersionedInstall::new(program_files(), "ImageMagick-", "magick.exe");
                for version in [
                    "7.1.2-Q16-HDRI",
                    "7.1.1-Q16-HDRI",
                    "7.1.0-Q16-HDRI",
                    "7.0.11-Q16-HDRI",
                ] {
                    spec = spec.known_path(installs.known(version));
                }
                spec = spec
                    .known_path(program_files().join("ImageMagick").join("magick.exe"))
                    .versioned(installs)
                    .search("magick");
            } else {
                spec = spec
                    .known_path("/usr/bin/magick")
                    .known_path("/usr/local/bin/magick")
                    .known_path("/opt/homebrew/bin/magick")
                    .versioned(VersionedInstall::new("/opt", "ImageMagick-", "bin/magick"))
                    .search("magick")
                    // ImageMagick 6 ships the same CLI as `convert`.
                    .search("convert");
            }
            spec.verify_with(&["-version"])
        }

        ToolId::Pdfium => {
            let lib = pdfium_library_name();
            if let Some(home) = home {
                spec = spec
                    .known_path(home.join(lib))
                    .known_path(home.join("lib").join(lib));
            }
            spec = spec.known_path(PathBuf::from(".").join(lib));
            if !cfg!(windows) {
                spec = spec
                    .known_path(PathBuf::from("/usr/lib").join(lib))
                    .known_path(PathBuf::from("/usr/local/lib").join(lib))
                    .known_path(PathBuf::from("/opt/homebrew/lib").join(lib));
            }
            spec
        }
    }
}

fn exe(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_owned()
    }
}

fn ghostscript_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["gswin64c.exe", "gswin32c.exe"]
    } else {
        &["gs"]
    }
}
