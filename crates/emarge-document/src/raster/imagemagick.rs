// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ImageMagick engine: a single invocation rendering every page.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{PageImage, ToolId};
use tracing::{debug, instrument, warn};

use super::{Converter, RasterJob};
use crate::process;
use crate::tools::ToolLocator;

pub struct ImageMagickConverter {
    locator: Arc<ToolLocator>,
    dpi: u32,
    timeout: Duration,
}

impl ImageMagickConverter {
    pub fn new(locator: Arc<ToolLocator>, settings: &OcrSettings) -> Self {
        Self {
            locator,
            dpi: settings.raster_dpi,
            timeout: settings.process_timeout(),
        }
    }
}

#[async_trait]
impl Converter for ImageMagickConverter {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    #[instrument(skip_all, fields(engine = "imagemagick"))]
    async fn try_convert(&self, job: &RasterJob<'_>) -> Result<Vec<PageImage>> {
        let magick = self
            .locator
            .locate(ToolId::ImageMagick)
            .await
            .ok_or(EmargeError::ToolUnavailable(ToolId::ImageMagick))?;

        let out_dir = job.workspace.subdir("imagemagick")?;
        let mut cmd = process::command(magick.program());
        cmd.arg("-density")
            .arg(self.dpi.to_string())
            .arg(job.pdf_path)
            .arg(out_dir.join("page-%02d.png"));

        let output = process::run(ToolId::ImageMagick, cmd, self.timeout).await?;
        if !output.success() {
            // Partial output (e.g. one bad page) is still worth collecting.
            warn!(
                exit_code = ?output.status.code(),
                stderr = %output.stderr,
                "ImageMagick exited with an error"
            );
        }

        let files = collect_pages(&out_dir)?;
        let mut pages = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let bytes = tokio::fs::read(file).await?;
            pages.push(PageImage::png(index as u32 + 1, bytes));
        }
        debug!(pages = pages.len(), "ImageMagick finished");
        Ok(pages)
    }
}

/// `page-*.png` and `page_*.png` files in `dir`, unique, sorted by name.
fn collect_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if (name.starts_with("page-") || name.starts_with("page_")) && name.ends_with(".png") {
            found.insert(path);
        }
    }
    Ok(found.into_iter().collect())
}
