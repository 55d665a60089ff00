// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ghostscript engine: one png16m render per page.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emarge_core::config::OcrSettings;
use emarge_core::error::{EmargeError, Result};
use emarge_core::types::{PageImage, ToolHandle, ToolId};
use tracing::{debug, instrument, warn};

use super::{Converter, RasterJob};
use crate::pdf::PdfReader;
use crate::process;
use crate::tools::ToolLocator;

pub struct GhostscriptConverter {
    locator: Arc<ToolLocator>,
    dpi: u32,
    timeout: Duration,
}

impl GhostscriptConverter {
    pub fn new(locator: Arc<ToolLocator>, settings: &OcrSettings) -> Self {
        Self {
            locator,
            dpi: settings.raster_dpi,
            timeout: settings.process_timeout(),
        }
    }

    /// Ask Ghostscript for the page count; `None` if it cannot tell.
    async fn page_count(&self, gs: &ToolHandle, pdf: &Path) -> Option<usize> {
        let program = format!(
            "({}) (r) file runpdfbegin pdfpagecount = quit",
            postscript_path(pdf)
        );
        let mut cmd = process::command(gs.program());
        cmd.args(["-q", "-dNODISPLAY", "-dNOSAFER", "-c", program.as_str()]);

        let output = process::run(ToolId::Ghostscript, cmd, self.timeout)
            .await
            .and_then(|out| out.check(ToolId::Ghostscript));
        match output {
            Ok(out) => {
                let count = out.stdout_lossy().trim().parse::<usize>().ok()?;
                (count > 0).then_some(count)
            }
            Err(err) => {
                debug!(%err, "Ghostscript page count failed");
                None
            }
        }
    }

    async fn render_page(&self, gs: &ToolHandle, pdf: &Path, page: usize, out: &Path) -> Result<Vec<u8>> {
        let mut cmd = process::command(gs.program());
        cmd.args([
            "-dNOPAUSE".to_string(),
            "-dBATCH".to_string(),
            "-dSAFER".to_string(),
            "-sDEVICE=png16m".to_string(),
            format!("-r{}", self.dpi),
            format!("-dFirstPage={page}"),
            format!("-dLastPage={page}"),
            format!("-sOutputFile={}", out.display()),
        ])
        .arg(pdf);

        process::run(ToolId::Ghostscript, cmd, self.timeout)
            .await?
            .check(ToolId::Ghostscript)?;

        match tokio::fs::read(out).await {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Err(EmargeError::ConversionFailure(format!("page {page} rendered empty"))),
            Err(err) => Err(EmargeError::ConversionFailure(format!(
                "page {page} produced no output: {err}"
            ))),
        }
    }
}

#[async_trait]
impl Converter for GhostscriptConverter {
    fn name(&self) -> &'static str {
        "ghostscript"
    }

    #[instrument(skip_all, fields(engine = "ghostscript"))]
    async fn try_convert(&self, job: &RasterJob<'_>) -> Result<Vec<PageImage>> {
        let gs = self
            .locator
            .locate(ToolId::Ghostscript)
            .await
            .ok_or(EmargeError::ToolUnavailable(ToolId::Ghostscript))?;

        let count = match self.page_count(&gs, job.pdf_path).await {
            Some(count) => count,
            None => PdfReader::from_bytes(job.pdf_bytes)
                .map(|reader| reader.page_count())
                .unwrap_or(0),
        };
        if count == 0 {
            return Err(EmargeError::ConversionFailure(
                "could not determine page count".into(),
            ));
        }

        let out_dir = job.workspace.subdir("ghostscript")?;
        let mut pages = Vec::with_capacity(count);
        for page in 1..=count {
            let out = out_dir.join(format!("page_{page}.png"));
            match self.render_page(&gs, job.pdf_path, page, &out).await {
                Ok(bytes) => pages.push(PageImage::png(page as u32, bytes)),
                Err(err) => warn!(page, %err, "Skipping page"),
            }
        }
        debug!(requested = count, rendered = pages.len(), "Ghostscript finished");
        Ok(pages)
    }
}

/// A path as a PostScript string body: forward slashes, parentheses escaped.
fn postscript_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postscript_path_escaping() {
        assert_eq!(
            postscript_path(Path::new(r"C:\tmp\scan (1).pdf")),
            r"C:/tmp/scan \(1\).pdf"
        );
    }

    #[tokio::test]
    async fn missing_ghostscript_is_unavailable() {
        use crate::tools::{ToolCatalog, ToolSpec};
        use crate::workspace::TempWorkspace;

        let settings = OcrSettings::default();
        let catalog = ToolCatalog::from_specs(vec![
            ToolSpec::new(ToolId::Ghostscript).known_path("/nonexistent/emarge/gs"),
        ]);
        let converter = GhostscriptConverter::new(Arc::new(ToolLocator::new(catalog, &settings)), &settings);

        let ws = TempWorkspace::acquire("emarge_test_", None).unwrap();
        let pdf_path = ws.file("input.pdf");
        let job = RasterJob {
            pdf_path: &pdf_path,
            pdf_bytes: b"%PDF",
            workspace: &ws,
        };
        let err = converter.try_convert(&job).await.unwrap_err();
        assert!(matches!(err, EmargeError::ToolUnavailable(ToolId::Ghostscript)));
    }

    /// A shell script standing in for `gs`: answers the page-count query with
    /// 2 and copies a prepared PNG for every page render.
    #[cfg(unix)]
    #[tokio::test]
    async fn renders_each_page_with_fake_gs() {
        use std::os::unix::fs::PermissionsExt;

        use crate::image::{blank_page_png, dimensions};
        use crate::pdf::fixtures::sample_pdf;
        use crate::tools::{ToolCatalog, ToolSpec};
        use crate::workspace::TempWorkspace;

        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("page1.png"), blank_page_png(30, 40).unwrap()).unwrap();
        std::fs::write(bin.path().join("page2.png"), blank_page_png(50, 60).unwrap()).unwrap();
        let script = bin.path().join("gs");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 for arg in \"$@\"; do\n\
                   case \"$arg\" in\n\
                     -dNODISPLAY) echo 2; exit 0;;\n\
                     -sOutputFile=*) out=\"${{arg#-sOutputFile=}}\";;\n\
                     -dFirstPage=*) page=\"${{arg#-dFirstPage=}}\";;\n\
                   esac\n\
                 done\n\
                 cp \"{}/page$page.png\" \"$out\"\n",
                bin.path().display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = OcrSettings::default();
        let catalog =
            ToolCatalog::from_specs(vec![ToolSpec::new(ToolId::Ghostscript).known_path(&script)]);
        let converter = GhostscriptConverter::new(Arc::new(ToolLocator::new(catalog, &settings)), &settings);

        let pdf = sample_pdf(&[(612, 792), (612, 792)]);
        let ws = TempWorkspace::acquire("emarge_test_", None).unwrap();
        let pdf_path = ws.file("input.pdf");
        std::fs::write(&pdf_path, &pdf).unwrap();
        let job = RasterJob {
            pdf_path: &pdf_path,
            pdf_bytes: &pdf,
            workspace: &ws,
        };

        let pages = converter.try_convert(&job).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].ordinal, 1);
        assert_eq!(dimensions(&pages[0].bytes).unwrap(), (30, 40));
        assert_eq!(dimensions(&pages[1].bytes).unwrap(), (50, 60));
    }
}
