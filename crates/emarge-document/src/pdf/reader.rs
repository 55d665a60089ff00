// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspection using the `lopdf` crate: page count and page geometry.
// Rendering is left to the rasterization engines.

use std::path::Path;

use emarge_core::error::{EmargeError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

/// US Letter in points, used when a page declares no usable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// How far up the page tree an inherited attribute is looked for.
const MAX_TREE_DEPTH: usize = 32;

/// Read-only view of a parsed PDF document.
///
/// Wraps `lopdf::Document` and answers the geometry questions the
/// rasterization engines need: how many pages, and how large each one is.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path)
            .map_err(|err| EmargeError::Pdf(format!("failed to open {}: {err}", path.display())))?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            document,
            source_path: Some(path.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| EmargeError::Pdf(format!("failed to parse PDF: {err}")))?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Page geometry --------------------------------------------------------

    /// Width and height in points of page `page_number` (1-based), honouring
    /// a MediaBox inherited from the page tree.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            EmargeError::Pdf(format!(
                "page {page_number} out of range (document has {} pages)",
                pages.len()
            ))
        })?;
        Ok(self.media_box(page_id).unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Sizes of all pages in document order.
    pub fn page_sizes(&self) -> Vec<(f32, f32)> {
        self.document
            .get_pages()
            .values()
            .map(|&id| self.media_box(id).unwrap_or(DEFAULT_PAGE_SIZE))
            .collect()
    }

    // -- Page tree helpers ----------------------------------------------------

    /// MediaBox of a page, walking up `/Parent` links for an inherited one.
    fn media_box(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let mut current = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(size) = current.get(b"MediaBox").ok().and_then(|b| self.rect_size(b)) {
                return Some(size);
            }
            current = self.parent(current)?;
        }
        None
    }

    fn parent(&self, dict: &Dictionary) -> Option<&Dictionary> {
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        self.document.get_dictionary(parent_id).ok()
    }

    /// Width and height of a `[x0 y0 x1 y1]` rectangle, possibly indirect.
    /// Degenerate rectangles count as absent.
    fn rect_size(&self, object: &Object) -> Option<(f32, f32)> {
        let object = match object {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };
        let values: Vec<f32> = object.as_array().ok()?.iter().filter_map(number).collect();
        let [x0, y0, x1, y1] = values[..] else {
            return None;
        };
        let (w, h) = ((x1 - x0).abs(), (y1 - y0).abs());
        (w > 0.0 && h > 0.0).then_some((w, h))
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
