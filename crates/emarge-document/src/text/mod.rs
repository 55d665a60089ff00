// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text post-processing — pure functions over recognised text: names, dates,
// a quality heuristic, and attendance-sheet markers.

pub mod dates;
pub mod emargement;
pub mod names;
pub mod quality;

pub use dates::extract_dates;
pub use emargement::{SIGNATURE_KEYWORDS, TABLE_KEYWORDS, analyze_emargement, contains_any};
pub use names::extract_names;
pub use quality::{is_acceptable, quality_ratio};
