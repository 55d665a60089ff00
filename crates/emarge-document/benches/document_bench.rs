// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the emarge-document crate: attendance-sheet text
// analysis and the PNG to LZW TIFF re-encoding done before every page OCR.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use emarge_core::types::PageImage;
use emarge_document::image::{blank_page_png, page_to_tiff};
use emarge_document::text::analyze_emargement;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A recognised sign-in sheet with 60 attendee rows.
fn synthetic_sheet() -> String {
    let first = ["Jean", "Marie", "Pierre", "Hélène", "Émilie", "Louis"];
    let last = ["Dupont", "Martin", "Durand", "Lefèvre", "Moreau", "Girard"];
    let mut text = String::from(
        "FEUILLE D'ÉMARGEMENT\nFormation : Sécurité incendie\nSession du 15/01/2024 au 20/01/2024\n\
         Nom\tPrénom\tMatin\tAprès-midi\n",
    );
    for row in 0..60 {
        text.push_str(&format!(
            "{} {}\t{:02}/01/2024\tsigné\n",
            first[row % first.len()],
            last[(row / first.len()) % last.len()],
            15 + row % 5
        ));
    }
    text
}

fn bench_analyze_emargement(c: &mut Criterion) {
    let sheet = synthetic_sheet();
    c.bench_function("analyze_emargement (60 rows)", |b| {
        b.iter(|| black_box(analyze_emargement(black_box(&sheet))));
    });
}

/// Re-encode an A4 page rendered at 100 DPI (827x1169).
fn bench_page_to_tiff(c: &mut Criterion) {
    let page = PageImage::png(1, blank_page_png(827, 1169).expect("blank page"));
    c.bench_function("page_to_tiff (827x1169)", |b| {
        b.iter(|| black_box(page_to_tiff(black_box(&page)).expect("tiff")));
    });
}

criterion_group!(benches, bench_analyze_emargement, bench_page_to_tiff);
criterion_main!(benches);
