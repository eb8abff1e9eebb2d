// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page preprocessing in the folio-ocr crate.
// Runs the full chain and each of the two expensive steps on a synthetic
// page of text-like strokes.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Rgb, RgbImage};

use folio_core::{AdaptiveMethod, DenoiseMethod};
use folio_ocr::preprocess::{
    DEFAULT_BLOCK_SIZE, DEFAULT_OFFSET, PreprocessOptions, Preprocessor, adaptive_threshold,
    denoise, to_grayscale,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 200x280 off-white page with a lighting gradient and rows of dark
/// "letters", roughly what a phone photo of a book page looks like at low
/// resolution.
fn synthetic_page() -> RgbImage {
    RgbImage::from_fn(200, 280, |x, y| {
        let in_line = (y % 20) < 10 && (20..180).contains(&x);
        let in_letter = (x % 9) < 5;
        if in_line && in_letter {
            Rgb([40, 35, 30])
        } else {
            let shade = 235 - (x / 10) as u8;
            Rgb([shade, shade, shade.saturating_sub(10)])
        }
    })
}

fn gray_page() -> GrayImage {
    to_grayscale(&synthetic_page())
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_full_chain(c: &mut Criterion) {
    let page = synthetic_page();
    let preprocessor = Preprocessor::new(PreprocessOptions::default());

    c.bench_function("preprocess full chain (200x280, x1.5)", |b| {
        b.iter(|| black_box(preprocessor.preprocess(black_box(&page))));
    });
}

fn bench_denoise(c: &mut Criterion) {
    let gray = gray_page();

    c.bench_function("denoise non-local means (200x280)", |b| {
        b.iter(|| black_box(denoise(black_box(&gray), DenoiseMethod::NonLocalMeans)));
    });
    c.bench_function("denoise gaussian (200x280)", |b| {
        b.iter(|| black_box(denoise(black_box(&gray), DenoiseMethod::Gaussian)));
    });
}

fn bench_denoise_page(c: &mut Criterion) {
    // Full-size page: 620x877 after the default rescale.
    let tile = gray_page();
    let page = GrayImage::from_fn(620, 877, |x, y| *tile.get_pixel(x % 200, y % 280));
    let mut group = c.benchmark_group("denoise page");
    group.sample_size(10);
    group.bench_function("non-local means (620x877)", |b| {
        b.iter(|| black_box(denoise(black_box(&page), DenoiseMethod::NonLocalMeans)));
    });
    group.finish();
}

fn bench_binarize(c: &mut Criterion) {
    let gray = gray_page();

    for (name, method) in [("mean", AdaptiveMethod::Mean), ("gaussian", AdaptiveMethod::Gaussian)] {
        c.bench_function(&format!("adaptive threshold {name} (200x280)"), |b| {
            b.iter(|| {
                black_box(adaptive_threshold(
                    black_box(&gray),
                    method,
                    DEFAULT_BLOCK_SIZE,
                    DEFAULT_OFFSET,
                ))
            });
        });
    }
}

criterion_group!(benches, bench_full_chain, bench_denoise, bench_denoise_page, bench_binarize);
criterion_main!(benches);
