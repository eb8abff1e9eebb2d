// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver — runs a pipeline over a catalog of images, sequentially or
// across worker threads, isolating per-image failures.
//
// Outcomes are always reported in catalog order, whatever order the workers
// finish in.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Barrier, mpsc};
use std::thread;

use folio_core::error::{ErrorScope, FolioError, Result};
use folio_core::{OcrResult, PipelineConfig};
use tracing::{debug, info, instrument, warn};

use crate::catalog::ImagePath;
use crate::engine::RecognitionEngine;
use crate::pipeline::Pipeline;

/// What to do when an image fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Report the failure and carry on with the remaining images.
    #[default]
    ContinueOnError,
    /// Stop at the first failure.
    AbortOnFirst,
}

/// The result of processing one image.
#[derive(Debug)]
pub struct ImageOutcome {
    pub image: ImagePath,
    pub result: Result<OcrResult>,
}

impl ImageOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a batch produced, in catalog order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ImageOutcome>,
    /// Set when processing stopped before the end of the catalog.
    pub aborted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&ImagePath, &OcrResult)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (&o.image, r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&ImagePath, &FolioError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.image, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Every image was processed and none failed.
    pub fn is_clean(&self) -> bool {
        !self.aborted && self.failure_count() == 0
    }
}

/// Whether `result` ends the batch. Invocation-scoped errors always do:
/// they will recur for every remaining image.
fn stops_batch(policy: BatchPolicy, result: &Result<OcrResult>) -> bool {
    match result {
        Ok(_) => false,
        Err(err) if err.scope() == ErrorScope::Invocation => true,
        Err(_) => policy == BatchPolicy::AbortOnFirst,
    }
}

fn log_outcome(outcome: &ImageOutcome) {
    if let Err(err) = &outcome.result {
        warn!(image = %outcome.image, %err, "Image failed");
    }
}

/// Process `images` in order on the calling thread with a single pipeline.
///
/// `on_outcome` is called as each image finishes, before the next one starts.
#[instrument(skip_all, fields(images = images.len(), ?policy))]
pub fn run_batch<E, C>(
    pipeline: &Pipeline<E>,
    images: &[ImagePath],
    policy: BatchPolicy,
    mut on_outcome: C,
) -> BatchReport
where
    E: RecognitionEngine,
    C: FnMut(&ImageOutcome),
{
    let mut report = BatchReport::default();

    for image in images {
        let result = pipeline.run_on_image(image);
        let stop = stops_batch(policy, &result);
        let outcome = ImageOutcome {
            image: image.clone(),
            result,
        };
        log_outcome(&outcome);
        on_outcome(&outcome);
        report.outcomes.push(outcome);

        if stop {
            report.aborted = report.outcomes.len() < images.len();
            break;
        }
    }

    info!(
        processed = report.outcomes.len(),
        failed = report.failure_count(),
        aborted = report.aborted,
        "Batch finished"
    );
    report
}

enum WorkerMessage {
    Done(usize, Result<OcrResult>),
    LoadFailed(FolioError),
}

/// Process `images` across up to `jobs` worker threads.
///
/// Each worker loads its own engine with `loader`; `config` is shared. Work
/// is handed out one image at a time, and outcomes are passed to
/// `on_outcome` (on the calling thread) in catalog order. With one job, or
/// one image, this is [`run_batch`] on the calling thread.
///
/// # Errors
///
/// Whatever `loader` fails with. Any worker failing to load stops the whole
/// batch before a single image is processed: workers wait for every engine
/// to load before taking work.
#[instrument(skip_all, fields(images = images.len(), jobs = jobs.get(), ?policy))]
pub fn run_batch_parallel<E, F, C>(
    config: &PipelineConfig,
    loader: F,
    images: &[ImagePath],
    jobs: NonZeroUsize,
    policy: BatchPolicy,
    mut on_outcome: C,
) -> Result<BatchReport>
where
    E: RecognitionEngine,
    F: Fn(&PipelineConfig) -> Result<E> + Sync,
    C: FnMut(&ImageOutcome),
{
    let workers = jobs.get().min(images.len()).max(1);
    if workers == 1 {
        let pipeline = Pipeline::load(config.clone(), &loader)?;
        return Ok(run_batch(&pipeline, images, policy, on_outcome));
    }

    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let load_failed = AtomicBool::new(false);
    let loaded = Barrier::new(workers);
    let (tx, rx) = mpsc::channel::<WorkerMessage>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let (next, stop, load_failed, loaded, loader) =
                (&next, &stop, &load_failed, &loaded, &loader);
            scope.spawn(move || {
                let pipeline = Pipeline::load(config.clone(), loader);
                if pipeline.is_err() {
                    load_failed.store(true, Ordering::SeqCst);
                }
                loaded.wait();

                let pipeline = match pipeline {
                    Ok(pipeline) if !load_failed.load(Ordering::SeqCst) => pipeline,
                    Ok(_) => return,
                    Err(err) => {
                        let _ = tx.send(WorkerMessage::LoadFailed(err));
                        return;
                    }
                };
                debug!(worker, "Worker started");

                while !stop.load(Ordering::Relaxed) {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(image) = images.get(index) else {
                        break;
                    };
                    let result = pipeline.run_on_image(image);
                    if tx.send(WorkerMessage::Done(index, result)).is_err() {
                        break;
                    }
                }
                debug!(worker, "Worker finished");
            });
        }
        drop(tx);

        let mut report = BatchReport::default();
        let mut pending: BTreeMap<usize, Result<OcrResult>> = BTreeMap::new();
        let mut load_error = None;

        for message in rx {
            match message {
                WorkerMessage::LoadFailed(err) => {
                    load_error.get_or_insert(err);
                }
                WorkerMessage::Done(index, result) => {
                    if report.aborted {
                        continue;
                    }
                    pending.insert(index, result);

                    // Emit the contiguous run that is now complete.
                    while let Some(result) = pending.remove(&report.outcomes.len()) {
                        let index = report.outcomes.len();
                        let halt = stops_batch(policy, &result);
                        let outcome = ImageOutcome {
                            image: images[index].clone(),
                            result,
                        };
                        log_outcome(&outcome);
                        on_outcome(&outcome);
                        report.outcomes.push(outcome);

                        if halt {
                            report.aborted = report.outcomes.len() < images.len();
                            stop.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                }
            }
        }

        if let Some(err) = load_error {
            return Err(err);
        }
        info!(
            processed = report.outcomes.len(),
            failed = report.failure_count(),
            aborted = report.aborted,
            "Batch finished"
        );
        Ok(report)
    })
}
