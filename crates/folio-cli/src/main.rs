// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — OCR for book page images
//
// Entry point. Initialises logging, parses arguments, discovers the images,
// loads the recognition engine, and prints or saves the text of every page.
//
// Exit status is 0 when every image was processed and written, 1 otherwise,
// and 2 for command-line usage errors.

mod cli;
mod engines;
mod output;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use folio_core::error::{FolioError, Result};
use folio_core::human_errors::humanize_error;
use folio_core::{OcrResult, PipelineConfig};
use folio_ocr::catalog::expand_home;
use folio_ocr::{ImagePath, RecognitionEngine, run_batch_parallel};
use tracing::{info, warn};

use cli::Cli;
use engines::load_engine;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let loader = |config: &PipelineConfig| load_engine(&cli, config);

    match run(&cli, loader, &mut io::stdout(), &mut io::stderr()) {
        Ok(status) => status.exit_code(),
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// How a run that got past discovery ended.
#[derive(Debug, PartialEq, Eq)]
enum RunStatus {
    /// No output flag was given, so no engine was loaded.
    NothingToDo,
    /// Every image was attempted; `failed` counts recognition and write
    /// failures together.
    Completed { processed: usize, failed: usize },
}

impl RunStatus {
    fn is_success(&self) -> bool {
        match self {
            RunStatus::NothingToDo => true,
            RunStatus::Completed { failed, .. } => *failed == 0,
        }
    }

    fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Discover, recognize, and emit. Results go to `stdout`, per-image errors
/// to `stderr`.
fn run<E, F>(
    cli: &Cli,
    loader: F,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<RunStatus>
where
    E: RecognitionEngine,
    F: Fn(&PipelineConfig) -> Result<E> + Sync,
{
    let config = cli.pipeline_config()?;
    let images = folio_ocr::discover(&cli.input)?;

    if !cli.has_output() {
        writeln!(stdout, "Nothing to do: use --print and/or --save-txt.")?;
        return Ok(RunStatus::NothingToDo);
    }

    let out_dir = resolve_out_dir(&cli.out_dir);
    info!(
        images = images.len(),
        engine = cli.engine.name(),
        jobs = cli.jobs.get(),
        "Folio starting"
    );

    let mut write_failures = 0usize;
    let report = run_batch_parallel(
        &config,
        loader,
        &images,
        cli.jobs,
        cli.batch_policy(),
        |outcome| match &outcome.result {
            Ok(result) => {
                if let Err(err) = emit(cli, &out_dir, &outcome.image, result, stdout) {
                    write_failures += 1;
                    report_image_error(stderr, &outcome.image, &err);
                }
            }
            Err(err) => report_image_error(stderr, &outcome.image, err),
        },
    )?;

    let failed = report.failure_count() + write_failures;
    if report.aborted {
        warn!(
            skipped = images.len() - report.outcomes.len(),
            "Stopped after the first failure"
        );
    }
    info!(
        processed = report.outcomes.len(),
        failed,
        "Folio finished"
    );

    Ok(RunStatus::Completed {
        processed: report.outcomes.len(),
        failed,
    })
}

/// Print and save one result as requested.
fn emit(
    cli: &Cli,
    out_dir: &Path,
    image: &ImagePath,
    result: &OcrResult,
    stdout: &mut impl Write,
) -> Result<()> {
    if cli.print {
        writeln!(stdout, "{}", output::render_console_block(result))?;
    }
    if cli.save_txt {
        let saved = output::save_text(out_dir, image, &result.text)?;
        writeln!(stdout, "[OK] Saved: {}", saved.display())?;
    }
    if cli.save_json {
        let saved = output::save_json(out_dir, image, result)?;
        writeln!(stdout, "[OK] Saved: {}", saved.display())?;
    }
    Ok(())
}

fn report_image_error(stderr: &mut impl Write, image: &ImagePath, err: &FolioError) {
    let human = humanize_error(err);
    // Nowhere left to report a failing stderr.
    let _ = writeln!(stderr, "[ERROR] {image}: {}", human.message);
    let _ = writeln!(stderr, "        {}", human.suggestion);
}

/// `~` expanded and made absolute against the working directory.
fn resolve_out_dir(out_dir: &Path) -> PathBuf {
    let expanded = expand_home(out_dir);
    std::path::absolute(&expanded).unwrap_or(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use folio_core::RecognitionFragment;
    use folio_ocr::RecognitionRequest;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;

    /// Reads every page as "HOLA".
    struct HolaEngine;

    impl RecognitionEngine for HolaEngine {
        fn name(&self) -> &'static str {
            "hola"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _request: &RecognitionRequest<'_>,
        ) -> Result<Vec<RecognitionFragment>> {
            Ok(vec![RecognitionFragment::text_only("HOLA")])
        }
    }

    /// Runs the driver with [`HolaEngine`], counting engine loads.
    struct Harness {
        loads: AtomicUsize,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                loads: AtomicUsize::new(0),
                stdout: Vec::new(),
                stderr: Vec::new(),
            }
        }

        fn run(&mut self, args: &[&str]) -> Result<RunStatus> {
            let cli = Cli::try_parse_from(std::iter::once("folio").chain(args.iter().copied()))
                .unwrap();
            let loads = &self.loads;
            run(
                &cli,
                |_| {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(HolaEngine)
                },
                &mut self.stdout,
                &mut self.stderr,
            )
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn stdout(&self) -> String {
            String::from_utf8_lossy(&self.stdout).into_owned()
        }

        fn stderr(&self) -> String {
            String::from_utf8_lossy(&self.stderr).into_owned()
        }
    }

    fn page(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(12, 8, Rgb([250, 250, 250])).save(&path).unwrap();
        path
    }

    fn arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn no_output_flags_loads_no_engine() {
        let tmp = TempDir::new().unwrap();
        page(tmp.path(), "p1.png");

        let mut harness = Harness::new();
        let status = harness.run(&[arg(tmp.path())]).unwrap();
        assert_eq!(status, RunStatus::NothingToDo);
        assert!(status.is_success());
        assert_eq!(harness.loads(), 0);
        assert!(harness.stdout().contains("Nothing to do"));
    }

    #[test]
    fn missing_input_fails_before_loading() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nowhere");

        let mut harness = Harness::new();
        let err = harness.run(&[arg(&missing), "--print"]).unwrap_err();
        assert!(matches!(err, FolioError::InvalidPath(_)));
        assert_eq!(harness.loads(), 0);
    }

    #[test]
    fn unsupported_file_fails_before_loading() {
        let tmp = TempDir::new().unwrap();
        let notes = tmp.path().join("notes.txt");
        fs::write(&notes, "x").unwrap();

        let mut harness = Harness::new();
        let err = harness.run(&[arg(&notes), "--print"]).unwrap_err();
        assert!(matches!(err, FolioError::UnsupportedFileKind(_)));
        assert_eq!(harness.loads(), 0);
    }

    #[test]
    fn printed_and_saved_pages_succeed() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("libro");
        fs::create_dir(&input).unwrap();
        let first = page(&input, "p1.png");
        page(&input, "p2.png");
        let out_dir = tmp.path().join("out");

        let mut harness = Harness::new();
        let status = harness
            .run(&[arg(&input), "--print", "--save-txt", "--out-dir", arg(&out_dir)])
            .unwrap();
        assert_eq!(status, RunStatus::Completed { processed: 2, failed: 0 });
        assert!(status.is_success());
        assert_eq!(harness.loads(), 1);

        assert_eq!(fs::read_to_string(out_dir.join("p1.txt")).unwrap(), "HOLA
");
        assert_eq!(fs::read_to_string(out_dir.join("p2.txt")).unwrap(), "HOLA
");
        let stdout = harness.stdout();
        let first = fs::canonicalize(first).unwrap();
        assert!(stdout.contains(&format!("FILE: {}", first.display())));
        assert_eq!(stdout.matches("[OK] Saved:").count(), 2);
        assert!(harness.stderr().is_empty());
    }

    #[test]
    fn one_bad_image_fails_the_run_but_not_the_others() {
        let tmp = TempDir::new().unwrap();
        page(tmp.path(), "p1.png");
        fs::write(tmp.path().join("p2.png"), b"not an image").unwrap();
        page(tmp.path(), "p3.png");

        let mut harness = Harness::new();
        let status = harness.run(&[arg(tmp.path()), "--print", "--jobs", "2"]).unwrap();
        assert_eq!(status, RunStatus::Completed { processed: 3, failed: 1 });
        assert!(!status.is_success());
        assert_eq!(harness.stdout().matches("HOLA").count(), 2);
        assert!(harness.stderr().contains("[ERROR]"));
        assert!(harness.stderr().contains("p2.png"));
    }

    #[test]
    fn fail_fast_stops_at_the_bad_image() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("p1.png"), b"not an image").unwrap();
        page(tmp.path(), "p2.png");

        let mut harness = Harness::new();
        let status = harness.run(&[arg(tmp.path()), "--print", "--fail-fast"]).unwrap();
        assert_eq!(status, RunStatus::Completed { processed: 1, failed: 1 });
        assert!(!harness.stdout().contains("HOLA"));
    }

    #[test]
    fn failed_text_write_fails_the_run() {
        let tmp = TempDir::new().unwrap();
        let image = page(tmp.path(), "p1.png");
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let mut harness = Harness::new();
        let status = harness
            .run(&[arg(&image), "--save-txt", "--out-dir", arg(&blocker.join("out"))])
            .unwrap();
        assert_eq!(status, RunStatus::Completed { processed: 1, failed: 1 });
        assert!(!status.is_success());
        assert!(harness.stderr().contains("[ERROR]"));
        assert!(!harness.stdout().contains("[OK] Saved:"));
    }

    #[test]
    fn engine_load_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        page(tmp.path(), "p1.png");
        let cli = Cli::try_parse_from(["folio", arg(tmp.path()), "--print"]).unwrap();

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        let err = run(
            &cli,
            |_| -> Result<HolaEngine> { Err(FolioError::EngineInit("no tesseract".into())) },
            &mut stdout,
            &mut stderr,
        )
        .unwrap_err();
        assert!(matches!(err, FolioError::EngineInit(_)));
        assert!(stdout.is_empty());
    }
}
