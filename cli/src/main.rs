//! Terminal front end for doccompare.
//!
//! Extracts two or three documents (PDF, Word or image), compares every later one against
//! the first and prints a colored inline diff with statistics, or JSON.
//!
//! # Usage
//!
//! ```bash
//! # Compare two documents
//! cargo run -p doccompare-cli -- contract-v1.pdf contract-v2.docx
//!
//! # Compare against text kept in a file (the text becomes the baseline)
//! cargo run -p doccompare-cli -- scan.png --reference-text expected.txt
//!
//! # Scanned PDFs need Pdfium for rasterization and OCR models
//! DOCCOMPARE_PDFIUM_LIB=/opt/pdfium/lib DOCCOMPARE_OCR_MODELS=~/models \
//!     cargo run -p doccompare-cli --features paddle -- scan.pdf typed.docx --force-ocr
//!
//! # Machine-readable output
//! cargo run -p doccompare-cli -- a.pdf b.pdf --json --yes --quiet
//! ```

mod prompt;
mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use doccompare_extract::{
    ComparisonInput, ComparisonReport, ComparisonRun, DocumentExtractor, ExtractError,
    ExtractOptions, ExtractionProgress, FileKind, PasswordFlow, PasswordQueue, PasswordResponse,
    SourceFile, password_channel,
};
use doccompare_ocr::{OcrOptions, Recognizer, UnavailableRecognizer};
use doccompare_pdf_process::{Backend, LopdfBackend, PdfProcessOptions, PdfiumBackend};
use futures_lite::future;
use tracing_subscriber::EnvFilter;

/// Environment fallback for `--pdfium-lib`.
const PDFIUM_ENV: &str = "DOCCOMPARE_PDFIUM_LIB";
/// Environment fallback for `--ocr-models`.
const OCR_MODELS_ENV: &str = "DOCCOMPARE_OCR_MODELS";
/// Exit code used when the user cancels.
const CANCELLED_EXIT_CODE: i32 = 130;

type SharedRecognizer = Box<dyn Recognizer + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "doccompare")]
#[command(about = "Compare PDF, Word and image documents word by word")]
#[command(version)]
struct Args {
    /// Documents to compare. The first one is the baseline.
    #[arg(required = true, num_args = 1..=3, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Plain-text file to use as the baseline instead of a document.
    #[arg(long, value_name = "FILE")]
    reference_text: Option<PathBuf>,

    /// OCR every PDF even when it has a usable text layer.
    #[arg(long)]
    force_ocr: bool,

    /// Pdfium dynamic library, or the directory containing it [env: DOCCOMPARE_PDFIUM_LIB].
    #[arg(long, value_name = "PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Directory with det.onnx, rec.onnx and dict.txt [env: DOCCOMPARE_OCR_MODELS].
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,

    /// DPI used to rasterize PDF pages for OCR.
    #[arg(long, value_name = "DPI")]
    render_dpi: Option<u16>,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Answer yes to every confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn pdfium_lib(&self) -> Option<PathBuf> {
        self.pdfium_lib
            .clone()
            .or_else(|| std::env::var_os(PDFIUM_ENV).map(PathBuf::from))
    }

    fn ocr_models(&self) -> Option<PathBuf> {
        self.ocr_models
            .clone()
            .or_else(|| std::env::var_os(OCR_MODELS_ENV).map(PathBuf::from))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let inputs = load_inputs(&args).await?;

    let mut pdf = PdfProcessOptions::new();
    if let Some(path) = args.pdfium_lib() {
        pdf = pdf.with_pdfium_library_path(path.to_string_lossy());
    }
    if let Some(dpi) = args.render_dpi {
        pdf = pdf.with_render_dpi(dpi);
    }
    let backend = select_backend(&pdf)?;
    let can_render = backend.can_render();
    let recognizer = select_recognizer(args.ocr_models().as_deref())?;
    let extractor = DocumentExtractor::new(
        backend,
        recognizer,
        ExtractOptions::new().with_pdf(pdf).with_ocr(OcrOptions::new()),
    );

    let (passwords, queue) = password_channel();
    if !confirm_pre_checks(&extractor, &passwords, &queue, &inputs, &args, can_render).await? {
        eprintln!("\x1b[2mAborted.\x1b[0m");
        std::process::exit(CANCELLED_EXIT_CODE);
    }

    match compare_documents(&extractor, &passwords, &queue, &inputs, &args).await {
        Ok(comparison) => {
            if args.json {
                let json = serde_json::to_string_pretty(&comparison)
                    .context("failed to serialize report")?;
                println!("{json}");
            } else {
                report::print(&comparison, report::use_color());
            }
            Ok(())
        }
        Err(err) if err.is_cancelled() => {
            eprintln!("\r\n\x1b[2mComparison cancelled.\x1b[0m");
            std::process::exit(CANCELLED_EXIT_CODE);
        }
        Err(err) => Err(err).context("comparison failed"),
    }
}

async fn load_inputs(args: &Args) -> Result<Vec<ComparisonInput>> {
    let mut inputs = Vec::with_capacity(args.files.len() + 1);
    if let Some(path) = &args.reference_text {
        let text = async_fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read reference text {}", path.display()))?;
        inputs.push(ComparisonInput::ReferenceText {
            label: display_name(path),
            text,
        });
    }
    for path in &args.files {
        let source = SourceFile::from_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        inputs.push(ComparisonInput::File(source));
    }
    anyhow::ensure!(
        (doccompare_extract::MIN_DOCUMENTS..=doccompare_extract::MAX_DOCUMENTS)
            .contains(&inputs.len()),
        "compare {} to {} documents (a reference text counts as one), got {}",
        doccompare_extract::MIN_DOCUMENTS,
        doccompare_extract::MAX_DOCUMENTS,
        inputs.len()
    );
    Ok(inputs)
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn select_backend(options: &PdfProcessOptions) -> Result<Backend> {
    if options.pdfium_library_path.is_none() {
        tracing::info!("no Pdfium library configured, scanned PDFs cannot be rasterized");
        return Ok(Backend::Lopdf(LopdfBackend));
    }
    let pdfium = PdfiumBackend::new(options).context("failed to load Pdfium")?;
    Ok(Backend::Pdfium(pdfium))
}

fn select_recognizer(models: Option<&Path>) -> Result<SharedRecognizer> {
    #[cfg(feature = "paddle")]
    if let Some(dir) = models {
        let models = doccompare_ocr::PaddleModels::from_dir(dir);
        let recognizer = doccompare_ocr::PaddleRecognizer::new(&models)
            .with_context(|| format!("failed to load OCR models from {}", dir.display()))?;
        return Ok(Box::new(recognizer));
    }

    #[cfg(not(feature = "paddle"))]
    if models.is_some() {
        tracing::warn!("built without the `paddle` feature, OCR models are ignored");
    }

    Ok(Box::new(UnavailableRecognizer::new(
        "OCR models are not configured (set --ocr-models or DOCCOMPARE_OCR_MODELS)",
    )))
}

/// Pre-check every PDF before the run and ask before expensive OCR. Locked PDFs are unlocked
/// here so their scan status is known; the run reuses the cached password. Returns `false`
/// if the user declines or cancels.
async fn confirm_pre_checks(
    extractor: &DocumentExtractor<Backend, SharedRecognizer>,
    passwords: &PasswordFlow,
    queue: &PasswordQueue,
    inputs: &[ComparisonInput],
    args: &Args,
    can_render: bool,
) -> Result<bool> {
    let limits = &extractor.pdf_options().limits;
    for input in inputs {
        let ComparisonInput::File(source) = input else {
            continue;
        };
        if source.kind() != Some(FileKind::Pdf) {
            continue;
        }
        let unlocked = extractor.pre_check_unlocked(source, passwords);
        let check = match future::or(unlocked, serve_passwords(queue)).await {
            Ok(check) => check,
            Err(err) if err.is_cancelled() => return Ok(false),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to inspect {}", source.name));
            }
        };
        tracing::debug!(file = %source.name, ?check, "pre-check");

        if check.exceeds_text_limit(limits) {
            eprintln!(
                "\x1b[33m⚠ {} has {} pages, only the first {} will be read.\x1b[0m",
                source.name, check.page_count, limits.text_page_limit
            );
        }
        let needs_ocr = args.force_ocr || check.is_scanned;
        if !needs_ocr {
            continue;
        }
        anyhow::ensure!(
            can_render,
            "{} needs OCR, which requires a Pdfium library (--pdfium-lib or {PDFIUM_ENV})",
            source.name
        );
        let advisory = check.ocr_advisory(limits);
        let pages = advisory.map_or_else(
            || check.page_count.min(limits.ocr_hard_limit),
            |advisory| advisory.pages_to_process,
        );
        eprintln!(
            "\x1b[33m⚠ {} needs OCR for {pages} page(s), this can take a while.\x1b[0m",
            source.name
        );
        if advisory.is_some_and(|advisory| advisory.exceeds_limit) {
            eprintln!(
                "\x1b[33m  Only the first {} of {} pages will be recognized.\x1b[0m",
                limits.ocr_hard_limit, check.page_count
            );
        }
        if !args.yes && !prompt::read_yes_no("Continue? [y/N]: ")? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn compare_documents(
    extractor: &DocumentExtractor<Backend, SharedRecognizer>,
    passwords: &PasswordFlow,
    queue: &PasswordQueue,
    inputs: &[ComparisonInput],
    args: &Args,
) -> Result<ComparisonReport, ExtractError> {
    let labels: Vec<&str> = inputs.iter().map(ComparisonInput::label).collect();
    let total = labels.len();
    let quiet = args.quiet;

    let on_progress = |index: usize, progress: ExtractionProgress| {
        if quiet {
            return;
        }
        let label = labels.get(index).copied().unwrap_or_default();
        eprint!(
            "\r\x1b[2K\x1b[36m[{}/{total}]\x1b[0m {label} \x1b[2m{:>3.0}% {}\x1b[0m",
            index + 1,
            progress.percent,
            progress.message
        );
        if progress.percent >= 100.0 {
            eprintln!();
        }
        io::stderr().flush().ok();
    };

    let comparison = ComparisonRun::new(extractor, passwords).with_force_ocr(args.force_ocr);
    let run = comparison.run(inputs, on_progress);
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            future::pending::<()>().await;
        }
        Err(ExtractError::Cancelled)
    };

    future::or(run, future::or(serve_passwords(queue), interrupted)).await
}

/// Answer password prompts from the terminal. Never completes; race it against the work.
async fn serve_passwords<T>(queue: &PasswordQueue) -> Result<T, ExtractError> {
    while let Some(request) = queue.next().await {
        let attempt = request.attempt.clone();
        let answer = blocking::unblock(move || {
            prompt::read_password(&attempt.label, attempt.last_error, attempt.attempts)
        })
        .await;
        let response = match answer {
            Ok(Some(password)) => PasswordResponse::Submit(password),
            Ok(None) => PasswordResponse::Cancel,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read password from terminal");
                PasswordResponse::Cancel
            }
        };
        if request.respond(response).is_err() {
            tracing::debug!("password prompt outlived its document");
        }
    }
    future::pending().await
}
