//! Dispatcher, password flow and comparison runs against in-memory backends.

use std::io::Cursor;

use doccompare_extract::{
    ComparisonInput, ComparisonRun, DocumentExtractor, ExtractError, ExtractOptions,
    ExtractionProgress, FileType, PasswordAttempt, PasswordIssue, PasswordQueue,
    PasswordResponse, PasswordState, SourceFile, password_channel,
};
use doccompare_ocr::{OcrLine, OcrError, Recognizer};
use doccompare_pdf_process::{
    LoadedPdf, PageLimits, PageText, PdfBackend, PdfProcessError, PdfProcessOptions,
};
use futures_lite::future;
use image::{ImageFormat, RgbImage};

struct FakePdf {
    password: Option<&'static str>,
    pages: Vec<String>,
}

struct FakeDocument<'a> {
    backend: &'a FakePdf,
}

impl FakePdf {
    fn new(pages: Vec<String>) -> Self {
        Self {
            password: None,
            pages,
        }
    }

    fn locked(password: &'static str, pages: Vec<String>) -> Self {
        Self {
            password: Some(password),
            ..Self::new(pages)
        }
    }
}

impl PdfBackend for FakePdf {
    type Document<'a> = FakeDocument<'a>;

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> doccompare_pdf_process::Result<Self::Document<'a>> {
        if !bytes.starts_with(b"%PDF") {
            return Err(PdfProcessError::Parse("missing header".into()));
        }
        match (self.password, password) {
            (Some(_), None) => Err(PdfProcessError::PasswordRequired),
            (Some(expected), Some(given)) if expected != given => {
                Err(PdfProcessError::IncorrectPassword)
            }
            _ => Ok(FakeDocument { backend: self }),
        }
    }
}

impl LoadedPdf for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.backend.pages.len()
    }

    fn page_text(&self, index: usize) -> doccompare_pdf_process::Result<PageText> {
        Ok(PageText::Plain(self.backend.pages[index].clone()))
    }

    fn render_page(&self, index: usize, _dpi: u16) -> doccompare_pdf_process::Result<RgbImage> {
        Ok(RgbImage::new(u32::try_from(index).unwrap() + 1, 1))
    }
}

/// Reads back "ocr page N" for the page whose image width is N.
struct EchoRecognizer;

impl Recognizer for EchoRecognizer {
    fn recognize(
        &self,
        image: &RgbImage,
        progress: &mut dyn FnMut(f32),
    ) -> doccompare_ocr::Result<Vec<OcrLine>> {
        progress(1.0);
        Ok(vec![
            OcrLine::new(format!("ocr page {}", image.width()), 80.0),
            OcrLine::new("~", 20.0),
        ])
    }
}

struct BrokenRecognizer;

impl Recognizer for BrokenRecognizer {
    fn recognize(
        &self,
        _image: &RgbImage,
        _progress: &mut dyn FnMut(f32),
    ) -> doccompare_ocr::Result<Vec<OcrLine>> {
        Err(OcrError::Recognition("model crashed".into()))
    }
}

fn text_pages(count: usize) -> Vec<String> {
    (1..=count)
        .map(|n| format!("This is page {n} of a perfectly ordinary text based contract."))
        .collect()
}

const CONTRACT: &str = "This agreement between the parties sets out the services, the fees, \
                        and the term of the engagement in full.";

fn pdf(name: &str) -> SourceFile {
    SourceFile::new(b"%PDF-1.7".to_vec(), name, "application/pdf")
}

fn extractor(backend: FakePdf) -> DocumentExtractor<FakePdf, EchoRecognizer> {
    DocumentExtractor::new(backend, EchoRecognizer, ExtractOptions::new())
}

async fn serve(queue: &PasswordQueue, responses: Vec<PasswordResponse>) -> Vec<PasswordAttempt> {
    let mut seen = Vec::new();
    for response in responses {
        let request = queue.next().await.expect("a prompt");
        seen.push(request.attempt.clone());
        request.respond(response).expect("operation is waiting");
    }
    seen
}

#[tokio::test]
async fn text_pdf_uses_structural_text() {
    let extractor = extractor(FakePdf::new(text_pages(3)));
    let mut events = Vec::new();
    let result = extractor
        .extract(&pdf("contract.pdf"), false, None, &mut |p| events.push(p))
        .await
        .unwrap();

    assert_eq!(result.file_type, FileType::Pdf);
    assert!(!result.used_ocr);
    assert_eq!(result.ocr_confidence, None);
    assert!(result.text.starts_with("This is page 1"));
    assert_eq!(result.text.lines().count(), 3);
    assert_eq!(
        events.last(),
        Some(&ExtractionProgress::new(100.0, "Extraction complete"))
    );
    assert!(events.iter().any(|p| p.message == "Extracting page 2/3..."));
}

#[tokio::test]
async fn forced_ocr_replaces_good_text() {
    let backend = FakePdf::new(text_pages(2));
    let extractor = extractor(backend);
    let result = extractor
        .extract(&pdf("contract.pdf"), true, None, &mut |_| {})
        .await
        .unwrap();

    assert!(result.used_ocr);
    assert_eq!(result.text, "ocr page 1\nocr page 2");
    assert_eq!(result.ocr_confidence, Some(80.0));
}

#[tokio::test]
async fn scanned_pdf_falls_back_to_ocr() {
    let extractor = extractor(FakePdf::new(vec![String::new(), " ".into()]));
    let mut events = Vec::new();
    let result = extractor
        .extract(&pdf("scan.pdf"), false, None, &mut |p| events.push(p))
        .await
        .unwrap();

    assert!(result.used_ocr);
    assert_eq!(result.text, "ocr page 1\nocr page 2");
    assert!(events
        .iter()
        .any(|p| p.message == "PDF appears to be scanned. Starting OCR..."));
    assert!(events.iter().any(|p| p.message.starts_with("OCR: Page 2/2")));
    assert_eq!(events.last(), Some(&ExtractionProgress::new(100.0, "OCR complete")));
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
}

#[tokio::test]
async fn ocr_is_capped_at_the_hard_limit() {
    let options = ExtractOptions::new().with_pdf(PdfProcessOptions::new().with_limits(PageLimits {
        ocr_hard_limit: 4,
        text_page_limit: 1000,
    }));
    let extractor =
        DocumentExtractor::new(FakePdf::new(vec![String::new(); 9]), EchoRecognizer, options);
    let result = extractor
        .extract(&pdf("long-scan.pdf"), false, None, &mut |_| {})
        .await
        .unwrap();

    assert_eq!(result.text.lines().count(), 4);
}

#[tokio::test]
async fn ocr_failures_are_extraction_failures() {
    let extractor = DocumentExtractor::new(
        FakePdf::new(vec![String::new()]),
        BrokenRecognizer,
        ExtractOptions::new(),
    );
    let err = extractor
        .extract(&pdf("scan.pdf"), false, None, &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ExtractionFailure { ref name, .. } if name == "scan.pdf"));
}

#[tokio::test]
async fn unknown_files_are_rejected() {
    let extractor = extractor(FakePdf::new(Vec::new()));
    let source = SourceFile::new(b"hello".to_vec(), "notes.txt", "text/plain");
    let err = extractor
        .extract(&source, false, None, &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedFileType { .. }));
}

#[tokio::test]
async fn corrupt_pdf_is_an_extraction_failure() {
    let extractor = extractor(FakePdf::new(Vec::new()));
    let source = SourceFile::new(b"garbage".to_vec(), "broken.pdf", "");
    let err = extractor
        .extract(&source, false, None, &mut |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ExtractionFailure { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn images_go_straight_to_ocr() {
    let mut png = Vec::new();
    RgbImage::new(7, 3)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let extractor = extractor(FakePdf::new(Vec::new()));
    let mut events = Vec::new();
    let result = extractor
        .extract(&SourceFile::new(png, "photo.png", "image/png"), false, None, &mut |p| {
            events.push(p);
        })
        .await
        .unwrap();

    assert_eq!(result.file_type, FileType::Image);
    assert!(result.used_ocr);
    assert_eq!(result.text, "ocr page 7");
    assert_eq!(events[1], ExtractionProgress::new(70.0, "Initializing OCR..."));
    assert!(events.iter().any(|p| p.message == "OCR progress: 100%"));
}

#[tokio::test]
async fn word_documents_are_read_without_ocr() {
    use docx_rs::{Docx, Paragraph, Run};

    let mut bytes = Vec::new();
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Statement of Work")))
        .build()
        .pack(Cursor::new(&mut bytes))
        .unwrap();

    let extractor = extractor(FakePdf::new(Vec::new()));
    let result = extractor
        .extract(&SourceFile::new(bytes, "sow.docx", ""), false, None, &mut |_| {})
        .await
        .unwrap();
    assert_eq!(result.file_type, FileType::Word);
    assert!(!result.used_ocr);
    assert_eq!(result.text, "Statement of Work");
}

#[tokio::test]
async fn pre_check_reports_locked_documents() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let result = extractor.pre_check(&pdf("locked.pdf"), None).unwrap();
    assert!(result.is_password_protected);

    let result = extractor.pre_check(&pdf("locked.pdf"), Some("pw")).unwrap();
    assert!(!result.is_password_protected);
    assert!(!result.is_scanned);
}

#[tokio::test]
async fn unlocked_pre_check_sees_a_scanned_document() {
    let extractor = extractor(FakePdf::locked("pw", vec![String::new(); 3]));
    let (flow, queue) = password_channel();
    let source = pdf("locked-scan.pdf");

    let check = extractor.pre_check_unlocked(&source, &flow);
    let host = serve(
        &queue,
        vec![
            PasswordResponse::Submit("nope".into()),
            PasswordResponse::Submit("pw".into()),
        ],
    );
    let (check, prompts) = future::zip(check, host).await;
    let check = check.unwrap();

    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1].last_error, PasswordIssue::Incorrect);
    assert!(!check.is_password_protected);
    assert!(check.is_scanned);
    assert_eq!(check.page_count, 3);
    let limits = extractor.pdf_options().limits;
    assert_eq!(check.ocr_advisory(&limits).map(|a| a.pages_to_process), Some(3));

    // The run that follows reuses the cached password.
    let inputs = [
        ComparisonInput::File(source),
        ComparisonInput::ReferenceText {
            label: "typed".into(),
            text: "ocr page 1\nocr page 2\nocr page 3".into(),
        },
    ];
    let report = ComparisonRun::new(&extractor, &flow)
        .run(&inputs, |_, _| {})
        .await
        .unwrap();
    assert!(report.documents[0].used_ocr);
    assert!(report.comparisons[0].result.is_exact_match);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn cancelling_an_unlocking_pre_check_is_cancelled() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let (flow, queue) = password_channel();
    let source = pdf("locked.pdf");

    let check = extractor.pre_check_unlocked(&source, &flow);
    let host = serve(&queue, vec![PasswordResponse::Cancel]);
    let (check, _) = future::zip(check, host).await;
    assert!(check.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn password_is_retried_until_correct_and_cached() {
    let extractor = extractor(FakePdf::locked("hunter2", text_pages(2)));
    let (flow, queue) = password_channel();
    let source = pdf("locked.pdf");
    let key = source.key();

    let work = flow.run(&key, "locked.pdf", async |password: Option<String>| {
        extractor
            .extract(&source, false, password.as_deref(), &mut |_| {})
            .await
    });
    let host = serve(
        &queue,
        vec![
            PasswordResponse::Submit("guess".into()),
            PasswordResponse::Submit("hunter2".into()),
        ],
    );
    let (result, prompts) = future::zip(work, host).await;

    assert!(result.unwrap().text.contains("page 2"));
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].last_error, PasswordIssue::Required);
    assert_eq!(prompts[1].last_error, PasswordIssue::Incorrect);
    assert_eq!(prompts[1].attempts, 1);
    assert_eq!(flow.state().await, PasswordState::Resolved(key.clone()));
    assert_eq!(flow.cached(&key).await.as_deref(), Some("hunter2"));

    // A second pass over the same document uses the cache and never prompts.
    let again = flow
        .run(&key, "locked.pdf", async |password: Option<String>| {
            extractor
                .extract(&source, false, password.as_deref(), &mut |_| {})
                .await
        })
        .await
        .unwrap();
    assert!(!again.used_ocr);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn cancelling_a_prompt_aborts() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let (flow, queue) = password_channel();
    let source = pdf("locked.pdf");

    let key = source.key();
    let work = flow.run(&key, "locked.pdf", async |password: Option<String>| {
        extractor
            .extract(&source, false, password.as_deref(), &mut |_| {})
            .await
    });
    let host = serve(&queue, vec![PasswordResponse::Cancel]);
    let (result, _) = future::zip(work, host).await;

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_recoverable());
    assert_eq!(flow.state().await, PasswordState::Idle);
}

#[tokio::test]
async fn without_a_host_the_password_error_surfaces() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let (flow, queue) = password_channel();
    drop(queue);
    let source = pdf("locked.pdf");

    let err = flow
        .run(&source.key(), "locked.pdf", async |password: Option<String>| {
            extractor
                .extract(&source, false, password.as_deref(), &mut |_| {})
                .await
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::PasswordRequired { .. }));
}

#[tokio::test]
async fn prompts_for_different_documents_never_overlap() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let (flow, queue) = password_channel();
    let first = pdf("first.pdf");
    let second = pdf("second.pdf");
    let attempt = async |source: &SourceFile| {
        flow.run(&source.key(), &source.name, async |password: Option<String>| {
            extractor
                .extract(source, false, password.as_deref(), &mut |_| {})
                .await
        })
        .await
    };

    let host = async {
        let mut labels = Vec::new();
        for _ in 0..2 {
            let request = queue.next().await.expect("a prompt");
            for _ in 0..5 {
                future::yield_now().await;
            }
            // The other document is parked behind this prompt.
            assert!(queue.is_empty());
            labels.push(request.attempt.label.clone());
            request.submit("pw").unwrap();
        }
        labels
    };

    let ((a, b), labels) = future::zip(future::zip(attempt(&first), attempt(&second)), host).await;
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(labels.len(), 2);
    assert_ne!(labels[0], labels[1]);
}

#[tokio::test]
async fn comparison_run_diffs_against_the_first_document() {
    let extractor = extractor(FakePdf::new(vec![CONTRACT.to_string()]));
    let (flow, _queue) = password_channel();
    let inputs = [
        ComparisonInput::File(pdf("contract.pdf")),
        ComparisonInput::ReferenceText {
            label: "expected".into(),
            text: CONTRACT.to_uppercase(),
        },
        ComparisonInput::ReferenceText {
            label: "edited".into(),
            text: CONTRACT.replace("the fees", "no fees"),
        },
    ];

    let mut seen = Vec::new();
    let report = ComparisonRun::new(&extractor, &flow)
        .run(&inputs, |index, progress| seen.push((index, progress.percent)))
        .await
        .unwrap();

    assert_eq!(report.documents.len(), 3);
    assert!(!report.documents[0].used_ocr);
    assert_eq!(report.documents[1].file_type, FileType::Text);
    assert_eq!(report.comparisons.len(), 2);
    assert_eq!(report.comparisons[0].other, 1);
    assert!(report.comparisons[0].result.is_exact_match);
    assert_eq!(report.comparisons[1].baseline, 0);
    assert!(!report.comparisons[1].result.is_exact_match);
    assert!(report.comparisons[1].result.similarity < 100);

    let indices: Vec<usize> = seen.iter().map(|(index, _)| *index).collect();
    assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(indices.last(), Some(&2));
}

#[tokio::test]
async fn comparison_report_serializes() {
    let extractor = extractor(FakePdf::new(vec![CONTRACT.to_string()]));
    let (flow, _queue) = password_channel();
    let inputs = [
        ComparisonInput::File(pdf("contract.pdf")),
        ComparisonInput::ReferenceText {
            label: "expected".into(),
            text: CONTRACT.to_string(),
        },
    ];
    let report = ComparisonRun::new(&extractor, &flow)
        .run(&inputs, |_, _| {})
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["documents"][0]["file_type"], "pdf");
    assert_eq!(json["documents"][1]["file_type"], "text");
    assert!(json["documents"][0].get("ocr_confidence").is_none());
    assert_eq!(json["comparisons"][0]["result"]["is_exact_match"], true);
}

#[tokio::test]
async fn comparison_run_rejects_wrong_document_counts() {
    let extractor = extractor(FakePdf::new(Vec::new()));
    let (flow, _queue) = password_channel();
    let run = ComparisonRun::new(&extractor, &flow);

    let one = [ComparisonInput::File(pdf("a.pdf"))];
    let err = run.run(&one, |_, _| {}).await.unwrap_err();
    assert!(matches!(err, ExtractError::InvalidRequest(_)));

    let four: Vec<_> = (0..4).map(|i| ComparisonInput::File(pdf(&format!("{i}.pdf")))).collect();
    assert!(run.run(&four, |_, _| {}).await.is_err());
}

#[tokio::test]
async fn comparison_run_stops_on_cancel() {
    let extractor = extractor(FakePdf::locked("pw", text_pages(1)));
    let (flow, queue) = password_channel();
    let inputs = [
        ComparisonInput::File(pdf("a.pdf")),
        ComparisonInput::File(pdf("b.pdf")),
    ];

    let comparison = ComparisonRun::new(&extractor, &flow).with_force_ocr(false);
    let work = comparison.run(&inputs, |_, _| {});
    let host = serve(&queue, vec![PasswordResponse::Cancel]);
    let (result, prompts) = future::zip(work, host).await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].label, "a.pdf");
}
