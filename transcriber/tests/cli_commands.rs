use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use vlm_gemini::VisionError;
use vlm_pipeline::config::AuthFailurePolicy;
use vlm_pipeline::export::read_csv;
use vlm_pipeline::extractor::TextExtractor;
use vlm_pipeline::image::ValidatedImage;
use vlm_pipeline::result::ExtractionStatus;
use vlm_transcriber::{check, run_batch, AppError, ProcessOptions, Settings};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

/// Echoes the file name, or fails with the configured error for `bad.png`.
struct EchoExtractor {
    calls: AtomicUsize,
    bad: fn() -> VisionError,
}

impl EchoExtractor {
    fn new(bad: fn() -> VisionError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            bad,
        }
    }
}

#[async_trait]
impl TextExtractor for EchoExtractor {
    async fn extract(&self, image: &ValidatedImage<'_>) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if image.filename() == "bad.png" {
            Err((self.bad)())
        } else {
            Ok(format!("text of {}", image.filename()))
        }
    }
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn fast_settings() -> Settings {
    Settings {
        retry_delay_seconds: 0.0,
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_directory_batch_prints_table_and_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("scans");
    std::fs::create_dir(&images).unwrap();
    write(&images, "b.webp", WEBP);
    write(&images, "a.png", PNG);
    write(&images, "empty.png", b"");

    let csv_path = dir.path().join("out").join("results.csv");
    let options = ProcessOptions {
        csv: Some(csv_path.clone()),
        show_table: true,
        ..ProcessOptions::default()
    };
    let mut out = Vec::new();
    let mut status = Vec::new();

    let run = run_batch(
        EchoExtractor::new(|| VisionError::Network("unused".into())),
        &fast_settings(),
        &[images],
        &options,
        &mut out,
        &mut status,
    )
    .await
    .unwrap();

    let names: Vec<&str> = run.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.webp", "empty.png"]);
    assert_eq!(run.results()[2].status, ExtractionStatus::ValidationError);

    let table = String::from_utf8(out).unwrap();
    assert!(table.starts_with("filename"));
    assert!(table.contains("text of b.webp"));
    assert!(table.contains("3 images: 2 succeeded, 1 validation errors"));

    let status = String::from_utf8(status).unwrap();
    assert!(status.contains("Processing image 1 of 3: a.png [success]"));
    assert!(status.contains("Processing image 3 of 3: empty.png [validation_error]"));
    assert!(status.contains("Wrote csv export to"));

    let rows = read_csv(std::fs::File::open(&csv_path).unwrap()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].extracted_text.as_deref(), Some("text of a.png"));
}

#[tokio::test]
async fn test_auth_halt_still_exports_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "a.png", PNG),
        write(dir.path(), "bad.png", PNG),
        write(dir.path(), "c.png", PNG),
    ];
    let csv_path = dir.path().join("partial.csv");
    let options = ProcessOptions {
        csv: Some(csv_path.clone()),
        ..ProcessOptions::default()
    };
    let extractor = EchoExtractor::new(|| VisionError::Auth("API key not valid".into()));
    let mut out = Vec::new();

    let err = run_batch(
        extractor,
        &fast_settings(),
        &inputs,
        &options,
        &mut out,
        &mut std::io::sink(),
    )
    .await
    .unwrap_err();

    match err {
        AppError::AuthHalted {
            filename,
            remaining,
            ..
        } => {
            assert_eq!(filename, "bad.png");
            assert_eq!(remaining, 1);
        }
        other => panic!("expected AuthHalted, got {other:?}"),
    }
    assert!(out.is_empty());

    let rows = read_csv(std::fs::File::open(&csv_path).unwrap()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].status, ExtractionStatus::ApiError);
}

#[tokio::test]
async fn test_failed_export_does_not_hide_auth_halt() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "a.png", PNG),
        write(dir.path(), "bad.png", PNG),
    ];
    let blocker = write(dir.path(), "blocker", b"not a directory");
    let xlsx_path = dir.path().join("partial.xlsx");
    let options = ProcessOptions {
        csv: Some(blocker.join("results.csv")),
        xlsx: Some(xlsx_path.clone()),
        ..ProcessOptions::default()
    };
    let mut status = Vec::new();

    let err = run_batch(
        EchoExtractor::new(|| VisionError::Auth("API key not valid".into())),
        &fast_settings(),
        &inputs,
        &options,
        &mut std::io::sink(),
        &mut status,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::AuthHalted { .. }), "got {err:?}");
    let status = String::from_utf8(status).unwrap();
    assert!(status.contains("Batch halted: "));
    assert!(status.contains("results.csv failed: "));
    assert!(status.contains("Wrote xlsx export to"));
    assert!(xlsx_path.exists());
}

#[tokio::test]
async fn test_failed_export_is_returned_after_other_targets() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![write(dir.path(), "a.png", PNG)];
    let blocker = write(dir.path(), "blocker", b"not a directory");
    let xlsx_path = dir.path().join("results.xlsx");
    let options = ProcessOptions {
        csv: Some(blocker.join("results.csv")),
        xlsx: Some(xlsx_path.clone()),
        ..ProcessOptions::default()
    };

    let err = run_batch(
        EchoExtractor::new(|| VisionError::Network("unused".into())),
        &fast_settings(),
        &inputs,
        &options,
        &mut std::io::sink(),
        &mut std::io::sink(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Io(_)), "got {err:?}");
    assert!(std::fs::read(&xlsx_path).unwrap().starts_with(b"PK"));
}

#[tokio::test]
async fn test_oversize_file_in_directory_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut poster = PNG.to_vec();
    poster.resize(8192, 0);
    write(dir.path(), "a.png", PNG);
    write(dir.path(), "poster.png", &poster);
    write(dir.path(), "z.webp", WEBP);
    let settings = Settings {
        max_file_size_bytes: 1024,
        ..fast_settings()
    };
    let extractor = EchoExtractor::new(|| VisionError::Network("unused".into()));
    let mut status = Vec::new();

    let run = run_batch(
        extractor,
        &settings,
        &[dir.path().to_path_buf()],
        &ProcessOptions::default(),
        &mut std::io::sink(),
        &mut status,
    )
    .await
    .unwrap();

    let statuses: Vec<ExtractionStatus> = run.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExtractionStatus::Success,
            ExtractionStatus::ValidationError,
            ExtractionStatus::Success,
        ]
    );
    assert!(run.results()[1]
        .error
        .as_deref()
        .unwrap()
        .contains("poster.png is 8.0 KiB"));
    let status = String::from_utf8(status).unwrap();
    assert!(status.contains("Processing image 2 of 3: poster.png [validation_error]"));
}

#[tokio::test]
async fn test_auth_continue_processes_every_image() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "bad.png", PNG),
        write(dir.path(), "c.png", PNG),
    ];
    let settings = Settings {
        auth_failure_policy: AuthFailurePolicy::Continue,
        ..fast_settings()
    };

    let run = run_batch(
        EchoExtractor::new(|| VisionError::Auth("API key not valid".into())),
        &settings,
        &inputs,
        &ProcessOptions::default(),
        &mut std::io::sink(),
        &mut std::io::sink(),
    )
    .await
    .unwrap();

    assert_eq!(run.len(), 2);
    assert_eq!(run.results()[1].status, ExtractionStatus::Success);
}

#[tokio::test]
async fn test_batch_limit_checked_before_reading_images() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..3)
        .map(|i| write(dir.path(), &format!("{i}.png"), PNG))
        .collect();
    let settings = Settings {
        max_batch_size: 2,
        ..fast_settings()
    };
    let extractor = EchoExtractor::new(|| VisionError::Network("unused".into()));

    let err = run_batch(
        extractor,
        &settings,
        &inputs,
        &ProcessOptions::default(),
        &mut std::io::sink(),
        &mut std::io::sink(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Batch(_)));
    assert!(err.to_string().contains("Maximum 2 images allowed per batch, got 3"));
}

#[tokio::test]
async fn test_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_batch(
        EchoExtractor::new(|| VisionError::Network("unused".into())),
        &fast_settings(),
        &[dir.path().to_path_buf()],
        &ProcessOptions::default(),
        &mut std::io::sink(),
        &mut std::io::sink(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NoImages));
}

#[tokio::test]
async fn test_check_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write(dir.path(), "ok.png", PNG),
        write(dir.path(), "notes.txt", b"hello"),
    ];
    let mut out = Vec::new();

    let err = check(&Settings::default(), &inputs, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidImages(1)));
    let report = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "OK ok.png (png, 16 B)");
    assert!(lines[1].starts_with("INVALID notes.txt: "));
    assert_eq!(lines[2], "1 of 2 images valid");
}

#[tokio::test]
async fn test_check_reports_oversize_without_loading() {
    let dir = tempfile::tempdir().unwrap();
    let mut poster = PNG.to_vec();
    poster.resize(2048, 0);
    let inputs = vec![write(dir.path(), "poster.png", &poster)];
    let settings = Settings {
        max_file_size_bytes: 1024,
        ..Settings::default()
    };
    let mut out = Vec::new();

    let err = check(&settings, &inputs, &mut out).await.unwrap_err();

    assert!(matches!(err, AppError::InvalidImages(1)));
    let report = String::from_utf8(out).unwrap();
    assert!(report.starts_with(
        "INVALID poster.png: File poster.png is 2.0 KiB, exceeding the 1.0 KiB size limit"
    ));
}

#[tokio::test]
async fn test_check_passes_when_all_valid() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![write(dir.path(), "scan.webp", WEBP)];
    let mut out = Vec::new();

    check(&Settings::default(), &inputs, &mut out).await.unwrap();

    assert!(String::from_utf8(out).unwrap().ends_with("1 of 1 images valid\n"));
}
