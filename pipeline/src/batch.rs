//! Sequential batch processing: validate, extract with retry, record.

use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{error, info, warn};
use vlm_gemini::VisionError;

use crate::config::{AuthFailurePolicy, PipelineConfig};
use crate::error::{BatchError, RetryError};
use crate::extractor::TextExtractor;
use crate::image::ImageItem;
use crate::result::{BatchRun, ExtractionResult, ExtractionStatus};
use crate::retry::RetryPolicy;
use crate::validation::{load_image, validate_image, ValidationError};

/// Progress notification sent after each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    /// 1-based index of the image just processed.
    pub current: usize,
    /// Number of images in the batch.
    pub total: usize,
    /// Name of the image just processed.
    pub filename: &'a str,
    /// Its final status.
    pub status: ExtractionStatus,
}

impl BatchProgress<'_> {
    /// Fraction of the batch done, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Outcome of one image, with the credential failure kept aside so the
/// orchestrator can apply the auth policy.
struct ItemOutcome {
    result: ExtractionResult,
    auth_failure: Option<String>,
}

impl ItemOutcome {
    fn rejected(err: &ValidationError) -> Self {
        warn!(filename = err.filename(), constraint = err.constraint(), "{err}");
        Self {
            result: ExtractionResult::validation_error(err.filename(), err),
            auth_failure: None,
        }
    }
}

/// Where an image comes from: already in memory, or a file read on its turn.
#[derive(Clone, Copy)]
enum Source<'a> {
    Loaded(&'a ImageItem),
    File(&'a Path),
}

/// Processes batches of images one at a time against a [`TextExtractor`].
///
/// Images are handled strictly in submission order and never concurrently,
/// which keeps load on the API bounded and attributes every failure to
/// exactly one image.
pub struct BatchOrchestrator<X> {
    extractor: X,
    config: PipelineConfig,
    retry: RetryPolicy,
}

impl<X: TextExtractor> BatchOrchestrator<X> {
    /// Creates an orchestrator with the given extractor and configuration.
    #[must_use]
    pub fn new(extractor: X, config: PipelineConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        Self {
            extractor,
            config,
            retry,
        }
    }

    /// Creates an orchestrator with the default configuration.
    #[must_use]
    pub fn with_defaults(extractor: X) -> Self {
        Self::new(extractor, PipelineConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The extractor in use.
    #[must_use]
    pub const fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Fails if `count` images would exceed the batch limit.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::BatchTooLarge` when `count > max_batch_size`.
    pub fn check_batch_size(&self, count: usize) -> Result<(), BatchError> {
        if count > self.config.max_batch_size {
            return Err(BatchError::BatchTooLarge {
                submitted: count,
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    /// Processes a batch without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`process_with_progress`](Self::process_with_progress).
    pub async fn process(&self, items: &[ImageItem]) -> Result<BatchRun, BatchError> {
        self.process_with_progress(items, |_| {}).await
    }

    /// Processes a batch, calling `on_progress` after every image.
    ///
    /// Returns one result per image, in input order. Per-image failures are
    /// recorded in the run and never abort it.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::BatchTooLarge` before touching any image if the
    /// batch exceeds the limit, and `BatchError::AuthFailed` with the partial
    /// run if the credential is rejected under [`AuthFailurePolicy::Halt`].
    pub async fn process_with_progress<P>(
        &self,
        items: &[ImageItem],
        on_progress: P,
    ) -> Result<BatchRun, BatchError>
    where
        P: FnMut(&BatchProgress<'_>),
    {
        let sources: Vec<Source<'_>> = items.iter().map(Source::Loaded).collect();
        self.process_sources(&sources, on_progress).await
    }

    /// Processes image files without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`process_paths_with_progress`](Self::process_paths_with_progress).
    pub async fn process_paths(&self, paths: &[PathBuf]) -> Result<BatchRun, BatchError> {
        self.process_paths_with_progress(paths, |_| {}).await
    }

    /// Processes image files, reading each one only when its turn comes so
    /// at most one image is held in memory.
    ///
    /// A file over the size limit is rejected from its metadata without
    /// being read. A file that cannot be read becomes a validation error
    /// for that image and the batch carries on.
    ///
    /// # Errors
    ///
    /// Same as [`process_with_progress`](Self::process_with_progress).
    pub async fn process_paths_with_progress<P>(
        &self,
        paths: &[PathBuf],
        on_progress: P,
    ) -> Result<BatchRun, BatchError>
    where
        P: FnMut(&BatchProgress<'_>),
    {
        let sources: Vec<Source<'_>> = paths.iter().map(|path| Source::File(path)).collect();
        self.process_sources(&sources, on_progress).await
    }

    async fn process_sources<P>(
        &self,
        sources: &[Source<'_>],
        mut on_progress: P,
    ) -> Result<BatchRun, BatchError>
    where
        P: FnMut(&BatchProgress<'_>),
    {
        self.check_batch_size(sources.len())?;

        if sources.is_empty() {
            warn!("No image files provided for processing");
            return Ok(BatchRun::default());
        }

        let total = sources.len();
        let start = Instant::now();
        let mut run = BatchRun::with_capacity(total);

        info!(total, "Processing batch");

        for (index, source) in sources.iter().enumerate() {
            let ItemOutcome {
                result,
                auth_failure,
            } = match *source {
                Source::Loaded(item) => self.process_item(item).await,
                Source::File(path) => match load_image(path, &self.config.limits).await {
                    Ok(item) => self.process_item(&item).await,
                    Err(err) => ItemOutcome::rejected(&err),
                },
            };

            info!(
                filename = %result.filename,
                status = %result.status,
                attempts = result.attempts,
                "Processed image {} of {}",
                index + 1,
                total
            );

            on_progress(&BatchProgress {
                current: index + 1,
                total,
                filename: &result.filename,
                status: result.status,
            });
            let filename = result.filename.clone();
            run.push(result);

            if let Some(message) = auth_failure {
                if self.config.auth_failure_policy == AuthFailurePolicy::Halt {
                    let remaining = total - (index + 1);
                    error!(filename = %filename, remaining, "Credential rejected, halting batch");
                    return Err(BatchError::AuthFailed {
                        filename,
                        message,
                        partial: run,
                        remaining,
                    });
                }
            }
        }

        let summary = run.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Batch complete"
        );

        Ok(run)
    }

    async fn process_item(&self, item: &ImageItem) -> ItemOutcome {
        let image = match validate_image(item, &self.config.limits) {
            Ok(image) => image,
            Err(err) => return ItemOutcome::rejected(&err),
        };

        let start = Instant::now();
        let outcome = self
            .retry
            .run(|| self.extractor.extract(&image), VisionError::is_transient)
            .await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(retried) => ItemOutcome {
                result: ExtractionResult::success(
                    item.filename(),
                    retried.value,
                    retried.attempts,
                    elapsed,
                ),
                auth_failure: None,
            },
            Err(RetryError::Exhausted {
                last_error,
                attempts,
                ..
            }) => {
                warn!(filename = item.filename(), attempts, "Retries exhausted: {last_error}");
                ItemOutcome {
                    result: ExtractionResult::failure(
                        item.filename(),
                        ExtractionStatus::ExhaustedRetries,
                        format!("Gave up after {attempts} attempts: {last_error}"),
                        attempts,
                        elapsed,
                    ),
                    auth_failure: None,
                }
            }
            Err(RetryError::Fatal {
                error, attempts, ..
            }) => {
                warn!(filename = item.filename(), kind = error.kind(), "Extraction failed: {error}");
                let auth_failure = error.is_auth().then(|| error.to_string());
                ItemOutcome {
                    result: ExtractionResult::failure(
                        item.filename(),
                        ExtractionStatus::ApiError,
                        error.to_string(),
                        attempts,
                        elapsed,
                    ),
                    auth_failure,
                }
            }
        }
    }
}
