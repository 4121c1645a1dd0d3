use std::sync::Arc;
use std::time::Duration;

use docshelf_classify::{Classifier, ClassifyRequest};
use docshelf_core::{
    BatchSummary, Category, ExtractedContent, FileRecord, OrganizeError, OrganizeOutcome,
    SkipReason, route,
};
use docshelf_storage::{ListFilter, StorageProvider};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::claim::ClaimSet;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::folders::FolderCache;

/// Drives files through the organize flow: skip checks, claim, content
/// extraction, classification, routing, and the move into the destination
/// category folder.
#[derive(Debug)]
pub struct Organizer {
    storage: Arc<dyn StorageProvider>,
    classifier: Arc<dyn Classifier>,
    folders: FolderCache,
    claims: ClaimSet,
    config: PipelineConfig,
    root: String,
}

impl Organizer {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        classifier: Arc<dyn Classifier>,
        root: impl Into<String>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            storage,
            classifier,
            folders: FolderCache::new(),
            claims: ClaimSet::new(),
            config,
            root: root.into(),
        }
    }

    /// The folder this organizer watches.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Organize a single file, reporting what happened.
    ///
    /// Never returns an error: per-file failures become
    /// [`OrganizeOutcome::Failed`] so callers can keep going. With
    /// `dry_run` the full classify-and-route flow runs, but the file is
    /// left in place.
    #[instrument(skip(self, file), fields(file.id = %file.id, file.name = %file.name))]
    pub async fn organize_file(&self, file: &FileRecord, dry_run: bool) -> OrganizeOutcome {
        if let Some(reason) = self.skip_reason(file).await {
            debug!(file = %file.name, reason = %reason, "skipping file");
            return OrganizeOutcome::Skipped { reason };
        }

        let outcome = self.process(file, dry_run).await;
        match &outcome {
            OrganizeOutcome::Moved { category } => {
                if dry_run {
                    // Nothing actually moved, so free the file for a real run.
                    self.claims.release(&file.id).await;
                }
                info!(file = %file.name, category = %category, dry_run, "organized file");
            }
            OrganizeOutcome::Failed(error) => {
                // Release the claim so a later trigger can retry.
                self.claims.release(&file.id).await;
                warn!(
                    file = %file.name,
                    code = %error.code,
                    error = %error.message,
                    retryable = error.retryable,
                    "failed to organize file"
                );
            }
            OrganizeOutcome::Skipped { .. } => {}
        }
        outcome
    }

    /// Prepare folders, list the root, and organize every file in it.
    ///
    /// Files are handled one at a time with a fixed pause between them to
    /// stay within the classification API's rate limits. Cancelling
    /// `cancel` stops the run at the next file boundary.
    pub async fn run_batch(
        &self,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, PipelineError> {
        if !dry_run {
            self.prepare_folders().await?;
        }

        let files = self.storage.list(&self.root, &ListFilter::sweep()).await?;
        info!(root = %self.root, count = files.len(), dry_run, "starting batch run");

        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let mut summary = BatchSummary::default();

        for (index, file) in files.iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                info!(processed = summary.total(), "batch run cancelled");
                break;
            }
            summary.record(&self.organize_file(file, dry_run).await);
        }

        info!(
            organized = summary.organized,
            skipped = summary.skipped,
            errors = summary.errors,
            "batch run finished"
        );
        Ok(summary)
    }

    /// Create every category folder under the root ahead of time, so a
    /// sweep does not race folder creation against its first move.
    pub async fn prepare_folders(&self) -> Result<(), PipelineError> {
        for category in Category::ALL {
            self.folders
                .resolve(self.storage.as_ref(), category, &self.root)
                .await?;
        }
        Ok(())
    }

    async fn skip_reason(&self, file: &FileRecord) -> Option<SkipReason> {
        if file.is_folder() {
            return Some(SkipReason::Folder);
        }
        if file.is_media() {
            return Some(SkipReason::MediaType);
        }
        if file.organized {
            return Some(SkipReason::AlreadyOrganized);
        }
        if !self.claims.claim(&file.id).await {
            return Some(SkipReason::InFlight);
        }
        None
    }

    async fn process(&self, file: &FileRecord, dry_run: bool) -> OrganizeOutcome {
        let content = self.fetch_content(file).await;
        let request = ClassifyRequest::new(file, &content);

        let result = match self.classifier.classify(&request).await {
            Ok(result) => result,
            Err(e) => {
                return OrganizeOutcome::Failed(OrganizeError {
                    code: "classification".into(),
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
            }
        };

        let category = route(&result, self.config.confidence_threshold);
        info!(
            file = %file.name,
            proposed = %result.category,
            destination = %category,
            confidence = result.confidence,
            source = ?content.source,
            "classified file"
        );

        if dry_run {
            return OrganizeOutcome::Moved { category };
        }

        let folder = match self
            .folders
            .resolve(self.storage.as_ref(), category, &self.root)
            .await
        {
            Ok(folder) => folder,
            Err(e) => {
                return OrganizeOutcome::Failed(OrganizeError {
                    code: "folder".into(),
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                });
            }
        };

        if let Err(e) = self.storage.move_file(&file.id, &folder).await {
            return OrganizeOutcome::Failed(OrganizeError {
                code: "move".into(),
                message: e.to_string(),
                retryable: e.is_retryable(),
            });
        }

        if let Err(e) = self.storage.mark_organized(&file.id).await {
            // The file already sits in its destination; the marker only
            // suppresses reprocessing, so a miss here is not a failure.
            warn!(file = %file.name, error = %e, "failed to set organized marker");
        }

        OrganizeOutcome::Moved { category }
    }

    /// Download and extract text for classification.
    ///
    /// Infallible: any problem along the way degrades to the filename
    /// fallback so the file still gets classified on its name.
    async fn fetch_content(&self, file: &FileRecord) -> ExtractedContent {
        let budget = Duration::from_secs(self.config.download_timeout_seconds);
        let bytes = match tokio::time::timeout(budget, self.storage.download(file)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                warn!(file = %file.name, error = %e, "download failed, classifying by filename");
                return ExtractedContent::filename_only(&file.name);
            }
            Err(_) => {
                warn!(
                    file = %file.name,
                    timeout_seconds = self.config.download_timeout_seconds,
                    "download timed out, classifying by filename"
                );
                return ExtractedContent::filename_only(&file.name);
            }
        };

        // Native docs come down converted, so parse the export format.
        let mime = file
            .export_mime()
            .map_or_else(|| file.mime_type.clone(), str::to_string);
        let name = file.name.clone();

        match tokio::task::spawn_blocking(move || docshelf_extract::extract(&mime, &bytes)).await {
            Ok(Ok(text)) => ExtractedContent::extracted(text, self.config.content_cap),
            Ok(Err(e)) => {
                debug!(file = %name, error = %e, "extraction failed, classifying by filename");
                ExtractedContent::filename_only(&name)
            }
            Err(e) => {
                warn!(file = %name, error = %e, "extraction task failed");
                ExtractedContent::filename_only(&name)
            }
        }
    }
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docshelf_classify::{FailingClassifier, MockClassifier};
    use docshelf_core::ClassificationResult;
    use docshelf_storage::MemoryStorage;

    use super::*;

    fn text_file(id: &str, name: &str) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: name.into(),
            mime_type: "text/plain".into(),
            size: 64,
            parent_id: Some("root".into()),
            organized: false,
        }
    }

    fn organizer(storage: Arc<MemoryStorage>, classifier: Arc<dyn Classifier>) -> Organizer {
        Organizer::new(storage, classifier, "root", PipelineConfig::default())
    }

    #[tokio::test]
    async fn confident_file_moves_to_category_folder() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Finance));
        let file = text_file("f1", "invoice.txt");
        storage
            .add_file(file.clone(), "Invoice #42, net 30 days")
            .await;

        let organizer = organizer(storage.clone(), classifier.clone());
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(
            outcome,
            OrganizeOutcome::Moved {
                category: Category::Finance
            }
        ));
        let moved = storage.file("f1").await.unwrap();
        assert!(moved.organized);
        let parent = moved.parent_id.unwrap();
        assert_eq!(storage.file(&parent).await.unwrap().name, "Finance");
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn low_confidence_routes_to_review() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::uncertain(Category::Finance));
        let file = text_file("f1", "maybe-invoice.txt");
        storage.add_file(file.clone(), "ambiguous scribbles").await;

        let organizer = organizer(storage.clone(), classifier);
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(
            outcome,
            OrganizeOutcome::Moved {
                category: Category::NeedsReview
            }
        ));
        let parent = storage.file("f1").await.unwrap().parent_id.unwrap();
        assert_eq!(storage.file(&parent).await.unwrap().name, "Needs Review");
    }

    #[tokio::test]
    async fn threshold_confidence_is_accepted() {
        let storage = Arc::new(MemoryStorage::new());
        let result =
            ClassificationResult::new(Category::Academics, 0.7, "boundary case", None).unwrap();
        let classifier = Arc::new(MockClassifier::with_result(result));
        let file = text_file("f1", "syllabus.txt");
        storage
            .add_file(file.clone(), "CS 301 course outline")
            .await;

        let organizer = organizer(storage, classifier);
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(
            outcome,
            OrganizeOutcome::Moved {
                category: Category::Academics
            }
        ));
    }

    #[tokio::test]
    async fn folders_and_media_skip_without_classification() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        let organizer = organizer(storage, classifier.clone());

        let mut folder = text_file("d1", "Old Stuff");
        folder.mime_type = docshelf_core::FOLDER_MIME.into();
        let mut photo = text_file("m1", "holiday.png");
        photo.mime_type = "image/png".into();

        let outcome = organizer.organize_file(&folder, false).await;
        assert!(matches!(
            outcome,
            OrganizeOutcome::Skipped {
                reason: SkipReason::Folder
            }
        ));
        let outcome = organizer.organize_file(&photo, false).await;
        assert!(matches!(
            outcome,
            OrganizeOutcome::Skipped {
                reason: SkipReason::MediaType
            }
        ));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn organized_marker_short_circuits() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        let mut file = text_file("f1", "done.txt");
        file.organized = true;

        let organizer = organizer(storage, classifier.clone());
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(
            outcome,
            OrganizeOutcome::Skipped {
                reason: SkipReason::AlreadyOrganized
            }
        ));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn held_claim_skips_as_in_flight() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        let file = text_file("f1", "contested.txt");
        storage.add_file(file.clone(), "contents").await;

        let organizer = organizer(storage, classifier.clone());
        assert!(organizer.claims.claim("f1").await);

        let outcome = organizer.organize_file(&file, false).await;
        assert!(matches!(
            outcome,
            OrganizeOutcome::Skipped {
                reason: SkipReason::InFlight
            }
        ));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn classification_failure_leaves_file_and_releases_claim() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(FailingClassifier::unavailable("overloaded"));
        let file = text_file("f1", "unlucky.txt");
        storage.add_file(file.clone(), "contents").await;

        let organizer = organizer(storage.clone(), classifier);
        let outcome = organizer.organize_file(&file, false).await;

        match outcome {
            OrganizeOutcome::Failed(error) => {
                assert_eq!(error.code, "classification");
                assert!(error.retryable);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        let untouched = storage.file("f1").await.unwrap();
        assert_eq!(untouched.parent_id.as_deref(), Some("root"));
        assert!(!untouched.organized);
        // Claim released, so a retry is allowed.
        assert!(organizer.claims.claim("f1").await);
    }

    #[tokio::test]
    async fn move_failure_keeps_file_unorganized() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Hr));
        let file = text_file("f1", "offer-letter.txt");
        storage.add_file(file.clone(), "offer terms").await;
        storage.fail_moves(true);

        let organizer = organizer(storage.clone(), classifier);
        let outcome = organizer.organize_file(&file, false).await;

        match outcome {
            OrganizeOutcome::Failed(error) => assert_eq!(error.code, "move"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!storage.file("f1").await.unwrap().organized);
    }

    #[tokio::test]
    async fn marker_miss_after_move_still_counts_as_moved() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Hr));
        let file = text_file("f1", "review.txt");
        storage.add_file(file.clone(), "annual review notes").await;
        storage.fail_marks(true);

        let organizer = organizer(storage.clone(), classifier);
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(outcome, OrganizeOutcome::Moved { .. }));
        let moved = storage.file("f1").await.unwrap();
        assert_ne!(moved.parent_id.as_deref(), Some("root"));
        assert!(!moved.organized);
    }

    #[tokio::test]
    async fn download_failure_falls_back_to_filename() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Finance));
        let file = text_file("f1", "tax-return.txt");
        storage.add_file(file.clone(), "contents").await;
        storage.fail_downloads(true);

        let organizer = organizer(storage, classifier.clone());
        let outcome = organizer.organize_file(&file, false).await;

        assert!(matches!(outcome, OrganizeOutcome::Moved { .. }));
        let request = classifier.last_request().unwrap();
        assert_eq!(request.content, "Filename: tax-return.txt");
    }

    #[tokio::test]
    async fn unsupported_type_classified_by_filename() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Projects));
        let mut file = text_file("f1", "release-v2.zip");
        file.mime_type = "application/zip".into();
        storage
            .add_file(file.clone(), vec![0x50, 0x4b, 0x03, 0x04])
            .await;

        let organizer = organizer(storage, classifier.clone());
        organizer.organize_file(&file, false).await;

        let request = classifier.last_request().unwrap();
        assert_eq!(request.content, "Filename: release-v2.zip");
    }

    #[tokio::test]
    async fn native_doc_uses_export_format_for_extraction() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Hr));
        let mut file = text_file("f1", "Interview Notes");
        file.mime_type = "application/vnd.google-apps.document".into();
        storage
            .add_file(file.clone(), "Candidate seemed strong on systems design")
            .await;

        let organizer = organizer(storage, classifier.clone());
        organizer.organize_file(&file, false).await;

        let request = classifier.last_request().unwrap();
        assert_eq!(request.content, "Candidate seemed strong on systems design");
    }

    #[tokio::test]
    async fn dry_run_classifies_without_side_effects() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Finance));
        let file = text_file("f1", "budget.txt");
        storage.add_file(file.clone(), "FY26 budget draft").await;

        let organizer = organizer(storage.clone(), classifier.clone());
        let outcome = organizer.organize_file(&file, true).await;

        assert!(matches!(
            outcome,
            OrganizeOutcome::Moved {
                category: Category::Finance
            }
        ));
        let untouched = storage.file("f1").await.unwrap();
        assert_eq!(untouched.parent_id.as_deref(), Some("root"));
        assert!(!untouched.organized);
        // Dry runs release their claim so a real run can follow.
        assert!(!organizer.claims.contains("f1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_sweeps_the_root_and_counts_outcomes() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Projects));
        storage
            .add_file(text_file("f1", "plan.txt"), "Q3 roadmap")
            .await;
        storage
            .add_file(text_file("f2", "standup.txt"), "notes")
            .await;
        let mut photo = text_file("m1", "team.png");
        photo.mime_type = "image/png".into();
        storage.add_file(photo, vec![0u8; 4]).await;
        let mut done = text_file("f3", "archived.txt");
        done.organized = true;
        storage.add_file(done, "already sorted").await;

        let organizer = organizer(storage.clone(), classifier);
        let summary = organizer
            .run_batch(false, &CancellationToken::new())
            .await
            .unwrap();

        // The sweep listing never surfaces the organized file at all.
        assert_eq!(summary.organized, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(storage.file("f3").await.unwrap().parent_id.as_deref(), Some("root"));

        // All destination folders exist up front, including the sentinel.
        let folders = storage.list("root", &ListFilter::default()).await.unwrap();
        let names: Vec<String> = folders
            .iter()
            .filter(|f| f.is_folder())
            .map(|f| f.name.clone())
            .collect();
        assert!(names.contains(&"Needs Review".to_string()));
        assert_eq!(names.len(), Category::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_paces_files_with_delay() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        storage.add_file(text_file("f1", "a.txt"), "a").await;
        storage.add_file(text_file("f2", "b.txt"), "b").await;

        let organizer = organizer(storage, classifier);
        let start = tokio::time::Instant::now();
        organizer
            .run_batch(false, &CancellationToken::new())
            .await
            .unwrap();

        // Exactly one inter-file pause for two files.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn cancelled_batch_stops_before_processing() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        storage.add_file(text_file("f1", "a.txt"), "a").await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let organizer = organizer(storage, classifier.clone());
        let summary = organizer.run_batch(false, &cancel).await.unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn folder_preparation_failure_aborts_the_batch() {
        let storage = Arc::new(MemoryStorage::new());
        let classifier = Arc::new(MockClassifier::confident(Category::Personal));
        storage.fail_folders(true);

        let organizer = organizer(storage, classifier);
        let result = organizer.run_batch(false, &CancellationToken::new()).await;
        assert!(matches!(result, Err(PipelineError::Storage(_))));
    }
}
