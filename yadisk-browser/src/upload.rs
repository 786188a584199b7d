use std::path::PathBuf;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::gateway::{GatewayError, UploadGateway};
use crate::listing::ListingCache;
use crate::navigation::FolderPath;

pub const MAX_BATCH_FILES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("at most {max} files can be uploaded at once, got {count}")]
    TooManyFiles { count: usize, max: usize },
    #[error("path has no file name: {0}")]
    NoFileName(String),
}

/// A local file picked for upload; `name` becomes the remote file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub path: PathBuf,
}

impl LocalFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, SelectionError> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| SelectionError::NoFileName(path.display().to_string()))?;
        Ok(Self { name, path })
    }
}

/// Files chosen for the next upload. `generation` changes whenever the
/// selection is reset so a new pick always starts from a clean input.
#[derive(Debug, Default)]
pub struct UploadSelection {
    files: Vec<LocalFile>,
    generation: u64,
}

impl UploadSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection. Oversized batches are rejected whole and the
    /// previous selection stays in place.
    pub fn select(&mut self, files: Vec<LocalFile>) -> Result<usize, SelectionError> {
        if files.len() > MAX_BATCH_FILES {
            return Err(SelectionError::TooManyFiles {
                count: files.len(),
                max: MAX_BATCH_FILES,
            });
        }
        self.files = files;
        Ok(self.files.len())
    }

    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reset(&mut self) {
        self.files.clear();
        self.generation += 1;
    }
}

/// Aggregate result of one upload run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub failed_names: Vec<String>,
    /// At least one file failed because the token was rejected.
    pub unauthorized: bool,
}

impl UploadOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    fn record_success(&mut self) {
        self.succeeded += 1;
    }

    fn record_failure(&mut self, name: &str, failure: &FileFailure) {
        self.failed += 1;
        self.failed_names.push(name.to_string());
        self.unauthorized |= failure.is_unauthorized();
    }
}

#[derive(Debug, Error)]
pub enum FileFailure {
    #[error("could not obtain upload target: {0}")]
    Target(GatewayError),
    #[error("could not send file: {0}")]
    Transfer(GatewayError),
    #[error("upload target answered {0}")]
    Status(StatusCode),
}

impl FileFailure {
    /// Only API errors speak for the token. The upload target is a one-time
    /// URL that never sees it, so its status is not an auth signal.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            FileFailure::Target(err) | FileFailure::Transfer(err) => err.is_unauthorized(),
            FileFailure::Status(_) => false,
        }
    }
}

pub struct UploadOrchestrator<'a, G> {
    gateway: &'a G,
    overwrite: bool,
}

impl<'a, G: UploadGateway> UploadOrchestrator<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            overwrite: true,
        }
    }

    /// Uploads every file concurrently into `folder`. Results are classified
    /// as they arrive; each success is inserted into `listing` right away.
    /// Returns once every file has either succeeded or failed.
    pub async fn run(
        &self,
        files: &[LocalFile],
        folder: &FolderPath,
        listing: &mut ListingCache,
    ) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();
        let mut pending: FuturesUnordered<_> = files
            .iter()
            .map(|file| async move { (file, self.upload_one(file, folder).await) })
            .collect();

        while let Some((file, result)) = pending.next().await {
            match result {
                Ok(()) => {
                    tracing::debug!(name = %file.name, folder = %folder, "upload succeeded");
                    outcome.record_success();
                    listing.insert_uploaded(&file.name);
                }
                Err(failure) => {
                    tracing::warn!(name = %file.name, folder = %folder, error = %failure, "upload failed");
                    outcome.record_failure(&file.name, &failure);
                }
            }
        }

        outcome
    }

    async fn upload_one(&self, file: &LocalFile, folder: &FolderPath) -> Result<(), FileFailure> {
        let destination = folder.destination_for(&file.name);
        let target = self
            .gateway
            .request_target(&destination, self.overwrite)
            .await
            .map_err(FileFailure::Target)?;
        let status = self
            .gateway
            .transmit(&target, file)
            .await
            .map_err(FileFailure::Transfer)?;
        if status == StatusCode::CREATED {
            Ok(())
        } else {
            Err(FileFailure::Status(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Entry;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;
    use url::Url;
    use yadisk_core::YadiskError;

    #[derive(Default)]
    struct FakeUploads {
        statuses: HashMap<String, StatusCode>,
        target_errors: HashMap<String, StatusCode>,
        delays_ms: HashMap<String, u64>,
        requested: RefCell<Vec<(String, bool)>>,
    }

    impl UploadGateway for FakeUploads {
        async fn request_target(
            &self,
            destination: &str,
            overwrite: bool,
        ) -> Result<Url, GatewayError> {
            self.requested
                .borrow_mut()
                .push((destination.to_string(), overwrite));
            if let Some(status) = self.target_errors.get(destination) {
                return Err(GatewayError::Api(YadiskError::Api {
                    status: *status,
                    body: String::new(),
                }));
            }
            Ok(Url::parse("https://uploader.example/target").unwrap())
        }

        async fn transmit(
            &self,
            _target: &Url,
            file: &LocalFile,
        ) -> Result<StatusCode, GatewayError> {
            if let Some(ms) = self.delays_ms.get(&file.name) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            Ok(self
                .statuses
                .get(&file.name)
                .copied()
                .unwrap_or(StatusCode::CREATED))
        }
    }

    fn local(name: &str) -> LocalFile {
        LocalFile {
            name: name.to_string(),
            path: PathBuf::from(format!("/tmp/{name}")),
        }
    }

    fn many(count: usize) -> Vec<LocalFile> {
        (0..count).map(|i| local(&format!("f{i}.txt"))).collect()
    }

    #[test]
    fn accepts_exactly_max_files() {
        let mut selection = UploadSelection::new();
        assert_eq!(selection.select(many(MAX_BATCH_FILES)), Ok(100));
        assert_eq!(selection.files().len(), 100);
    }

    #[test]
    fn rejects_oversized_batch_and_keeps_previous() {
        let mut selection = UploadSelection::new();
        selection.select(vec![local("keep.txt")]).unwrap();

        let err = selection.select(many(MAX_BATCH_FILES + 1)).unwrap_err();

        assert_eq!(
            err,
            SelectionError::TooManyFiles {
                count: 101,
                max: 100
            }
        );
        assert_eq!(selection.files(), [local("keep.txt")]);
    }

    #[test]
    fn reset_clears_files_and_bumps_generation() {
        let mut selection = UploadSelection::new();
        selection.select(vec![local("a")]).unwrap();
        selection.reset();
        assert!(selection.is_empty());
        assert_eq!(selection.generation(), 1);
    }

    #[test]
    fn local_file_takes_name_from_path() {
        let file = LocalFile::from_path("/home/me/Photos/cat.jpg").unwrap();
        assert_eq!(file.name, "cat.jpg");
        assert!(matches!(
            LocalFile::from_path("/"),
            Err(SelectionError::NoFileName(_))
        ));
    }

    #[tokio::test]
    async fn aggregates_mixed_results() {
        let gateway = FakeUploads {
            statuses: HashMap::from([
                ("bad.txt".to_string(), StatusCode::INTERNAL_SERVER_ERROR),
                ("ok-but-200.txt".to_string(), StatusCode::OK),
            ]),
            target_errors: HashMap::from([("/Docs/no-target.txt".to_string(), StatusCode::CONFLICT)]),
            ..FakeUploads::default()
        };
        let files = vec![
            local("a.txt"),
            local("bad.txt"),
            local("b.txt"),
            local("ok-but-200.txt"),
            local("no-target.txt"),
        ];
        let mut listing = ListingCache::new();

        let outcome = UploadOrchestrator::new(&gateway)
            .run(&files, &FolderPath::parse("Docs"), &mut listing)
            .await;

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 3);
        assert_eq!(outcome.total(), files.len());
        let mut failed = outcome.failed_names.clone();
        failed.sort();
        assert_eq!(failed, ["bad.txt", "no-target.txt", "ok-but-200.txt"]);
        assert!(!outcome.unauthorized);

        let listed: Vec<_> = listing.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(listed, ["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn requests_overwriting_targets_under_current_folder() {
        let gateway = FakeUploads::default();
        let mut listing = ListingCache::new();

        UploadOrchestrator::new(&gateway)
            .run(
                &[local("report.pdf")],
                &FolderPath::parse("Docs/2024"),
                &mut listing,
            )
            .await;

        assert_eq!(
            gateway.requested.borrow().as_slice(),
            [("/Docs/2024/report.pdf".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn slow_file_does_not_block_faster_ones() {
        let gateway = FakeUploads {
            delays_ms: HashMap::from([("slow.txt".to_string(), 50)]),
            statuses: HashMap::from([("slow.txt".to_string(), StatusCode::BAD_GATEWAY)]),
            ..FakeUploads::default()
        };
        let mut listing = ListingCache::from_entries(vec![Entry::dir("Archive")]);

        let outcome = UploadOrchestrator::new(&gateway)
            .run(
                &[local("slow.txt"), local("fast.txt")],
                &FolderPath::root(),
                &mut listing,
            )
            .await;

        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed_names, ["slow.txt"]);
        let listed: Vec<_> = listing.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(listed, ["Archive", "fast.txt"]);
    }

    #[tokio::test]
    async fn flags_rejected_token() {
        let gateway = FakeUploads {
            target_errors: HashMap::from([("/a.txt".to_string(), StatusCode::UNAUTHORIZED)]),
            ..FakeUploads::default()
        };
        let mut listing = ListingCache::new();

        let outcome = UploadOrchestrator::new(&gateway)
            .run(&[local("a.txt")], &FolderPath::root(), &mut listing)
            .await;

        assert_eq!(outcome.failed, 1);
        assert!(outcome.unauthorized);
    }

    #[tokio::test]
    async fn forbidden_upload_target_keeps_token() {
        let gateway = FakeUploads {
            statuses: HashMap::from([("a.txt".to_string(), StatusCode::FORBIDDEN)]),
            ..FakeUploads::default()
        };
        let mut listing = ListingCache::new();

        let outcome = UploadOrchestrator::new(&gateway)
            .run(&[local("a.txt")], &FolderPath::root(), &mut listing)
            .await;

        assert_eq!(outcome.failed_names, ["a.txt"]);
        assert!(!outcome.unauthorized);
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_outcome() {
        let gateway = FakeUploads::default();
        let mut listing = ListingCache::new();
        let outcome = UploadOrchestrator::new(&gateway)
            .run(&[], &FolderPath::root(), &mut listing)
            .await;
        assert_eq!(outcome, UploadOutcome::default());
    }
}
