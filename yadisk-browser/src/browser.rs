use crate::gateway::{FolderGateway, UploadGateway};
use crate::listing::{ListingCache, ListingError};
use crate::navigation::{FolderPath, NavigationState};
use crate::upload::{LocalFile, SelectionError, UploadOrchestrator, UploadOutcome, UploadSelection};

/// One remote folder view: where we are, what is in it, and what is queued
/// for upload. Every navigation change is followed by exactly one refresh.
pub struct FolderBrowser<G> {
    gateway: G,
    navigation: NavigationState,
    listing: ListingCache,
    selection: UploadSelection,
    last_outcome: Option<UploadOutcome>,
}

impl<G> FolderBrowser<G>
where
    G: FolderGateway + UploadGateway,
{
    pub fn new(gateway: G) -> Self {
        Self::at(gateway, FolderPath::root())
    }

    pub fn at(gateway: G, folder: FolderPath) -> Self {
        Self {
            gateway,
            navigation: NavigationState::at(folder),
            listing: ListingCache::new(),
            selection: UploadSelection::new(),
            last_outcome: None,
        }
    }

    pub fn folder(&self) -> &FolderPath {
        self.navigation.path()
    }

    pub fn listing(&self) -> &ListingCache {
        &self.listing
    }

    pub fn selection(&self) -> &UploadSelection {
        &self.selection
    }

    pub fn last_outcome(&self) -> Option<&UploadOutcome> {
        self.last_outcome.as_ref()
    }

    /// Initial load of the starting folder.
    pub async fn open(&mut self) {
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        self.listing
            .refresh(&self.gateway, self.navigation.path())
            .await;
    }

    pub async fn descend_into(&mut self, name: &str) {
        self.navigation.descend_into(name);
        self.refresh().await;
    }

    /// Moves to the parent folder. Returns `false` (and does not refresh) at the root.
    pub async fn ascend(&mut self) -> bool {
        if !self.navigation.ascend() {
            return false;
        }
        self.refresh().await;
        true
    }

    pub fn select(&mut self, files: Vec<LocalFile>) -> Result<usize, SelectionError> {
        self.selection.select(files)
    }

    /// Uploads the current selection into the current folder, then clears the
    /// selection. The returned outcome covers this run only.
    pub async fn upload_selection(&mut self) -> &UploadOutcome {
        let outcome = UploadOrchestrator::new(&self.gateway)
            .run(
                self.selection.files(),
                self.navigation.path(),
                &mut self.listing,
            )
            .await;
        tracing::info!(
            folder = %self.navigation.path(),
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "upload batch finished"
        );
        self.selection.reset();
        self.last_outcome.insert(outcome)
    }

    /// True when the last listing or upload was rejected for authorization.
    pub fn needs_reauth(&self) -> bool {
        self.listing.error() == Some(ListingError::Unauthorized)
            || self
                .last_outcome
                .as_ref()
                .is_some_and(|outcome| outcome.unauthorized)
    }
}
