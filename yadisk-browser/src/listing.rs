use serde::Serialize;
use thiserror::Error;
use yadisk_core::{Resource, ResourceType};

use crate::gateway::{FolderGateway, GatewayError};
use crate::navigation::FolderPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

impl EntryKind {
    fn rank(self) -> u8 {
        match self {
            EntryKind::Dir => 0,
            EntryKind::File => 1,
        }
    }
}

impl From<ResourceType> for EntryKind {
    fn from(value: ResourceType) -> Self {
        match value {
            ResourceType::Dir => EntryKind::Dir,
            ResourceType::File => EntryKind::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Set only on rows inserted after an upload; gone after the next refresh.
    pub is_new: bool,
}

impl Entry {
    pub fn dir(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Dir)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            modified: None,
            is_new: false,
        }
    }

    fn uploaded(name: &str) -> Self {
        Self {
            is_new: true,
            ..Self::file(name)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn sort_key(&self) -> SortKey<'_> {
        SortKey::new(self.kind, &self.name)
    }
}

impl From<Resource> for Entry {
    fn from(resource: Resource) -> Self {
        Self {
            name: resource.name,
            kind: resource.resource_type.into(),
            size: resource.size,
            modified: resource.modified,
            is_new: false,
        }
    }
}

/// Listing order assumed for server results: directories first, then by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey<'a> {
    rank: u8,
    name: &'a str,
}

impl<'a> SortKey<'a> {
    pub fn new(kind: EntryKind, name: &'a str) -> Self {
        Self {
            rank: kind.rank(),
            name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("Failed to load folder contents")]
    Unavailable,
    #[error("Access to the disk was denied, sign in again")]
    Unauthorized,
}

/// Last fetched contents of the current folder.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: Vec<Entry>,
    error: Option<ListingError>,
    loading: bool,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn error(&self) -> Option<ListingError> {
        self.error
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Re-fetches `folder`. On success the entries are replaced verbatim; on
    /// failure they are kept and the error indicator is set.
    pub async fn refresh<G: FolderGateway>(&mut self, gateway: &G, folder: &FolderPath) {
        let path = self.begin_refresh(folder);
        let result = gateway.list_folder(&path).await;
        self.finish_refresh(&path, result);
    }

    /// Marks the cache as loading and returns the service path to fetch.
    pub fn begin_refresh(&mut self, folder: &FolderPath) -> String {
        self.loading = true;
        self.error = None;
        folder.listing_path()
    }

    /// Applies the result of a fetch started with `begin_refresh`. Loading is
    /// cleared either way.
    pub fn finish_refresh(&mut self, path: &str, result: Result<Vec<Entry>, GatewayError>) {
        match result {
            Ok(entries) => {
                tracing::debug!(path, count = entries.len(), "folder listing replaced");
                self.entries = entries;
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "folder listing failed");
                self.error = Some(if err.is_unauthorized() {
                    ListingError::Unauthorized
                } else {
                    ListingError::Unavailable
                });
            }
        }
        self.loading = false;
    }

    /// Inserts a freshly uploaded file without re-fetching. Returns `false`
    /// when a row with that name is already listed.
    pub fn insert_uploaded(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        let key = SortKey::new(EntryKind::File, name);
        let position = self
            .entries
            .iter()
            .position(|entry| entry.sort_key() > key)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, Entry::uploaded(name));
        true
    }
}
