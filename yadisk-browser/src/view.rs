//! Plain-text views for the terminal.

use std::fmt::Write as _;

use url::Url;

use crate::listing::{EntryKind, ListingCache};
use crate::navigation::FolderPath;
use crate::upload::{MAX_BATCH_FILES, UploadOutcome, UploadSelection};

pub fn render_listing(folder: &FolderPath, listing: &ListingCache) -> String {
    let mut out = format!("Yandex Disk: {folder}\n");
    if listing.entries().is_empty() && listing.error().is_none() {
        out.push_str("  (empty folder)\n");
    }
    for entry in listing.entries() {
        let _ = match entry.kind {
            EntryKind::Dir => writeln!(out, "  [dir] {}/", entry.name),
            EntryKind::File if entry.is_new => writeln!(out, "  [new] {}", entry.name),
            EntryKind::File => writeln!(out, "        {}", entry.name),
        };
    }
    if let Some(error) = listing.error() {
        let _ = writeln!(out, "{error}");
    }
    out
}

pub fn render_selection(selection: &UploadSelection) -> String {
    if selection.is_empty() {
        return "Choose files to upload".to_string();
    }
    let names: Vec<&str> = selection.files().iter().map(|f| f.name.as_str()).collect();
    format!("Files: {}", names.join(", "))
}

pub fn render_outcome(outcome: &UploadOutcome) -> String {
    let mut out = format!("Uploaded successfully: {}", outcome.succeeded);
    if outcome.failed > 0 {
        let _ = write!(
            out,
            "\nFailed uploads: {}\nNot uploaded: {}",
            outcome.failed,
            outcome.failed_names.join(", ")
        );
    }
    out
}

pub fn render_too_many_files() -> String {
    format!("Maximum number of files per upload: {MAX_BATCH_FILES}")
}

pub fn render_sign_in(authorize_url: &Url) -> String {
    format!(
        "Yandex Disk\n\
         To access your disk, open the link below and confirm access for this application:\n\
         {authorize_url}\n\
         Then run `yadisk-browser login --redirect '<address you were sent to>'`."
    )
}
