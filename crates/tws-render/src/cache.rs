//! On-disk HTML snapshots used in place of rendering.
//!
//! A snapshot is never invalidated: once a page has been saved it is reused on
//! every run until the file is deleted or emptied.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::RenderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the saved page, `None` when missing, empty or unreadable.
    pub fn read(&self) -> Option<String> {
        let path = self.path.display();
        match fs_err::read_to_string(&self.path) {
            Ok(page) if page.is_empty() => {
                log::warn!("Existing HTML file {path} is empty, will try fetching");
                None
            }
            Ok(page) => {
                log::info!("Read HTML from {path} ({} bytes)", page.len());
                Some(page)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::error!("Error reading HTML file: {e}, will try fetching");
                None
            }
        }
    }

    pub fn write(&self, page: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }
        fs_err::write(&self.path, page)
    }
}

/// Returns the snapshot content if any, otherwise fetches `url` and saves the
/// result. Failing to save is logged and does not fail the fetch.
pub fn load_or_fetch<F>(snapshot: &Snapshot, url: &str, fetch: F) -> Result<String, RenderError>
where
    F: FnOnce(&str) -> Result<String, RenderError>,
{
    if let Some(page) = snapshot.read() {
        return Ok(page);
    }

    log::info!("No valid local HTML found, fetching from URL: {url}");
    let page = fetch(url)?;

    match snapshot.write(&page) {
        Ok(()) => log::info!("Saved fetched HTML to {}", snapshot.path().display()),
        Err(e) => log::error!("Failed to save fetched HTML: {e}"),
    }

    Ok(page)
}
