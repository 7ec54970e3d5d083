//! Deterministic document placement under the content directory.
//!
//! # Layout
//!
//! ```text
//! content/
//! ├── items/
//! │   ├── a9/
//! │   │   └── <itemId>.json     # one Photograph document per media item
//! │   └── cb/
//! │       └── <itemId>.json
//! └── albums/
//!     └── <albumId>.json        # one Album document per exported album
//! ```
//!
//! Item documents are bucketed into subdirectories named after the first two
//! hex characters of the SHA-1 digest of the item id. Photo services hand out
//! albums with thousands of items; without bucketing, `items/` becomes one
//! enormous flat directory that is slow to list and unpleasant to sync. The
//! bucket is a pure function of the id, so re-running an export writes every
//! document to the same path it used last time.
//!
//! Album documents are flat — there is one per album, not thousands.

use sha1::{Digest, Sha1};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Write failures carry the stage that failed, so the top-level diagnostic
/// reads as `mkdir: …` or `writing item: …`.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("mkdir: {0}")]
    Mkdir(#[source] io::Error),
    #[error("writing item: {0}")]
    Write(#[source] io::Error),
}

/// Relative path for a media item's Photograph document.
///
/// `items/<first 2 hex chars of SHA-1(id)>/<id>.json` — stable across runs
/// and machines.
pub fn item_document_path(item_id: &str) -> String {
    let digest = Sha1::digest(item_id.as_bytes());
    let hex = format!("{:x}", digest);
    format!("items/{}/{}.json", &hex[..2], item_id)
}

/// Relative path for an album's Album document.
pub fn album_document_path(album_id: &str) -> String {
    format!("albums/{}.json", album_id)
}

/// Write a document under the content directory, creating parent
/// directories (owner-only on Unix) as needed. Overwrites silently — the
/// path is a pure function of the source object, so overwriting is how
/// re-runs stay idempotent.
pub fn write_document(content_dir: &Path, relative: &str, bytes: &[u8]) -> Result<(), WriteError> {
    let target = content_dir.join(relative);
    if let Some(parent) = target.parent() {
        create_dirs(parent).map_err(WriteError::Mkdir)?;
    }
    fs::write(&target, bytes).map_err(WriteError::Write)
}

#[cfg(unix)]
fn create_dirs(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_dirs(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(path)
}
