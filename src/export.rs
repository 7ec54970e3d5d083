//! Export orchestration: find the named album, walk its media items, write
//! the documents.
//!
//! # Control flow
//!
//! ```text
//! list albums (one page)
//!   ├── empty listing            → NoAlbums (caller prints the message)
//!   └── for each album
//!         ├── title ≠ requested  → SKIP line, continue
//!         └── title = requested  → paginate media items
//!               ├── per item: map → write → record date → append @id ref
//!               └── after last page: build + write album document
//! ```
//!
//! The album document is written strictly after every item document, so a
//! run that dies partway leaves only individually valid item files and no
//! album summary referencing unwritten items.
//!
//! The title match is exact and case-sensitive — this is a lookup, not a
//! search. Several albums sharing the requested title are exported
//! independently, in listing order.
//!
//! # Failure
//!
//! Everything is fatal. The first error from search, timestamp parsing,
//! serialization, or the filesystem aborts the current album and propagates
//! to `main`, labeled with the stage that failed. Item documents already on
//! disk stay there; the re-run overwrites them byte-for-byte.

use crate::api::{ALBUM_PAGE_SIZE, Album, ApiError, MEDIA_PAGE_SIZE, PhotoLibrary};
use crate::files::{self, WriteError};
use crate::jsonld::{self, ItemRef, TemporalRange};
use crate::output;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Where and how the exported graph is rooted.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Content directory the `items/` and `albums/` trees are written under.
    pub content_dir: PathBuf,
    /// Base URL prefix for `@id` references between documents.
    pub graph_uri: String,
    /// Reserved for static-asset placement; accepted but not consulted by
    /// the current mapping.
    pub static_dir: Option<PathBuf>,
}

/// Export failures, labeled with the stage that failed.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("listing albums: {0}")]
    Listing(#[source] ApiError),
    #[error("searching: {0}")]
    Searching(#[source] ApiError),
    #[error("parsing time: {0}")]
    ParsingTime(#[source] chrono::ParseError),
    #[error("marshalling: {0}")]
    Marshalling(#[source] serde_json::Error),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What a successful run amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The listing itself was empty. A non-empty listing with zero title
    /// matches is `Done { albums: 0, .. }` instead.
    NoAlbums,
    Done { albums: usize, items: usize },
}

/// Run the export: list albums, export every exact title match.
pub fn run_export<L: PhotoLibrary>(
    library: &mut L,
    album_title: &str,
    options: &ExportOptions,
) -> Result<ExportOutcome, ExportError> {
    let albums = library
        .list_albums(ALBUM_PAGE_SIZE)
        .map_err(ExportError::Listing)?;
    if albums.is_empty() {
        return Ok(ExportOutcome::NoAlbums);
    }

    let mut exported = 0;
    let mut items = 0;
    for album in &albums {
        if album.title != album_title {
            output::print_skip(album);
            continue;
        }
        output::print_album(album);
        items += export_album(library, album, options)?;
        exported += 1;
    }

    Ok(ExportOutcome::Done {
        albums: exported,
        items,
    })
}

/// Export one album: drive the pagination loop, write an item document per
/// media item, then the album document.
fn export_album<L: PhotoLibrary>(
    library: &mut L,
    album: &Album,
    options: &ExportOptions,
) -> Result<usize, ExportError> {
    let mut range = TemporalRange::default();
    let mut item_refs: Vec<ItemRef> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = library
            .search_media_items(&album.id, page_token.as_deref(), MEDIA_PAGE_SIZE)
            .map_err(ExportError::Searching)?;

        for item in &page.items {
            output::print_item(item);

            let (document, created) =
                jsonld::map_media_item(item).map_err(ExportError::ParsingTime)?;
            let relative = files::item_document_path(&item.id);
            let bytes = to_document_bytes(&document)?;
            files::write_document(&options.content_dir, &relative, &bytes)?;

            range.record(created);
            item_refs.push(ItemRef::new(format!("{}/{relative}", options.graph_uri)));
        }

        // Token relay: keep going only while the service hands one back.
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    let exported = item_refs.len();
    let document = jsonld::map_album(album, item_refs, &range);
    let bytes = to_document_bytes(&document)?;
    files::write_document(
        &options.content_dir,
        &files::album_document_path(&album.id),
        &bytes,
    )?;

    Ok(exported)
}

/// Pretty-printed (2-space indent), newline-terminated JSON.
fn to_document_bytes<T: Serialize>(document: &T) -> Result<Vec<u8>, ExportError> {
    let mut bytes = serde_json::to_vec_pretty(document).map_err(ExportError::Marshalling)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MediaItem, MediaMetadata, MediaPage, PhotoMetadata};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Scripted in-memory library; records the token sequence it was asked
    /// for and fails on demand.
    struct MockLibrary {
        albums: Vec<Album>,
        pages: Vec<MediaPage>,
        served: usize,
        tokens_seen: Vec<Option<String>>,
        fail_search: bool,
    }

    impl MockLibrary {
        fn new(albums: Vec<Album>, pages: Vec<MediaPage>) -> Self {
            Self {
                albums,
                pages,
                served: 0,
                tokens_seen: Vec::new(),
                fail_search: false,
            }
        }
    }

    impl PhotoLibrary for MockLibrary {
        fn list_albums(&mut self, _page_size: u32) -> Result<Vec<Album>, ApiError> {
            Ok(self.albums.clone())
        }

        fn search_media_items(
            &mut self,
            _album_id: &str,
            page_token: Option<&str>,
            _page_size: u32,
        ) -> Result<MediaPage, ApiError> {
            if self.fail_search {
                return Err(ApiError::Status {
                    endpoint: "mediaItems.search",
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            self.tokens_seen.push(page_token.map(str::to_string));
            let page = self.pages[self.served].clone();
            self.served += 1;
            Ok(page)
        }
    }

    fn album(id: &str, title: &str) -> Album {
        Album {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    fn media_item(id: &str, created: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            filename: format!("{id}.jpg"),
            base_url: format!("https://lh3.example/{id}"),
            media_metadata: MediaMetadata {
                creation_time: created.to_string(),
                width: 4032,
                height: 3024,
                photo: Some(PhotoMetadata {
                    camera_make: Some("Fujifilm".to_string()),
                    ..PhotoMetadata::default()
                }),
            },
        }
    }

    fn options(dir: &Path) -> ExportOptions {
        ExportOptions {
            content_dir: dir.to_path_buf(),
            graph_uri: "https://example.org/graph".to_string(),
            static_dir: None,
        }
    }

    fn page(items: Vec<MediaItem>, next: Option<&str>) -> MediaPage {
        MediaPage {
            items,
            next_page_token: next.map(str::to_string),
        }
    }

    #[test]
    fn exports_items_and_album_document() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Dolomites")],
            vec![page(
                vec![
                    media_item("abc", "2020-01-01T09:00:00Z"),
                    media_item("abd", "2020-06-15T09:00:00Z"),
                ],
                None,
            )],
        );

        let outcome = run_export(&mut library, "Dolomites", &options(tmp.path())).unwrap();
        assert_eq!(outcome, ExportOutcome::Done { albums: 1, items: 2 });

        // Item documents land in their hash buckets.
        assert!(tmp.path().join("items/a9/abc.json").exists());
        assert!(tmp.path().join("items/cb/abd.json").exists());

        let album_doc: serde_json::Value =
            serde_json::from_slice(&fs::read(tmp.path().join("albums/alb-1.json")).unwrap())
                .unwrap();
        assert_eq!(album_doc["@type"], "Collection");
        assert_eq!(album_doc["name"], "Dolomites");
        assert_eq!(album_doc["temporalCoverage"], "2020-01-01/2020-06-15");
        assert_eq!(
            album_doc["itemListElement"][0]["@id"],
            "https://example.org/graph/items/a9/abc.json"
        );
        assert_eq!(
            album_doc["itemListElement"][1]["@id"],
            "https://example.org/graph/items/cb/abd.json"
        );
    }

    #[test]
    fn item_refs_preserve_api_return_order_across_pages() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Trip")],
            vec![
                page(vec![media_item("item-b", "2020-02-01T00:00:00Z")], Some("t2")),
                page(vec![media_item("item-a", "2020-01-01T00:00:00Z")], None),
            ],
        );

        run_export(&mut library, "Trip", &options(tmp.path())).unwrap();

        // Relay loop: first call has no token, second relays "t2".
        assert_eq!(library.tokens_seen, vec![None, Some("t2".to_string())]);

        let album_doc: serde_json::Value =
            serde_json::from_slice(&fs::read(tmp.path().join("albums/alb-1.json")).unwrap())
                .unwrap();
        let refs: Vec<&str> = album_doc["itemListElement"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["@id"].as_str().unwrap())
            .collect();
        // item-b was returned first, so it is listed first despite its later date.
        assert_eq!(
            refs,
            vec![
                "https://example.org/graph/items/02/item-b.json",
                "https://example.org/graph/items/3f/item-a.json",
            ]
        );
    }

    #[test]
    fn empty_page_token_ends_the_relay() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Trip")],
            vec![page(vec![media_item("abc", "2020-01-01T00:00:00Z")], Some(""))],
        );

        run_export(&mut library, "Trip", &options(tmp.path())).unwrap();
        assert_eq!(library.served, 1);
    }

    #[test]
    fn empty_listing_reports_no_albums() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(vec![], vec![]);

        let outcome = run_export(&mut library, "Anything", &options(tmp.path())).unwrap();
        assert_eq!(outcome, ExportOutcome::NoAlbums);
    }

    #[test]
    fn zero_title_matches_completes_without_writing() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(vec![album("alb-1", "Dolomites")], vec![]);

        let outcome = run_export(&mut library, "Alps", &options(tmp.path())).unwrap();

        // Not NoAlbums — the listing had entries, none matched.
        assert_eq!(outcome, ExportOutcome::Done { albums: 0, items: 0 });
        assert!(!tmp.path().join("items").exists());
        assert!(!tmp.path().join("albums").exists());
    }

    #[test]
    fn title_match_is_case_sensitive_and_exact() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![
                album("alb-1", "dolomites"),
                album("alb-2", "Dolomites 2019"),
            ],
            vec![],
        );

        let outcome = run_export(&mut library, "Dolomites", &options(tmp.path())).unwrap();
        assert_eq!(outcome, ExportOutcome::Done { albums: 0, items: 0 });
    }

    #[test]
    fn duplicate_titles_export_independently() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Trip"), album("alb-2", "Trip")],
            vec![
                page(vec![media_item("item-a", "2020-01-01T00:00:00Z")], None),
                page(vec![media_item("item-b", "2021-01-01T00:00:00Z")], None),
            ],
        );

        let outcome = run_export(&mut library, "Trip", &options(tmp.path())).unwrap();
        assert_eq!(outcome, ExportOutcome::Done { albums: 2, items: 2 });
        assert!(tmp.path().join("albums/alb-1.json").exists());
        assert!(tmp.path().join("albums/alb-2.json").exists());
    }

    #[test]
    fn search_failure_aborts_before_album_document() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(vec![album("alb-1", "Trip")], vec![]);
        library.fail_search = true;

        let err = run_export(&mut library, "Trip", &options(tmp.path())).unwrap_err();
        assert!(err.to_string().starts_with("searching:"));
        assert!(!tmp.path().join("albums/alb-1.json").exists());
    }

    #[test]
    fn malformed_timestamp_aborts_with_parsing_label() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Trip")],
            vec![page(vec![media_item("abc", "not-a-timestamp")], None)],
        );

        let err = run_export(&mut library, "Trip", &options(tmp.path())).unwrap_err();
        assert!(err.to_string().starts_with("parsing time:"));
        assert!(!tmp.path().join("albums/alb-1.json").exists());
    }

    #[test]
    fn item_documents_are_pretty_printed_and_newline_terminated() {
        let tmp = TempDir::new().unwrap();
        let mut library = MockLibrary::new(
            vec![album("alb-1", "Trip")],
            vec![page(vec![media_item("abc", "2020-01-01T00:00:00Z")], None)],
        );

        run_export(&mut library, "Trip", &options(tmp.path())).unwrap();

        let bytes = fs::read(tmp.path().join("items/a9/abc.json")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n  \"@type\": \"Photograph\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn rerunning_an_unchanged_export_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let albums = vec![album("alb-1", "Trip")];
        let pages = vec![page(
            vec![
                media_item("abc", "2020-01-01T00:00:00Z"),
                media_item("abd", "2020-06-15T00:00:00Z"),
            ],
            None,
        )];

        let mut library = MockLibrary::new(albums.clone(), pages.clone());
        run_export(&mut library, "Trip", &options(tmp.path())).unwrap();
        let first_item = fs::read(tmp.path().join("items/a9/abc.json")).unwrap();
        let first_album = fs::read(tmp.path().join("albums/alb-1.json")).unwrap();

        let mut library = MockLibrary::new(albums, pages);
        run_export(&mut library, "Trip", &options(tmp.path())).unwrap();

        assert_eq!(fs::read(tmp.path().join("items/a9/abc.json")).unwrap(), first_item);
        assert_eq!(fs::read(tmp.path().join("albums/alb-1.json")).unwrap(), first_album);
    }
}
