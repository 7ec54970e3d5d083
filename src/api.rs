//! Photo-library REST client: album listing and media-item search.
//!
//! The [`PhotoLibrary`] trait is the seam between the exporter and the
//! network. The production implementation is [`PhotosClient`] — a blocking
//! `reqwest` client against the Google Photos Library API with bearer auth
//! from [`auth::Session`](crate::auth::Session). Everything above the trait
//! is network-agnostic, so exporter tests run against a recorded mock.
//!
//! # Known limitation: single-page album listing
//!
//! `list_albums` is called exactly once per run with a page size of
//! [`ALBUM_PAGE_SIZE`] and its `nextPageToken` is ignored. Albums beyond the
//! first page are silently invisible. This mirrors the published behavior of
//! the export format this crate reproduces; fixing it would change which
//! albums a run can see.
//!
//! Media-item search *is* paginated — the exporter relays `nextPageToken`
//! until the service stops returning one.

use crate::auth::{AuthError, Session};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Base URL of the photo-library service.
pub const API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Albums listed per run. Operator-tunable constant, deliberately not a flag.
pub const ALBUM_PAGE_SIZE: u32 = 25;

/// Media items requested per search page.
pub const MEDIA_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("auth: {0}")]
    Auth(#[from] AuthError),
}

/// An album as listed by the service. Read-only to this program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
}

/// A media item as returned by search. Read-only to this program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub filename: String,
    /// Templated URL; renditions are obtained by appending a size directive.
    pub base_url: String,
    pub media_metadata: MediaMetadata,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    /// RFC3339 creation timestamp, parsed strictly by the mapper.
    pub creation_time: String,
    // The service encodes int64 dimensions as JSON strings.
    #[serde(default, deserialize_with = "int64_string")]
    pub width: i64,
    #[serde(default, deserialize_with = "int64_string")]
    pub height: i64,
    #[serde(default)]
    pub photo: Option<PhotoMetadata>,
}

/// Photographic metadata; every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub aperture_f_number: Option<f64>,
    #[serde(default)]
    pub exposure_time: Option<String>,
    #[serde(default)]
    pub iso_equivalent: Option<i64>,
}

/// One page of media-item search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPage {
    pub items: Vec<MediaItem>,
    /// Relay token for the next page; `None` or empty means the last page.
    pub next_page_token: Option<String>,
}

/// Accepts `"4032"` or `4032` — the service documents string encoding for
/// int64 fields but number-encoded fixtures should not break deserialization.
fn int64_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Read-only photo-library operations the exporter needs.
pub trait PhotoLibrary {
    /// List the first page of albums. Never paginated — see the module docs.
    fn list_albums(&mut self, page_size: u32) -> Result<Vec<Album>, ApiError>;

    /// Fetch one page of media items belonging to `album_id`.
    fn search_media_items(
        &mut self,
        album_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<MediaPage, ApiError>;
}

#[derive(Debug, Default, Deserialize)]
struct ListAlbumsResponse {
    #[serde(default)]
    albums: Vec<Album>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    media_items: Vec<MediaItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    album_id: &'a str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

/// Blocking client bound to an authenticated [`Session`].
pub struct PhotosClient {
    session: Session,
}

impl PhotosClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl PhotoLibrary for PhotosClient {
    fn list_albums(&mut self, page_size: u32) -> Result<Vec<Album>, ApiError> {
        let bearer = self.session.bearer()?;
        let response = self
            .session
            .http()
            .get(format!("{API_BASE}/albums"))
            .query(&[("pageSize", page_size)])
            .bearer_auth(bearer)
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint: "albums.list",
                status: response.status(),
            });
        }
        let body: ListAlbumsResponse = response.json()?;
        Ok(body.albums)
    }

    fn search_media_items(
        &mut self,
        album_id: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<MediaPage, ApiError> {
        let bearer = self.session.bearer()?;
        let request = SearchRequest {
            album_id,
            page_size,
            page_token,
        };
        let response = self
            .session
            .http()
            .post(format!("{API_BASE}/mediaItems:search"))
            .bearer_auth(bearer)
            .json(&request)
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint: "mediaItems.search",
                status: response.status(),
            });
        }
        let body: SearchResponse = response.json()?;
        Ok(MediaPage {
            items: body.media_items,
            next_page_token: body.next_page_token,
        })
    }
}
