//! Typed JSON-LD documents and the media-item → document mapper.
//!
//! The original export format assembled these documents as open-ended
//! string-keyed maps. Here each document is an explicit record type whose
//! serde output reproduces the same key names, nesting, and (alphabetical)
//! key order, so previously published sites see byte-identical files. The
//! schema.org vocabulary in play: `Photograph`, `ImageObject`,
//! `PropertyValue`, `Collection`/`ItemList`.
//!
//! # Document shapes
//!
//! Per media item:
//!
//! ```text
//! { "@type": "Photograph",
//!   "associatedMedia": { "@type": "ImageObject",
//!                        "dateCreated": …, "exifData": […], "height": …,
//!                        "name": …, "thumbnail": [4 renditions], "width": … },
//!   "sameAs": "https://…/v1/mediaItems/<id>" }
//! ```
//!
//! Per album, written after all of its items:
//!
//! ```text
//! { "@type": "Collection", "additionalType": "http://schema.org/ItemList",
//!   "itemListElement": [{"@id": …}, …], "name": …,
//!   "sameAs": "https://…/v1/albums/<id>", "temporalCoverage": "min/max" }
//! ```
//!
//! # Thumbnail renditions
//!
//! Every photograph carries exactly four hotlinked renditions, built by
//! appending a size/crop directive to the item's base URL. The directive
//! syntax (`=w1280-h960`, `=w200-h200-c`) is the hosting service's
//! convention — an opaque contract that versions with the service, not with
//! this crate.

use crate::api::{API_BASE, Album, MediaItem, PhotoMetadata};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;

/// The four fixed renditions: width, height, size/crop directive.
const RENDITIONS: [(i64, i64, &str); 4] = [
    (1280, 960, "=w1280-h960"),
    (640, 480, "=w640-h480"),
    (200, 200, "=w200-h200-c"),
    (96, 96, "=w96-h96-c"),
];

/// JSON-LD document written once per media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotographDocument {
    #[serde(rename = "@type")]
    pub schema_type: &'static str,
    #[serde(rename = "associatedMedia")]
    pub associated_media: ImageObject,
    #[serde(rename = "sameAs")]
    pub same_as: String,
}

/// The image payload nested under `associatedMedia`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageObject {
    #[serde(rename = "@type")]
    pub schema_type: &'static str,
    #[serde(rename = "dateCreated")]
    pub date_created: String,
    /// One entry per EXIF field present on the source item. Omitted
    /// entirely when no field is present.
    #[serde(rename = "exifData", skip_serializing_if = "Vec::is_empty")]
    pub exif_data: Vec<ExifEntry>,
    pub height: i64,
    pub name: String,
    pub thumbnail: Vec<ThumbnailEntry>,
    pub width: i64,
}

/// A schema.org PropertyValue holding one EXIF field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifEntry {
    #[serde(rename = "@type")]
    pub schema_type: &'static str,
    pub identifier: &'static str,
    pub value: ExifValue,
}

/// EXIF values are strings except ISO, which stays numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExifValue {
    Text(String),
    Number(i64),
}

/// One fixed-size hotlinked rendition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThumbnailEntry {
    #[serde(rename = "@type")]
    pub schema_type: &'static str,
    #[serde(rename = "contentUrl")]
    pub content_url: String,
    pub height: i64,
    pub width: i64,
}

/// JSON-LD document written once per album, after all item documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumDocument {
    #[serde(rename = "@type")]
    pub schema_type: &'static str,
    #[serde(rename = "additionalType")]
    pub additional_type: &'static str,
    #[serde(rename = "itemListElement")]
    pub item_list_element: Vec<ItemRef>,
    pub name: String,
    #[serde(rename = "sameAs")]
    pub same_as: String,
    #[serde(rename = "temporalCoverage", skip_serializing_if = "Option::is_none")]
    pub temporal_coverage: Option<String>,
}

/// Graph-relative reference from the album document to an item document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRef {
    #[serde(rename = "@id")]
    pub id: String,
}

impl ItemRef {
    pub fn new(id: String) -> Self {
        Self { id }
    }
}

/// Running min/max of item creation instants across an album.
///
/// Stays empty for an album with no items, in which case the album document
/// simply has no `temporalCoverage` key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemporalRange {
    earliest: Option<DateTime<FixedOffset>>,
    latest: Option<DateTime<FixedOffset>>,
}

impl TemporalRange {
    /// Fold one creation instant into the range.
    pub fn record(&mut self, instant: DateTime<FixedOffset>) {
        if self.earliest.is_none_or(|e| instant < e) {
            self.earliest = Some(instant);
        }
        if self.latest.is_none_or(|l| instant > l) {
            self.latest = Some(instant);
        }
    }

    /// Coverage string: a single `YYYY-MM-DD` when the earliest and latest
    /// items share a date, otherwise `min/max`. `None` when nothing was
    /// recorded.
    pub fn coverage(&self) -> Option<String> {
        let (earliest, latest) = (self.earliest?, self.latest?);
        let min = earliest.format("%Y-%m-%d").to_string();
        let max = latest.format("%Y-%m-%d").to_string();
        if min == max { Some(min) } else { Some(format!("{min}/{max}")) }
    }
}

/// Map one media item into its Photograph document.
///
/// The creation timestamp is parsed strictly as RFC3339; a malformed
/// timestamp is an error the caller treats as fatal for the album, not a
/// field to skip. The parsed instant is returned alongside the document so
/// the exporter can fold it into the album's [`TemporalRange`].
pub fn map_media_item(
    item: &MediaItem,
) -> Result<(PhotographDocument, DateTime<FixedOffset>), chrono::ParseError> {
    let created = DateTime::parse_from_rfc3339(&item.media_metadata.creation_time)?;

    let doc = PhotographDocument {
        schema_type: "Photograph",
        associated_media: ImageObject {
            schema_type: "ImageObject",
            date_created: created.to_rfc3339_opts(SecondsFormat::Secs, true),
            exif_data: map_exif(item.media_metadata.photo.as_ref()),
            height: item.media_metadata.height,
            name: item.filename.clone(),
            thumbnail: map_thumbnails(&item.base_url),
            width: item.media_metadata.width,
        },
        same_as: format!("{API_BASE}/mediaItems/{}", item.id),
    };

    Ok((doc, created))
}

/// Build the album document from the refs and range accumulated while the
/// item documents were written.
pub fn map_album(album: &Album, item_refs: Vec<ItemRef>, range: &TemporalRange) -> AlbumDocument {
    AlbumDocument {
        schema_type: "Collection",
        additional_type: "http://schema.org/ItemList",
        item_list_element: item_refs,
        name: album.title.clone(),
        same_as: format!("{API_BASE}/albums/{}", album.id),
        temporal_coverage: range.coverage(),
    }
}

/// One PropertyValue per present field, in a fixed identifier order.
/// Empty strings and zero values count as absent.
fn map_exif(photo: Option<&PhotoMetadata>) -> Vec<ExifEntry> {
    let Some(photo) = photo else {
        return Vec::new();
    };
    let mut entries = Vec::new();

    if let Some(make) = photo.camera_make.as_deref().filter(|s| !s.is_empty()) {
        entries.push(entry("make", ExifValue::Text(make.to_string())));
    }
    if let Some(model) = photo.camera_model.as_deref().filter(|s| !s.is_empty()) {
        entries.push(entry("model", ExifValue::Text(model.to_string())));
    }
    if let Some(aperture) = photo.aperture_f_number.filter(|&f| f != 0.0) {
        entries.push(entry("aperture", ExifValue::Text(format_aperture(aperture))));
    }
    if let Some(exposure) = photo.exposure_time.as_deref().filter(|s| !s.is_empty()) {
        entries.push(entry("exposure", ExifValue::Text(exposure.to_string())));
    }
    if let Some(iso) = photo.iso_equivalent.filter(|&n| n != 0) {
        entries.push(entry("iso", ExifValue::Number(iso)));
    }

    entries
}

fn entry(identifier: &'static str, value: ExifValue) -> ExifEntry {
    ExifEntry {
        schema_type: "PropertyValue",
        identifier,
        value,
    }
}

/// `f/1.800000` → `f/1.8`. Only `'0'` digits are stripped, so a whole
/// f-number keeps its dot (`f/2.`) — faithful to the published format.
fn format_aperture(f_number: f64) -> String {
    format!("f/{f_number:.6}").trim_end_matches('0').to_string()
}

fn map_thumbnails(base_url: &str) -> Vec<ThumbnailEntry> {
    RENDITIONS
        .iter()
        .map(|&(width, height, directive)| ThumbnailEntry {
            schema_type: "ImageObject",
            content_url: format!("{base_url}{directive}"),
            height,
            width,
        })
        .collect()
}
