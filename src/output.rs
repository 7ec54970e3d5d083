//! CLI progress output.
//!
//! One line per album considered and one per item exported, matching the
//! published format so existing log-scraping scripts keep working:
//!
//! ```text
//! SKIP: <albumId> <title>
//! <albumId> <title>
//! <itemId> <creationTime> <filename>
//! Exported 1 album (214 items)
//! ```
//!
//! Each `format_*` function is pure and returns the line; the `print_*`
//! wrapper writes it to stdout. Tests exercise the format functions only.

use crate::api::{Album, MediaItem};

/// Line for an album whose title did not match the requested one.
pub fn format_skip(album: &Album) -> String {
    format!("SKIP: {} {}", album.id, album.title)
}

/// Header line for an album about to be exported.
pub fn format_album(album: &Album) -> String {
    format!("{} {}", album.id, album.title)
}

/// Progress line for one exported media item. The creation time is echoed
/// as received, before parsing.
pub fn format_item(item: &MediaItem) -> String {
    format!(
        "{} {} {}",
        item.id, item.media_metadata.creation_time, item.filename
    )
}

/// Summary line after a successful run.
pub fn format_summary(albums: usize, items: usize) -> String {
    let album_word = if albums == 1 { "album" } else { "albums" };
    let item_word = if items == 1 { "item" } else { "items" };
    format!("Exported {albums} {album_word} ({items} {item_word})")
}

pub fn print_skip(album: &Album) {
    println!("{}", format_skip(album));
}

pub fn print_album(album: &Album) {
    println!("{}", format_album(album));
}

pub fn print_item(item: &MediaItem) {
    println!("{}", format_item(item));
}

pub fn print_summary(albums: usize, items: usize) {
    println!("{}", format_summary(albums, items));
}
