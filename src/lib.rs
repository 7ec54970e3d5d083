//! # Album Graph
//!
//! Exports a hosted photo album as JSON-LD structured-data files for
//! static-site publishing. The program authenticates against the photo
//! service, finds the album with the requested title, walks its media items
//! page by page, and writes one `Photograph` document per item plus one
//! `Collection` document per album under a content directory — metadata and
//! hotlinked thumbnail URLs only, never image bytes.
//!
//! ```text
//! auth      credentials.json + token.json  →  authenticated session
//! api       session                        →  albums, media-item pages
//! jsonld    media item / album             →  typed JSON-LD documents
//! files     document                       →  items/<xx>/<id>.json, albums/<id>.json
//! export    all of the above, in order, album document last
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`auth`] | OAuth2 credential loading, token cache, interactive code exchange, transparent refresh |
//! | [`api`] | Typed photo-library client: one-page album listing, paginated media-item search |
//! | [`jsonld`] | JSON-LD record types and the item/album mappers |
//! | [`export`] | Orchestration: title filter, pagination relay, temporal coverage, write order |
//! | [`files`] | SHA-1–bucketed path computation and write-with-mkdir |
//! | [`output`] | Progress line formatting |
//!
//! # Design Decisions
//!
//! ## Typed documents, not string-keyed maps
//!
//! Each JSON-LD document is an explicit serde record type whose output
//! reproduces the published key names, nesting, and key order exactly.
//! Misspelled keys and missing fields are compile errors, and the shape of
//! the published graph is readable from the type definitions in [`jsonld`].
//!
//! ## Fully sequential, blocking I/O
//!
//! One HTTP call or disk write at a time, on one thread. The entire run is
//! a single pass over one album's pages, and the output must preserve API
//! return order anyway — concurrency would buy nothing and cost the
//! ordering guarantee. The only suspension point is the first-run prompt
//! for an authorization code.
//!
//! ## Idempotent by path
//!
//! Every output path is a pure function of a stable service-assigned id, so
//! re-running an export overwrites the same files with the same bytes.
//! There is no checkpoint state to corrupt: a failed run leaves valid item
//! documents and no album document (the album is always written last).

pub mod api;
pub mod auth;
pub mod export;
pub mod files;
pub mod jsonld;
pub mod output;
