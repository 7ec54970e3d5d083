use album_graph::export::{self, ExportOptions, ExportOutcome};
use album_graph::{api, auth, output};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "album-graph")]
#[command(version)]
#[command(about = "Export a hosted photo album as JSON-LD structured data")]
#[command(long_about = "\
Export a hosted photo album as JSON-LD structured data

Finds the album whose title matches ALBUM_TITLE exactly, walks its media
items, and writes one Photograph document per item plus one Collection
document per album:

  <CONTENT_DIR>/
  ├── items/<xx>/<itemId>.json     # xx = first two hex chars of SHA-1(itemId)
  └── albums/<albumId>.json

Documents cross-reference each other with @id URIs rooted at GRAPH_URI.
Only metadata and hotlinked thumbnail URLs are exported, never image bytes.

First run: the tool prints a consent URL, waits for the authorization code
on stdin, and caches the resulting token at the --token path.")]
struct Cli {
    /// Album title to export (exact, case-sensitive match)
    album_title: String,

    /// Content directory the document trees are written under
    content_dir: PathBuf,

    /// Base URL prefix for @id references between documents
    graph_uri: String,

    /// OAuth2 client configuration file
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Cached OAuth2 token (created on first successful authorization)
    #[arg(long, default_value = "token.json")]
    token: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Startup precondition: no credentials, no export.
    let secrets = auth::load_credentials(&cli.credentials)?;
    let session = auth::Session::obtain(secrets, &cli.token, &auth::StdinCodes)?;
    let mut library = api::PhotosClient::new(session);

    let options = ExportOptions {
        content_dir: cli.content_dir,
        graph_uri: cli.graph_uri,
        static_dir: None,
    };

    match export::run_export(&mut library, &cli.album_title, &options)? {
        ExportOutcome::NoAlbums => println!("No albums found."),
        ExportOutcome::Done { albums, items } => output::print_summary(albums, items),
    }

    Ok(())
}
