//! OAuth2 credential loading, token caching, and the interactive
//! authorization-code flow.
//!
//! # Flow
//!
//! ```text
//! credentials file ──► ClientSecrets ──► Session::obtain
//!                                            │
//!                    token file decodes? ────┤
//!                         yes: use it        │
//!                         no: consent URL → CodeProvider → exchange → persist
//! ```
//!
//! The credentials file is a startup precondition: if it is unreadable or
//! unparsable the process exits with the error. The token file is not — a
//! missing or corrupt cache just re-runs the interactive flow and overwrites
//! it (owner-only permissions).
//!
//! Refresh is transparent: [`Session::bearer`] checks expiry (with a skew
//! buffer) before every use and trades the refresh token for a new access
//! token when needed, re-persisting the cache. Callers never refresh
//! explicitly.
//!
//! The interactive step is behind the [`CodeProvider`] trait so tests can
//! substitute a fixed code for the terminal prompt. [`StdinCodes`] is the
//! production implementation: print the consent URL, block on a line of
//! stdin.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Read-only access to the photo library; changing this invalidates cached
/// tokens, which must then be deleted by hand.
pub const SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

/// Out-of-band redirect: the service displays the code for manual copy-paste
/// instead of redirecting to a local listener.
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed credentials file: {0}")]
    MalformedCredentials(#[source] serde_json::Error),
    #[error("credentials file has no \"installed\" or \"web\" section")]
    MissingSection,
    #[error("invalid authorization endpoint: {0}")]
    BadAuthUri(#[from] url::ParseError),
    #[error("empty authorization code")]
    EmptyCode,
    #[error("token endpoint request failed: {0}")]
    TokenEndpoint(#[from] reqwest::Error),
    #[error("access token expired and no refresh token is cached")]
    NoRefreshToken,
}

/// OAuth2 client configuration from the credentials file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// Credentials files wrap the secrets in an `installed` (desktop app) or
/// `web` section depending on how the OAuth client was registered.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// Parse the OAuth2 client configuration. Any failure here is fatal to the
/// process — there is nothing to export without API access.
pub fn load_credentials(path: &Path) -> Result<ClientSecrets, AuthError> {
    let bytes = fs::read(path)?;
    let file: CredentialsFile =
        serde_json::from_slice(&bytes).map_err(AuthError::MalformedCredentials)?;
    file.installed.or(file.web).ok_or(AuthError::MissingSection)
}

/// A cached OAuth2 token.
///
/// `expires_at` is absolute (computed from the endpoint's `expires_in` at
/// exchange time) so the cache survives process restarts. A token without
/// one is treated as non-expiring, matching common client-library behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= expiry,
            None => false,
        }
    }
}

/// Wire shape of the token endpoint's response, for both the initial
/// exchange and refreshes.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    /// Refresh responses usually omit the refresh token; keep the previous
    /// one so the next refresh still works.
    fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// Pluggable source of the one-time authorization code.
pub trait CodeProvider {
    /// Given the consent URL the operator must visit, return the code the
    /// service displayed.
    fn provide(&self, auth_url: &str) -> Result<String, AuthError>;
}

/// Production provider: prints the consent URL and blocks indefinitely on a
/// line of standard input.
pub struct StdinCodes;

impl CodeProvider for StdinCodes {
    fn provide(&self, auth_url: &str) -> Result<String, AuthError> {
        println!("Go to the following link in your browser then type the authorization code:");
        println!("{auth_url}");

        let mut code = String::new();
        io::stdin().lock().read_line(&mut code)?;
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(AuthError::EmptyCode);
        }
        Ok(code)
    }
}

/// The consent URL the operator visits to grant read-only access.
fn consent_url(secrets: &ClientSecrets) -> Result<Url, AuthError> {
    Ok(Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("access_type", "offline"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("scope", SCOPE),
        ],
    )?)
}

fn load_token(path: &Path) -> Option<Token> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Persist the token cache with owner-only permissions, overwriting any
/// previous cache.
fn save_token(path: &Path, token: &Token) -> Result<(), AuthError> {
    let json = serde_json::to_vec(token).expect("token serialization is infallible");
    write_owner_only(path, &json)?;
    Ok(())
}

#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)
}

/// An authenticated HTTP session: client secrets, the cached token, and the
/// blocking client the API layer issues requests through.
pub struct Session {
    http: reqwest::blocking::Client,
    secrets: ClientSecrets,
    token: Token,
    token_path: PathBuf,
}

impl Session {
    /// Produce an authenticated session.
    ///
    /// A decodable token cache at `token_path` is used directly; otherwise
    /// the interactive flow runs: consent URL → `codes` → code exchange →
    /// persist. The token file is only written on a successful exchange.
    pub fn obtain(
        secrets: ClientSecrets,
        token_path: &Path,
        codes: &dyn CodeProvider,
    ) -> Result<Self, AuthError> {
        let http = reqwest::blocking::Client::builder().build()?;

        let token = match load_token(token_path) {
            Some(token) => token,
            None => {
                let code = codes.provide(consent_url(&secrets)?.as_str())?;
                let token = exchange_code(&http, &secrets, &code)?;
                println!("Saving credential file to: {}", token_path.display());
                save_token(token_path, &token)?;
                token
            }
        };

        Ok(Self {
            http,
            secrets,
            token,
            token_path: token_path.to_path_buf(),
        })
    }

    /// The blocking client API calls go through.
    pub fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    /// Current access token, refreshed transparently when stale. The
    /// refreshed token is re-persisted so the next run skips the refresh.
    pub fn bearer(&mut self) -> Result<String, AuthError> {
        if self.token.is_expired(Utc::now()) {
            let refresh = self
                .token
                .refresh_token
                .clone()
                .ok_or(AuthError::NoRefreshToken)?;
            self.token = refresh_token(&self.http, &self.secrets, &refresh)?;
            save_token(&self.token_path, &self.token)?;
        }
        Ok(self.token.access_token.clone())
    }
}

fn exchange_code(
    http: &reqwest::blocking::Client,
    secrets: &ClientSecrets,
    code: &str,
) -> Result<Token, AuthError> {
    let response: TokenResponse = http
        .post(&secrets.token_uri)
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()?
        .error_for_status()?
        .json()?;
    Ok(response.into_token(Utc::now(), None))
}

fn refresh_token(
    http: &reqwest::blocking::Client,
    secrets: &ClientSecrets,
    refresh: &str,
) -> Result<Token, AuthError> {
    let response: TokenResponse = http
        .post(&secrets.token_uri)
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
        ])
        .send()?
        .error_for_status()?
        .json()?;
    Ok(response.into_token(Utc::now(), Some(refresh.to_string())))
}
