//! Gmail OAuth2 token handling
//!
//! The token artifact uses Google's "authorized user" JSON layout, so a
//! `token.json` written by other Google tooling is accepted as-is.
//!
//! Normal reads only ever load and refresh the artifact. The interactive
//! authorization code flow (local callback server on a loopback port) is
//! reserved for [`GmailAuth::authorize`], called by the bootstrap binary.
//! Uses synchronous HTTP (ureq).

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::GmailCredentials;

/// The token artifact is absent; interactive authorization must run first
#[derive(Debug, thiserror::Error)]
#[error("No Gmail token found at {}. Run gmail-authorize first.", .path.display())]
pub struct CredentialsMissing {
    pub path: PathBuf,
}

/// Handle on the token artifact for one Gmail account
pub struct GmailAuth {
    token_path: PathBuf,
}

/// Stored token data (Google authorized-user format)
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    client_id: String,
    client_secret: String,
    #[serde(default)]
    scopes: Vec<String>,
    expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Access token still usable for at least the refresh margin
    fn fresh_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref()?;
        match self.expiry {
            Some(expiry) if expiry <= now + Duration::seconds(GmailAuth::REFRESH_MARGIN_SECS) => None,
            _ => Some(token),
        }
    }
}

fn default_token_uri() -> String {
    GmailAuth::TOKEN_URL.to_string()
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    #[allow(dead_code)]
    token_type: String,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Read-only scope; nothing here may change mailbox state
    pub const GMAIL_READONLY_SCOPE: &'static str = "https://www.googleapis.com/auth/gmail.readonly";

    /// Port range to try for local OAuth callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Tokens expiring within this many seconds are refreshed first
    const REFRESH_MARGIN_SECS: i64 = 300;

    /// Open an existing token artifact
    ///
    /// Fails with [`CredentialsMissing`] when the file does not exist.
    pub fn from_token_file(token_path: impl Into<PathBuf>) -> Result<Self> {
        let token_path = token_path.into();
        if !token_path.exists() {
            return Err(CredentialsMissing { path: token_path }.into());
        }

        let auth = Self { token_path };
        // Fail early on a corrupt artifact rather than at the first API call
        auth.load_token()?;
        Ok(auth)
    }

    /// Path of the token artifact
    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Get a valid access token, refreshing it if needed
    ///
    /// Never falls back to interactive authorization.
    pub fn access_token(&self) -> Result<String> {
        let mut token = self.load_token()?;

        if let Some(access) = token.fresh_access_token(Utc::now()) {
            return Ok(access.to_string());
        }

        let refresh_token = token.refresh_token.clone().with_context(|| {
            format!(
                "Gmail token at {} expired and has no refresh token. Run gmail-authorize again.",
                self.token_path.display()
            )
        })?;

        debug!("Refreshing Gmail access token");
        let response = Self::refresh_access_token(&token, &refresh_token)?;
        token.token = Some(response.access_token.clone());
        token.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(rotated) = response.refresh_token {
            token.refresh_token = Some(rotated);
        }
        self.save_token(&token)?;

        Ok(response.access_token)
    }

    /// Reuse a working token artifact or run the interactive flow
    pub fn load_or_authorize(
        credentials: &GmailCredentials,
        token_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let token_path = token_path.into();

        if let Ok(auth) = Self::from_token_file(&token_path) {
            match auth.access_token() {
                Ok(_) => {
                    info!("Existing Gmail token is valid: {}", token_path.display());
                    return Ok(auth);
                }
                Err(e) => info!("Existing Gmail token unusable ({:#}), re-authorizing", e),
            }
        }

        Self::authorize(credentials, token_path)
    }

    /// Perform authorization code flow authentication and store the token
    pub fn authorize(credentials: &GmailCredentials, token_path: impl Into<PathBuf>) -> Result<Self> {
        let auth = Self {
            token_path: token_path.into(),
        };

        // Step 1: Start local server to receive callback
        let (listener, port) = Self::start_local_server()?;
        let redirect_uri = format!("http://localhost:{}", port);

        // Step 2: Build authorization URL
        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(Self::GMAIL_READONLY_SCOPE),
        );

        println!("\n=== Gmail Authorization Required ===");
        println!("Opening browser for authorization...");
        println!("If the browser doesn't open, visit: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        // Step 3: Wait for callback with authorization code
        println!("Waiting for authorization...");
        let code = Self::wait_for_callback(listener)?;

        // Step 4: Exchange code for tokens
        println!("Exchanging authorization code for tokens...");
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let response: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        let token = StoredToken {
            token: Some(response.access_token),
            refresh_token: response.refresh_token,
            token_uri: Self::TOKEN_URL.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            scopes: vec![Self::GMAIL_READONLY_SCOPE.to_string()],
            expiry: response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        };
        auth.save_token(&token)?;

        println!("Authorization successful!\n");
        Ok(auth)
    }

    /// Start a local TCP server on an available port
    fn start_local_server() -> Result<(TcpListener, u16)> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
                return Ok((listener, port));
            }
        }
        anyhow::bail!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )
    }

    /// Wait for OAuth callback and extract authorization code
    fn wait_for_callback(listener: TcpListener) -> Result<String> {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        // Format: GET /?code=AUTH_CODE&scope=... HTTP/1.1
        let callback = parse_callback(&request_line);

        let (status, body) = match &callback {
            Ok(_) => ("200 OK", "Authorization successful! You can close this window."),
            Err(_) => ("400 Bad Request", "Authorization failed. Please try again."),
        };

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        callback
    }

    /// Exchange a refresh token for a new access token
    fn refresh_access_token(token: &StoredToken, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(&token.token_uri)
            .send_form([
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")
    }

    /// Load stored token from disk
    fn load_token(&self) -> Result<StoredToken> {
        let content = fs::read_to_string(&self.token_path)
            .with_context(|| format!("Failed to read token file: {}", self.token_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file: {}", self.token_path.display()))
    }

    /// Save token to disk
    fn save_token(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(token)?;
        fs::write(&self.token_path, content)
            .with_context(|| format!("Failed to write token file: {}", self.token_path.display()))?;
        Ok(())
    }
}

/// Pull the authorization code (or OAuth error) out of the callback request line
fn parse_callback(request_line: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .context("Malformed callback request")?;
    let url = Url::parse(&format!("http://localhost{}", target))
        .context("Malformed callback request")?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" => anyhow::bail!("OAuth error: {}", value),
            "code" => code = Some(value.into_owned()),
            _ => {}
        }
    }

    code.context("No authorization code received")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn write_token(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("token.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_missing_token_is_credentials_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let err = GmailAuth::from_token_file(&path).err().unwrap();
        let missing = err.downcast_ref::<CredentialsMissing>().unwrap();
        assert_eq!(missing.path, path);
        assert!(err.to_string().contains("gmail-authorize"));
    }

    #[test]
    fn test_accepts_google_authorized_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_token(
            dir.path(),
            r#"{
                "token": "ya29.access",
                "refresh_token": "1//refresh",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "secret",
                "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
                "universe_domain": "googleapis.com",
                "account": "",
                "expiry": "2999-10-20T10:11:12.345678Z"
            }"#,
        );

        let auth = GmailAuth::from_token_file(&path).unwrap();
        assert_eq!(auth.access_token().unwrap(), "ya29.access");
    }

    #[test]
    fn test_corrupt_token_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_token(dir.path(), "{ not json");

        let err = GmailAuth::from_token_file(&path).err().unwrap();
        assert!(err.downcast_ref::<CredentialsMissing>().is_none());
        assert!(format!("{:#}", err).contains("Failed to parse token file"));
    }

    #[test]
    fn test_expired_token_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_token(
            dir.path(),
            r#"{
                "token": "old",
                "client_id": "id",
                "client_secret": "secret",
                "expiry": "2000-01-01T00:00:00Z"
            }"#,
        );

        let auth = GmailAuth::from_token_file(&path).unwrap();
        let err = auth.access_token().unwrap_err();
        assert!(err.to_string().contains("no refresh token"));
    }

    #[test]
    fn test_fresh_access_token_margin() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut token = StoredToken {
            token: Some("abc".to_string()),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expiry: Some(now + Duration::seconds(600)),
        };
        assert_eq!(token.fresh_access_token(now), Some("abc"));

        token.expiry = Some(now + Duration::seconds(120));
        assert_eq!(token.fresh_access_token(now), None);

        token.expiry = None;
        assert_eq!(token.fresh_access_token(now), Some("abc"));

        token.token = None;
        assert_eq!(token.fresh_access_token(now), None);
    }

    #[test]
    fn test_parse_callback_code() {
        let code = parse_callback("GET /?code=4%2F0Ab&scope=gmail.readonly HTTP/1.1\r\n").unwrap();
        assert_eq!(code, "4/0Ab");
    }

    #[test]
    fn test_parse_callback_error() {
        let err = parse_callback("GET /?error=access_denied HTTP/1.1\r\n").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_callback_without_code() {
        assert!(parse_callback("GET /favicon.ico HTTP/1.1\r\n").is_err());
    }
}
