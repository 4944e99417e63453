//! Configuration loading for the intake tools
//!
//! File layout under the base directory (see the `config` crate):
//!
//! ```text
//! config/credentials/gmail_credentials.json   # OAuth client (Google Cloud Console)
//! config/credentials/token.json               # authorized-user token
//! data/incoming/mail_<id>.json                # normalized records
//! ```
//!
//! OAuth client credentials are loaded from (in order of priority):
//! 1. JSON file (Google Cloud Console format)
//! 2. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CREDENTIALS_DIR: &str = "config/credentials";
const CREDENTIALS_FILE: &str = "gmail_credentials.json";
const TOKEN_FILE: &str = "token.json";
const INCOMING_DIR: &str = "data/incoming";

/// Locations of every file the intake tools touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePaths {
    /// OAuth client credentials, read by the bootstrap binary only
    pub credentials_file: PathBuf,
    /// Token artifact produced by the bootstrap binary
    pub token_file: PathBuf,
    /// Directory receiving `mail_<id>.json` records
    pub output_dir: PathBuf,
}

impl IntakePaths {
    /// Resolve paths under the configured base directory
    pub fn resolve() -> Result<Self> {
        let base = config::base_dir().context("Could not determine base directory")?;
        Ok(Self::from_base(base))
    }

    /// Lay out paths under an explicit base directory
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let credentials_dir = base.join(CREDENTIALS_DIR);
        Self {
            credentials_file: credentials_dir.join(CREDENTIALS_FILE),
            token_file: credentials_dir.join(TOKEN_FILE),
            output_dir: base.join(INCOMING_DIR),
        }
    }
}

/// OAuth credentials for Gmail API access
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Google Cloud Console credential file format (installed app)
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: String,
}

impl GmailCredentials {
    /// Load credentials from the given file, falling back to
    /// `GMAIL_CLIENT_ID` / `GMAIL_CLIENT_SECRET` when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        Self::from_env().with_context(|| {
            format!(
                "No OAuth client credentials: place them at {} or set GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET",
                path.display()
            )
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from a GoogleCredentialFile
    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Support both "installed" (desktop) and "web" credential types
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret,
        })
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GMAIL_CLIENT_ID")
            .context("GMAIL_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET")
            .context("GMAIL_CLIENT_SECRET environment variable not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }
}
