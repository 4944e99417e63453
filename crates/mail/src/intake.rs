//! Single-message intake: resolve a target, fetch, normalize, persist

use anyhow::Result;
use log::info;
use std::path::PathBuf;

use crate::config::IntakePaths;
use crate::gmail::{GmailAuth, GmailClient, normalize};
use crate::models::MessageId;
use crate::source::MessageSource;
use crate::storage::RecordWriter;

/// Which message a run should read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Read exactly this message; no inbox listing
    ById(MessageId),
    /// Read the most recent inbox message
    Latest,
    /// No selector given; nothing is fetched
    Usage,
}

impl Mode {
    /// Resolve the command-line selector. An explicit id wins over `--last`.
    pub fn from_flags(id: Option<String>, last: bool) -> Self {
        match id {
            Some(id) if !id.is_empty() => Mode::ById(MessageId::new(id)),
            _ if last => Mode::Latest,
            _ => Mode::Usage,
        }
    }
}

/// How a run ended without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record for `id` was written to `path`
    Written { id: MessageId, path: PathBuf },
    /// `Mode::Latest` found no inbox messages
    EmptyInbox,
    /// `Mode::Usage`; nothing was attempted
    Usage,
}

/// Open the Gmail client for the configured token artifact
///
/// Fails with [`CredentialsMissing`](crate::gmail::CredentialsMissing)
/// when the token has not been created yet.
pub fn connect(paths: &IntakePaths) -> Result<GmailClient> {
    let auth = GmailAuth::from_token_file(&paths.token_file)?;
    Ok(GmailClient::new(auth))
}

/// Run one intake: fetch, normalize, persist
///
/// Nothing is written unless every earlier step succeeded.
pub fn run(source: &dyn MessageSource, mode: Mode, writer: &RecordWriter) -> Result<Outcome> {
    let id = match mode {
        Mode::Usage => return Ok(Outcome::Usage),
        Mode::ById(id) => {
            info!("Reading message with id {}", id);
            id
        }
        Mode::Latest => match source.fetch_latest()? {
            Some(id) => {
                info!("Latest inbox message: {}", id);
                id
            }
            None => {
                info!("No messages found in the inbox");
                return Ok(Outcome::EmptyInbox);
            }
        },
    };

    let raw = source.fetch_by_id(&id)?;
    let record = normalize(raw);
    let path = writer.persist(&record)?;

    Ok(Outcome::Written {
        id: record.id,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_wins_over_last() {
        assert_eq!(
            Mode::from_flags(Some("abc".to_string()), true),
            Mode::ById(MessageId::new("abc"))
        );
    }

    #[test]
    fn test_last_without_id() {
        assert_eq!(Mode::from_flags(None, true), Mode::Latest);
    }

    #[test]
    fn test_no_selector_is_usage() {
        assert_eq!(Mode::from_flags(None, false), Mode::Usage);
        assert_eq!(Mode::from_flags(Some(String::new()), false), Mode::Usage);
    }

    #[test]
    fn test_connect_without_token_is_credentials_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IntakePaths::from_base(dir.path());

        let err = connect(&paths).err().unwrap();
        assert!(err.downcast_ref::<crate::gmail::CredentialsMissing>().is_some());
    }
}
