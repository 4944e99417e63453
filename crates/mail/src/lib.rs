//! Mail crate - Gmail intake for the document pipeline
//!
//! This crate provides:
//! - Gmail API client and read-only OAuth token handling
//! - Normalization of raw Gmail messages into flat records
//! - JSON record files for downstream stages (OCR, classification)
//! - The single-message intake run used by `read-gmail`
//!
//! Nothing in this crate changes mailbox state.

pub mod config;
pub mod gmail;
pub mod intake;
pub mod models;
pub mod source;
pub mod storage;

pub use config::{GmailCredentials, IntakePaths};
pub use gmail::{CredentialsMissing, GmailAuth, GmailClient, normalize, normalize_message};
pub use intake::{Mode, Outcome, connect, run};
pub use models::{MessageId, NormalizedRecord};
pub use source::{FetchError, InMemorySource, MessageSource};
pub use storage::RecordWriter;
