//! gmail-authorize - One-time Gmail authorization for read-gmail
//!
//! Reuses a working token when there is one, otherwise opens the browser
//! for consent and stores the token. Then lists the five most recent
//! message ids as a connection check.

use anyhow::Result;
use log::error;
use mail::{GmailAuth, GmailClient, GmailCredentials, IntakePaths};
use std::process::ExitCode;

/// Messages listed by the connection check
const CHECK_MESSAGES: usize = 5;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match authorize() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn authorize() -> Result<()> {
    let base = config::init()?;
    let paths = IntakePaths::from_base(&base);

    let credentials = GmailCredentials::load(&paths.credentials_file)?;
    let auth = GmailAuth::load_or_authorize(&credentials, &paths.token_file)?;
    println!("Token stored at {}", auth.token_path().display());

    let client = GmailClient::new(auth);
    let recent = client.list_messages(CHECK_MESSAGES, &[])?;
    let messages = recent.messages.unwrap_or_default();

    if messages.is_empty() {
        println!("No messages.");
    } else {
        println!("Last {} messages:", messages.len());
        for msg in messages {
            println!("- ID: {}", msg.id);
        }
    }

    Ok(())
}
