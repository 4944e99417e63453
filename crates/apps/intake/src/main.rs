//! read-gmail - Reads one Gmail message into the pipeline's incoming folder
//!
//! Typical invocations:
//! - by hand: `read-gmail --last`
//! - from n8n: `read-gmail --id={{gmail.id}}`
//!
//! The mailbox is never modified: nothing is marked read, relabeled or deleted.

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use mail::{IntakePaths, Mode, Outcome, RecordWriter};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reads one Gmail message and saves it as JSON in data/incoming/")]
struct Args {
    /// Read the most recent inbox message
    #[arg(long)]
    last: bool,

    /// Read a specific message by its Gmail id (takes precedence over --last)
    #[arg(long, value_name = "MESSAGE_ID")]
    id: Option<String>,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let mode = Mode::from_flags(args.id, args.last);

    // No selector: say so before touching credentials or the network
    if mode == Mode::Usage {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match read_message(mode) {
        Ok(Outcome::Written { path, .. }) => {
            println!("Message saved: {}", path.display());
            info!("Finished successfully");
            ExitCode::SUCCESS
        }
        Ok(Outcome::EmptyInbox) => {
            println!("No messages in the inbox, nothing to do.");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Usage) => {
            print_usage();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_message(mode: Mode) -> Result<Outcome> {
    let paths = IntakePaths::resolve()?;
    let client = mail::connect(&paths)?;
    let writer = RecordWriter::new(&paths.output_dir);
    mail::run(&client, mode, &writer)
}

fn print_usage() {
    println!("Use --last or --id=<MESSAGE_ID> to choose which message to read.");
}
