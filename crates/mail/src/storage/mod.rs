//! Persistence of normalized records
//!
//! Records are plain JSON files in a single directory, one per message,
//! picked up by the next pipeline stage.

mod record_file;

pub use record_file::RecordWriter;
