//! Domain models for mail entities

mod message;
mod record;

pub use message::MessageId;
pub use record::NormalizedRecord;
