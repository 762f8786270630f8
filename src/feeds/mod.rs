//! Price feed ingestion: push messages and polled quotes

pub mod message;
pub mod ingestor;

pub use message::*;
pub use ingestor::*;
