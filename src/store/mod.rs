//! Persistence layer — libSQL-backed transcript log.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlTranscriptLog;
pub use traits::{TranscriptEntry, TranscriptLog};
