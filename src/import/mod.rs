//! Bulk CSV import that bootstraps the registry.
//!
//! read → validate → resolve → persist. Rows failing validation are
//! dropped and counted; only unreadable input and store failures abort
//! the import.

pub mod importer;
pub mod reader;
pub mod resolve;
pub mod validate;

pub use importer::*;
pub use reader::*;
pub use resolve::*;
pub use validate::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input at record {record}: {reason}")]
    Malformed { record: u64, reason: String },

    #[error("Import file is empty: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("Persisting imported records failed after {inserted} of {total}: {source}")]
    Persistence {
        inserted: usize,
        total: usize,
        #[source]
        source: DatabaseError,
    },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
