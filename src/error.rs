//! Error type shared by every fallible operation in the crate.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage I/O failed for '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown template key: {0}")]
    UnknownTemplate(String),

    #[error("no tone field with id {0}")]
    UnknownNote(u32),

    #[error("field '{field}' requires a concrete value")]
    InvalidEdit { field: &'static str },

    #[error("layout service error: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, Error>;
