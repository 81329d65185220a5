use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by lexicon imports, the compiled graph format and the
/// statistics store.
///
/// Searches never fail: a missing or broken store only switches the engine
/// to its in-memory fallback.
#[derive(Error, Debug)]
pub enum LexiconError {
    /// A source file could not be opened or read
    #[error("can't open file '{}': {source}", path.display())]
    ImportIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A compiled graph failed its checksum or structural validation
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// The statistics store rejected an operation
    #[error("store error: {0}")]
    Store(String),

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, LexiconError>;

impl LexiconError {
    pub fn import_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        LexiconError::ImportIo {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        LexiconError::CorruptData(msg.into())
    }

    pub fn store<S: Into<String>>(msg: S) -> Self {
        LexiconError::Store(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        LexiconError::Config(msg.into())
    }
}

impl From<sqlx::Error> for LexiconError {
    fn from(err: sqlx::Error) -> Self {
        LexiconError::Store(err.to_string())
    }
}

impl From<fst::Error> for LexiconError {
    fn from(err: fst::Error) -> Self {
        LexiconError::CorruptData(err.to_string())
    }
}

impl From<bincode::Error> for LexiconError {
    fn from(err: bincode::Error) -> Self {
        LexiconError::CorruptData(err.to_string())
    }
}
