//! Rulebook errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulebookError {
    /// The rulebook file could not be read.
    #[error("failed to read rulebook {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule id was requested that the rulebook does not contain.
    #[error("rule {0:?} not found in rulebook")]
    UnknownRule(String),

    /// A rule source other than a local file failed.
    #[error("rule source unavailable: {0}")]
    Unavailable(String),
}
