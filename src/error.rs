//! Error type for the fallible steps behind the language server.
//!
//! None of these reach the editor: the template core turns every failure
//! into an empty result and logs it.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to walk template directory: {0}")]
    Walk(#[from] ignore::Error),

    #[error("template walk task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("lookup cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
