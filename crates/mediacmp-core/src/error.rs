use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read metadata of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot mark {} read-only: {source}", path.display())]
    Mark {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid filename date pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("cannot write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
