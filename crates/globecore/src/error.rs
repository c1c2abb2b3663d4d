use std::path::PathBuf;
use thiserror::Error;

/// Failures while acquiring or decoding the world land dataset.
///
/// Only `Unavailable` is reported by the mirror walk itself; the other
/// variants surface when loading from an explicit local file, where the
/// caller asked for exactly one source.
#[derive(Debug, Error)]
pub enum LandError {
    #[error("no usable land dataset after trying {tried} mirror(s)")]
    Unavailable { tried: usize },

    #[error("land topology parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed land topology: {0}")]
    Topology(&'static str),

    #[error("dataset contains no land polygons")]
    EmptyLand,

    #[error("http request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for LandError {
    fn from(e: ureq::Error) -> Self {
        LandError::Http(Box::new(e))
    }
}

/// Failures while loading viewer configuration or pin lists from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
