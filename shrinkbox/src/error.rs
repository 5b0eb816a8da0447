use crate::node::NodeKind;
use crate::path::{ArchivePath, PathError};

pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by a registered view factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot handle path `{raw}`")]
    InvalidPath {
        raw: String,
        #[source]
        source: PathError,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Cannot replace {existing} `{path}` with a {incoming}")]
    PathConflict {
        path: ArchivePath,
        existing: NodeKind,
        incoming: NodeKind,
    },

    #[error("No view registered for capability `{capability}`")]
    UnsupportedCapability { capability: &'static str },

    #[error("Cannot construct view for capability `{capability}`")]
    AdapterConstructionFailed {
        capability: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Malformed archive stream: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_path<S: Into<String>>(raw: S, source: PathError) -> Error {
        Error::InvalidPath {
            raw: raw.into(),
            source,
        }
    }
}

/// Parses a caller-supplied path, attaching the raw input to the error.
pub(crate) fn parse_path(raw: &str) -> Result<ArchivePath> {
    ArchivePath::new(raw).map_err(|source| Error::invalid_path(raw, source))
}
