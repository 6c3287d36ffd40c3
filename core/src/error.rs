use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the query and ranking engines.
///
/// Lookups that simply find nothing (unknown term, empty postings, missing export
/// store) are not errors; they yield empty results.
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream index data breaks an invariant the engines rely on.
    #[error("index invariant violated: {0}")]
    Invariant(String),
    #[error("malformed node record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self { Error::Invariant(msg.into()) }
}
