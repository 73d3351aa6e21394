use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("rows file is not a JSON array of objects: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sink write failed: {0}")]
    Sink(String),
}

/// Why a single row was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing Voter ID")]
    MissingVoterId,

    #[error("age {0:?} is not a whole number")]
    InvalidAge(String),

    #[error("age {0} is outside 18..=120")]
    AgeOutOfRange(i64),
}
