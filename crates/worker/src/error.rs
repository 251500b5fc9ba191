/// Failure reading from a record source. Fatal to the replay that hit it.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error reading {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed source {name}: {reason}")]
    Malformed { name: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The source is unusable, e.g. required columns are missing.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No replay is running")]
    NotRunning,

    #[error(transparent)]
    Source(#[from] SourceError),
}
