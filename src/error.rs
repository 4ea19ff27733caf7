// Error types shared by the reporter library

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The host log sink refused a write. The engine has no fallback sink.
    #[error("failed to write report line: {0}")]
    Sink(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("malformed lifecycle event on line {line}: {source}")]
    Event {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
