use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{field} must be <= {max}, got {value}")]
    OutOfBounds {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("unknown {what}: {key}")]
    UnknownKey { what: &'static str, key: String },
}
