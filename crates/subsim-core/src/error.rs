use thiserror::Error;
use uuid::Uuid;

/// Core error type shared across subsim crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run parameters, detected before any simulation starts.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A generated timeline broke an event-log invariant.
    #[error("consistency error in subscription {subscription_id}: {message}")]
    Consistency {
        subscription_id: Uuid,
        message: String,
    },
}

/// Convenience alias for results returned by subsim crates.
pub type Result<T> = std::result::Result<T, Error>;
