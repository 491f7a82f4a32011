use thiserror::Error;
use uuid::Uuid;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("consistency error in subscription {subscription_id}: {message}")]
    Consistency {
        subscription_id: Uuid,
        message: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<subsim_core::Error> for GenerationError {
    fn from(err: subsim_core::Error) -> Self {
        match err {
            subsim_core::Error::Configuration(message) => Self::Configuration(message),
            subsim_core::Error::Consistency {
                subscription_id,
                message,
            } => Self::Consistency {
                subscription_id,
                message,
            },
        }
    }
}
