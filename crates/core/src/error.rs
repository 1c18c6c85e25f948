use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Push transport error: {0}")]
    Transport(String),

    #[error("Invalid push token: {0}")]
    InvalidToken(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(uuid::Uuid),

    #[error("Recipient not eligible: {0}")]
    NotEligible(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
