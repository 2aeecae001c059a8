use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("GPIO setup failed: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("remote store request failed: {0}")]
    Store(#[from] reqwest::Error),

    #[error("remote store returned unexpected payload at {path}: {reason}")]
    StorePayload { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
