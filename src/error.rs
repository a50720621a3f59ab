// Error types for the Pinry client.
// Library code returns `PinryError`; the command layer wraps these with
// `anyhow` context before they reach the user.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PinryError>;

#[derive(Error, Debug)]
pub enum PinryError {
    #[error("Invalid pinry url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Failed to upload image [{}]: not found", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Failed to upload image [{}]: {status} - {body}", path.display())]
    UploadFailed {
        path: PathBuf,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to create pin {payload}, {status} - {body}")]
    PinCreationFailed {
        payload: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to create board '{name}': {status} - {body}")]
    BoardCreationFailed {
        name: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Board '{0}' does not exist")]
    BoardNotFound(String),

    #[error("Failed to add pin {pin_id} to board: {board}, {status}")]
    BoardAttachFailed {
        board: String,
        pin_id: u64,
        status: reqwest::StatusCode,
    },

    #[error("Unexpected response from {url}: {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
