use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Local files deleted for: {}", .titles.join(", "))]
    FilesDeleted { titles: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
