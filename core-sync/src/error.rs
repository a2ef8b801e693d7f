use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Local files deleted for: {}", .titles.join(", "))]
    FilesDeleted { titles: Vec<String> },

    #[error("An upload attempt is already running")]
    AttemptInProgress,

    #[error("No backend registered for {0}")]
    BackendNotRegistered(String),

    #[error("Upload attempt cancelled")]
    Cancelled,

    #[error("No pending record for {0}")]
    RecordNotFound(String),

    #[error("Invalid upload state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid upload state: {0}")]
    InvalidState(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<BridgeError> for SyncError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::AuthRejected(msg) => SyncError::Auth(msg),
            BridgeError::FilesDeleted { titles } => SyncError::FilesDeleted { titles },
            BridgeError::Transport(msg) => SyncError::Transport(msg),
            BridgeError::NotAvailable(msg) => SyncError::Transport(msg),
            BridgeError::Io(e) => SyncError::Transport(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
