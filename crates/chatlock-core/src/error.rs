//! Error types for Chatlock core operations.
//!
//! Every failure here is local and recoverable. The CLI layer maps these
//! to user-facing messages and exit codes.

use thiserror::Error;

/// Result type alias for Chatlock operations.
pub type Result<T> = std::result::Result<T, LockError>;

/// Core error type for Chatlock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// No PIN fingerprint has been stored yet
    #[error("Set a PIN to use Private Chats.")]
    PinNotSet,

    /// PIN fingerprint did not match the stored one
    #[error("Incorrect PIN.")]
    WrongPin,

    /// Authenticated decryption or key import failed
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// No vault entry exists for the requested lock key
    #[error("Not found: {0}")]
    NotFound(String),

    /// The view holds no user or assistant messages to capture
    #[error("Send a message before locking.")]
    EmptyCapture,

    /// The current route addresses neither a conversation nor a project
    #[error("Open an existing chat before locking.")]
    NoActiveTarget,

    /// The backing key-value store failed to read or write
    #[error("Storage error: {0}")]
    Persistence(String),

    /// A folder action was attempted before the folder PIN was verified
    #[error("Unlock the folder first.")]
    FolderLocked,

    /// A folder action targeted an entry that is not a chat
    #[error("This item is not a chat.")]
    NotAChat,

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl LockError {
    /// True for failures the user sees as "wrong PIN".
    ///
    /// A failed authentication tag looks the same to the user as a typo, but
    /// callers should still log the two apart.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, LockError::WrongPin | LockError::Crypto(_))
    }

    /// True for "nothing to do" outcomes such as unlocking an already
    /// unlocked entry.
    pub fn is_benign(&self) -> bool {
        matches!(self, LockError::NotFound(_))
    }

    /// True when the operation was rejected before any mutation because
    /// there was nothing to lock.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LockError::EmptyCapture | LockError::NoActiveTarget | LockError::InvalidInput(_)
        )
    }
}

impl From<rusqlite::Error> for LockError {
    fn from(err: rusqlite::Error) -> Self {
        LockError::Persistence(format!("SQLite error: {}", err))
    }
}
