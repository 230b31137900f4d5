//! # State Error Types
//!
//! Errors surfaced by the state layer.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       State Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐  │
//! │  │  Configuration  │  │   Persistence   │  │     Background          │  │
//! │  │                 │  │                 │  │                         │  │
//! │  │  InvalidConfig  │  │  Storage        │  │  TaskFailed             │  │
//! │  │  ConfigLoad     │  │  Serialization  │  │                         │  │
//! │  │  ConfigSave     │  │                 │  │                         │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence errors never reach the UI on their own: the favorites store
//! logs them and keeps its in-memory list. They only show up to a caller
//! that awaits a [`PersistTicket`](crate::favorites::PersistTicket).

use cartwise_db::DbError;
use thiserror::Error;

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A config value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config file could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The key-value store rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// Favorites JSON could not be encoded or decoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Background Errors
    // =========================================================================
    /// A background persistence or load task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StateError {
    fn from(err: toml::de::Error) -> Self {
        StateError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StateError {
    fn from(err: toml::ser::Error) -> Self {
        StateError::ConfigSaveFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StateError {
    fn from(err: tokio::task::JoinError) -> Self {
        StateError::TaskFailed(err.to_string())
    }
}

impl StateError {
    /// True for failures of the on-device store or of the stored data.
    ///
    /// These are the errors the favorites store treats as fail-open.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, StateError::Storage(_) | StateError::Serialization(_))
    }

    /// True for errors raised while loading, validating or saving config.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StateError::InvalidConfig(_)
                | StateError::ConfigLoadFailed(_)
                | StateError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_persistence_errors() {
        let err = StateError::from(DbError::Unavailable("pool closed".into()));
        assert!(err.is_persistence_error());
        assert!(!err.is_config_error());
        assert!(err.to_string().contains("pool closed"));
    }

    #[test]
    fn test_bad_json_is_persistence_error() {
        let json_err = serde_json::from_str::<Vec<u32>>("{not json").unwrap_err();
        assert!(StateError::from(json_err).is_persistence_error());
    }

    #[test]
    fn test_toml_errors_are_config_errors() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err = StateError::from(toml_err);
        assert!(err.is_config_error());
        assert!(matches!(err, StateError::ConfigLoadFailed(_)));
    }
}
