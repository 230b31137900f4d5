//! # Error Types
//!
//! Domain-specific error types for cartwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartwise-core errors (this file)                                       │
//! │  ├── CoreError        - Undecodable API payloads                        │
//! │  └── ValidationError  - User input rejected before any effect           │
//! │                                                                         │
//! │  cartwise-db errors (separate crate)                                    │
//! │  └── DbError          - Key-value store failures                        │
//! │                                                                         │
//! │  cartwise-state errors                                                  │
//! │  └── StateError       - Persistence, config, background tasks           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing prices, images and ids are NOT errors: the boundary adapter
//! resolves them through fallback chains.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A search or statistics payload could not be decoded.
    ///
    /// Screens show this in their inline error region; the stores never see
    /// it.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Surfaced to the user as a blocking alert; the operation is aborted with
/// no partial effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., malformed email address).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same email invited twice).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
