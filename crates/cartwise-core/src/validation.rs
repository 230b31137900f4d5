//! # Validation Module
//!
//! User-input checks run before a screen acts: the search box and the
//! share-cart invite form.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen                                                        │
//! │  └── Disables the button while the field is empty                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── validate_search_query  (before any search request)                 │
//! │  └── validate_invite_emails (before sending cart invites)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Err(ValidationError) → blocking alert, nothing sent                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cartwise_core::validation::{validate_email, validate_search_query};
//!
//! assert_eq!(validate_search_query("  oat milk ").unwrap(), "oat milk");
//! assert!(validate_email("sam@example.com").is_ok());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::MAX_SEARCH_QUERY_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Search
// =============================================================================

/// Validates a search query and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use cartwise_core::validation::validate_search_query;
///
/// assert!(validate_search_query("   ").is_err());
/// assert!(validate_search_query(&"a".repeat(201)).is_err());
/// ```
pub fn validate_search_query(query: &str) -> ValidationResult<&str> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "query".to_string(),
        });
    }

    if query.chars().count() > MAX_SEARCH_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_QUERY_LEN,
        });
    }

    Ok(query)
}

// =============================================================================
// Invites
// =============================================================================

/// Validates a single email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part without whitespace
/// - Domain with at least one dot and no empty labels
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let (local, domain) = match email.split_once('@') {
        Some((local, domain)) if !domain.contains('@') => (local, domain),
        _ => return Err(invalid("must contain exactly one '@'")),
    };

    if local.is_empty() {
        return Err(invalid("missing name before '@'"));
    }

    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Validates the recipient list of a share-cart invite.
///
/// Rejects an empty list, any malformed address, and the same address
/// twice (case-insensitive).
pub fn validate_invite_emails<S: AsRef<str>>(emails: &[S]) -> ValidationResult<()> {
    if emails.is_empty() {
        return Err(ValidationError::Required {
            field: "emails".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for email in emails {
        let email = email.as_ref().trim();
        validate_email(email)?;
        if !seen.insert(email.to_lowercase()) {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: email.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
