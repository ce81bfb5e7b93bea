//! Unified error types and result handling.
//!
//! Every service function returns [`Result`]. The HTTP layer turns each
//! variant into a status code in `web::error`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable explanation
    pub message: String,
}

/// Collected validation messages for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a message for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Returns `true` when no message has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded messages, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether a message was recorded for `field`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise [`Error::Validation`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&joined.join(", "))
    }
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced record does not exist (or is hidden by soft delete/status)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record, e.g. `"food item"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The requester lacks the role or ownership required
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Why access was denied
        reason: String,
    },

    /// The request carried no identity
    #[error("Authentication required")]
    Unauthenticated,

    /// An argument is unusable, e.g. an empty order line list
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong
        message: String,
    },

    /// The operation clashes with existing data
    #[error("Conflict: {message}")]
    Conflict {
        /// What clashed
        message: String,
    },

    /// Checkout was requested with nothing in the cart
    #[error("Cart for user {user_id} is empty")]
    EmptyCart {
        /// Owner of the empty cart
        user_id: String,
    },

    /// Field-level validation failures
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Startup configuration problem
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// I/O failure (binding the listener, reading files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Whether this is a storage-level unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(db_err) => is_unique_violation(db_err),
            _ => false,
        }
    }
}

/// Whether a [`sea_orm::DbErr`] reports a unique constraint violation.
#[must_use]
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::not_found("food item", 7);
        assert_eq!(error.to_string(), "food item not found: 7");

        let error = Error::EmptyCart {
            user_id: "u1".to_string(),
        };
        assert_eq!(error.to_string(), "Cart for user u1 is empty");
    }

    #[test]
    fn test_field_errors_collects_messages() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.push("name", "Name is required");
        errors.push("price", "Price must be positive");
        assert!(errors.has("name"));
        assert!(!errors.has("email"));
        assert_eq!(
            errors.to_string(),
            "name: Name is required, price: Price must be positive"
        );

        let result = errors.into_result();
        assert!(matches!(result, Err(Error::Validation(ref e)) if e.as_slice().len() == 2));
    }
}
