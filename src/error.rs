//! Error types for share reconciliation.

use thiserror::Error;

use crate::warehouse::WarehouseError;

/// Errors surfaced to the host orchestrator by share operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The declared configuration is missing or has an unusable value.
    #[error("invalid value for {field}: {message}")]
    InvalidConfig { field: String, message: String },

    /// An identifier cannot be rendered safely into a statement.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// A statement sent to the warehouse failed.
    #[error("{action}: {source}")]
    Execution {
        action: String,
        #[source]
        source: WarehouseError,
    },

    /// The row returned by the warehouse does not have the expected shape.
    #[error("failed to decode share {id}: {message}")]
    Decode { id: String, message: String },

    /// The share does not exist in the warehouse.
    #[error("share not found: {id}")]
    NotFound { id: String },

    /// An attribute that cannot change in place was changed.
    #[error("attribute {attribute} cannot be changed without replacing the share")]
    ImmutableAttribute { attribute: String },
}

/// Result type for share operations
pub type ShareResult<T> = Result<T, ShareError>;

impl ShareError {
    /// Create an invalid config error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a warehouse failure with the action that was being attempted.
    pub fn execution(action: impl Into<String>, source: WarehouseError) -> Self {
        Self::Execution {
            action: action.into(),
            source,
        }
    }

    /// Create a decode error.
    pub fn decode(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an immutable attribute error.
    pub fn immutable(attribute: impl Into<String>) -> Self {
        Self::ImmutableAttribute {
            attribute: attribute.into(),
        }
    }

    /// Whether this error means the share is gone.
    ///
    /// Hosts use this to drop the resource from state instead of failing the plan.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
