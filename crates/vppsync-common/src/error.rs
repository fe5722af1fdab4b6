//! Error types for synchronization operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. The variants
//! mirror the failure classes of the engine: missing caller input, unexpected
//! object bindings, dataplane call failures, shell execution failures, and
//! programming-invariant violations (which are deliberately distinguishable
//! from ordinary failures).

use std::io;
use thiserror::Error;

/// Result type alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing interface/VRF/address state.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required attribute was not supplied by the caller.
    #[error("Required attribute {attribute} was not passed")]
    MissingAttribute {
        /// Name of the missing attribute.
        attribute: &'static str,
    },

    /// The referenced object has a type the operation cannot work with.
    #[error("Object {object} expected to be {expected} but is {actual}")]
    UnexpectedBinding {
        /// Serialized object id.
        object: String,
        /// The expected object type.
        expected: &'static str,
        /// The actual object type.
        actual: String,
    },

    /// A dataplane API call returned a non-zero status.
    #[error("Dataplane call {api} failed with status {code}")]
    DataplaneCall {
        /// The dataplane API that failed.
        api: &'static str,
        /// The returned status code.
        code: i32,
    },

    /// Failed to spawn a shell command.
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned a non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// An internal invariant was violated. Never the result of caller input;
    /// callers must not retry or swallow this.
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// What was violated.
        message: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl SyncError {
    /// Creates a missing-attribute error.
    pub fn missing_attribute(attribute: &'static str) -> Self {
        Self::MissingAttribute { attribute }
    }

    /// Creates an unexpected-binding error.
    pub fn unexpected_binding(
        object: impl Into<String>,
        expected: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        Self::UnexpectedBinding {
            object: object.into(),
            expected,
            actual: actual.into(),
        }
    }

    /// Creates a dataplane call error.
    pub fn dataplane(api: &'static str, code: i32) -> Self {
        Self::DataplaneCall { api, code }
    }

    /// Creates an invariant-violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error signals a programming-invariant violation
    /// rather than a normal operational failure.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SyncError::InvariantViolation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_display() {
        let err = SyncError::missing_attribute("ROUTER_INTERFACE_ATTR_TYPE");
        assert_eq!(
            err.to_string(),
            "Required attribute ROUTER_INTERFACE_ATTR_TYPE was not passed"
        );
    }

    #[test]
    fn test_dataplane_call_display() {
        let err = SyncError::dataplane("interface_ip_address_add_del", -1);
        assert!(err.to_string().contains("interface_ip_address_add_del"));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_invariant_is_distinguishable() {
        assert!(SyncError::invariant("bad family").is_invariant_violation());
        assert!(!SyncError::dataplane("ip_vrf_add", -1).is_invariant_violation());
        assert!(!SyncError::missing_attribute("MTU").is_invariant_violation());
    }

    #[test]
    fn test_unexpected_binding_display() {
        let err = SyncError::unexpected_binding("0x1234", "PORT", "LAG");
        assert_eq!(err.to_string(), "Object 0x1234 expected to be PORT but is LAG");
    }
}
