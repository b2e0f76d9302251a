//! Error types for the work item automation library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == DevOps Error Enum ==
/// Unified error type for the library.
///
/// Callers distinguish failure classes by variant, never by parsing the
/// message text. The messages still embed the available/legal value lists
/// so they can be shown to a user directly.
#[derive(Error, Debug)]
pub enum DevOpsError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A network call to Azure DevOps failed (transport, auth, or backend)
    #[error("Request failed during {operation}: {message}")]
    Fetch {
        /// The operation that was being performed
        operation: String,
        /// Transport or backend error detail
        message: String,
    },

    /// No concrete work item type could be matched to a category
    #[error(
        "Cannot find suitable work item type for category '{category}'. \
         Available types in this project: {}. \
         Use an explicit type name to pick one of them.",
        .available.join(", ")
    )]
    Resolution {
        /// The category that could not be resolved
        category: String,
        /// Every type name the project offers, sorted
        available: Vec<String>,
    },

    /// A requested state is not valid for the target work item type
    #[error(
        "Invalid state '{state}' for {work_item_type}. Available states: {}",
        .available.join(", ")
    )]
    Validation {
        /// The rejected state name
        state: String,
        /// The concrete type the state was checked against
        work_item_type: String,
        /// The legal state names for that type, in backend order
        available: Vec<String>,
    },

    /// Bad caller-supplied input (malformed date, unknown category, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DevOpsError {
    // == Fetch Constructor ==
    /// Builds a `Fetch` error from an operation name and any displayable cause.
    pub fn fetch(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Fetch {
            operation: operation.into(),
            message: cause.to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the library.
pub type Result<T> = std::result::Result<T, DevOpsError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message_lists_available_types() {
        let err = DevOpsError::Resolution {
            category: "epic".to_string(),
            available: vec!["Task".to_string(), "Bug".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("'epic'"));
        assert!(message.contains("Task, Bug"));
    }

    #[test]
    fn test_validation_message_lists_legal_states() {
        let err = DevOpsError::Validation {
            state: "Resolved".to_string(),
            work_item_type: "Task".to_string(),
            available: vec!["New".to_string(), "Active".to_string(), "Closed".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("'Resolved'"));
        assert!(message.contains("New, Active, Closed"));
    }

    #[test]
    fn test_fetch_constructor() {
        let err = DevOpsError::fetch("get work item types", "connection refused");
        match err {
            DevOpsError::Fetch { operation, message } => {
                assert_eq!(operation, "get work item types");
                assert_eq!(message, "connection refused");
            }
            other => panic!("expected Fetch, got {:?}", other),
        }
    }
}
