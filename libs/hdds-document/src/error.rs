//! # Document Errors
//!
//! Error types for building and loading element trees.

use thiserror::Error;

/// Errors that can occur while building or loading a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// Markup could not be read.
    #[error("XML error at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the reader.
        position: u64,
        /// Reader message.
        message: String,
    },

    /// A closing tag did not match the open element.
    #[error("unbalanced tag </{found}> (expected </{expected}>)")]
    UnbalancedTag {
        /// Tag the reader was inside of.
        expected: String,
        /// Tag that was closed.
        found: String,
    },

    /// The markup contained no element at all.
    #[error("document has no root element")]
    EmptyDocument,

    /// Two identified elements share a name.
    #[error("duplicate identifier \"{name}\" on <{tag}>")]
    DuplicateIdentifier {
        /// The clashing name.
        name: String,
        /// Tag of the second element.
        tag: String,
    },

    /// A handle does not belong to this document.
    #[error("element #{0} does not exist")]
    UnknownElement(usize),
}

/// Result type alias for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocumentError::DuplicateIdentifier {
            name: "BCAL".to_string(),
            tag: "tubs".to_string(),
        };
        assert!(err.to_string().contains("BCAL"));
        assert!(err.to_string().contains("<tubs>"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentError>();
    }
}
