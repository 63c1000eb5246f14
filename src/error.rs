//! Error types
//!
//! Construction errors are fatal: the builder that produced one must be
//! discarded. Lookup misses are not errors and never show up here.

use std::collections::TryReserveError;

use thiserror::Error;

/// Fatal error raised while building a document from events.
#[derive(Debug, Error)]
pub enum BuildError {
    /// `end_element` with no open element.
    #[error("Unbalanced structure: end element without matching start element")]
    UnbalancedEnd,

    /// `finish` while elements are still open.
    #[error("Unbalanced structure: {open} element(s) still open at finish")]
    UnclosedElements {
        /// Number of elements left open
        open: usize,
    },

    /// Attribute event outside an element start, or after its content began.
    #[error("Attribute '{name}' outside an open element start")]
    AttributeOutsideElement {
        /// Local name of the offending attribute
        name: String,
    },

    /// Namespace declaration outside an element start, or after its content began.
    #[error("Namespace declaration for prefix '{prefix}' outside an open element start")]
    NamespaceOutsideElement {
        /// Declared prefix (empty for the default namespace)
        prefix: String,
    },

    /// A previous event already failed; the builder must be discarded.
    #[error("Builder already failed; discard it")]
    Poisoned,

    /// A backing store outgrew the handle space.
    #[error("Capacity overflow: more than {max} records in the {store} store")]
    CapacityOverflow {
        /// Which store overflowed
        store: &'static str,
        /// Largest representable handle
        max: u32,
    },

    /// Growing a backing store failed.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Error raised by the copy-on-write edit layer.
#[derive(Debug, Error)]
pub enum EditError {
    /// The cursor does not point at something the edit applies to.
    #[error("Invalid edit target: {0}")]
    InvalidTarget(&'static str),

    /// Replaying the edited event stream failed (usually a malformed fragment).
    #[error("Rebuild failed: {0}")]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            BuildError::UnclosedElements { open: 2 }.to_string(),
            "Unbalanced structure: 2 element(s) still open at finish"
        );
        let err: EditError = BuildError::UnbalancedEnd.into();
        assert!(err.to_string().starts_with("Rebuild failed: Unbalanced structure"));
    }
}
