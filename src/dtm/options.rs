//! Construction-time configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which whitespace-only text runs become nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WhitespaceHandling {
    /// Keep every whitespace-only run as a Whitespace node
    #[default]
    Preserve,
    /// Drop runs classified Whitespace; SignificantWhitespace is kept
    DiscardInsignificant,
}

/// What a CDATA event does to whitespace accumulated right before it in the same run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CdataWhitespace {
    /// Keep it; the merged value is the plain concatenation
    #[default]
    Keep,
    /// Drop the whitespace-only events directly preceding the CDATA
    DropPreceding,
}

/// Which element an ID value maps to when it occurs more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DuplicateIdPolicy {
    /// The first element in document order keeps the ID
    #[default]
    FirstWins,
    /// Each later element overwrites the mapping
    LastWins,
}

/// Options for [`TreeBuilder`](super::builder::TreeBuilder)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildOptions {
    /// Initial node store capacity
    pub node_capacity: usize,
    /// Initial attribute store capacity
    pub attribute_capacity: usize,
    /// Initial namespace store capacity
    pub namespace_capacity: usize,
    pub whitespace: WhitespaceHandling,
    pub cdata_whitespace: CdataWhitespace,
    pub duplicate_ids: DuplicateIdPolicy,
    /// Base URI of the document itself
    pub base_uri: Option<String>,
    /// Stamp line/column from `set_position` onto records
    pub line_info: bool,
    /// Dedupe window of the atomic string pool (0 disables it)
    pub atomic_window: usize,
    /// Dedupe window of the value string pool (0 disables it)
    pub value_window: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            node_capacity: 256,
            attribute_capacity: 128,
            namespace_capacity: 16,
            whitespace: WhitespaceHandling::Preserve,
            cdata_whitespace: CdataWhitespace::Keep,
            duplicate_ids: DuplicateIdPolicy::FirstWins,
            base_uri: None,
            line_info: false,
            atomic_window: 4096,
            value_window: 32,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial capacities for the node, attribute and namespace stores
    pub fn with_capacity(mut self, nodes: usize, attributes: usize, namespaces: usize) -> Self {
        self.node_capacity = nodes;
        self.attribute_capacity = attributes;
        self.namespace_capacity = namespaces;
        self
    }

    pub fn with_whitespace(mut self, whitespace: WhitespaceHandling) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn with_cdata_whitespace(mut self, policy: CdataWhitespace) -> Self {
        self.cdata_whitespace = policy;
        self
    }

    pub fn with_duplicate_ids(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn with_line_info(mut self, line_info: bool) -> Self {
        self.line_info = line_info;
        self
    }

    /// Set the dedupe windows of the atomic and value pools
    pub fn with_pool_windows(mut self, atomic: usize, value: usize) -> Self {
        self.atomic_window = atomic;
        self.value_window = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = BuildOptions::default();
        assert_eq!(opts.whitespace, WhitespaceHandling::Preserve);
        assert_eq!(opts.cdata_whitespace, CdataWhitespace::Keep);
        assert_eq!(opts.duplicate_ids, DuplicateIdPolicy::FirstWins);
        assert!(!opts.line_info);
    }

    #[test]
    fn test_builder_methods() {
        let opts = BuildOptions::new()
            .with_capacity(10, 5, 2)
            .with_whitespace(WhitespaceHandling::DiscardInsignificant)
            .with_base_uri("http://example.com/doc.xml")
            .with_line_info(true);
        assert_eq!(opts.node_capacity, 10);
        assert_eq!(opts.attribute_capacity, 5);
        assert_eq!(opts.namespace_capacity, 2);
        assert_eq!(opts.whitespace, WhitespaceHandling::DiscardInsignificant);
        assert_eq!(opts.base_uri.as_deref(), Some("http://example.com/doc.xml"));
        assert!(opts.line_info);
    }
}
