//! Document - Frozen Array-Backed Tree
//!
//! The immutable aggregate produced by the builder:
//! - node, attribute and namespace stores indexed by `u32` handles
//! - the string table both pools live in
//! - the ID index
//!
//! Node handles are assigned in document order and every subtree occupies a
//! contiguous handle range, so order comparison and descendant tests are
//! integer comparisons. A `Document` is never mutated after `finish`; edits
//! produce new documents (see [`edit`](super::edit)).

use std::collections::HashMap;

use super::cursor::Cursor;
use super::node::{
    AttrId, AttributeRecord, NamespaceRecord, NodeId, NodeRecord, NsId, NONE, ROOT,
};
use super::options::{BuildOptions, DuplicateIdPolicy};
use super::strings::StringTable;

/// Map from ID attribute value to owning element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    map: HashMap<Box<str>, NodeId>,
}

impl IdIndex {
    /// Element carrying the ID `id`
    #[inline]
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.map.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Record `value -> element`; returns false if the value was already taken
    pub(crate) fn insert(&mut self, value: &str, element: NodeId, policy: DuplicateIdPolicy) -> bool {
        match self.map.get_mut(value) {
            Some(existing) => {
                if policy == DuplicateIdPolicy::LastWins {
                    *existing = element;
                }
                false
            }
            None => {
                self.map.insert(Box::from(value), element);
                true
            }
        }
    }
}

/// A frozen document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    attributes: Vec<AttributeRecord>,
    namespaces: Vec<NamespaceRecord>,
    strings: StringTable,
    ids: IdIndex,
    options: BuildOptions,
}

impl Document {
    pub(crate) fn from_parts(
        nodes: Vec<NodeRecord>,
        attributes: Vec<AttributeRecord>,
        namespaces: Vec<NamespaceRecord>,
        strings: StringTable,
        ids: IdIndex,
        options: BuildOptions,
    ) -> Self {
        Document {
            nodes,
            attributes,
            namespaces,
            strings,
            ids,
            options,
        }
    }

    /// Handle of the synthetic root
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// A cursor positioned at the root
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Get a node by handle (`None` for the null handle or out of range)
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        if id == NONE {
            return None;
        }
        self.nodes.get(id as usize)
    }

    /// Get an attribute by handle
    #[inline]
    pub fn attribute(&self, id: AttrId) -> Option<&AttributeRecord> {
        if id == NONE {
            return None;
        }
        self.attributes.get(id as usize)
    }

    /// Get a namespace node by handle
    #[inline]
    pub fn namespace(&self, id: NsId) -> Option<&NamespaceRecord> {
        if id == NONE {
            return None;
        }
        self.namespaces.get(id as usize)
    }

    /// Node record for a handle known to be live
    #[inline]
    pub(crate) fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id as usize]
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of attributes
    pub fn attribute_count(&self) -> usize {
        self.attributes.len() - 1
    }

    /// Number of namespace nodes, the fixed `xml` node included
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len() - 1
    }

    /// The string table
    #[inline]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// The ID index
    #[inline]
    pub fn ids(&self) -> &IdIndex {
        &self.ids
    }

    /// Options the document was built with; edits rebuild with the same ones
    #[inline]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub(crate) fn namespace_store(&self) -> &[NamespaceRecord] {
        &self.namespaces
    }

    /// Element with the given ID
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.lookup(id)
    }

    /// First handle after the subtree rooted at `id`
    ///
    /// The next sibling of the nearest ancestor-or-self that has one, or
    /// one past the last handle.
    pub fn subtree_end(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(node) = self.node(current) {
            if node.next_sibling != NONE {
                return node.next_sibling;
            }
            current = node.parent;
        }
        self.nodes.len() as NodeId
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let next = self.node(id).map(|n| n.first_child).unwrap_or(NONE);
        ChildIter { doc: self, next }
    }

    /// Iterate over the attributes of an element
    pub fn attributes_of(&self, id: NodeId) -> AttributeIter<'_> {
        let next = self.node(id).map(|n| n.first_attribute).unwrap_or(NONE);
        AttributeIter { doc: self, next }
    }

    /// Iterate over all descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> std::ops::Range<NodeId> {
        if self.node(id).is_none() {
            return 0..0;
        }
        (id + 1)..self.subtree_end(id)
    }

    /// Concatenated text of all descendant text-like nodes
    ///
    /// Comments and processing instructions are skipped.
    pub fn string_value(&self, id: NodeId) -> String {
        let mut out = String::new();
        for desc in self.descendants(id) {
            let node = &self.nodes[desc as usize];
            if node.kind.is_text_like() {
                out.push_str(self.strings.value(node.value));
            }
        }
        out
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: NodeId,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.doc.node(current)?;
        self.next = node.next_sibling;
        Some(current)
    }
}

/// Iterator over an element's attributes
pub struct AttributeIter<'a> {
    doc: &'a Document,
    next: AttrId,
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = AttrId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let attr = self.doc.attribute(current)?;
        self.next = attr.next_attribute;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtm::builder::build;
    use crate::dtm::node::NodeKind;
    use crate::dtm::options::BuildOptions;
    use crate::sax::DtmEvent;

    fn sample() -> Document {
        // <a>x<b>y<!--skip-->z</b><?pi data?>w</a>
        build(
            &[
                DtmEvent::start_element("", "a", ""),
                DtmEvent::text("x"),
                DtmEvent::start_element("", "b", ""),
                DtmEvent::text("y"),
                DtmEvent::comment("skip"),
                DtmEvent::text("z"),
                DtmEvent::EndElement,
                DtmEvent::processing_instruction("pi", "data"),
                DtmEvent::text("w"),
                DtmEvent::EndElement,
            ],
            BuildOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_null_handles() {
        let doc = sample();
        assert!(doc.node(NONE).is_none());
        assert!(doc.attribute(NONE).is_none());
        assert!(doc.namespace(NONE).is_none());
        assert!(doc.node(10_000).is_none());
        assert_eq!(doc.root(), ROOT);
    }

    #[test]
    fn test_children() {
        let doc = sample();
        let kinds: Vec<NodeKind> = doc.children(2).map(|id| doc.node(id).unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Text,
                NodeKind::Element,
                NodeKind::ProcessingInstruction,
                NodeKind::Text
            ]
        );
    }

    #[test]
    fn test_subtree_ranges() {
        let doc = sample();
        // root=1, a=2, x=3, b=4, y=5, comment=6, z=7, pi=8, w=9
        assert_eq!(doc.subtree_end(4), 8);
        assert_eq!(doc.subtree_end(2), 10);
        assert_eq!(doc.descendants(4).collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(doc.descendants(ROOT).count(), 8);
    }

    #[test]
    fn test_string_value_skips_comments_and_pis() {
        let doc = sample();
        assert_eq!(doc.string_value(ROOT), "xyzw");
        assert_eq!(doc.string_value(4), "yz");
        assert_eq!(doc.string_value(8), "");
    }

    #[test]
    fn test_id_index_insert() {
        let mut ids = IdIndex::default();
        assert!(ids.insert("a", 2, DuplicateIdPolicy::FirstWins));
        assert!(!ids.insert("a", 3, DuplicateIdPolicy::FirstWins));
        assert_eq!(ids.lookup("a"), Some(2));
        assert!(!ids.insert("a", 4, DuplicateIdPolicy::LastWins));
        assert_eq!(ids.lookup("a"), Some(4));
        assert_eq!(ids.lookup("missing"), None);
        assert_eq!(ids.len(), 1);
    }
}
