//! Node, attribute and namespace records
//!
//! Fixed-shape records held in contiguous arrays and linked by `u32` handles.
//! Handle `0` is the null sentinel in every store; node handle `1` is always
//! the synthetic root.

use super::strings::{StrId, EMPTY, NO_VALUE};

/// Handle into the node store
pub type NodeId = u32;
/// Handle into the attribute store
pub type AttrId = u32;
/// Handle into the namespace store
pub type NsId = u32;

/// Sentinel value for "no record" in every store
pub const NONE: u32 = 0;

/// Handle of the synthetic root node
pub const ROOT: NodeId = 1;

/// Handle of the fixed `xml` namespace node that terminates every scope chain
pub const XML_NAMESPACE_NODE: NsId = 1;

/// Kind of a record in the node store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Synthetic document root
    Root,
    /// Element
    Element,
    /// Text run containing non-whitespace or CDATA content
    Text,
    /// Whitespace-only text run
    Whitespace,
    /// Whitespace-only text run that must be preserved
    SignificantWhitespace,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

impl NodeKind {
    /// Text, Whitespace or SignificantWhitespace
    #[inline]
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Whitespace | NodeKind::SignificantWhitespace
        )
    }

    /// Root or Element: kinds that can have children
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Element)
    }
}

/// XPath data model node type, as reported by a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathNodeType {
    Root,
    Element,
    Attribute,
    Namespace,
    Text,
    SignificantWhitespace,
    Whitespace,
    ProcessingInstruction,
    Comment,
}

impl From<NodeKind> for XPathNodeType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Root => XPathNodeType::Root,
            NodeKind::Element => XPathNodeType::Element,
            NodeKind::Text => XPathNodeType::Text,
            NodeKind::Whitespace => XPathNodeType::Whitespace,
            NodeKind::SignificantWhitespace => XPathNodeType::SignificantWhitespace,
            NodeKind::Comment => XPathNodeType::Comment,
            NodeKind::ProcessingInstruction => XPathNodeType::ProcessingInstruction,
        }
    }
}

/// Declared attribute type reported by a validating producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeType {
    /// No declaration seen
    #[default]
    Undeclared,
    CData,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    NmToken,
    NmTokens,
    Notation,
    Enumeration,
}

impl AttributeType {
    /// Whether values of this type go into the ID index
    #[inline]
    pub fn is_id(self) -> bool {
        self == AttributeType::Id
    }
}

/// One element, text run, comment, PI, or the root
///
/// Text fields are indices into the document's string table: names,
/// prefixes, URIs, language and base into the atomic pool, `value` into
/// the value pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub previous_sibling: NodeId,
    pub next_sibling: NodeId,
    /// Head of this element's attribute list
    pub first_attribute: AttrId,
    /// Innermost namespace node visible here; the chain runs outward
    pub first_namespace: NsId,
    pub local_name: StrId,
    pub namespace_uri: StrId,
    pub prefix: StrId,
    /// `NO_VALUE` for elements and the root, whose value is computed
    pub value: StrId,
    pub xml_lang: StrId,
    pub base_uri: StrId,
    /// Self-closed, or closed with no content events at all
    pub is_empty_element: bool,
    pub line_number: u32,
    pub line_position: u32,
}

impl NodeRecord {
    /// Placeholder stored at handle 0
    pub(crate) fn sentinel() -> Self {
        Self::leaf(NodeKind::Root, NONE, NO_VALUE)
    }

    /// The synthetic root
    pub fn root(base_uri: StrId) -> Self {
        NodeRecord {
            base_uri,
            ..Self::leaf(NodeKind::Root, NONE, NO_VALUE)
        }
    }

    /// A new element under `parent`
    pub fn element(parent: NodeId, prefix: StrId, local_name: StrId, namespace_uri: StrId) -> Self {
        NodeRecord {
            prefix,
            local_name,
            namespace_uri,
            ..Self::leaf(NodeKind::Element, parent, NO_VALUE)
        }
    }

    /// A text-like node, comment or PI under `parent`
    pub fn leaf(kind: NodeKind, parent: NodeId, value: StrId) -> Self {
        NodeRecord {
            kind,
            parent,
            first_child: NONE,
            previous_sibling: NONE,
            next_sibling: NONE,
            first_attribute: NONE,
            first_namespace: NONE,
            local_name: EMPTY,
            namespace_uri: EMPTY,
            prefix: EMPTY,
            value,
            xml_lang: EMPTY,
            base_uri: EMPTY,
            is_empty_element: false,
            line_number: 0,
            line_position: 0,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child != NONE
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.first_attribute != NONE
    }
}

/// One attribute; reachable only through its owner's attribute list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRecord {
    pub owner_element: NodeId,
    pub next_attribute: AttrId,
    pub local_name: StrId,
    pub namespace_uri: StrId,
    pub prefix: StrId,
    pub value: StrId,
    /// Declared (or `xml:id`) identifier attribute
    pub is_id: bool,
    pub line_number: u32,
    pub line_position: u32,
}

impl AttributeRecord {
    pub(crate) fn sentinel() -> Self {
        AttributeRecord {
            owner_element: NONE,
            next_attribute: NONE,
            local_name: EMPTY,
            namespace_uri: EMPTY,
            prefix: EMPTY,
            value: NO_VALUE,
            is_id: false,
            line_number: 0,
            line_position: 0,
        }
    }
}

/// One namespace declaration
///
/// `next_namespace` points at the next-outer visible declaration, which is
/// not necessarily declared on a sibling or the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceRecord {
    /// Element that lexically declared it (`NONE` for the fixed `xml` node)
    pub declared_element: NodeId,
    pub next_namespace: NsId,
    /// Prefix, empty for the default namespace
    pub name: StrId,
    pub namespace_uri: StrId,
}

impl NamespaceRecord {
    pub(crate) fn sentinel() -> Self {
        NamespaceRecord {
            declared_element: NONE,
            next_namespace: NONE,
            name: EMPTY,
            namespace_uri: EMPTY,
        }
    }
}
