//! Navigation Cursor
//!
//! A `(node, position)` pair over a borrowed [`Document`]. Cursors are `Copy`,
//! never allocate into the document, and may be used from any number of
//! threads at once.
//!
//! Every `move_to_*` either succeeds and changes position, or returns false
//! and leaves the cursor exactly where it was.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::document::Document;
use super::namespace::{is_hidden, lang_matches, ns, split_qname, NamespaceScopeKind};
use super::node::{
    AttrId, NodeId, NodeKind, NodeRecord, NsId, XPathNodeType, NONE, ROOT, XML_NAMESPACE_NODE,
};

/// Sub-position of a cursor on its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// On the node itself
    Node,
    /// On one of the node's attributes
    Attribute(AttrId),
    /// On a namespace node in scope at the node
    Namespace(NsId),
}

impl Position {
    /// Node < Attribute < Namespace
    fn rank(self) -> u8 {
        match self {
            Position::Node => 0,
            Position::Attribute(_) => 1,
            Position::Namespace(_) => 2,
        }
    }

    /// Order within the same kind of position
    fn key(self) -> u32 {
        match self {
            Position::Node => 0,
            // Attribute lists are appended in order
            Position::Attribute(id) => id,
            // Scope chains run from newer (higher) to older handles
            Position::Namespace(id) => u32::MAX - id,
        }
    }
}

/// Result of comparing two cursors in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOrder {
    Before,
    After,
    Same,
    /// The cursors belong to different documents
    Unknown,
}

/// Lightweight position over a document
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    doc: &'a Document,
    node: NodeId,
    position: Position,
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("node", &self.node)
            .field("position", &self.position)
            .field("kind", &self.node_kind())
            .finish()
    }
}

impl<'a> Cursor<'a> {
    /// Cursor at the root of `doc`
    pub fn new(doc: &'a Document) -> Self {
        Cursor {
            doc,
            node: ROOT,
            position: Position::Node,
        }
    }

    /// The document this cursor walks
    #[inline]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Current node handle (the owner element when on an attribute or namespace)
    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    fn record(&self) -> &'a NodeRecord {
        self.rec(self.node)
    }

    #[inline]
    fn rec(&self, id: NodeId) -> &'a NodeRecord {
        self.doc.record(id)
    }

    #[inline]
    fn on_node(&self) -> bool {
        self.position == Position::Node
    }

    #[inline]
    fn same_document(&self, other: &Cursor<'_>) -> bool {
        std::ptr::eq(self.doc, other.doc)
    }

    /// Move to a node position
    fn jump(&mut self, node: NodeId) -> bool {
        self.node = node;
        self.position = Position::Node;
        true
    }

    // === Tree moves ===

    /// Move to the parent; from an attribute or namespace, to its element
    pub fn move_to_parent(&mut self) -> bool {
        match self.position {
            Position::Attribute(_) | Position::Namespace(_) => self.jump(self.node),
            Position::Node => {
                let parent = self.record().parent;
                parent != NONE && self.jump(parent)
            }
        }
    }

    pub fn move_to_first_child(&mut self) -> bool {
        let child = self.record().first_child;
        self.on_node() && child != NONE && self.jump(child)
    }

    /// Move to the next sibling
    pub fn move_to_next(&mut self) -> bool {
        let next = self.record().next_sibling;
        self.on_node() && next != NONE && self.jump(next)
    }

    /// Move to the previous sibling
    pub fn move_to_previous(&mut self) -> bool {
        let previous = self.record().previous_sibling;
        self.on_node() && previous != NONE && self.jump(previous)
    }

    /// Move to the first sibling (succeeds when already there)
    pub fn move_to_first(&mut self) -> bool {
        if !self.on_node() {
            return false;
        }
        let parent = self.record().parent;
        if parent == NONE {
            return false;
        }
        let first = self.rec(parent).first_child;
        self.jump(first)
    }

    /// Step off an attribute or namespace onto its element
    pub(crate) fn move_to_owner(&mut self) {
        self.position = Position::Node;
    }

    /// Move to the root; always succeeds
    pub fn move_to_root(&mut self) {
        self.jump(ROOT);
    }

    /// Move to the element whose ID attribute has value `id`
    pub fn move_to_id(&mut self, id: &str) -> bool {
        match self.doc.ids().lookup(id) {
            Some(element) => self.jump(element),
            None => false,
        }
    }

    /// Take over the position of another cursor on the same document
    pub fn move_to(&mut self, other: &Cursor<'_>) -> bool {
        if !self.same_document(other) {
            return false;
        }
        self.node = other.node;
        self.position = other.position;
        true
    }

    // === Attributes ===

    /// Element whose attributes are reachable from here
    fn attribute_owner(&self) -> Option<&'a NodeRecord> {
        match self.position {
            Position::Namespace(_) => None,
            _ => Some(self.record()).filter(|r| r.is_element()),
        }
    }

    /// Move to the first attribute of the current (or owning) element
    pub fn move_to_first_attribute(&mut self) -> bool {
        match self.attribute_owner() {
            Some(owner) if owner.first_attribute != NONE => {
                self.position = Position::Attribute(owner.first_attribute);
                true
            }
            _ => false,
        }
    }

    pub fn move_to_next_attribute(&mut self) -> bool {
        let Position::Attribute(current) = self.position else {
            return false;
        };
        match self.doc.attribute(current).map(|a| a.next_attribute) {
            Some(next) if next != NONE => {
                self.position = Position::Attribute(next);
                true
            }
            _ => false,
        }
    }

    fn find_attribute(&self, matches: impl Fn(&str, &str, &str) -> bool) -> Option<AttrId> {
        let owner = self.attribute_owner()?;
        let strings = self.doc.strings();
        let mut current = owner.first_attribute;
        while let Some(attr) = self.doc.attribute(current) {
            let prefix = strings.atomic(attr.prefix);
            let local = strings.atomic(attr.local_name);
            let uri = strings.atomic(attr.namespace_uri);
            if matches(prefix, local, uri) {
                return Some(current);
            }
            current = attr.next_attribute;
        }
        None
    }

    /// Move to the attribute with the given local name and namespace URI
    pub fn move_to_attribute(&mut self, local_name: &str, namespace_uri: &str) -> bool {
        match self.find_attribute(|_, local, uri| local == local_name && uri == namespace_uri) {
            Some(id) => {
                self.position = Position::Attribute(id);
                true
            }
            None => false,
        }
    }

    /// Move to the attribute with the given qualified name (`prefix:local`)
    pub fn move_to_attribute_named(&mut self, qname: &str) -> bool {
        let (want_prefix, want_local) = split_qname(qname);
        match self.find_attribute(|prefix, local, _| prefix == want_prefix && local == want_local) {
            Some(id) => {
                self.position = Position::Attribute(id);
                true
            }
            None => false,
        }
    }

    /// Value of an attribute of the current element; `""` if absent
    pub fn get_attribute(&self, local_name: &str, namespace_uri: &str) -> &'a str {
        self.find_attribute(|_, local, uri| local == local_name && uri == namespace_uri)
            .and_then(|id| self.doc.attribute(id))
            .map(|attr| self.doc.strings().value(attr.value))
            .unwrap_or("")
    }

    // === Namespaces ===

    /// Element whose scope is visible from here (owner for attributes and
    /// namespaces, nearest element ancestor for other nodes)
    fn scope_element(&self) -> Option<NodeId> {
        let mut current = self.node;
        while let Some(node) = self.doc.node(current) {
            if node.is_element() {
                return Some(current);
            }
            current = node.parent;
        }
        None
    }

    /// First namespace node at or after `start` that `element` exposes under `scope`
    fn next_visible(&self, element: NodeId, start: NsId, scope: NamespaceScopeKind) -> Option<NsId> {
        let store = self.doc.namespace_store();
        let strings = self.doc.strings();
        let head = self.rec(element).first_namespace;
        let mut current = start;
        while let Some(record) = self.doc.namespace(current) {
            match scope {
                // Local declarations sit at the front of the chain
                NamespaceScopeKind::Local if record.declared_element != element => return None,
                NamespaceScopeKind::ExcludeXml if current == XML_NAMESPACE_NODE => return None,
                _ => {}
            }
            if !is_hidden(store, strings, head, current) {
                return Some(current);
            }
            current = record.next_namespace;
        }
        None
    }

    /// Move to the first namespace node in scope at the current element
    pub fn move_to_first_namespace(&mut self, scope: NamespaceScopeKind) -> bool {
        if !self.on_node() || !self.record().is_element() {
            return false;
        }
        let head = self.record().first_namespace;
        match self.next_visible(self.node, head, scope) {
            Some(found) => {
                self.position = Position::Namespace(found);
                true
            }
            None => false,
        }
    }

    pub fn move_to_next_namespace(&mut self, scope: NamespaceScopeKind) -> bool {
        let Position::Namespace(current) = self.position else {
            return false;
        };
        let Some(next) = self.doc.namespace(current).map(|n| n.next_namespace) else {
            return false;
        };
        match self.next_visible(self.node, next, scope) {
            Some(found) => {
                self.position = Position::Namespace(found);
                true
            }
            None => false,
        }
    }

    /// Visible namespace nodes of `element`, nearest first
    fn visible_namespaces(&self, element: NodeId) -> impl Iterator<Item = NsId> + 'a {
        let this = *self;
        let head = self.rec(element).first_namespace;
        let mut next = this.next_visible(element, head, NamespaceScopeKind::All);
        std::iter::from_fn(move || {
            let current = next?;
            let after = this.doc.namespace(current).map(|n| n.next_namespace).unwrap_or(NONE);
            next = this.next_visible(element, after, NamespaceScopeKind::All);
            Some(current)
        })
    }

    /// Move to the in-scope namespace node binding `prefix`
    pub fn move_to_namespace(&mut self, prefix: &str) -> bool {
        if !self.on_node() || !self.record().is_element() {
            return false;
        }
        let strings = self.doc.strings();
        let found = self.visible_namespaces(self.node).find(|&id| {
            self.doc
                .namespace(id)
                .is_some_and(|n| strings.atomic(n.name) == prefix)
        });
        match found {
            Some(id) => {
                self.position = Position::Namespace(id);
                true
            }
            None => false,
        }
    }

    /// URI bound to `prefix` on the current element; `""` if unbound
    pub fn get_namespace(&self, prefix: &str) -> &'a str {
        if !self.record().is_element() {
            return "";
        }
        let mut lookup = *self;
        lookup.position = Position::Node;
        if lookup.move_to_namespace(prefix) {
            lookup.value_str().unwrap_or("")
        } else {
            ""
        }
    }

    /// Resolve `prefix` in the scope visible from the current position
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&'a str> {
        match prefix {
            ns::XML_PREFIX => return Some(ns::XML),
            ns::XMLNS_PREFIX => return Some(ns::XMLNS),
            _ => {}
        }
        let element = self.scope_element()?;
        let strings = self.doc.strings();
        self.visible_namespaces(element)
            .filter_map(|id| self.doc.namespace(id))
            .find(|n| strings.atomic(n.name) == prefix)
            .map(|n| strings.atomic(n.namespace_uri))
    }

    /// Nearest prefix bound to `namespace_uri` in the scope visible from here
    pub fn lookup_prefix(&self, namespace_uri: &str) -> Option<&'a str> {
        let element = self.scope_element()?;
        let strings = self.doc.strings();
        self.visible_namespaces(element)
            .filter_map(|id| self.doc.namespace(id))
            .find(|n| strings.atomic(n.namespace_uri) == namespace_uri)
            .map(|n| strings.atomic(n.name))
    }

    // === Order ===

    /// Same document, node and sub-position
    pub fn is_same_position(&self, other: &Cursor<'_>) -> bool {
        self.same_document(other) && self.node == other.node && self.position == other.position
    }

    /// Compare positions in document order
    ///
    /// Nodes order by handle. On one node, the node itself comes first, then
    /// its attributes in list order, then its namespace nodes in chain order.
    pub fn compare_position(&self, other: &Cursor<'_>) -> NodeOrder {
        if !self.same_document(other) {
            return NodeOrder::Unknown;
        }
        let lhs = (self.node, self.position.rank(), self.position.key());
        let rhs = (other.node, other.position.rank(), other.position.key());
        match lhs.cmp(&rhs) {
            Ordering::Less => NodeOrder::Before,
            Ordering::Greater => NodeOrder::After,
            Ordering::Equal => NodeOrder::Same,
        }
    }

    /// Whether this position lies inside the subtree of `other`
    ///
    /// Attributes and namespace nodes of `other`'s element count as inside;
    /// nothing is inside an attribute or namespace node.
    pub fn is_descendant_of(&self, other: &Cursor<'_>) -> bool {
        if !self.same_document(other) || !other.on_node() {
            return false;
        }
        let bound = self.doc.subtree_end(other.node);
        let after_start = if self.on_node() {
            self.node > other.node
        } else {
            self.node >= other.node
        };
        after_start && self.node < bound
    }

    // === Accessors ===

    /// XPath node type at the current position
    pub fn node_kind(&self) -> XPathNodeType {
        match self.position {
            Position::Node => self.record().kind.into(),
            Position::Attribute(_) => XPathNodeType::Attribute,
            Position::Namespace(_) => XPathNodeType::Namespace,
        }
    }

    /// Local name: element/attribute local part, PI target, namespace prefix
    pub fn local_name(&self) -> &'a str {
        let strings = self.doc.strings();
        match self.position {
            Position::Node => match self.record().kind {
                NodeKind::Element | NodeKind::ProcessingInstruction => {
                    strings.atomic(self.record().local_name)
                }
                _ => "",
            },
            Position::Attribute(id) => self
                .doc
                .attribute(id)
                .map(|a| strings.atomic(a.local_name))
                .unwrap_or(""),
            Position::Namespace(id) => self
                .doc
                .namespace(id)
                .map(|n| strings.atomic(n.name))
                .unwrap_or(""),
        }
    }

    /// Prefix of an element or attribute name
    pub fn prefix(&self) -> &'a str {
        let strings = self.doc.strings();
        match self.position {
            Position::Node if self.record().is_element() => strings.atomic(self.record().prefix),
            Position::Attribute(id) => self
                .doc
                .attribute(id)
                .map(|a| strings.atomic(a.prefix))
                .unwrap_or(""),
            _ => "",
        }
    }

    /// Namespace URI of an element or attribute name
    pub fn namespace_uri(&self) -> &'a str {
        let strings = self.doc.strings();
        match self.position {
            Position::Node if self.record().is_element() => {
                strings.atomic(self.record().namespace_uri)
            }
            Position::Attribute(id) => self
                .doc
                .attribute(id)
                .map(|a| strings.atomic(a.namespace_uri))
                .unwrap_or(""),
            _ => "",
        }
    }

    /// Qualified name (`prefix:local` when prefixed)
    pub fn name(&self) -> Cow<'a, str> {
        let prefix = self.prefix();
        let local = self.local_name();
        if prefix.is_empty() {
            Cow::Borrowed(local)
        } else {
            Cow::Owned(format!("{}:{}", prefix, local))
        }
    }

    /// Stored value, when the position has one
    fn value_str(&self) -> Option<&'a str> {
        let strings = self.doc.strings();
        match self.position {
            Position::Attribute(id) => self.doc.attribute(id).map(|a| strings.value(a.value)),
            Position::Namespace(id) => self.doc.namespace(id).map(|n| strings.atomic(n.namespace_uri)),
            // Elements and the root store "no value"
            Position::Node => strings.value_opt(self.record().value),
        }
    }

    /// Stored value without aggregation; `""` for elements and the root
    pub(crate) fn value_raw(&self) -> &'a str {
        self.value_str().unwrap_or("")
    }

    /// String value
    ///
    /// Stored for attributes, namespace nodes and leaves. For elements and
    /// the root it is computed on each call from descendant text nodes.
    pub fn value(&self) -> Cow<'a, str> {
        match self.value_str() {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(self.doc.string_value(self.node)),
        }
    }

    pub fn has_children(&self) -> bool {
        self.on_node() && self.record().has_children()
    }

    pub fn has_attributes(&self) -> bool {
        self.on_node() && self.record().has_attributes()
    }

    /// Element closed with no content at all
    pub fn is_empty_element(&self) -> bool {
        self.on_node() && self.record().is_element() && self.record().is_empty_element
    }

    /// Inherited `xml:lang`, `""` if none
    pub fn xml_lang(&self) -> &'a str {
        self.doc.strings().atomic(self.record().xml_lang)
    }

    /// XPath `lang()` against the inherited `xml:lang`
    pub fn lang_matches(&self, lang: &str) -> bool {
        lang_matches(self.xml_lang(), lang)
    }

    /// Base URI in effect, `""` if none
    pub fn base_uri(&self) -> &'a str {
        self.doc.strings().atomic(self.record().base_uri)
    }

    /// Source line, 0 when line information was not recorded
    pub fn line_number(&self) -> u32 {
        match self.position {
            Position::Node => self.record().line_number,
            Position::Attribute(id) => self.doc.attribute(id).map(|a| a.line_number).unwrap_or(0),
            Position::Namespace(_) => 0,
        }
    }

    /// Source column, 0 when line information was not recorded
    pub fn line_position(&self) -> u32 {
        match self.position {
            Position::Node => self.record().line_position,
            Position::Attribute(id) => self.doc.attribute(id).map(|a| a.line_position).unwrap_or(0),
            Position::Namespace(_) => 0,
        }
    }
}
