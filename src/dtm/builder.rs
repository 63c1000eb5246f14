//! Tree Builder
//!
//! Builds a [`Document`] from structural events in a single pass.
//!
//! Links are patched as nodes appear:
//! - each open element remembers its last linked child, so a new node gets
//!   its previous sibling immediately and back-patches that sibling's
//!   `next_sibling` (or the parent's `first_child`);
//! - namespace chains are threaded through a [`NamespaceScope`] that unwinds
//!   when the declaring element closes;
//! - consecutive character-data events are merged into one text node, which
//!   is only written when the next non-text event arrives.

use super::document::{Document, IdIndex};
use super::namespace::{ns, resolve_base, NamespaceScope};
use super::node::{
    AttrId, AttributeRecord, AttributeType, NamespaceRecord, NodeId, NodeKind, NodeRecord, NONE,
    ROOT,
};
use super::options::{BuildOptions, CdataWhitespace, WhitespaceHandling};
use super::strings::{StringPoolBuilder, EMPTY};
use crate::error::BuildError;
use crate::sax::{EventSink, TextKind};

/// Per-element build state, kept on a stack of open elements
#[derive(Debug, Clone, Copy)]
struct OpenElement {
    node: NodeId,
    /// Running previous sibling for the next child
    last_child: NodeId,
    /// Tail of the attribute list
    last_attribute: AttrId,
    /// Attributes and declarations are still accepted
    in_start_tag: bool,
    /// Any content event arrived, including dropped whitespace
    has_content: bool,
    /// Inside `xml:space="preserve"`
    preserve_space: bool,
}

impl OpenElement {
    fn new(node: NodeId, preserve_space: bool, in_start_tag: bool) -> Self {
        OpenElement {
            node,
            last_child: NONE,
            last_attribute: NONE,
            in_start_tag,
            has_content: false,
            preserve_space,
        }
    }
}

/// Character data merged from consecutive text events
#[derive(Debug)]
struct PendingText {
    value: String,
    kind: NodeKind,
    /// Bytes at the end of `value` that came from whitespace events
    whitespace_tail: usize,
    line_number: u32,
    line_position: u32,
}

impl PendingText {
    fn new(line_number: u32, line_position: u32) -> Self {
        PendingText {
            value: String::new(),
            kind: NodeKind::Whitespace,
            whitespace_tail: 0,
            line_number,
            line_position,
        }
    }

    /// Merge one event into the run
    ///
    /// Whitespace stays Whitespace, SignificantWhitespace upgrades it, and
    /// Text or CDATA upgrades and locks the run as Text.
    fn push(&mut self, value: &str, kind: TextKind, cdata: CdataWhitespace) {
        match kind {
            TextKind::Text => {
                self.kind = NodeKind::Text;
                self.whitespace_tail = 0;
            }
            TextKind::CData => {
                if cdata == CdataWhitespace::DropPreceding {
                    let keep = self.value.len() - self.whitespace_tail;
                    self.value.truncate(keep);
                }
                self.kind = NodeKind::Text;
                self.whitespace_tail = 0;
            }
            TextKind::Whitespace => {
                self.whitespace_tail += value.len();
            }
            TextKind::SignificantWhitespace => {
                if self.kind == NodeKind::Whitespace {
                    self.kind = NodeKind::SignificantWhitespace;
                }
                self.whitespace_tail += value.len();
            }
        }
        self.value.push_str(value);
    }
}

/// Append a record, growing the store by doubling
fn push_record<T>(store: &mut Vec<T>, record: T, name: &'static str) -> Result<u32, BuildError> {
    let handle = u32::try_from(store.len())
        .ok()
        .filter(|&h| h < u32::MAX)
        .ok_or(BuildError::CapacityOverflow {
            store: name,
            max: u32::MAX - 1,
        })?;
    if store.len() == store.capacity() {
        store.try_reserve(store.len().max(4))?;
    }
    store.push(record);
    Ok(handle)
}

/// Whether a string is XML whitespace only
pub fn is_whitespace_only(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Single-pass document builder
///
/// Create with [`TreeBuilder::new`], drive through [`EventSink`], and call
/// [`TreeBuilder::finish`]. The first structural error poisons the builder.
pub struct TreeBuilder {
    options: BuildOptions,
    nodes: Vec<NodeRecord>,
    attributes: Vec<AttributeRecord>,
    namespaces: Vec<NamespaceRecord>,
    strings: StringPoolBuilder,
    ids: IdIndex,
    /// Open elements; the root frame sits at the bottom
    open: Vec<OpenElement>,
    scope: NamespaceScope,
    pending: Option<PendingText>,
    line_number: u32,
    line_position: u32,
    failed: bool,
}

impl TreeBuilder {
    /// Begin a document: creates the root and the fixed `xml` namespace node
    pub fn new(options: BuildOptions) -> Self {
        let mut strings = StringPoolBuilder::new(options.atomic_window, options.value_window);

        // Interning into an empty pool cannot overflow
        let base_uri = options
            .base_uri
            .as_deref()
            .and_then(|b| strings.intern_atomic(b).ok())
            .unwrap_or(EMPTY);
        let xml_prefix = strings.intern_atomic(ns::XML_PREFIX).unwrap_or(EMPTY);
        let xml_uri = strings.intern_atomic(ns::XML).unwrap_or(EMPTY);

        let mut nodes = Vec::with_capacity(options.node_capacity.max(2));
        nodes.push(NodeRecord::sentinel());
        nodes.push(NodeRecord::root(base_uri));

        let mut attributes = Vec::with_capacity(options.attribute_capacity.max(1));
        attributes.push(AttributeRecord::sentinel());

        let mut namespaces = Vec::with_capacity(options.namespace_capacity.max(2));
        namespaces.push(NamespaceRecord::sentinel());
        namespaces.push(NamespaceRecord {
            declared_element: NONE,
            next_namespace: NONE,
            name: xml_prefix,
            namespace_uri: xml_uri,
        });

        TreeBuilder {
            nodes,
            attributes,
            namespaces,
            strings,
            ids: IdIndex::default(),
            open: vec![OpenElement::new(ROOT, false, false)],
            scope: NamespaceScope::new(),
            pending: None,
            line_number: 0,
            line_position: 0,
            failed: false,
            options,
        }
    }

    /// Position stamped on records created from now on (with `line_info`)
    pub fn set_position(&mut self, line_number: u32, line_position: u32) {
        if self.options.line_info {
            self.line_number = line_number;
            self.line_position = line_position;
        }
    }

    /// Number of elements currently open
    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }

    /// Character data in the boolean form a tokenizer usually reports it
    pub fn on_text(
        &mut self,
        value: &str,
        is_cdata: bool,
        is_whitespace_only: bool,
    ) -> Result<(), BuildError> {
        let kind = if is_cdata {
            TextKind::CData
        } else if is_whitespace_only {
            TextKind::Whitespace
        } else {
            TextKind::Text
        };
        self.text(value, kind)
    }

    /// Character data classified by content
    pub fn on_characters(&mut self, value: &str) -> Result<(), BuildError> {
        self.on_text(value, false, is_whitespace_only(value))
    }

    /// Freeze the document
    ///
    /// Fails if any element is still open; no partial document is returned.
    pub fn finish(mut self) -> Result<Document, BuildError> {
        if self.failed {
            return Err(BuildError::Poisoned);
        }
        self.flush_text()?;
        if self.open.len() > 1 {
            return Err(BuildError::UnclosedElements {
                open: self.open.len() - 1,
            });
        }

        self.nodes.shrink_to_fit();
        self.attributes.shrink_to_fit();
        self.namespaces.shrink_to_fit();
        let strings = self.strings.finish();

        tracing::debug!(
            nodes = self.nodes.len() - 1,
            attributes = self.attributes.len() - 1,
            namespaces = self.namespaces.len() - 1,
            atomic_strings = strings.atomic_len(),
            value_strings = strings.value_len(),
            string_bytes = strings.bytes_used(),
            ids = self.ids.len(),
            "document frozen"
        );

        Ok(Document::from_parts(
            self.nodes,
            self.attributes,
            self.namespaces,
            strings,
            self.ids,
            self.options,
        ))
    }

    // === Internals ===

    fn guard(&mut self, result: Result<(), BuildError>) -> Result<(), BuildError> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn check(&self) -> Result<(), BuildError> {
        if self.failed {
            Err(BuildError::Poisoned)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn top(&mut self) -> &mut OpenElement {
        // The root frame is never popped
        let last = self.open.len() - 1;
        &mut self.open[last]
    }

    /// Mark the current element as having content; closes its start tag
    fn begin_content(&mut self) {
        let top = self.top();
        top.in_start_tag = false;
        top.has_content = true;
    }

    /// Frame of the element whose start tag is still open
    fn start_tag_frame(&mut self) -> Option<OpenElement> {
        let top = *self.top();
        (top.in_start_tag && top.node != ROOT).then_some(top)
    }

    /// Add a node under the current element and link it into the sibling list
    fn append_child(&mut self, mut record: NodeRecord) -> Result<NodeId, BuildError> {
        let frame = *self.top();
        let parent = &self.nodes[frame.node as usize];
        record.parent = frame.node;
        record.previous_sibling = frame.last_child;
        record.xml_lang = parent.xml_lang;
        record.base_uri = parent.base_uri;
        if self.options.line_info && record.line_number == 0 {
            record.line_number = self.line_number;
            record.line_position = self.line_position;
        }

        let id = push_record(&mut self.nodes, record, "node")?;
        if frame.last_child != NONE {
            self.nodes[frame.last_child as usize].next_sibling = id;
        } else {
            self.nodes[frame.node as usize].first_child = id;
        }
        self.top().last_child = id;
        Ok(id)
    }

    /// Write out the pending text run, if any
    fn flush_text(&mut self) -> Result<(), BuildError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if pending.value.is_empty() {
            return Ok(());
        }
        if pending.kind == NodeKind::Whitespace
            && self.options.whitespace == WhitespaceHandling::DiscardInsignificant
        {
            return Ok(());
        }

        let value = self.strings.intern_value(&pending.value)?;
        let mut record = NodeRecord::leaf(pending.kind, NONE, value);
        record.line_number = pending.line_number;
        record.line_position = pending.line_position;
        self.append_child(record)?;
        Ok(())
    }

    fn register_id(&mut self, value: &str, element: NodeId) {
        if !self.ids.insert(value, element, self.options.duplicate_ids) {
            tracing::debug!(id = value, element, "duplicate ID value");
        }
    }

    /// Apply `xml:lang`, `xml:space` and `xml:base` to the element being started
    fn apply_xml_attribute(&mut self, local_name: &str, value: &str, element: NodeId) -> Result<(), BuildError> {
        match local_name {
            "lang" => {
                let lang = self.strings.intern_atomic(value)?;
                self.nodes[element as usize].xml_lang = lang;
            }
            "space" => match value {
                "preserve" => self.top().preserve_space = true,
                "default" => self.top().preserve_space = false,
                _ => {}
            },
            "base" => {
                let parent = self.nodes[element as usize].parent;
                let inherited = self.strings.atomic(self.nodes[parent as usize].base_uri);
                let resolved = resolve_base(inherited, value);
                let base = self.strings.intern_atomic(&resolved)?;
                self.nodes[element as usize].base_uri = base;
            }
            _ => {}
        }
        Ok(())
    }

    fn do_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<(), BuildError> {
        self.flush_text()?;
        self.begin_content();

        let prefix = self.strings.intern_atomic(prefix)?;
        let local_name = self.strings.intern_atomic(local_name)?;
        let namespace_uri = self.strings.intern_atomic(namespace_uri)?;
        let mut record = NodeRecord::element(NONE, prefix, local_name, namespace_uri);
        record.first_namespace = self.scope.current();

        let id = self.append_child(record)?;
        let preserve_space = self.top().preserve_space;
        self.open.push(OpenElement::new(id, preserve_space, true));
        Ok(())
    }

    fn do_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<(), BuildError> {
        if namespace_uri == ns::XMLNS
            || prefix == ns::XMLNS_PREFIX
            || (prefix.is_empty() && local_name == ns::XMLNS_PREFIX)
        {
            let declared = if prefix == ns::XMLNS_PREFIX { local_name } else { "" };
            return self.do_namespace_decl(declared, value);
        }

        let Some(frame) = self.start_tag_frame() else {
            return Err(BuildError::AttributeOutsideElement {
                name: local_name.to_string(),
            });
        };
        let element = frame.node;

        let in_xml_namespace = namespace_uri == ns::XML || prefix == ns::XML_PREFIX;
        let is_id = attr_type.is_id() || (in_xml_namespace && local_name == "id");

        let record = AttributeRecord {
            owner_element: element,
            next_attribute: NONE,
            local_name: self.strings.intern_atomic(local_name)?,
            namespace_uri: self.strings.intern_atomic(namespace_uri)?,
            prefix: self.strings.intern_atomic(prefix)?,
            value: self.strings.intern_value(value)?,
            is_id,
            line_number: self.line_number,
            line_position: self.line_position,
        };
        let id = push_record(&mut self.attributes, record, "attribute")?;
        if frame.last_attribute == NONE {
            self.nodes[element as usize].first_attribute = id;
        } else {
            self.attributes[frame.last_attribute as usize].next_attribute = id;
        }
        self.top().last_attribute = id;

        if in_xml_namespace {
            self.apply_xml_attribute(local_name, value, element)?;
        }
        if is_id {
            self.register_id(value, element);
        }
        Ok(())
    }

    fn do_namespace_decl(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), BuildError> {
        let Some(frame) = self.start_tag_frame() else {
            return Err(BuildError::NamespaceOutsideElement {
                prefix: prefix.to_string(),
            });
        };

        // The xml binding is fixed and xmlns cannot be bound
        if prefix == ns::XML_PREFIX || prefix == ns::XMLNS_PREFIX {
            return Ok(());
        }

        let name = self.strings.intern_atomic(prefix)?;
        let uri = self.strings.intern_atomic(namespace_uri)?;
        let handle = u32::try_from(self.namespaces.len()).unwrap_or(u32::MAX);
        let before = self.scope;
        let record = self.scope.declare(frame.node, name, uri, handle);
        if let Err(err) = push_record(&mut self.namespaces, record, "namespace") {
            self.scope = before;
            return Err(err);
        }
        self.nodes[frame.node as usize].first_namespace = self.scope.current();
        Ok(())
    }

    fn do_text(&mut self, value: &str, kind: TextKind) -> Result<(), BuildError> {
        self.begin_content();
        let kind = match kind {
            TextKind::Whitespace if self.top().preserve_space => TextKind::SignificantWhitespace,
            other => other,
        };
        let (line, column) = (self.line_number, self.line_position);
        let cdata = self.options.cdata_whitespace;
        self.pending
            .get_or_insert_with(|| PendingText::new(line, column))
            .push(value, kind, cdata);
        Ok(())
    }

    fn do_leaf(&mut self, kind: NodeKind, name: &str, value: &str) -> Result<(), BuildError> {
        self.flush_text()?;
        self.begin_content();
        let value = self.strings.intern_value(value)?;
        let mut record = NodeRecord::leaf(kind, NONE, value);
        record.local_name = self.strings.intern_atomic(name)?;
        self.append_child(record)?;
        Ok(())
    }

    fn do_end_element(&mut self) -> Result<(), BuildError> {
        self.flush_text()?;
        if self.open.len() <= 1 {
            return Err(BuildError::UnbalancedEnd);
        }
        let frame = self.open.pop().ok_or(BuildError::UnbalancedEnd)?;
        self.nodes[frame.node as usize].is_empty_element = !frame.has_content;
        self.scope.leave(frame.node, &self.namespaces);
        Ok(())
    }
}

impl EventSink for TreeBuilder {
    fn start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_start_element(prefix, local_name, namespace_uri);
        self.guard(result)
    }

    fn attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_attribute(prefix, local_name, namespace_uri, value, attr_type);
        self.guard(result)
    }

    fn namespace_decl(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_namespace_decl(prefix, namespace_uri);
        self.guard(result)
    }

    fn text(&mut self, value: &str, kind: TextKind) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_text(value, kind);
        self.guard(result)
    }

    fn comment(&mut self, value: &str) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_leaf(NodeKind::Comment, "", value);
        self.guard(result)
    }

    fn processing_instruction(&mut self, name: &str, value: &str) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_leaf(NodeKind::ProcessingInstruction, name, value);
        self.guard(result)
    }

    fn end_element(&mut self) -> Result<(), BuildError> {
        self.check()?;
        let result = self.do_end_element();
        self.guard(result)
    }
}

/// Build a document from a recorded event stream
pub fn build<'e, I>(events: I, options: BuildOptions) -> Result<Document, BuildError>
where
    I: IntoIterator<Item = &'e crate::sax::DtmEvent>,
{
    let mut builder = TreeBuilder::new(options);
    crate::sax::replay(events, &mut builder)?;
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtm::node::XML_NAMESPACE_NODE;
    use crate::dtm::options::DuplicateIdPolicy;
    use crate::sax::DtmEvent;

    fn doc(events: &[DtmEvent]) -> Document {
        build(events, BuildOptions::default()).unwrap()
    }

    fn elem(name: &str) -> DtmEvent {
        DtmEvent::start_element("", name, "")
    }

    fn end() -> DtmEvent {
        DtmEvent::EndElement
    }

    /// `<a x="1"><b>hi</b><!--c--></a>`
    fn scenario() -> Vec<DtmEvent> {
        vec![
            elem("a"),
            DtmEvent::attribute("x", "1"),
            elem("b"),
            DtmEvent::text("hi"),
            end(),
            DtmEvent::comment("c"),
            end(),
        ]
    }

    #[test]
    fn test_scenario_layout() {
        let doc = doc(&scenario());
        // root, a, b, "hi", comment
        assert_eq!(doc.node_count(), 5);

        let root = doc.node(ROOT).unwrap();
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.first_child, 2);

        let a = doc.node(2).unwrap();
        assert_eq!(a.kind, NodeKind::Element);
        assert_eq!(a.parent, ROOT);
        assert_eq!(a.first_child, 3);
        assert_ne!(a.first_attribute, NONE);

        let b = doc.node(3).unwrap();
        assert_eq!(b.next_sibling, 5);
        assert_eq!(b.first_child, 4);
        assert_eq!(doc.node(4).unwrap().kind, NodeKind::Text);

        let comment = doc.node(5).unwrap();
        assert_eq!(comment.kind, NodeKind::Comment);
        assert_eq!(comment.previous_sibling, 3);
        assert_eq!(comment.next_sibling, NONE);
        assert_eq!(doc.strings().value(comment.value), "c");
    }

    #[test]
    fn test_attribute_list_order() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::attribute("x", "1"),
            DtmEvent::attribute("y", "2"),
            DtmEvent::attribute("z", "3"),
            end(),
        ]);
        let names: Vec<&str> = doc
            .attributes_of(2)
            .map(|id| doc.strings().atomic(doc.attribute(id).unwrap().local_name))
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert!(doc.attributes_of(2).all(|id| doc.attribute(id).unwrap().owner_element == 2));
    }

    #[test]
    fn test_xmlns_attribute_becomes_declaration() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::Attribute {
                prefix: "xmlns".into(),
                local_name: "p".into(),
                namespace_uri: ns::XMLNS.into(),
                value: "urn:p".into(),
                attr_type: AttributeType::Undeclared,
            },
            end(),
        ]);
        assert!(!doc.node(2).unwrap().has_attributes());
        let head = doc.node(2).unwrap().first_namespace;
        let decl = doc.namespace(head).unwrap();
        assert_eq!(decl.declared_element, 2);
        assert_eq!(doc.strings().atomic(decl.name), "p");
        assert_eq!(doc.strings().atomic(decl.namespace_uri), "urn:p");
        assert_eq!(decl.next_namespace, XML_NAMESPACE_NODE);
    }

    #[test]
    fn test_namespace_chain_does_not_leak_to_sibling() {
        // <r xmlns:a="A"><x xmlns:b="B"><y/></x><z/></r>
        let doc = doc(&[
            elem("r"),
            DtmEvent::namespace_decl("a", "A"),
            elem("x"),
            DtmEvent::namespace_decl("b", "B"),
            elem("y"),
            end(),
            end(),
            elem("z"),
            end(),
            end(),
        ]);
        let r = doc.node(2).unwrap();
        let x = doc.node(3).unwrap();
        let y = doc.node(4).unwrap();
        let z = doc.node(5).unwrap();
        assert_eq!(y.first_namespace, x.first_namespace);
        assert_eq!(z.first_namespace, r.first_namespace);
        assert_eq!(doc.namespace(x.first_namespace).unwrap().next_namespace, r.first_namespace);
    }

    #[test]
    fn test_text_coalescing_classification() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::text_of("  ", TextKind::Whitespace),
            DtmEvent::text_of("\n", TextKind::Whitespace),
            end(),
            elem("b"),
            DtmEvent::text_of(" ", TextKind::Whitespace),
            DtmEvent::text_of(" ", TextKind::SignificantWhitespace),
            end(),
            elem("c"),
            DtmEvent::text_of(" ", TextKind::SignificantWhitespace),
            DtmEvent::text("x"),
            DtmEvent::text_of(" ", TextKind::Whitespace),
            end(),
        ]);
        let kinds: Vec<(NodeKind, &str)> = (1..=doc.node_count() as u32)
            .filter_map(|id| doc.node(id))
            .filter(|n| n.kind.is_text_like())
            .map(|n| (n.kind, doc.strings().value(n.value)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (NodeKind::Whitespace, "  \n"),
                (NodeKind::SignificantWhitespace, "  "),
                (NodeKind::Text, " x "),
            ]
        );
    }

    #[test]
    fn test_cdata_keeps_preceding_whitespace_by_default() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::text("x"),
            DtmEvent::text_of(" ", TextKind::Whitespace),
            DtmEvent::text_of("y", TextKind::CData),
            end(),
        ]);
        let text = doc.node(3).unwrap();
        assert_eq!(doc.strings().value(text.value), "x y");
    }

    #[test]
    fn test_cdata_drop_preceding_whitespace_policy() {
        let events = [
            elem("a"),
            DtmEvent::text("x"),
            DtmEvent::text_of(" ", TextKind::Whitespace),
            DtmEvent::text_of("y", TextKind::CData),
            end(),
        ];
        let opts = BuildOptions::default().with_cdata_whitespace(CdataWhitespace::DropPreceding);
        let doc = build(&events, opts).unwrap();
        let text = doc.node(3).unwrap();
        assert_eq!(doc.strings().value(text.value), "xy");
        assert_eq!(text.kind, NodeKind::Text);
    }

    #[test]
    fn test_discard_insignificant_whitespace() {
        let events = [
            elem("a"),
            DtmEvent::text_of("\n  ", TextKind::Whitespace),
            elem("b"),
            end(),
            DtmEvent::text_of("\n", TextKind::SignificantWhitespace),
            end(),
            elem("c"),
            DtmEvent::text_of(" ", TextKind::Whitespace),
            end(),
        ];
        let opts = BuildOptions::default().with_whitespace(WhitespaceHandling::DiscardInsignificant);
        let doc = build(&events, opts).unwrap();
        // a, b, significant whitespace, c
        assert_eq!(doc.node_count(), 5);
        assert_eq!(doc.node(2).unwrap().first_child, 3);
        assert_eq!(doc.node(4).unwrap().kind, NodeKind::SignificantWhitespace);

        // c lost its only child but was not self-closed
        let c = doc.node(5).unwrap();
        assert!(!c.has_children());
        assert!(!c.is_empty_element);
        assert!(doc.node(3).unwrap().is_empty_element);
    }

    #[test]
    fn test_xml_space_preserve_upgrades_whitespace() {
        let events = [
            elem("pre"),
            DtmEvent::Attribute {
                prefix: "xml".into(),
                local_name: "space".into(),
                namespace_uri: ns::XML.into(),
                value: "preserve".into(),
                attr_type: AttributeType::Undeclared,
            },
            elem("i"),
            DtmEvent::text_of("  ", TextKind::Whitespace),
            end(),
            end(),
        ];
        let opts = BuildOptions::default().with_whitespace(WhitespaceHandling::DiscardInsignificant);
        let doc = build(&events, opts).unwrap();
        assert_eq!(doc.node(4).unwrap().kind, NodeKind::SignificantWhitespace);
    }

    #[test]
    fn test_xml_lang_inherited() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::Attribute {
                prefix: "xml".into(),
                local_name: "lang".into(),
                namespace_uri: ns::XML.into(),
                value: "en".into(),
                attr_type: AttributeType::Undeclared,
            },
            elem("b"),
            DtmEvent::text("t"),
            end(),
            end(),
        ]);
        for id in 2..=4 {
            let node = doc.node(id).unwrap();
            assert_eq!(doc.strings().atomic(node.xml_lang), "en");
        }
        assert_eq!(doc.strings().atomic(doc.node(ROOT).unwrap().xml_lang), "");
    }

    #[test]
    fn test_id_index_policies() {
        let events = [
            elem("r"),
            elem("a"),
            DtmEvent::id_attribute("id", "x1"),
            end(),
            elem("b"),
            DtmEvent::id_attribute("id", "x1"),
            end(),
            elem("c"),
            DtmEvent::attribute("id", "plain"),
            end(),
            end(),
        ];
        let first = build(&events, BuildOptions::default()).unwrap();
        assert_eq!(first.ids().lookup("x1"), Some(3));
        assert_eq!(first.ids().lookup("plain"), None);

        let opts = BuildOptions::default().with_duplicate_ids(DuplicateIdPolicy::LastWins);
        let last = build(&events, opts).unwrap();
        assert_eq!(last.ids().lookup("x1"), Some(4));
    }

    #[test]
    fn test_xml_id_is_always_an_id() {
        let doc = doc(&[
            elem("a"),
            DtmEvent::Attribute {
                prefix: "xml".into(),
                local_name: "id".into(),
                namespace_uri: ns::XML.into(),
                value: "top".into(),
                attr_type: AttributeType::Undeclared,
            },
            end(),
        ]);
        assert_eq!(doc.ids().lookup("top"), Some(2));
    }

    #[test]
    fn test_empty_element_flag() {
        let doc = doc(&[elem("r"), elem("e"), end(), elem("f"), DtmEvent::comment(""), end(), end()]);
        assert!(doc.node(3).unwrap().is_empty_element);
        assert!(!doc.node(4).unwrap().is_empty_element);
        assert!(!doc.node(2).unwrap().is_empty_element);
    }

    #[test]
    fn test_unbalanced_end_is_fatal() {
        let err = build(&[elem("a"), end(), end()], BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::UnbalancedEnd));
    }

    #[test]
    fn test_missing_end_is_fatal() {
        let err = build(&[elem("a"), elem("b"), end()], BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::UnclosedElements { open: 1 }));
    }

    #[test]
    fn test_attribute_after_content_is_fatal() {
        let err = build(
            &[elem("a"), DtmEvent::text("t"), DtmEvent::attribute("x", "1"), end()],
            BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::AttributeOutsideElement { .. }));

        let err = build(&[DtmEvent::namespace_decl("p", "urn:p")], BuildOptions::default()).unwrap_err();
        assert!(matches!(err, BuildError::NamespaceOutsideElement { .. }));
    }

    #[test]
    fn test_builder_poisoned_after_error() {
        let mut builder = TreeBuilder::new(BuildOptions::default());
        assert!(builder.end_element().is_err());
        assert!(matches!(builder.start_element("", "a", ""), Err(BuildError::Poisoned)));
        assert!(matches!(builder.finish(), Err(BuildError::Poisoned)));
    }

    #[test]
    fn test_growth_from_tiny_capacity() {
        let mut events = vec![elem("r")];
        for i in 0..100 {
            events.push(elem("item"));
            events.push(DtmEvent::attribute("n", &i.to_string()));
            events.push(DtmEvent::namespace_decl("p", "urn:p"));
            events.push(end());
        }
        events.push(end());
        let opts = BuildOptions::default().with_capacity(1, 1, 1);
        let doc = build(&events, opts).unwrap();
        assert_eq!(doc.node_count(), 102);
        assert_eq!(doc.attribute_count(), 100);
        // 100 declarations plus the fixed xml node
        assert_eq!(doc.namespace_count(), 101);
    }

    #[test]
    fn test_line_info() {
        let mut builder = TreeBuilder::new(BuildOptions::default().with_line_info(true));
        builder.set_position(1, 1);
        builder.start_element("", "a", "").unwrap();
        builder.set_position(2, 5);
        builder.on_characters("text").unwrap();
        builder.set_position(3, 1);
        builder.end_element().unwrap();
        let doc = builder.finish().unwrap();
        assert_eq!((doc.node(2).unwrap().line_number, doc.node(2).unwrap().line_position), (1, 1));
        assert_eq!((doc.node(3).unwrap().line_number, doc.node(3).unwrap().line_position), (2, 5));
    }

    #[test]
    fn test_on_text_boolean_form() {
        let mut builder = TreeBuilder::new(BuildOptions::default());
        builder.start_element("", "a", "").unwrap();
        builder.on_text("  ", false, true).unwrap();
        builder.on_text("<raw>", true, false).unwrap();
        assert_eq!(builder.depth(), 1);
        builder.end_element().unwrap();
        let doc = builder.finish().unwrap();
        let text = doc.node(3).unwrap();
        assert_eq!(text.kind, NodeKind::Text);
        assert_eq!(doc.strings().value(text.value), "  <raw>");
    }
}
