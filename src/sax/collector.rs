//! Event Collector
//!
//! Records events delivered to it, and turns a built tree back into the
//! event stream that produces it by walking a [`Cursor`] depth first.

use super::events::{DtmEvent, TextKind};
use super::{replay, EventSink};
use crate::dtm::cursor::{Cursor, Position};
use crate::dtm::node::{AttrId, AttributeType, NodeId, NodeKind, NONE, ROOT};
use crate::dtm::XPathNodeType;
use crate::error::BuildError;

/// Sink that stores every event it receives
#[derive(Debug, Default, Clone)]
pub struct EventCollector {
    events: Vec<DtmEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity
    pub fn with_capacity(events: usize) -> Self {
        Self {
            events: Vec::with_capacity(events),
        }
    }

    /// Get the collected events as a slice
    pub fn events(&self) -> &[DtmEvent] {
        &self.events
    }

    /// Take the collected events
    pub fn into_events(self) -> Vec<DtmEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventCollector {
    fn start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<(), BuildError> {
        self.events
            .push(DtmEvent::start_element(prefix, local_name, namespace_uri));
        Ok(())
    }

    fn attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<(), BuildError> {
        self.events.push(DtmEvent::Attribute {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            namespace_uri: namespace_uri.to_string(),
            value: value.to_string(),
            attr_type,
        });
        Ok(())
    }

    fn namespace_decl(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), BuildError> {
        self.events
            .push(DtmEvent::namespace_decl(prefix, namespace_uri));
        Ok(())
    }

    fn text(&mut self, value: &str, kind: TextKind) -> Result<(), BuildError> {
        self.events.push(DtmEvent::text_of(value, kind));
        Ok(())
    }

    fn comment(&mut self, value: &str) -> Result<(), BuildError> {
        self.events.push(DtmEvent::comment(value));
        Ok(())
    }

    fn processing_instruction(&mut self, name: &str, value: &str) -> Result<(), BuildError> {
        self.events
            .push(DtmEvent::processing_instruction(name, value));
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), BuildError> {
        self.events.push(DtmEvent::EndElement);
        Ok(())
    }
}

/// Events that reproduce the subtree at the cursor
///
/// The root contributes only its children. On an attribute or namespace
/// node the owning element's subtree is collected.
pub fn collect_events(cursor: &Cursor<'_>) -> Vec<DtmEvent> {
    let mut collector = EventCollector::new();
    let walked = walk(cursor, &Verbatim, &mut collector);
    debug_assert!(walked.is_ok(), "event collector rejected an event: {walked:?}");
    collector.into_events()
}

/// Points where a walk can diverge from the stored tree
///
/// All hooks are keyed by handles of the document being walked.
pub(crate) trait WalkHooks {
    /// Leave this node and its subtree out
    fn skip_node(&self, _node: NodeId) -> bool {
        false
    }

    /// Leave this attribute out
    fn skip_attribute(&self, _attr: AttrId) -> bool {
        false
    }

    /// Emit this event instead of the stored attribute
    fn replace_attribute(&self, _attr: AttrId) -> Option<&DtmEvent> {
        None
    }

    /// Start-tag items appended after the element's stored attributes
    fn extra_attributes(&self, _element: NodeId) -> &[DtmEvent] {
        &[]
    }

    /// Events emitted just before the node
    fn before(&self, _node: NodeId) -> &[DtmEvent] {
        &[]
    }

    /// Events emitted just after the node (after its end tag)
    fn after(&self, _node: NodeId) -> &[DtmEvent] {
        &[]
    }

    /// Events emitted as the node's last children
    fn before_end(&self, _container: NodeId) -> &[DtmEvent] {
        &[]
    }
}

/// Walk the stored tree unchanged
struct Verbatim;

impl WalkHooks for Verbatim {}

fn text_kind(kind: NodeKind) -> TextKind {
    match kind {
        NodeKind::Whitespace => TextKind::Whitespace,
        NodeKind::SignificantWhitespace => TextKind::SignificantWhitespace,
        _ => TextKind::Text,
    }
}

/// Start tag of the element at `nav`: name, local declarations, attributes
fn open_element<H, S>(nav: &Cursor<'_>, hooks: &H, sink: &mut S) -> Result<(), BuildError>
where
    H: WalkHooks + ?Sized,
    S: EventSink + ?Sized,
{
    let node = nav.node_id();
    sink.start_element(nav.prefix(), nav.local_name(), nav.namespace_uri())?;

    // The chain lists local declarations nearest first; declare them in source order
    let doc = nav.document();
    let strings = doc.strings();
    let mut declarations = Vec::new();
    let mut current = doc.node(node).map(|n| n.first_namespace).unwrap_or(NONE);
    while let Some(record) = doc.namespace(current) {
        if record.declared_element != node {
            break;
        }
        declarations.push((strings.atomic(record.name), strings.atomic(record.namespace_uri)));
        current = record.next_namespace;
    }
    for (prefix, uri) in declarations.into_iter().rev() {
        sink.namespace_decl(prefix, uri)?;
    }

    let mut attr = *nav;
    let mut more = attr.move_to_first_attribute();
    while more {
        if let Position::Attribute(id) = attr.position() {
            if let Some(event) = hooks.replace_attribute(id) {
                event.feed(sink)?;
            } else if !hooks.skip_attribute(id) {
                let is_id = doc.attribute(id).is_some_and(|a| a.is_id);
                let attr_type = if is_id {
                    AttributeType::Id
                } else {
                    AttributeType::Undeclared
                };
                sink.attribute(
                    attr.prefix(),
                    attr.local_name(),
                    attr.namespace_uri(),
                    attr.value_raw(),
                    attr_type,
                )?;
            }
        }
        more = attr.move_to_next_attribute();
    }
    replay(hooks.extra_attributes(node), sink)
}

/// Everything after an element's content
fn close_element<H, S>(node: NodeId, hooks: &H, sink: &mut S) -> Result<(), BuildError>
where
    H: WalkHooks + ?Sized,
    S: EventSink + ?Sized,
{
    replay(hooks.before_end(node), sink)?;
    sink.end_element()?;
    replay(hooks.after(node), sink)
}

fn emit_leaf<S: EventSink + ?Sized>(nav: &Cursor<'_>, sink: &mut S) -> Result<(), BuildError> {
    let value = nav.value_raw();
    match nav.node_kind() {
        XPathNodeType::Comment => sink.comment(value),
        XPathNodeType::ProcessingInstruction => sink.processing_instruction(nav.local_name(), value),
        _ => {
            let kind = nav
                .document()
                .node(nav.node_id())
                .map(|n| text_kind(n.kind))
                .unwrap_or(TextKind::Text);
            sink.text(value, kind)
        }
    }
}

/// Depth-first walk from `start`, feeding `sink` with splices from `hooks`
pub(crate) fn walk<H, S>(start: &Cursor<'_>, hooks: &H, sink: &mut S) -> Result<(), BuildError>
where
    H: WalkHooks + ?Sized,
    S: EventSink + ?Sized,
{
    let mut nav = *start;
    nav.move_to_owner();
    let top = nav.node_id();
    let from_root = top == ROOT;

    if from_root && !nav.move_to_first_child() {
        return replay(hooks.before_end(ROOT), sink);
    }

    loop {
        let node = nav.node_id();
        if !hooks.skip_node(node) {
            replay(hooks.before(node), sink)?;
            if nav.node_kind() == XPathNodeType::Element {
                open_element(&nav, hooks, sink)?;
                if nav.move_to_first_child() {
                    continue;
                }
                close_element(node, hooks, sink)?;
            } else {
                emit_leaf(&nav, sink)?;
                replay(hooks.after(node), sink)?;
            }
        }

        // Advance: next sibling, or climb and close finished elements
        loop {
            if nav.node_id() == top {
                return Ok(());
            }
            if nav.move_to_next() {
                break;
            }
            nav.move_to_parent();
            let parent = nav.node_id();
            if parent == ROOT {
                return replay(hooks.before_end(ROOT), sink);
            }
            close_element(parent, hooks, sink)?;
        }
    }
}
