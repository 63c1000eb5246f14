//! Copy-on-Write Edits
//!
//! A [`Document`] never changes once built. Each edit walks the source tree,
//! splices the change into the event stream and feeds it to a fresh
//! [`TreeBuilder`], so every invariant of a built document holds for the
//! result as well. Cursors into the source stay valid and keep seeing the
//! old tree.

use std::slice;

use super::builder::TreeBuilder;
use super::cursor::{Cursor, Position};
use super::document::Document;
use super::namespace::ns;
use super::node::{AttrId, AttributeType, NodeId, XPathNodeType, ROOT};
use crate::error::{BuildError, EditError};
use crate::sax::collector::{walk, WalkHooks};
use crate::sax::DtmEvent;

/// One change applied during a rebuild
#[derive(Debug)]
enum Splice<'f> {
    DeleteNode(NodeId),
    DeleteAttribute(AttrId),
    Before(NodeId, &'f [DtmEvent]),
    After(NodeId, &'f [DtmEvent]),
    Append(NodeId, &'f [DtmEvent]),
    ReplaceAttribute(AttrId, DtmEvent),
    AddAttribute(NodeId, DtmEvent),
}

impl WalkHooks for Splice<'_> {
    fn skip_node(&self, node: NodeId) -> bool {
        matches!(self, Splice::DeleteNode(target) if *target == node)
    }

    fn skip_attribute(&self, attr: AttrId) -> bool {
        matches!(self, Splice::DeleteAttribute(target) if *target == attr)
    }

    fn replace_attribute(&self, attr: AttrId) -> Option<&DtmEvent> {
        match self {
            Splice::ReplaceAttribute(target, event) if *target == attr => Some(event),
            _ => None,
        }
    }

    fn extra_attributes(&self, element: NodeId) -> &[DtmEvent] {
        match self {
            Splice::AddAttribute(target, event) if *target == element => slice::from_ref(event),
            _ => &[],
        }
    }

    fn before(&self, node: NodeId) -> &[DtmEvent] {
        match self {
            Splice::Before(target, events) if *target == node => *events,
            _ => &[],
        }
    }

    fn after(&self, node: NodeId) -> &[DtmEvent] {
        match self {
            Splice::After(target, events) if *target == node => *events,
            _ => &[],
        }
    }

    fn before_end(&self, container: NodeId) -> &[DtmEvent] {
        match self {
            Splice::Append(target, events) if *target == container => *events,
            _ => &[],
        }
    }
}

/// Check that a fragment is well-nested content
///
/// Start-tag items may only follow a start tag inside the fragment; at the
/// fragment's top level they would attach to a node outside it.
fn check_fragment(fragment: &[DtmEvent]) -> Result<(), BuildError> {
    let mut depth = 0usize;
    let mut in_start_tag = false;
    for event in fragment {
        match event {
            DtmEvent::StartElement { .. } => {
                depth += 1;
                in_start_tag = true;
                continue;
            }
            DtmEvent::EndElement => {
                depth = depth.checked_sub(1).ok_or(BuildError::UnbalancedEnd)?;
            }
            DtmEvent::Attribute { local_name, .. } if !in_start_tag => {
                return Err(BuildError::AttributeOutsideElement {
                    name: local_name.clone(),
                });
            }
            DtmEvent::NamespaceDecl { prefix, .. } if !in_start_tag => {
                return Err(BuildError::NamespaceOutsideElement {
                    prefix: prefix.clone(),
                });
            }
            DtmEvent::Attribute { .. } | DtmEvent::NamespaceDecl { .. } => continue,
            _ => {}
        }
        in_start_tag = false;
    }
    if depth > 0 {
        return Err(BuildError::UnclosedElements { open: depth });
    }
    Ok(())
}

/// Replay the cursor's document with one splice into a new document
fn rebuild(target: &Cursor<'_>, splice: &Splice<'_>) -> Result<Document, EditError> {
    let doc = target.document();
    tracing::trace!(?splice, nodes = doc.node_count(), "rebuilding document");

    let root = doc.cursor();
    // Whitespace, ID and base-URI settings carry over to the new document
    let options = doc.options().clone().with_capacity(
        doc.node_count() + 1,
        doc.attribute_count() + 1,
        doc.namespace_count() + 1,
    );

    let mut builder = TreeBuilder::new(options);
    walk(&root, splice, &mut builder)?;
    Ok(builder.finish()?)
}

/// Node-position target other than the root
fn content_node(target: &Cursor<'_>) -> Result<NodeId, EditError> {
    match target.position() {
        Position::Node if target.node_id() == ROOT => {
            Err(EditError::InvalidTarget("the root has no siblings"))
        }
        Position::Node => Ok(target.node_id()),
        _ => Err(EditError::InvalidTarget("expected a tree node")),
    }
}

/// Remove the node at the cursor with its subtree, or the attribute at the cursor
pub fn delete_node(target: &Cursor<'_>) -> Result<Document, EditError> {
    let splice = match target.position() {
        Position::Node if target.node_id() == ROOT => {
            return Err(EditError::InvalidTarget("the root cannot be deleted"));
        }
        Position::Node => Splice::DeleteNode(target.node_id()),
        Position::Attribute(id) => Splice::DeleteAttribute(id),
        Position::Namespace(_) => {
            return Err(EditError::InvalidTarget("namespace nodes cannot be deleted"));
        }
    };
    rebuild(target, &splice)
}

/// Insert `fragment` as preceding siblings of the node at the cursor
pub fn insert_before(target: &Cursor<'_>, fragment: &[DtmEvent]) -> Result<Document, EditError> {
    let node = content_node(target)?;
    check_fragment(fragment)?;
    rebuild(target, &Splice::Before(node, fragment))
}

/// Insert `fragment` as following siblings of the node at the cursor
pub fn insert_after(target: &Cursor<'_>, fragment: &[DtmEvent]) -> Result<Document, EditError> {
    let node = content_node(target)?;
    check_fragment(fragment)?;
    rebuild(target, &Splice::After(node, fragment))
}

/// Insert `fragment` as the last children of the element or root at the cursor
pub fn append_child(target: &Cursor<'_>, fragment: &[DtmEvent]) -> Result<Document, EditError> {
    let is_container = target
        .document()
        .node(target.node_id())
        .is_some_and(|n| n.kind.is_container());
    if target.position() != Position::Node || !is_container {
        return Err(EditError::InvalidTarget("expected an element or the root"));
    }
    check_fragment(fragment)?;
    rebuild(target, &Splice::Append(target.node_id(), fragment))
}

/// Set an attribute on the element at the cursor (or owning the attribute at it)
///
/// An existing attribute with the same local name and namespace keeps its
/// place in the list and its ID-ness; otherwise the attribute is appended.
pub fn set_attribute(
    target: &Cursor<'_>,
    prefix: &str,
    local_name: &str,
    namespace_uri: &str,
    value: &str,
) -> Result<Document, EditError> {
    let on_element = match target.position() {
        Position::Node => target.node_kind() == XPathNodeType::Element,
        Position::Attribute(_) => true,
        Position::Namespace(_) => false,
    };
    if !on_element {
        return Err(EditError::InvalidTarget("expected an element or attribute"));
    }
    if namespace_uri == ns::XMLNS
        || prefix == ns::XMLNS_PREFIX
        || (prefix.is_empty() && local_name == ns::XMLNS_PREFIX)
    {
        return Err(EditError::InvalidTarget("namespace declarations are not attributes"));
    }

    let mut element = *target;
    element.move_to_owner();
    let mut existing = element;
    existing.move_to_attribute(local_name, namespace_uri);

    let splice = match existing.position() {
        Position::Attribute(id) => {
            let is_id = target.document().attribute(id).is_some_and(|a| a.is_id);
            Splice::ReplaceAttribute(
                id,
                attribute_event(prefix, local_name, namespace_uri, value, is_id),
            )
        }
        _ => Splice::AddAttribute(
            element.node_id(),
            attribute_event(prefix, local_name, namespace_uri, value, false),
        ),
    };
    rebuild(target, &splice)
}

fn attribute_event(
    prefix: &str,
    local_name: &str,
    namespace_uri: &str,
    value: &str,
    is_id: bool,
) -> DtmEvent {
    DtmEvent::Attribute {
        prefix: prefix.to_string(),
        local_name: local_name.to_string(),
        namespace_uri: namespace_uri.to_string(),
        value: value.to_string(),
        attr_type: if is_id {
            AttributeType::Id
        } else {
            AttributeType::Undeclared
        },
    }
}
