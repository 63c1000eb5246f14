//! Structural Event Types
//!
//! Owned form of the events a tokenizer feeds to a tree builder. Used for
//! recorded streams, edit fragments and round-trip checks.

use super::EventSink;
use crate::dtm::AttributeType;
use crate::error::BuildError;

/// How a character-data event was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Character data containing non-whitespace
    Text,
    /// CDATA section content
    CData,
    /// Whitespace-only character data
    Whitespace,
    /// Whitespace-only character data that must be preserved
    SignificantWhitespace,
}

/// A structural parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtmEvent {
    /// Start of an element; attributes and declarations follow
    StartElement {
        prefix: String,
        local_name: String,
        namespace_uri: String,
    },

    /// Attribute of the most recently started element
    Attribute {
        prefix: String,
        local_name: String,
        namespace_uri: String,
        value: String,
        /// Declared type, from the validator side channel
        attr_type: AttributeType,
    },

    /// Namespace declaration on the most recently started element
    NamespaceDecl { prefix: String, namespace_uri: String },

    /// Character data
    Text { value: String, kind: TextKind },

    /// Comment content (excluding markers)
    Comment { value: String },

    /// Processing instruction target and data
    ProcessingInstruction { name: String, value: String },

    /// End of the innermost open element
    EndElement,
}

impl DtmEvent {
    pub fn start_element(prefix: &str, local_name: &str, namespace_uri: &str) -> Self {
        DtmEvent::StartElement {
            prefix: prefix.to_string(),
            local_name: local_name.to_string(),
            namespace_uri: namespace_uri.to_string(),
        }
    }

    /// Unqualified, undeclared attribute
    pub fn attribute(local_name: &str, value: &str) -> Self {
        DtmEvent::Attribute {
            prefix: String::new(),
            local_name: local_name.to_string(),
            namespace_uri: String::new(),
            value: value.to_string(),
            attr_type: AttributeType::Undeclared,
        }
    }

    /// Unqualified attribute declared as an ID
    pub fn id_attribute(local_name: &str, value: &str) -> Self {
        DtmEvent::Attribute {
            prefix: String::new(),
            local_name: local_name.to_string(),
            namespace_uri: String::new(),
            value: value.to_string(),
            attr_type: AttributeType::Id,
        }
    }

    pub fn namespace_decl(prefix: &str, namespace_uri: &str) -> Self {
        DtmEvent::NamespaceDecl {
            prefix: prefix.to_string(),
            namespace_uri: namespace_uri.to_string(),
        }
    }

    pub fn text(value: &str) -> Self {
        DtmEvent::Text {
            value: value.to_string(),
            kind: TextKind::Text,
        }
    }

    pub fn text_of(value: &str, kind: TextKind) -> Self {
        DtmEvent::Text {
            value: value.to_string(),
            kind,
        }
    }

    pub fn comment(value: &str) -> Self {
        DtmEvent::Comment {
            value: value.to_string(),
        }
    }

    pub fn processing_instruction(name: &str, value: &str) -> Self {
        DtmEvent::ProcessingInstruction {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Check if this is a start element event
    #[inline]
    pub fn is_start_element(&self) -> bool {
        matches!(self, DtmEvent::StartElement { .. })
    }

    /// Check if this is an end element event
    #[inline]
    pub fn is_end_element(&self) -> bool {
        matches!(self, DtmEvent::EndElement)
    }

    /// Check if this is an attribute or namespace declaration
    #[inline]
    pub fn is_start_tag_item(&self) -> bool {
        matches!(self, DtmEvent::Attribute { .. } | DtmEvent::NamespaceDecl { .. })
    }

    /// Deliver this event to a sink
    pub fn feed<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<(), BuildError> {
        match self {
            DtmEvent::StartElement {
                prefix,
                local_name,
                namespace_uri,
            } => sink.start_element(prefix, local_name, namespace_uri),
            DtmEvent::Attribute {
                prefix,
                local_name,
                namespace_uri,
                value,
                attr_type,
            } => sink.attribute(prefix, local_name, namespace_uri, value, *attr_type),
            DtmEvent::NamespaceDecl {
                prefix,
                namespace_uri,
            } => sink.namespace_decl(prefix, namespace_uri),
            DtmEvent::Text { value, kind } => sink.text(value, *kind),
            DtmEvent::Comment { value } => sink.comment(value),
            DtmEvent::ProcessingInstruction { name, value } => {
                sink.processing_instruction(name, value)
            }
            DtmEvent::EndElement => sink.end_element(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classes() {
        assert!(DtmEvent::start_element("", "a", "").is_start_element());
        assert!(DtmEvent::EndElement.is_end_element());
        assert!(DtmEvent::attribute("x", "1").is_start_tag_item());
        assert!(DtmEvent::namespace_decl("p", "urn:p").is_start_tag_item());
        assert!(!DtmEvent::text("hi").is_start_tag_item());
    }

    #[test]
    fn test_id_attribute_carries_type() {
        match DtmEvent::id_attribute("id", "x1") {
            DtmEvent::Attribute { attr_type, .. } => assert!(attr_type.is_id()),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
