//! Namespace Scope Chaining
//!
//! Every element points at the innermost namespace node visible at it; each
//! namespace node points at the next-outer one. The chain is a stack that the
//! builder grows while an element's declarations arrive and unwinds when the
//! element closes, so a following sibling never inherits declarations that
//! went out of scope with a closed subtree.

use super::node::{NamespaceRecord, NodeId, NsId, XML_NAMESPACE_NODE};
use super::strings::{StrId, StringTable};

/// Well-known namespace URIs and prefixes
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
    pub const XML_PREFIX: &str = "xml";
    pub const XMLNS_PREFIX: &str = "xmlns";
}

/// Which namespace nodes a cursor enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceScopeKind {
    /// Only declarations made on the element itself
    Local,
    /// Everything in scope except the fixed `xml` binding
    ExcludeXml,
    /// Everything in scope, the fixed `xml` binding included
    All,
}

/// The "last namespace in scope" state threaded through the builder
///
/// `last_in_scope` is the chain head a newly opened element inherits. It only
/// moves forward when a declaration is pushed and backward when the element
/// that declared the head closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceScope {
    last_in_scope: NsId,
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceScope {
    /// Empty scope: only the fixed `xml` binding is visible
    pub fn new() -> Self {
        NamespaceScope {
            last_in_scope: XML_NAMESPACE_NODE,
        }
    }

    /// Chain head visible at the current position
    #[inline]
    pub fn current(&self) -> NsId {
        self.last_in_scope
    }

    /// Build the record for a declaration on `element` and push it in front
    /// of the chain. `handle` is where the caller will store the record.
    pub fn declare(
        &mut self,
        element: NodeId,
        name: StrId,
        namespace_uri: StrId,
        handle: NsId,
    ) -> NamespaceRecord {
        let record = NamespaceRecord {
            declared_element: element,
            next_namespace: self.last_in_scope,
            name,
            namespace_uri,
        };
        self.last_in_scope = handle;
        record
    }

    /// Unwind every declaration made by `closed`
    pub fn leave(&mut self, closed: NodeId, namespaces: &[NamespaceRecord]) {
        while self.last_in_scope != XML_NAMESPACE_NODE {
            match namespaces.get(self.last_in_scope as usize) {
                Some(record) if record.declared_element == closed => {
                    self.last_in_scope = record.next_namespace;
                }
                _ => break,
            }
        }
    }
}

/// Whether `candidate` is hidden at an element whose chain starts at `head`
///
/// A node is hidden when a nearer node binds the same prefix, or when it is an
/// undeclaration of the default namespace (`xmlns=""`).
pub fn is_hidden(
    namespaces: &[NamespaceRecord],
    strings: &StringTable,
    head: NsId,
    candidate: NsId,
) -> bool {
    let Some(record) = namespaces.get(candidate as usize) else {
        return true;
    };
    if strings.atomic(record.namespace_uri).is_empty() {
        return true;
    }
    let mut current = head;
    while current != candidate && current != 0 {
        let Some(nearer) = namespaces.get(current as usize) else {
            break;
        };
        if nearer.name == record.name {
            return true;
        }
        current = nearer.next_namespace;
    }
    false
}

/// Split `prefix:local` into its parts; no colon means an empty prefix
pub fn split_qname(qname: &str) -> (&str, &str) {
    match memchr::memchr(b':', qname.as_bytes()) {
        Some(pos) => (&qname[..pos], &qname[pos + 1..]),
        None => ("", qname),
    }
}

/// XPath `lang()` test: `lang` equals `wanted`, or starts with it followed by a subtag
///
/// Compared as bytes, ASCII case-insensitively, so any tag text is accepted.
pub fn lang_matches(lang: &str, wanted: &str) -> bool {
    let (lang, wanted) = (lang.as_bytes(), wanted.as_bytes());
    if wanted.is_empty() {
        return false;
    }
    // `wanted` has to stop where `lang` or one of its subtags stops
    let at_boundary = lang.len() == wanted.len()
        || memchr::memchr_iter(b'-', lang).any(|pos| pos == wanted.len());
    at_boundary && lang[..wanted.len()].eq_ignore_ascii_case(wanted)
}

/// Resolve an `xml:base` value against the inherited base URI
///
/// Absolute values replace the base. Relative ones replace the last path
/// segment of the base.
pub fn resolve_base(inherited: &str, base: &str) -> String {
    let is_absolute = base.starts_with('/') || {
        let bytes = base.as_bytes();
        match memchr::memchr(b':', bytes) {
            Some(pos) => pos > 0 && bytes[..pos].iter().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')),
            None => false,
        }
    };
    if is_absolute || inherited.is_empty() {
        return base.to_string();
    }
    match memchr::memrchr(b'/', inherited.as_bytes()) {
        Some(pos) => format!("{}{}", &inherited[..=pos], base),
        None => base.to_string(),
    }
}
