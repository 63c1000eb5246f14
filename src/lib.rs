//! RustyDTM - Array-backed XPath document tree
//!
//! Layers:
//! A: Event contract (`sax`): the seven structural events a tokenizer emits
//! B: Builder (`dtm::builder`): single pass from events to a frozen `Document`
//! C: Cursor (`dtm::cursor`): `Copy` navigator implementing the XPath data model
//! D: Edits (`dtm::edit`): copy-on-write changes that rebuild a new `Document`
//!
//! ```
//! use rustydtm::{build, BuildOptions, DtmEvent, XPathNodeType};
//!
//! let events = [
//!     DtmEvent::start_element("", "a", ""),
//!     DtmEvent::attribute("x", "1"),
//!     DtmEvent::start_element("", "b", ""),
//!     DtmEvent::text("hi"),
//!     DtmEvent::EndElement,
//!     DtmEvent::comment("c"),
//!     DtmEvent::EndElement,
//! ];
//! let doc = build(&events, BuildOptions::default()).unwrap();
//!
//! let mut nav = doc.cursor();
//! assert!(nav.move_to_first_child());
//! assert_eq!(nav.local_name(), "a");
//! assert_eq!(nav.value(), "hi");
//! assert!(nav.move_to_first_child());
//! assert!(nav.move_to_next());
//! assert_eq!(nav.node_kind(), XPathNodeType::Comment);
//! ```

pub mod dtm;
pub mod error;
pub mod sax;

pub use dtm::{
    build, BuildOptions, Cursor, Document, NamespaceScopeKind, NodeOrder, TreeBuilder,
    XPathNodeType,
};
pub use error::{BuildError, EditError};
pub use sax::{collect_events, DtmEvent, EventCollector, EventSink, TextKind};
