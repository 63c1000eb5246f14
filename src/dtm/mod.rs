//! DTM Module - Array-Backed Document Tree
//!
//! Builds a read-only tree from structural events and navigates it by handle:
//! - Parallel record stores for nodes, attributes and namespace nodes
//! - `u32` handles in document order, `0` as the null handle
//! - Two string pools (names and values)
//! - Namespace scope chains shared between elements
//!
//! ## Architecture
//!
//! ```text
//! Document
//! ├── nodes: Vec<NodeRecord>           # handle 1 is the root
//! ├── attributes: Vec<AttributeRecord> # linked per element
//! ├── namespaces: Vec<NamespaceRecord> # handle 1 is the fixed xml binding
//! ├── strings: StringTable             # atomic + value pools
//! └── ids: IdIndex                     # ID value -> element
//! ```

pub mod builder;
pub mod cursor;
pub mod document;
pub mod edit;
pub mod namespace;
pub mod node;
pub mod options;
pub mod strings;

pub use builder::{build, TreeBuilder};
pub use cursor::{Cursor, NodeOrder, Position};
pub use document::{Document, IdIndex};
pub use edit::{append_child, delete_node, insert_after, insert_before, set_attribute};
pub use namespace::NamespaceScopeKind;
pub use node::{AttrId, AttributeType, NodeId, NodeKind, NsId, XPathNodeType};
pub use options::{BuildOptions, CdataWhitespace, DuplicateIdPolicy, WhitespaceHandling};
pub use strings::{StrId, StringTable};
