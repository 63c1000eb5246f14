//! Structural Event Contract
//!
//! The tokenizer side of the tree model. A producer drives an [`EventSink`]
//! with well-nested events; the tree builder is the main sink, the
//! [`EventCollector`] records events for inspection.
//!
//! ```text
//! tokenizer ---> EventSink (TreeBuilder) ---> Document ---> Cursor
//!                                                             |
//!                     EventCollector <--- collect_events <----+
//! ```

pub mod collector;
pub mod events;

pub use collector::{collect_events, EventCollector};
pub use events::{DtmEvent, TextKind};

use crate::dtm::AttributeType;
use crate::error::BuildError;

/// Receiver of structural events
///
/// Attributes and namespace declarations belong to the most recently started
/// element and must arrive before any of its content.
pub trait EventSink {
    /// Called when an element starts
    fn start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
    ) -> Result<(), BuildError>;

    /// Called for each attribute of the current element
    ///
    /// `attr_type` is the declared type reported by a validator, or
    /// `Undeclared` when nothing validates the input.
    fn attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace_uri: &str,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<(), BuildError>;

    /// Called for each namespace declaration on the current element
    fn namespace_decl(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), BuildError>;

    /// Called for character data
    fn text(&mut self, value: &str, kind: TextKind) -> Result<(), BuildError>;

    /// Called for comments
    fn comment(&mut self, value: &str) -> Result<(), BuildError>;

    /// Called for processing instructions
    fn processing_instruction(&mut self, name: &str, value: &str) -> Result<(), BuildError>;

    /// Called when the innermost open element ends
    fn end_element(&mut self) -> Result<(), BuildError>;
}

/// Feed a recorded event stream to a sink, stopping at the first error
pub fn replay<'e, S, I>(events: I, sink: &mut S) -> Result<(), BuildError>
where
    S: EventSink + ?Sized,
    I: IntoIterator<Item = &'e DtmEvent>,
{
    for event in events {
        event.feed(sink)?;
    }
    Ok(())
}
