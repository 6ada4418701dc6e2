pub mod types;

use crate::stage_manager::error::Fault;

pub use types::{Attribute, ContentEvent};

/// Push-style receiver of content events.
///
/// Transformers and serializers implement this; the stage upstream of them
/// calls [`EventConsumer::handle`] once per event, synchronously.
pub trait EventConsumer {
    /// Handle a single event. A transformer may push any number of events to
    /// its own downstream before returning.
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault>;
}
