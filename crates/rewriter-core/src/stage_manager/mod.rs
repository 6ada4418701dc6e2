pub mod context;
pub mod core_stages;
pub mod descriptor;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod runner;

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::event::{ContentEvent, EventConsumer};
use crate::stage_manager::context::ProcessingContext;
use crate::stage_manager::descriptor::StageDescriptor;
use crate::stage_manager::error::Fault;

/// Result of a stage's own initialization hook
pub type StageInitResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Role a stage plays in a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageRole {
    Generator,
    Transformer,
    Serializer,
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageRole::Generator => write!(f, "generator"),
            StageRole::Transformer => write!(f, "transformer"),
            StageRole::Serializer => write!(f, "serializer"),
        }
    }
}

/// Core trait that all stages must implement
pub trait Stage {
    /// The type name this stage is registered under
    fn type_name(&self) -> &str;

    /// Initialize the stage for one pipeline invocation.
    ///
    /// Called exactly once, before any event flows.
    fn init(&mut self, context: &ProcessingContext, descriptor: &StageDescriptor) -> StageInitResult;
}

/// Entry stage: turns raw text written to [`Generator::writer`] into events
pub trait Generator: Stage {
    /// Set the consumer that receives every generated event
    fn set_downstream(&mut self, downstream: Downstream);

    /// The consumer set by [`Generator::set_downstream`], if wired
    fn downstream(&self) -> Option<&Downstream>;

    /// Writer the caller pushes raw input into
    fn writer(&mut self) -> &mut dyn Write;

    /// Completion hook: flush buffered input downstream and release resources.
    fn finished(&mut self) -> Result<(), Fault>;
}

/// Middle stage: consumes events and produces events for its downstream
pub trait Transformer: Stage + EventConsumer {
    /// Set the consumer that receives this transformer's output
    fn set_downstream(&mut self, downstream: Downstream);

    /// The consumer set by [`Transformer::set_downstream`], if wired
    fn downstream(&self) -> Option<&Downstream>;
}

/// Terminal stage: consumes events, no downstream
pub trait Serializer: Stage + EventConsumer {}

pub type GeneratorHandle = Rc<RefCell<dyn Generator>>;
pub type TransformerHandle = Rc<RefCell<dyn Transformer>>;
pub type SerializerHandle = Rc<RefCell<dyn Serializer>>;

/// Wrap a generator into the handle type used for wiring
pub fn generator_handle<G: Generator + 'static>(generator: G) -> GeneratorHandle {
    Rc::new(RefCell::new(generator))
}

/// Wrap a transformer into the handle type used for wiring
pub fn transformer_handle<T: Transformer + 'static>(transformer: T) -> TransformerHandle {
    Rc::new(RefCell::new(transformer))
}

/// Wrap a serializer into the handle type used for wiring
pub fn serializer_handle<S: Serializer + 'static>(serializer: S) -> SerializerHandle {
    Rc::new(RefCell::new(serializer))
}

/// The single outgoing edge of a generator or transformer.
///
/// Edges point forward only, so an assembled chain never forms a cycle.
#[derive(Clone)]
pub enum Downstream {
    Transformer(TransformerHandle),
    Serializer(SerializerHandle),
}

impl Downstream {
    /// Role of the stage this edge points at
    pub fn role(&self) -> StageRole {
        match self {
            Downstream::Transformer(_) => StageRole::Transformer,
            Downstream::Serializer(_) => StageRole::Serializer,
        }
    }

    /// Type name of the stage this edge points at
    pub fn type_name(&self) -> String {
        match self {
            Downstream::Transformer(transformer) => transformer.borrow().type_name().to_string(),
            Downstream::Serializer(serializer) => serializer.borrow().type_name().to_string(),
        }
    }

    /// The edge leaving the target stage; `None` once the serializer is reached
    pub fn next(&self) -> Option<Downstream> {
        match self {
            Downstream::Transformer(transformer) => transformer.borrow().downstream().cloned(),
            Downstream::Serializer(_) => None,
        }
    }

    /// Whether both edges point at the same stage instance
    pub fn is_same_stage(&self, other: &Downstream) -> bool {
        match (self, other) {
            (Downstream::Transformer(a), Downstream::Transformer(b)) => Rc::ptr_eq(a, b),
            (Downstream::Serializer(a), Downstream::Serializer(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Push one event into the target stage
    pub fn push(&self, event: ContentEvent) -> Result<(), Fault> {
        match self {
            Downstream::Transformer(transformer) => transformer.borrow_mut().handle(event),
            Downstream::Serializer(serializer) => serializer.borrow_mut().handle(event),
        }
    }
}

impl EventConsumer for Downstream {
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault> {
        self.push(event)
    }
}

impl fmt::Debug for Downstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downstream")
            .field("role", &self.role())
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Push an event to an optional downstream, faulting if the stage was never wired
pub fn push_downstream(stage: &str, downstream: Option<&Downstream>, event: ContentEvent) -> Result<(), Fault> {
    match downstream {
        Some(target) => target.push(event),
        None => Err(Fault::processing(format!("Stage '{}' has no downstream consumer", stage))),
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
