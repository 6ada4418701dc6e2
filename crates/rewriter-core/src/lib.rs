//! # Rewriter Core
//!
//! Assembles and drives streaming content pipelines: one generator, an ordered
//! chain of transformers, and one serializer, wired into a single synchronous
//! event chain.
pub mod config;
pub mod error;
pub mod event;
pub mod stage_manager;

// Re-export the types most callers need to build and run a pipeline
pub use error::{Error, Result};
pub use event::{ContentEvent, EventConsumer};
pub use stage_manager::{Downstream, Generator, Serializer, Stage, StageRole, Transformer};
pub use stage_manager::context::ProcessingContext;
pub use stage_manager::descriptor::{PipelineDescription, StageDescriptor};
pub use stage_manager::pipeline::{AssembledPipeline, PipelineAssembler};
pub use stage_manager::registry::{InjectedTransformers, StageFactory, StageRegistry};
pub use stage_manager::runner::{PipelineRunner, PipelineState};
