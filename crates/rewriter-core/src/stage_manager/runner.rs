use std::fmt;
use std::io;
use std::rc::Rc;
use std::sync::Arc;

use log::{error, info, warn};

use crate::stage_manager::context::ProcessingContext;
use crate::stage_manager::descriptor::PipelineDescription;
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::pipeline::{AssembledPipeline, PipelineAssembler};
use crate::stage_manager::registry::{InjectedTransformers, StageFactory};
use crate::stage_manager::{Downstream, GeneratorHandle};

/// Lifecycle of a single pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Assembling,
    Ready,
    Running,
    Finished,
    Failed,
}

impl PipelineState {
    /// Whether the state allows no further work
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Finished | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Uninitialized => write!(f, "uninitialized"),
            PipelineState::Assembling => write!(f, "assembling"),
            PipelineState::Ready => write!(f, "ready"),
            PipelineState::Running => write!(f, "running"),
            PipelineState::Finished => write!(f, "finished"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// Drives one assembled pipeline: hands out the entry point, then finishes it.
///
/// A runner is single-use. Once it reaches [`PipelineState::Failed`] or
/// [`PipelineState::Finished`] it never goes back to `Ready`.
pub struct PipelineRunner {
    factory: Arc<dyn StageFactory>,
    state: PipelineState,
    pipeline: Option<AssembledPipeline>,
}

impl PipelineRunner {
    pub fn new(factory: Arc<dyn StageFactory>) -> Self {
        Self {
            factory,
            state: PipelineState::Uninitialized,
            pipeline: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The assembled pipeline, once assembly has succeeded
    pub fn pipeline(&self) -> Option<&AssembledPipeline> {
        match self.state {
            PipelineState::Failed => None,
            _ => self.pipeline.as_ref(),
        }
    }

    /// Assemble using the injected transformers the factory supplies
    pub fn init(&mut self, context: &ProcessingContext, description: &PipelineDescription) -> Result<(), StageSystemError> {
        if self.state != PipelineState::Uninitialized {
            return Err(self.invalid_state("init"));
        }
        let injected = self.factory.injected_transformers();
        self.init_with(context, description, injected)
    }

    /// Assemble with an explicitly supplied set of injected transformers
    pub fn init_with(
        &mut self,
        context: &ProcessingContext,
        description: &PipelineDescription,
        injected: InjectedTransformers,
    ) -> Result<(), StageSystemError> {
        if self.state != PipelineState::Uninitialized {
            return Err(self.invalid_state("init"));
        }
        self.state = PipelineState::Assembling;

        match PipelineAssembler::new(self.factory.as_ref()).assemble(context, description, injected) {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                self.state = PipelineState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Failed to assemble pipeline '{}': {}", description.display_name(), e);
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// The generator the caller pushes raw input into
    pub fn entry_point(&mut self) -> Result<GeneratorHandle, StageSystemError> {
        let generator = match (self.state, &self.pipeline) {
            (PipelineState::Ready | PipelineState::Running, Some(pipeline)) => Rc::clone(pipeline.generator()),
            _ => return Err(self.invalid_state("get the entry point")),
        };
        self.state = PipelineState::Running;
        Ok(generator)
    }

    /// The first consumer after the generator
    pub fn chain_head(&self) -> Result<Downstream, StageSystemError> {
        match (self.state, &self.pipeline) {
            (PipelineState::Ready | PipelineState::Running | PipelineState::Finished, Some(pipeline)) => {
                Ok(pipeline.chain_head().clone())
            }
            _ => Err(self.invalid_state("get the chain head")),
        }
    }

    /// Write raw input into the generator's writer
    pub fn write_input(&mut self, input: &[u8]) -> io::Result<()> {
        let generator = self.entry_point().map_err(io::Error::other)?;
        let mut generator = generator.borrow_mut();
        generator.writer().write_all(input)
    }

    /// Signal the generator that input is complete.
    ///
    /// The completion hook runs at most once per runner. A fault it raises is
    /// reported through [`Fault::into_reported`](crate::stage_manager::error::Fault::into_reported):
    /// an I/O cause comes back unchanged, anything else as a wrapped
    /// "pipeline exception".
    pub fn finish(&mut self) -> io::Result<()> {
        let generator = match (self.state, &self.pipeline) {
            (PipelineState::Ready | PipelineState::Running, Some(pipeline)) => Rc::clone(pipeline.generator()),
            (PipelineState::Finished, _) => return Err(io::Error::other(StageSystemError::AlreadyFinished)),
            _ => return Err(io::Error::other(self.invalid_state("finish"))),
        };

        // Move out of Running before calling the hook so it can never run twice
        self.state = PipelineState::Finished;
        let outcome = generator.borrow_mut().finished();
        match outcome {
            Ok(()) => {
                info!("Pipeline finished");
                Ok(())
            }
            Err(fault) => {
                warn!("Pipeline failed while finishing: {}", fault);
                self.state = PipelineState::Failed;
                Err(fault.into_reported())
            }
        }
    }

    fn invalid_state(&self, operation: &'static str) -> StageSystemError {
        StageSystemError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

impl fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("state", &self.state)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
