use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use crate::stage_manager::context::ProcessingContext;
use crate::stage_manager::descriptor::{PipelineDescription, StageDescriptor};
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::registry::{InjectedTransformers, StageFactory};
use crate::stage_manager::{Downstream, GeneratorHandle, SerializerHandle, Stage, StageRole, TransformerHandle};

/// A fully resolved, initialized and wired pipeline for one invocation
pub struct AssembledPipeline {
    generator: GeneratorHandle,
    /// Injected `pre`, then explicit, then injected `post`
    transformers: Vec<TransformerHandle>,
    serializer: SerializerHandle,
    /// First consumer after the generator
    chain_head: Downstream,
}

impl AssembledPipeline {
    /// The generator the caller drives
    pub fn generator(&self) -> &GeneratorHandle {
        &self.generator
    }

    /// Transformers in wiring order
    pub fn transformers(&self) -> &[TransformerHandle] {
        &self.transformers
    }

    pub fn serializer(&self) -> &SerializerHandle {
        &self.serializer
    }

    /// First transformer, or the serializer when there are none
    pub fn chain_head(&self) -> &Downstream {
        &self.chain_head
    }

    /// Follow downstream edges from the generator until the serializer
    pub fn walk(&self) -> Vec<Downstream> {
        let mut visited = Vec::with_capacity(self.transformers.len() + 1);
        let mut current = self.generator.borrow().downstream().cloned();
        while let Some(stage) = current {
            current = stage.next();
            visited.push(stage);
        }
        visited
    }

    /// Type names along the chain, generator first
    pub fn stage_names(&self) -> Vec<String> {
        let mut names = vec![self.generator.borrow().type_name().to_string()];
        names.extend(self.walk().iter().map(Downstream::type_name));
        names
    }
}

impl fmt::Debug for AssembledPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builds [`AssembledPipeline`]s from descriptions using a [`StageFactory`]
pub struct PipelineAssembler<'a> {
    factory: &'a dyn StageFactory,
}

impl<'a> PipelineAssembler<'a> {
    pub fn new(factory: &'a dyn StageFactory) -> Self {
        Self { factory }
    }

    /// Resolve, initialize and wire every stage of `description`.
    ///
    /// Stages are initialized in order: generator, injected `pre`, explicit
    /// transformers, injected `post`, serializer. The first failure aborts
    /// assembly and nothing built so far is returned.
    pub fn assemble(
        &self,
        context: &ProcessingContext,
        description: &PipelineDescription,
        injected: InjectedTransformers,
    ) -> Result<AssembledPipeline, StageSystemError> {
        let pipeline_name = description.display_name();
        debug!("Assembling pipeline '{}'", pipeline_name);

        let generator_descriptor = description.generator();
        let generator = self
            .factory
            .resolve_generator(generator_descriptor.type_name())
            .ok_or_else(|| not_found(StageRole::Generator, generator_descriptor))?;
        initialize(StageRole::Generator, &mut *generator.borrow_mut(), context, generator_descriptor)?;

        let InjectedTransformers { pre, post } = injected;
        let explicit = description.transformers();
        let transformer_count = pre.len() + explicit.len() + post.len();
        let mut transformers: Vec<TransformerHandle> = Vec::with_capacity(transformer_count);

        // Injected stages bracket the configured ones and only ever see an empty descriptor
        let empty = StageDescriptor::empty();
        for transformer in pre {
            initialize(StageRole::Transformer, &mut *transformer.borrow_mut(), context, &empty)?;
            transformers.push(transformer);
        }
        for descriptor in explicit {
            let transformer = self
                .factory
                .resolve_transformer(descriptor.type_name())
                .ok_or_else(|| not_found(StageRole::Transformer, descriptor))?;
            initialize(StageRole::Transformer, &mut *transformer.borrow_mut(), context, descriptor)?;
            transformers.push(transformer);
        }
        for transformer in post {
            initialize(StageRole::Transformer, &mut *transformer.borrow_mut(), context, &empty)?;
            transformers.push(transformer);
        }

        let serializer_descriptor = description.serializer();
        let serializer = self
            .factory
            .resolve_serializer(serializer_descriptor.type_name())
            .ok_or_else(|| not_found(StageRole::Serializer, serializer_descriptor))?;
        initialize(StageRole::Serializer, &mut *serializer.borrow_mut(), context, serializer_descriptor)?;

        // Wire back to front so each stage is handed an already-wired target
        let mut target = Downstream::Serializer(Rc::clone(&serializer));
        for transformer in transformers.iter().rev() {
            transformer.borrow_mut().set_downstream(target);
            target = Downstream::Transformer(Rc::clone(transformer));
        }
        generator.borrow_mut().set_downstream(target.clone());

        let pipeline = AssembledPipeline {
            generator,
            transformers,
            serializer,
            chain_head: target,
        };
        info!("Assembled pipeline '{}': {}", pipeline_name, pipeline.stage_names().join(" -> "));
        Ok(pipeline)
    }
}

fn initialize<S: Stage + ?Sized>(
    role: StageRole,
    stage: &mut S,
    context: &ProcessingContext,
    descriptor: &StageDescriptor,
) -> Result<(), StageSystemError> {
    debug!("Initializing {} '{}'", role, stage.type_name());
    stage
        .init(context, descriptor)
        .map_err(|source| StageSystemError::InitializationFailed {
            role,
            type_name: stage.type_name().to_string(),
            source,
        })
}

fn not_found(role: StageRole, descriptor: &StageDescriptor) -> StageSystemError {
    StageSystemError::StageNotFound {
        role,
        type_name: descriptor.type_name().to_string(),
    }
}
