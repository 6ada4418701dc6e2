use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::stage_manager::descriptor::PipelineDescription;
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::{GeneratorHandle, SerializerHandle, StageRole, TransformerHandle};

/// Transformers supplied outside the pipeline description.
///
/// `pre` runs before every explicit transformer, `post` after all of them.
#[derive(Default)]
pub struct InjectedTransformers {
    pub pre: Vec<TransformerHandle>,
    pub post: Vec<TransformerHandle>,
}

impl InjectedTransformers {
    pub fn new(pre: Vec<TransformerHandle>, post: Vec<TransformerHandle>) -> Self {
        Self { pre, post }
    }

    /// No injected transformers at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pre.len() + self.post.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for InjectedTransformers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |set: &[TransformerHandle]| -> Vec<String> {
            set.iter().map(|t| t.borrow().type_name().to_string()).collect()
        };
        f.debug_struct("InjectedTransformers")
            .field("pre", &names(self.pre.as_slice()))
            .field("post", &names(self.post.as_slice()))
            .finish()
    }
}

/// Outcome of resolving a type name for a given role
pub enum ResolvedStage {
    Generator(GeneratorHandle),
    Transformer(TransformerHandle),
    Serializer(SerializerHandle),
    NotFound { role: StageRole, type_name: String },
}

/// Produces fresh, uninitialized stages by role and type name
pub trait StageFactory {
    fn resolve_generator(&self, type_name: &str) -> Option<GeneratorHandle>;

    fn resolve_transformer(&self, type_name: &str) -> Option<TransformerHandle>;

    fn resolve_serializer(&self, type_name: &str) -> Option<SerializerHandle>;

    /// Injected transformers for one pipeline invocation
    fn injected_transformers(&self) -> InjectedTransformers;

    /// Resolve by role, folding the three lookups into one sum type
    fn resolve(&self, role: StageRole, type_name: &str) -> ResolvedStage {
        let resolved = match role {
            StageRole::Generator => self.resolve_generator(type_name).map(ResolvedStage::Generator),
            StageRole::Transformer => self.resolve_transformer(type_name).map(ResolvedStage::Transformer),
            StageRole::Serializer => self.resolve_serializer(type_name).map(ResolvedStage::Serializer),
        };
        resolved.unwrap_or_else(|| ResolvedStage::NotFound {
            role,
            type_name: type_name.to_string(),
        })
    }
}

type GeneratorConstructor = Box<dyn Fn() -> GeneratorHandle + Send + Sync>;
type TransformerConstructor = Box<dyn Fn() -> TransformerHandle + Send + Sync>;
type SerializerConstructor = Box<dyn Fn() -> SerializerHandle + Send + Sync>;

struct InjectedEntry {
    type_name: String,
    ranking: i32,
    constructor: TransformerConstructor,
}

/// Default [`StageFactory`] backed by registered constructors.
///
/// Injected transformers are ordered by ranking: a negative ranking places
/// the transformer in the `pre` set, zero or positive in the `post` set.
/// Equal rankings keep registration order.
pub struct StageRegistry {
    generators: HashMap<String, GeneratorConstructor>,
    transformers: HashMap<String, TransformerConstructor>,
    serializers: HashMap<String, SerializerConstructor>,
    /// Kept sorted by ranking
    injected: Vec<InjectedEntry>,
}

// Manual Debug implementation
impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("generators", &self.type_names(StageRole::Generator))
            .field("transformers", &self.type_names(StageRole::Transformer))
            .field("serializers", &self.type_names(StageRole::Serializer))
            .field("injected", &self.injected.iter().map(|e| (&e.type_name, e.ranking)).collect::<Vec<_>>())
            .finish()
    }
}

impl StageRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
            transformers: HashMap::new(),
            serializers: HashMap::new(),
            injected: Vec::new(),
        }
    }

    /// Register a generator constructor
    pub fn register_generator<F>(&mut self, type_name: &str, constructor: F) -> Result<(), StageSystemError>
    where
        F: Fn() -> GeneratorHandle + Send + Sync + 'static,
    {
        if self.generators.contains_key(type_name) {
            return Err(already_exists(StageRole::Generator, type_name));
        }
        self.generators.insert(type_name.to_string(), Box::new(constructor));
        debug!("Registered generator '{}'", type_name);
        Ok(())
    }

    /// Register a transformer constructor, resolvable from descriptors
    pub fn register_transformer<F>(&mut self, type_name: &str, constructor: F) -> Result<(), StageSystemError>
    where
        F: Fn() -> TransformerHandle + Send + Sync + 'static,
    {
        if self.transformers.contains_key(type_name) {
            return Err(already_exists(StageRole::Transformer, type_name));
        }
        self.transformers.insert(type_name.to_string(), Box::new(constructor));
        debug!("Registered transformer '{}'", type_name);
        Ok(())
    }

    /// Register a serializer constructor
    pub fn register_serializer<F>(&mut self, type_name: &str, constructor: F) -> Result<(), StageSystemError>
    where
        F: Fn() -> SerializerHandle + Send + Sync + 'static,
    {
        if self.serializers.contains_key(type_name) {
            return Err(already_exists(StageRole::Serializer, type_name));
        }
        self.serializers.insert(type_name.to_string(), Box::new(constructor));
        debug!("Registered serializer '{}'", type_name);
        Ok(())
    }

    /// Register a transformer injected into every pipeline built from this registry
    pub fn register_injected_transformer<F>(
        &mut self,
        type_name: &str,
        ranking: i32,
        constructor: F,
    ) -> Result<(), StageSystemError>
    where
        F: Fn() -> TransformerHandle + Send + Sync + 'static,
    {
        if self.injected.iter().any(|entry| entry.type_name == type_name) {
            return Err(already_exists(StageRole::Transformer, type_name));
        }
        // Insert after every entry with ranking <= ours to keep registration order on ties
        let position = self.injected.partition_point(|entry| entry.ranking <= ranking);
        self.injected.insert(
            position,
            InjectedEntry {
                type_name: type_name.to_string(),
                ranking,
                constructor: Box::new(constructor),
            },
        );
        debug!("Registered injected transformer '{}' with ranking {}", type_name, ranking);
        Ok(())
    }

    /// Check if a type name is registered for the role
    pub fn has_stage(&self, role: StageRole, type_name: &str) -> bool {
        match role {
            StageRole::Generator => self.generators.contains_key(type_name),
            StageRole::Transformer => self.transformers.contains_key(type_name),
            StageRole::Serializer => self.serializers.contains_key(type_name),
        }
    }

    /// Registered type names for a role, sorted
    pub fn type_names(&self, role: StageRole) -> Vec<String> {
        let mut names: Vec<String> = match role {
            StageRole::Generator => self.generators.keys().cloned().collect(),
            StageRole::Transformer => self.transformers.keys().cloned().collect(),
            StageRole::Serializer => self.serializers.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Injected type names as `(pre, post)`, each in execution order
    pub fn injected_type_names(&self) -> (Vec<String>, Vec<String>) {
        let (pre, post): (Vec<&InjectedEntry>, Vec<&InjectedEntry>) =
            self.injected.iter().partition(|entry| entry.ranking < 0);
        let names = |entries: Vec<&InjectedEntry>| -> Vec<String> {
            entries.into_iter().map(|e| e.type_name.clone()).collect()
        };
        (names(pre), names(post))
    }

    /// Get the number of registered stage types, injected ones included
    pub fn count(&self) -> usize {
        self.generators.len() + self.transformers.len() + self.serializers.len() + self.injected.len()
    }

    /// Check that every stage a description names can be resolved, without
    /// creating or initializing anything.
    ///
    /// Returns the chain as `(role, type name)` pairs in wiring order, with
    /// injected transformers in place.
    pub fn validate(&self, description: &PipelineDescription) -> Result<Vec<(StageRole, String)>, StageSystemError> {
        let require = |role: StageRole, type_name: &str| {
            if self.has_stage(role, type_name) {
                Ok((role, type_name.to_string()))
            } else {
                Err(StageSystemError::StageNotFound {
                    role,
                    type_name: type_name.to_string(),
                })
            }
        };

        let (pre, post) = self.injected_type_names();
        let mut chain = vec![require(StageRole::Generator, description.generator().type_name())?];
        chain.extend(pre.into_iter().map(|name| (StageRole::Transformer, name)));
        for transformer in description.transformers() {
            chain.push(require(StageRole::Transformer, transformer.type_name())?);
        }
        chain.extend(post.into_iter().map(|name| (StageRole::Transformer, name)));
        chain.push(require(StageRole::Serializer, description.serializer().type_name())?);
        Ok(chain)
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StageFactory for StageRegistry {
    fn resolve_generator(&self, type_name: &str) -> Option<GeneratorHandle> {
        self.generators.get(type_name).map(|constructor| constructor())
    }

    fn resolve_transformer(&self, type_name: &str) -> Option<TransformerHandle> {
        self.transformers.get(type_name).map(|constructor| constructor())
    }

    fn resolve_serializer(&self, type_name: &str) -> Option<SerializerHandle> {
        self.serializers.get(type_name).map(|constructor| constructor())
    }

    /// Builds fresh instances on every call, so no injected transformer is
    /// ever shared between two invocations.
    fn injected_transformers(&self) -> InjectedTransformers {
        let mut injected = InjectedTransformers::none();
        for entry in &self.injected {
            let transformer = (entry.constructor)();
            if entry.ranking < 0 {
                injected.pre.push(transformer);
            } else {
                injected.post.push(transformer);
            }
        }
        injected
    }
}

fn already_exists(role: StageRole, type_name: &str) -> StageSystemError {
    StageSystemError::StageAlreadyExists {
        role,
        type_name: type_name.to_string(),
    }
}
