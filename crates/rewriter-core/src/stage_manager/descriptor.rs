use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ConfigData;
use crate::config::error::ConfigError;

/// Configuration record naming a stage's type and its parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// Role-specific type name used to resolve the stage
    #[serde(rename = "type")]
    type_name: String,

    /// Stage parameters; keys are unique
    #[serde(default)]
    config: ConfigData,
}

impl StageDescriptor {
    /// Descriptor for the given type with no parameters
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            config: ConfigData::new(),
        }
    }

    /// The descriptor handed to injected transformers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add one parameter
    pub fn with_value<T: Serialize>(mut self, key: &str, value: T) -> Result<Self, ConfigError> {
        self.config.set(key, value)?;
        Ok(self)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    /// Typed parameter lookup
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.get(key)
    }

    /// True for the empty descriptor (no type, no parameters)
    pub fn is_empty(&self) -> bool {
        self.type_name.is_empty() && self.config.is_empty()
    }
}

/// Declarative description of one pipeline.
///
/// Exactly one generator and one serializer; transformer order is kept as
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescription {
    /// Optional name, used in logs only
    #[serde(default)]
    name: Option<String>,

    generator: StageDescriptor,

    #[serde(default)]
    transformers: Vec<StageDescriptor>,

    serializer: StageDescriptor,
}

impl PipelineDescription {
    /// Description with no explicit transformers
    pub fn new(generator: StageDescriptor, serializer: StageDescriptor) -> Self {
        Self {
            name: None,
            generator,
            transformers: Vec::new(),
            serializer,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Append an explicit transformer after those already present
    pub fn with_transformer(mut self, transformer: StageDescriptor) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for log lines; falls back to the generator/serializer pair
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}->{}", self.generator.type_name(), self.serializer.type_name()),
        }
    }

    pub fn generator(&self) -> &StageDescriptor {
        &self.generator
    }

    pub fn transformers(&self) -> &[StageDescriptor] {
        &self.transformers
    }

    pub fn serializer(&self) -> &StageDescriptor {
        &self.serializer
    }
}
