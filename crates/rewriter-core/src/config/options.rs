use crate::config::ConfigData;

pub const PROPERTY_CLASSDEBUGINFO: &str = "java.classdebuginfo";
pub const PROPERTY_COMPILER_SOURCE_VM: &str = "java.compilerSourceVM";
pub const PROPERTY_ENCODING: &str = "java.javaEncoding";

pub const DEFAULT_VM_VERSION: &str = "auto";
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Compiler options normalized from raw component properties.
///
/// Missing properties fall back to defaults; empty strings count as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    generate_debug_info: bool,
    source_version: String,
    encoding: String,
}

impl CompilerOptions {
    pub fn from_config(props: &ConfigData) -> Self {
        Self {
            generate_debug_info: props.get_or(PROPERTY_CLASSDEBUGINFO, true),
            source_version: non_empty(props, PROPERTY_COMPILER_SOURCE_VM).unwrap_or_else(|| DEFAULT_VM_VERSION.to_string()),
            encoding: non_empty(props, PROPERTY_ENCODING).unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
        }
    }

    pub fn generate_debug_info(&self) -> bool {
        self.generate_debug_info
    }

    pub fn source_version(&self) -> &str {
        &self.source_version
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::from_config(&ConfigData::new())
    }
}

fn non_empty(props: &ConfigData, key: &str) -> Option<String> {
    props.get::<String>(key).filter(|value| !value.is_empty())
}
