use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Output sink shared between the caller and the serializer
pub type SharedOutput = Rc<RefCell<dyn Write>>;

/// Context handed to every stage's `init` during one pipeline invocation.
///
/// The assembler never looks inside; it only passes the context through.
pub struct ProcessingContext {
    /// Content type of the response being produced
    content_type: Option<String>,

    /// Path of the request being processed
    request_path: Option<String>,

    /// String attributes set by the caller
    attributes: HashMap<String, String>,

    /// Typed data shared with stages
    shared_data: HashMap<String, Box<dyn Any>>,

    /// Where the serializer writes its output
    output: Option<SharedOutput>,
}

impl ProcessingContext {
    /// Create an empty context with no output attached
    pub fn new() -> Self {
        Self {
            content_type: None,
            request_path: None,
            attributes: HashMap::new(),
            shared_data: HashMap::new(),
            output: None,
        }
    }

    /// Attach the output sink for the serializer
    pub fn with_output(mut self, output: SharedOutput) -> Self {
        self.output = Some(output);
        self
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Set the request path
    pub fn with_request_path(mut self, request_path: &str) -> Self {
        self.request_path = Some(request_path.to_string());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }

    /// A clone of the output handle, if one is attached
    pub fn output(&self) -> Option<SharedOutput> {
        self.output.clone()
    }

    /// Set a string attribute
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    /// Get a string attribute
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Set a shared data value
    pub fn set_data<T: 'static>(&mut self, key: &str, value: T) {
        self.shared_data.insert(key.to_string(), Box::new(value));
    }

    /// Get a shared data value
    pub fn get_data<T: 'static>(&self, key: &str) -> Option<&T> {
        self.shared_data.get(key).and_then(|data| data.downcast_ref::<T>())
    }

    /// Get a mutable reference to a shared data value
    pub fn get_data_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.shared_data.get_mut(key).and_then(|data| data.downcast_mut::<T>())
    }
}

impl Default for ProcessingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data_keys: Vec<&String> = self.shared_data.keys().collect();
        f.debug_struct("ProcessingContext")
            .field("content_type", &self.content_type)
            .field("request_path", &self.request_path)
            .field("attributes", &self.attributes)
            .field("shared_data", &data_keys)
            .field("has_output", &self.output.is_some())
            .finish()
    }
}
