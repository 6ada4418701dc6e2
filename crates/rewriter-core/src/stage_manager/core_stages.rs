use std::io::{self, Write};

use log::{debug, trace};

use crate::event::{Attribute, ContentEvent, EventConsumer};
use crate::stage_manager::context::{ProcessingContext, SharedOutput};
use crate::stage_manager::descriptor::StageDescriptor;
use crate::stage_manager::error::{Fault, StageSystemError};
use crate::stage_manager::registry::StageRegistry;
use crate::stage_manager::{
    generator_handle, push_downstream, serializer_handle, transformer_handle, Downstream, Generator, Serializer,
    Stage, StageInitResult, Transformer,
};

// Type names of the built-in stages
pub const LINES_GENERATOR: &str = "lines";
pub const TRACE_TRANSFORMER: &str = "trace";
pub const EVENT_LOG_SERIALIZER: &str = "event-log";

// Descriptor keys
pub const ELEMENT_KEY: &str = "element";
pub const LABEL_KEY: &str = "label";

const DEFAULT_ELEMENT: &str = "line";

// --- Core Stage Definitions ---

/// Generator that emits one element per input line.
///
/// Input is buffered until [`Generator::finished`], then decoded as UTF-8 and
/// emitted as `start-document`, `<line n="1">text</line>`…, `end-document`.
#[derive(Debug, Default)]
pub struct LineGenerator {
    element: String,
    buffer: Vec<u8>,
    downstream: Option<Downstream>,
}

impl LineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&self, event: ContentEvent) -> Result<(), Fault> {
        push_downstream(LINES_GENERATOR, self.downstream.as_ref(), event)
    }
}

impl Stage for LineGenerator {
    fn type_name(&self) -> &str {
        LINES_GENERATOR
    }

    fn init(&mut self, _context: &ProcessingContext, descriptor: &StageDescriptor) -> StageInitResult {
        self.element = descriptor
            .get::<String>(ELEMENT_KEY)
            .filter(|element| !element.is_empty())
            .unwrap_or_else(|| DEFAULT_ELEMENT.to_string());
        Ok(())
    }
}

impl Generator for LineGenerator {
    fn set_downstream(&mut self, downstream: Downstream) {
        self.downstream = Some(downstream);
    }

    fn downstream(&self) -> Option<&Downstream> {
        self.downstream.as_ref()
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.buffer
    }

    fn finished(&mut self) -> Result<(), Fault> {
        let input = std::mem::take(&mut self.buffer);
        let text = String::from_utf8(input).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!("Generating events for {} lines", text.lines().count());

        self.emit(ContentEvent::StartDocument)?;
        for (index, line) in text.lines().enumerate() {
            let number = Attribute::new("n", (index + 1).to_string());
            self.emit(ContentEvent::start_element(self.element.as_str(), vec![number]))?;
            if !line.is_empty() {
                self.emit(ContentEvent::characters(line))?;
            }
            self.emit(ContentEvent::end_element(self.element.as_str()))?;
        }
        self.emit(ContentEvent::EndDocument)
    }
}

/// Transformer that forwards every event unchanged, logging it at trace level
#[derive(Debug, Default)]
pub struct TraceTransformer {
    label: String,
    seen: usize,
    downstream: Option<Downstream>,
}

impl TraceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events forwarded so far
    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl Stage for TraceTransformer {
    fn type_name(&self) -> &str {
        TRACE_TRANSFORMER
    }

    fn init(&mut self, _context: &ProcessingContext, descriptor: &StageDescriptor) -> StageInitResult {
        self.label = descriptor.get::<String>(LABEL_KEY).unwrap_or_else(|| TRACE_TRANSFORMER.to_string());
        self.seen = 0;
        Ok(())
    }
}

impl EventConsumer for TraceTransformer {
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault> {
        self.seen += 1;
        trace!("[{}] #{} {}", self.label, self.seen, event);
        push_downstream(TRACE_TRANSFORMER, self.downstream.as_ref(), event)
    }
}

impl Transformer for TraceTransformer {
    fn set_downstream(&mut self, downstream: Downstream) {
        self.downstream = Some(downstream);
    }

    fn downstream(&self) -> Option<&Downstream> {
        self.downstream.as_ref()
    }
}

/// Serializer that writes one line per event to the context output
#[derive(Default)]
pub struct EventLogSerializer {
    output: Option<SharedOutput>,
}

impl EventLogSerializer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Stage for EventLogSerializer {
    fn type_name(&self) -> &str {
        EVENT_LOG_SERIALIZER
    }

    fn init(&mut self, context: &ProcessingContext, _descriptor: &StageDescriptor) -> StageInitResult {
        let output = context.output().ok_or("processing context has no output attached")?;
        self.output = Some(output);
        Ok(())
    }
}

impl EventConsumer for EventLogSerializer {
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| Fault::processing("event-log serializer used before init"))?;
        let mut output = output.borrow_mut();
        writeln!(output, "{}", event)?;
        if matches!(event, ContentEvent::EndDocument) {
            output.flush()?;
        }
        Ok(())
    }
}

impl Serializer for EventLogSerializer {}

// --- Core Stage Registration ---

/// Register every built-in stage with `registry`
pub fn register_core_stages(registry: &mut StageRegistry) -> Result<(), StageSystemError> {
    registry.register_generator(LINES_GENERATOR, || generator_handle(LineGenerator::new()))?;
    registry.register_transformer(TRACE_TRANSFORMER, || transformer_handle(TraceTransformer::new()))?;
    registry.register_serializer(EVENT_LOG_SERIALIZER, || serializer_handle(EventLogSerializer::new()))?;
    Ok(())
}

impl StageRegistry {
    /// Registry pre-populated with the built-in stages
    pub fn with_core_stages() -> Result<Self, StageSystemError> {
        let mut registry = StageRegistry::new();
        register_core_stages(&mut registry)?;
        Ok(registry)
    }
}
