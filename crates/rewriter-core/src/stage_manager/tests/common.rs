use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use crate::event::{ContentEvent, EventConsumer};
use crate::stage_manager::context::ProcessingContext;
use crate::stage_manager::descriptor::StageDescriptor;
use crate::stage_manager::error::Fault;
use crate::stage_manager::registry::{InjectedTransformers, StageFactory};
use crate::stage_manager::{
    generator_handle, push_downstream, serializer_handle, transformer_handle, Downstream, Generator, GeneratorHandle,
    Serializer, SerializerHandle, Stage, StageInitResult, Transformer, TransformerHandle,
};

/// Shared, ordered record of what the test stages did
pub(super) type Journal = Rc<RefCell<Vec<String>>>;

pub(super) fn new_journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(super) fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

/// Fault the generator raises from its completion hook
#[derive(Clone)]
pub(super) enum FinishFault {
    Io(io::ErrorKind, &'static str),
    Processing(&'static str),
}

// Mock generator that records init, counts completion calls, and replays a fixed
// event list downstream when finished. Written input replaces the text payload.
pub(super) struct RecordingGenerator {
    name: String,
    journal: Journal,
    downstream: Option<Downstream>,
    input: Vec<u8>,
    events: Vec<ContentEvent>,
    finish_calls: Rc<Cell<u32>>,
    fault: Option<FinishFault>,
}

impl RecordingGenerator {
    pub(super) fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            downstream: None,
            input: Vec::new(),
            events: vec![
                ContentEvent::StartDocument,
                ContentEvent::characters("hello"),
                ContentEvent::EndDocument,
            ],
            finish_calls: Rc::new(Cell::new(0)),
            fault: None,
        }
    }

    pub(super) fn with_fault(mut self, fault: FinishFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub(super) fn finish_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.finish_calls)
    }

}

impl Stage for RecordingGenerator {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _context: &ProcessingContext, _descriptor: &StageDescriptor) -> StageInitResult {
        self.journal.borrow_mut().push(format!("init:{}", self.name));
        Ok(())
    }
}

impl Generator for RecordingGenerator {
    fn set_downstream(&mut self, downstream: Downstream) {
        self.downstream = Some(downstream);
    }

    fn downstream(&self) -> Option<&Downstream> {
        self.downstream.as_ref()
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.input
    }

    fn finished(&mut self) -> Result<(), Fault> {
        self.finish_calls.set(self.finish_calls.get() + 1);
        match &self.fault {
            Some(FinishFault::Io(kind, message)) => return Err(Fault::Io(io::Error::new(*kind, *message))),
            Some(FinishFault::Processing(message)) => return Err(Fault::processing(*message)),
            None => {}
        }
        let mut events = self.events.clone();
        if !self.input.is_empty() {
            let text = String::from_utf8_lossy(&self.input).into_owned();
            events[1] = ContentEvent::Characters(text);
        }
        for event in events {
            push_downstream(&self.name, self.downstream.as_ref(), event)?;
        }
        Ok(())
    }
}

// Mock transformer that journals each event it sees before forwarding it
pub(super) struct RecordingTransformer {
    name: String,
    journal: Journal,
    downstream: Option<Downstream>,
    init_error: Option<&'static str>,
    received_config: Option<StageDescriptor>,
}

impl RecordingTransformer {
    pub(super) fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            downstream: None,
            init_error: None,
            received_config: None,
        }
    }

    pub(super) fn failing_init(mut self, message: &'static str) -> Self {
        self.init_error = Some(message);
        self
    }

    pub(super) fn received_config(&self) -> Option<&StageDescriptor> {
        self.received_config.as_ref()
    }
}

impl Stage for RecordingTransformer {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _context: &ProcessingContext, descriptor: &StageDescriptor) -> StageInitResult {
        self.journal.borrow_mut().push(format!("init:{}", self.name));
        self.received_config = Some(descriptor.clone());
        match self.init_error {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }
}

impl EventConsumer for RecordingTransformer {
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault> {
        self.journal.borrow_mut().push(format!("{}:{}", self.name, event.name()));
        push_downstream(&self.name, self.downstream.as_ref(), event)
    }
}

impl Transformer for RecordingTransformer {
    fn set_downstream(&mut self, downstream: Downstream) {
        self.downstream = Some(downstream);
    }

    fn downstream(&self) -> Option<&Downstream> {
        self.downstream.as_ref()
    }
}

// Mock serializer that journals each event, optionally failing on one kind
pub(super) struct RecordingSerializer {
    name: String,
    journal: Journal,
    fail_on: Option<&'static str>,
}

impl RecordingSerializer {
    pub(super) fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            fail_on: None,
        }
    }

    pub(super) fn failing_on(mut self, event_name: &'static str) -> Self {
        self.fail_on = Some(event_name);
        self
    }
}

impl Stage for RecordingSerializer {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _context: &ProcessingContext, _descriptor: &StageDescriptor) -> StageInitResult {
        self.journal.borrow_mut().push(format!("init:{}", self.name));
        Ok(())
    }
}

impl EventConsumer for RecordingSerializer {
    fn handle(&mut self, event: ContentEvent) -> Result<(), Fault> {
        if self.fail_on == Some(event.name()) {
            return Err(Fault::with_source(
                format!("{} rejected {}", self.name, event.name()),
                io::Error::new(io::ErrorKind::InvalidData, "malformed markup"),
            ));
        }
        let entry = match &event {
            ContentEvent::Characters(text) => format!("{}:characters={}", self.name, text),
            other => format!("{}:{}", self.name, other.name()),
        };
        self.journal.borrow_mut().push(entry);
        Ok(())
    }
}

impl Serializer for RecordingSerializer {}

/// Factory resolving a fixed set of names to recording stages.
///
/// Every stage it creates writes into the same journal.
pub(super) struct TestFactory {
    journal: Journal,
    generators: Vec<&'static str>,
    transformers: Vec<&'static str>,
    serializers: Vec<&'static str>,
    failing_transformer: Option<&'static str>,
    generator_fault: Option<FinishFault>,
    serializer_fail_on: Option<&'static str>,
    last_finish_counter: RefCell<Option<Rc<Cell<u32>>>>,
}

impl TestFactory {
    pub(super) fn new(journal: Journal) -> Self {
        Self {
            journal,
            generators: vec!["xml-gen"],
            transformers: vec!["linkfix", "rewrite-a", "rewrite-b", "rewrite-c"],
            serializers: vec!["html-ser"],
            failing_transformer: None,
            generator_fault: None,
            serializer_fail_on: None,
            last_finish_counter: RefCell::new(None),
        }
    }

    pub(super) fn with_failing_transformer(mut self, name: &'static str) -> Self {
        self.failing_transformer = Some(name);
        self
    }

    pub(super) fn with_generator_fault(mut self, fault: FinishFault) -> Self {
        self.generator_fault = Some(fault);
        self
    }

    pub(super) fn with_serializer_failing_on(mut self, event_name: &'static str) -> Self {
        self.serializer_fail_on = Some(event_name);
        self
    }

    /// Completion-hook counter of the most recently resolved generator
    pub(super) fn finish_counter(&self) -> Option<Rc<Cell<u32>>> {
        self.last_finish_counter.borrow().clone()
    }

    /// Build an injected transformer journaling into the same journal
    pub(super) fn injected(&self, name: &str) -> TransformerHandle {
        transformer_handle(RecordingTransformer::new(name, Rc::clone(&self.journal)))
    }
}

impl StageFactory for TestFactory {
    fn resolve_generator(&self, type_name: &str) -> Option<GeneratorHandle> {
        if !self.generators.iter().any(|name| *name == type_name) {
            return None;
        }
        let mut generator = RecordingGenerator::new(type_name, Rc::clone(&self.journal));
        if let Some(fault) = &self.generator_fault {
            generator = generator.with_fault(fault.clone());
        }
        *self.last_finish_counter.borrow_mut() = Some(generator.finish_counter());
        Some(generator_handle(generator))
    }

    fn resolve_transformer(&self, type_name: &str) -> Option<TransformerHandle> {
        if !self.transformers.iter().any(|name| *name == type_name) {
            return None;
        }
        let mut transformer = RecordingTransformer::new(type_name, Rc::clone(&self.journal));
        if self.failing_transformer == Some(type_name) {
            transformer = transformer.failing_init("refusing to start");
        }
        Some(transformer_handle(transformer))
    }

    fn resolve_serializer(&self, type_name: &str) -> Option<SerializerHandle> {
        if !self.serializers.iter().any(|name| *name == type_name) {
            return None;
        }
        let mut serializer = RecordingSerializer::new(type_name, Rc::clone(&self.journal));
        if let Some(event_name) = self.serializer_fail_on {
            serializer = serializer.failing_on(event_name);
        }
        Some(serializer_handle(serializer))
    }

    fn injected_transformers(&self) -> InjectedTransformers {
        InjectedTransformers::new(vec![self.injected("audit")], Vec::new())
    }
}

/// Type names along downstream edges, starting after the generator
pub(super) fn downstream_names(generator: &GeneratorHandle) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = generator.borrow().downstream().cloned();
    while let Some(stage) = current {
        names.push(stage.type_name());
        current = stage.next();
    }
    names
}
